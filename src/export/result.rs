//! Export result: working directory, produced files, final artifact
//!
//! One [`ExportResult`] exclusively owns the per-export working directory
//! and every [`CsvFile`] produced into it. The final deliverable is
//! materialized lazily and exactly once: a single file's own path, or an
//! archive bundling all files when there is more than one (or archiving is
//! forced). Cleanup of the working directory is explicit, with a drop-time
//! safety net for abandoned results.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{CsvFileConfig, ResultConfig};
use crate::error::{ResourceError, Result};

use super::file::CsvFile;

/// Pluggable archive strategy.
///
/// Receives the produced file paths and the working directory, and returns
/// the path of the assembled artifact.
#[async_trait]
pub trait Archiver: Send {
    async fn archive(&self, files: &[PathBuf], dir: &Path) -> Result<PathBuf>;
}

/// Built-in archiver producing a ZIP file containing each input file under
/// its base name.
pub struct ZipArchiver {
    base_name: String,
}

impl ZipArchiver {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
        }
    }
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self::new("data")
    }
}

#[async_trait]
impl Archiver for ZipArchiver {
    async fn archive(&self, files: &[PathBuf], dir: &Path) -> Result<PathBuf> {
        use zip::write::SimpleFileOptions;
        use zip::{CompressionMethod, ZipWriter};

        let archive_path = dir.join(format!("{}.zip", self.base_name));
        let archive_file = std::fs::File::create(&archive_path)?;
        let mut writer = ZipWriter::new(archive_file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    ResourceError::ArchiveFailed(format!(
                        "file path has no base name: {}",
                        path.display()
                    ))
                })?;
            writer
                .start_file(name, options)
                .map_err(|e| ResourceError::ArchiveFailed(e.to_string()))?;
            let mut input = std::fs::File::open(path)?;
            std::io::copy(&mut input, &mut writer)?;
        }
        writer
            .finish()
            .map_err(|e| ResourceError::ArchiveFailed(e.to_string()))?;

        debug!("Created ZIP archive: {} ({} files)", archive_path.display(), files.len());
        Ok(archive_path)
    }
}

/// The set of files produced by one export and their final artifact.
pub struct ExportResult {
    base_path: PathBuf,
    file_base_name: String,
    force_archive: bool,
    archiver: Option<Box<dyn Archiver>>,
    files: Vec<CsvFile>,
    dir_name: Option<PathBuf>,
    result_path: Option<PathBuf>,
}

impl std::fmt::Debug for ExportResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportResult")
            .field("base_path", &self.base_path)
            .field("file_base_name", &self.file_base_name)
            .field("force_archive", &self.force_archive)
            .field("files", &self.files.len())
            .field("dir_name", &self.dir_name)
            .field("result_path", &self.result_path)
            .finish_non_exhaustive()
    }
}

impl ExportResult {
    pub fn new(config: &ResultConfig) -> Self {
        Self {
            base_path: config.base_path.clone(),
            file_base_name: config.file_base_name.clone(),
            force_archive: config.force_archive,
            archiver: None,
            files: Vec::new(),
            dir_name: None,
            result_path: None,
        }
    }

    /// Substitute the archive strategy used when multiple files exist or
    /// archiving is forced.
    pub fn with_archiver(mut self, archiver: Box<dyn Archiver>) -> Self {
        self.archiver = Some(archiver);
        self
    }

    /// Unique working directory of this export, allocated lazily.
    ///
    /// The directory itself is created on disk by the first file write.
    pub fn dir_name(&mut self) -> PathBuf {
        if let Some(dir) = &self.dir_name {
            return dir.clone();
        }
        let unique = format!("{}-{}", Local::now().format("%Y%m%d-%H%M%S"), Uuid::new_v4());
        let dir = self.base_path.join(unique);
        self.dir_name = Some(dir.clone());
        dir
    }

    /// Allocate the next sequential output file (`<base>-NNN.csv`) inside
    /// the working directory and register it.
    pub fn new_csv_file(&mut self, config: &CsvFileConfig) -> &mut CsvFile {
        let file_name = format!("{}-{:03}.csv", self.file_base_name, self.files.len() + 1);
        let path = self.dir_name().join(file_name);
        debug!("Allocated output file: {}", path.display());
        self.files.push(CsvFile::new(path, config));
        let index = self.files.len() - 1;
        &mut self.files[index]
    }

    /// The most recently allocated output file.
    pub fn current_file_mut(&mut self) -> Option<&mut CsvFile> {
        self.files.last_mut()
    }

    /// Produced output files, in creation order.
    pub fn files(&self) -> &[CsvFile] {
        &self.files
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Path of the final artifact, resolved once and memoized.
    ///
    /// `None` when the export produced no files. With exactly one file and
    /// no forced archiving this is the file's own path; otherwise the
    /// archive strategy runs over all file paths.
    pub async fn result_path(&mut self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.result_path {
            return Ok(Some(path.clone()));
        }
        if self.files.is_empty() {
            return Ok(None);
        }

        let path = if self.files.len() > 1 || self.force_archive {
            let paths: Vec<PathBuf> = self
                .files
                .iter()
                .map(|file| file.path().to_path_buf())
                .collect();
            let dir = self.dir_name();
            match &self.archiver {
                Some(archiver) => archiver.archive(&paths, &dir).await?,
                None => {
                    ZipArchiver::new(self.file_base_name.clone())
                        .archive(&paths, &dir)
                        .await?
                }
            }
        } else {
            self.files[0].path().to_path_buf()
        };

        info!("Export artifact resolved: {}", path.display());
        self.result_path = Some(path.clone());
        Ok(Some(path))
    }

    /// Copy the final artifact to `destination`, creating parent
    /// directories as needed. The working directory is left in place.
    pub async fn copy_to(&mut self, destination: impl AsRef<Path>) -> Result<()> {
        let source = self
            .result_path()
            .await?
            .ok_or(ResourceError::NoOutputFiles)?;
        let destination = destination.as_ref();
        prepare_destination(destination).await?;
        tokio::fs::copy(&source, destination).await?;
        Ok(())
    }

    /// Move the final artifact to `destination` and clean up the working
    /// directory afterwards.
    pub async fn move_to(&mut self, destination: impl AsRef<Path>) -> Result<()> {
        let source = self
            .result_path()
            .await?
            .ok_or(ResourceError::NoOutputFiles)?;
        let destination = destination.as_ref();
        prepare_destination(destination).await?;
        tokio::fs::rename(&source, destination).await?;
        self.cleanup().await
    }

    /// Save the final artifact to `destination`, deleting the working state
    /// when `delete_temp` is set.
    pub async fn save_as(&mut self, destination: impl AsRef<Path>, delete_temp: bool) -> Result<()> {
        if delete_temp {
            self.move_to(destination).await
        } else {
            self.copy_to(destination).await
        }
    }

    /// Remove the working directory and forget all output files.
    ///
    /// Idempotent; absence of the directory is not an error.
    pub async fn cleanup(&mut self) -> Result<()> {
        self.files.clear();
        if let Some(dir) = &self.dir_name {
            match tokio::fs::remove_dir_all(dir).await {
                Ok(()) => debug!("Removed working directory: {}", dir.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

async fn prepare_destination(destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

impl Drop for ExportResult {
    fn drop(&mut self) {
        // Safety net only; explicit cleanup() is the contract.
        if let Some(dir) = &self.dir_name {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
