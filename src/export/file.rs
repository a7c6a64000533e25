//! CSV output file
//!
//! Owns one on-disk file handle. The handle is opened lazily on the first
//! write, parent directories are created on demand, and the handle is
//! released exactly once through [`CsvFile::close`]. A configured byte
//! order mark is emitted before anything else; the row delimiter prefixes
//! every row except the first.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::config::{BomConfig, CsvFileConfig};
use crate::error::Result;

use super::encoder::RowEncoder;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const WRITE_BUFFER_CAPACITY: usize = 8 * 1024 * 1024;

/// Byte-order-mark behavior of a [`CsvFile`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BomMode {
    /// No BOM
    #[default]
    Off,
    /// Standard UTF-8 BOM bytes `EF BB BF`
    Utf8,
    /// Caller-supplied literal bytes
    Literal(Vec<u8>),
}

impl BomMode {
    fn bytes(&self) -> Option<&[u8]> {
        match self {
            BomMode::Off => None,
            BomMode::Utf8 => Some(&UTF8_BOM),
            BomMode::Literal(bytes) => Some(bytes),
        }
    }
}

impl From<&BomConfig> for BomMode {
    fn from(config: &BomConfig) -> Self {
        match config {
            BomConfig::Enabled(false) => BomMode::Off,
            BomConfig::Enabled(true) => BomMode::Utf8,
            BomConfig::Literal(text) => BomMode::Literal(text.as_bytes().to_vec()),
        }
    }
}

/// One CSV output file with lazy, exclusively-owned file handle.
pub struct CsvFile {
    path: PathBuf,
    row_delimiter: String,
    encoder: RowEncoder,
    bom: BomMode,
    entries_count: usize,
    writer: Option<BufWriter<File>>,
}

impl CsvFile {
    /// Create a file description; no I/O happens until the first write.
    pub fn new(path: PathBuf, config: &CsvFileConfig) -> Self {
        Self {
            path,
            row_delimiter: config.row_delimiter.clone(),
            encoder: RowEncoder::new(config.cell_delimiter.clone(), config.enclosure.clone()),
            bom: BomMode::from(&config.bom),
            entries_count: 0,
            writer: None,
        }
    }

    /// Path of the on-disk file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of rows written so far (header and footer rows included).
    pub fn entries_count(&self) -> usize {
        self.entries_count
    }

    /// Open the file for writing, creating parent directories as needed.
    ///
    /// Idempotent: an already-open file is left alone.
    pub async fn open(&mut self) -> Result<()> {
        if self.writer.is_some() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let file = File::create(&self.path).await?;
        self.writer = Some(BufWriter::with_capacity(WRITE_BUFFER_CAPACITY, file));
        debug!("Opened CSV file: {}", self.path.display());
        Ok(())
    }

    /// Encode and append one row.
    ///
    /// The first row is preceded by the configured BOM bytes (if any);
    /// every later row is prefixed with the row delimiter.
    ///
    /// # Returns
    /// * `Result<usize>` - Number of row bytes written (BOM excluded)
    pub async fn write_row(&mut self, cells: &[String]) -> Result<usize> {
        self.open().await?;

        if self.entries_count == 0 {
            let bom = self.bom.bytes().map(<[u8]>::to_vec);
            if let Some(bom) = bom {
                self.write_content(&bom).await?;
            }
        }

        let mut content = String::new();
        if self.entries_count > 0 {
            content.push_str(&self.row_delimiter);
        }
        content.push_str(&self.encoder.encode(cells));

        let written = self.write_content(content.as_bytes()).await?;
        self.entries_count += 1;
        Ok(written)
    }

    async fn write_content(&mut self, content: &[u8]) -> Result<usize> {
        self.open().await?;
        // open() above guarantees the writer exists
        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(content).await?;
        }
        Ok(content.len())
    }

    /// Flush and release the file handle.
    ///
    /// Idempotent; safe to call on a file that never opened a handle.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().await?;
            debug!(
                "Closed CSV file: {} ({} rows)",
                self.path.display(),
                self.entries_count
            );
        }
        Ok(())
    }

    /// Close the file and remove it from storage.
    ///
    /// Idempotent; absence of the file is not an error.
    pub async fn delete(&mut self) -> Result<()> {
        self.close().await?;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for CsvFile {
    fn drop(&mut self) {
        // Flushing needs the async runtime; close() is the contract.
        if self.writer.is_some() {
            debug!(
                "CsvFile dropped without explicit close: {}",
                self.path.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn test_write_rows_and_delimiters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut file = CsvFile::new(path.clone(), &CsvFileConfig::default());

        for i in 0..3 {
            file.write_row(&row(&[&i.to_string(), "x"])).await.unwrap();
        }
        file.close().await.unwrap();

        assert_eq!(file.entries_count(), 3);
        let content = std::fs::read_to_string(&path).unwrap();
        // N rows yield exactly N-1 row delimiters, no trailing delimiter
        assert_eq!(content.matches("\r\n").count(), 2);
        assert_eq!(content, "\"0\",\"x\"\r\n\"1\",\"x\"\r\n\"2\",\"x\"");
    }

    #[tokio::test]
    async fn test_lazy_parent_directory_creation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("out.csv");
        let mut file = CsvFile::new(path.clone(), &CsvFileConfig::default());

        file.write_row(&row(&["v"])).await.unwrap();
        file.close().await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_utf8_bom_precedes_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.csv");
        let config = CsvFileConfig {
            bom: BomConfig::Enabled(true),
            ..CsvFileConfig::default()
        };
        let mut file = CsvFile::new(path.clone(), &config);

        file.write_row(&row(&["a"])).await.unwrap();
        file.write_row(&row(&["b"])).await.unwrap();
        file.close().await.unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        // BOM written once, before the first row only
        assert_eq!(&bytes[3..], b"\"a\"\r\n\"b\"");
    }

    #[tokio::test]
    async fn test_literal_bom_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.csv");
        let config = CsvFileConfig {
            bom: BomConfig::Literal("\u{FEFF}".to_string()),
            ..CsvFileConfig::default()
        };
        let mut file = CsvFile::new(path.clone(), &config);
        file.write_row(&row(&["a"])).await.unwrap();
        file.close().await.unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with("\u{FEFF}".as_bytes()));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut file = CsvFile::new(dir.path().join("out.csv"), &CsvFileConfig::default());

        // Safe on a file that never opened a handle
        file.close().await.unwrap();

        file.write_row(&row(&["a"])).await.unwrap();
        file.close().await.unwrap();
        file.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut file = CsvFile::new(path.clone(), &CsvFileConfig::default());

        file.write_row(&row(&["a"])).await.unwrap();
        file.delete().await.unwrap();
        assert!(!path.exists());
        file.delete().await.unwrap();
    }

    #[tokio::test]
    async fn test_write_returns_byte_count() {
        let dir = tempdir().unwrap();
        let mut file = CsvFile::new(dir.path().join("out.csv"), &CsvFileConfig::default());

        let first = file.write_row(&row(&["ab"])).await.unwrap();
        assert_eq!(first, "\"ab\"".len());
        let second = file.write_row(&row(&["c"])).await.unwrap();
        assert_eq!(second, "\r\n\"c\"".len());
        file.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_custom_delimiters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let config = CsvFileConfig {
            row_delimiter: "\n".to_string(),
            cell_delimiter: ";".to_string(),
            enclosure: String::new(),
            bom: BomConfig::Enabled(false),
        };
        let mut file = CsvFile::new(path.clone(), &config);
        file.write_row(&row(&["a", "b"])).await.unwrap();
        file.write_row(&row(&["c", "d"])).await.unwrap();
        file.close().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a;b\nc;d");
    }
}
