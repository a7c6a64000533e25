//! Serial column: 1-based row numbering.

use serde_json::Value;

use super::{Column, RenderContext};

/// Stateless column rendering the 1-based row number.
///
/// The header defaults to `"#"`. The index is global across the export, so
/// numbering continues across batches and rotated files.
pub struct SerialColumn {
    /// Header cell content
    pub header: Option<String>,
    /// Footer cell content
    pub footer: Option<String>,
    /// Whether the column is exported
    pub visible: bool,
}

impl SerialColumn {
    pub fn new() -> Self {
        Self {
            header: Some("#".to_string()),
            footer: None,
            visible: true,
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }
}

impl Default for SerialColumn {
    fn default() -> Self {
        Self::new()
    }
}

impl Column for SerialColumn {
    fn visible(&self) -> bool {
        self.visible
    }

    fn render_header(&self, ctx: &RenderContext<'_>) -> String {
        match &self.header {
            Some(header) if !header.is_empty() => header.clone(),
            _ => ctx.empty_cell.to_string(),
        }
    }

    fn render_footer(&self, ctx: &RenderContext<'_>) -> String {
        match &self.footer {
            Some(footer) if !footer.is_empty() => footer.clone(),
            _ => ctx.empty_cell.to_string(),
        }
    }

    fn render_body(&self, _model: &Value, _key: &Value, index: usize, _ctx: &RenderContext<'_>) -> String {
        (index + 1).to_string()
    }
}
