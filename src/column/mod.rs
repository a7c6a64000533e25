//! Column definitions and resolution
//!
//! Columns turn raw rows into cell text. Each column variant implements the
//! [`Column`] trait with header, footer and body rendering; the export
//! pipeline resolves a list of [`ColumnSpec`] values into an ordered,
//! visible-only set of trait objects exactly once, on the first non-empty
//! batch.
//!
//! Columns can be declared three ways:
//! - a shorthand string `attribute[:format[:label]]`
//! - a fully configured [`DataColumn`], [`SerialColumn`] or [`GenericColumn`]
//! - any custom [`Column`] implementation
//!
//! With no declared columns at all, one data column per key of the first
//! row is derived automatically.

pub mod data;
pub mod serial;

pub use data::{DataColumn, ValueSource};
pub use serial::SerialColumn;

use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::format::{LabelSource, ValueFormatter};

/// Per-row callback producing final cell text, overriding default rendering.
///
/// Arguments are the row, its key, and the zero-based global row index.
pub type ContentFn = Box<dyn Fn(&Value, &Value, usize) -> String + Send + Sync>;

/// Grid-level settings borrowed by columns while rendering.
pub struct RenderContext<'a> {
    /// Placeholder for cells without content
    pub empty_cell: &'a str,
    /// Text rendered for null values
    pub null_display: &'a str,
    /// Formatter applied to non-null data cell values
    pub formatter: &'a dyn ValueFormatter,
    /// Optional source of attribute display labels
    pub labels: Option<&'a dyn LabelSource>,
}

/// A single export column.
///
/// Implementations render the header cell, the footer cell, and one body
/// cell per row. Rendering must be stateless with respect to rows: the
/// resolved column set is shared across every row of the export.
pub trait Column: Send {
    /// Whether this column takes part in the export. Defaults to `true`;
    /// invisible columns are dropped at resolution time.
    fn visible(&self) -> bool {
        true
    }

    /// Render the header cell content.
    fn render_header(&self, ctx: &RenderContext<'_>) -> String;

    /// Render the footer cell content.
    fn render_footer(&self, ctx: &RenderContext<'_>) -> String;

    /// Render the body cell content for one row.
    fn render_body(&self, model: &Value, key: &Value, index: usize, ctx: &RenderContext<'_>) -> String;
}

/// A plain column with static header/footer and an optional content callback.
pub struct GenericColumn {
    /// Header cell content
    pub header: Option<String>,
    /// Footer cell content
    pub footer: Option<String>,
    /// Optional body content callback
    pub content: Option<ContentFn>,
    /// Whether the column is exported
    pub visible: bool,
}

impl GenericColumn {
    pub fn new() -> Self {
        Self {
            header: None,
            footer: None,
            content: None,
            visible: true,
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn with_content<F>(mut self, content: F) -> Self
    where
        F: Fn(&Value, &Value, usize) -> String + Send + Sync + 'static,
    {
        self.content = Some(Box::new(content));
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

impl Default for GenericColumn {
    fn default() -> Self {
        Self::new()
    }
}

impl Column for GenericColumn {
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

    fn render_body(&self, model: &Value, key: &Value, index: usize, ctx: &RenderContext<'_>) -> String {
        match &self.content {
            Some(content) => content(model, key, index),
            None => ctx.empty_cell.to_string(),
        }
    }
}

/// Declarative column specification, resolved once per export.
pub enum ColumnSpec {
    /// Compact string form `attribute[:format[:label]]`
    Shorthand(String),
    /// A fully configured column
    Column(Box<dyn Column>),
}

impl ColumnSpec {
    /// Shorthand spec from a string
    pub fn shorthand(text: impl Into<String>) -> Self {
        ColumnSpec::Shorthand(text.into())
    }

    /// Spec from any column implementation
    pub fn custom(column: impl Column + 'static) -> Self {
        ColumnSpec::Column(Box::new(column))
    }
}

impl From<&str> for ColumnSpec {
    fn from(text: &str) -> Self {
        ColumnSpec::Shorthand(text.to_string())
    }
}

impl From<String> for ColumnSpec {
    fn from(text: String) -> Self {
        ColumnSpec::Shorthand(text)
    }
}

impl From<DataColumn> for ColumnSpec {
    fn from(column: DataColumn) -> Self {
        ColumnSpec::Column(Box::new(column))
    }
}

impl From<SerialColumn> for ColumnSpec {
    fn from(column: SerialColumn) -> Self {
        ColumnSpec::Column(Box::new(column))
    }
}

impl From<GenericColumn> for ColumnSpec {
    fn from(column: GenericColumn) -> Self {
        ColumnSpec::Column(Box::new(column))
    }
}

/// Parse a shorthand column spec of form `attribute[:format[:label]]`.
///
/// The attribute part is mandatory and colon-free; the format part must be
/// a word (an empty segment falls back to `"raw"`); the label part is the
/// remainder and may itself contain colons.
///
/// # Errors
/// * `ConfigError::InvalidColumnFormat` when the grammar is violated
pub fn parse_shorthand(text: &str) -> Result<DataColumn> {
    let mut parts = text.splitn(3, ':');
    let attribute = parts.next().unwrap_or("");
    let format = parts.next();
    let label = parts.next();

    if attribute.is_empty() {
        return Err(ConfigError::InvalidColumnFormat(text.to_string()).into());
    }
    if let Some(format) = format {
        if !format.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(ConfigError::InvalidColumnFormat(text.to_string()).into());
        }
    }

    let mut column = DataColumn::from_attribute(attribute);
    if let Some(format) = format.filter(|f| !f.is_empty()) {
        column.format = format.to_string();
    }
    column.label = label.map(str::to_string);
    Ok(column)
}

/// Resolve declared specs into the ordered, visible-only column set.
///
/// With an empty spec list, one data column per key of `sample_row` is
/// derived in iteration order (object keys, or indices for an array row).
/// Malformed shorthand strings fail here, before any file I/O.
pub fn resolve_columns(specs: Vec<ColumnSpec>, sample_row: &Value) -> Result<Vec<Box<dyn Column>>> {
    let specs = if specs.is_empty() {
        guess_columns(sample_row)
    } else {
        specs
    };

    let mut columns: Vec<Box<dyn Column>> = Vec::with_capacity(specs.len());
    for spec in specs {
        let column: Box<dyn Column> = match spec {
            ColumnSpec::Shorthand(text) => Box::new(parse_shorthand(&text)?),
            ColumnSpec::Column(column) => column,
        };
        if column.visible() {
            columns.push(column);
        }
    }
    debug!("Resolved {} visible columns", columns.len());
    Ok(columns)
}

/// Derive column specs from the shape of the first row.
fn guess_columns(sample_row: &Value) -> Vec<ColumnSpec> {
    match sample_row {
        Value::Object(map) => map
            .keys()
            .map(|key| ColumnSpec::Shorthand(key.clone()))
            .collect(),
        Value::Array(items) => (0..items.len())
            .map(|i| ColumnSpec::Shorthand(i.to_string()))
            .collect(),
        _ => {
            debug!("Cannot guess columns from a scalar row");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::format::RawFormatter;
    use serde_json::json;

    fn ctx<'a>(formatter: &'a RawFormatter) -> RenderContext<'a> {
        RenderContext {
            empty_cell: "",
            null_display: "",
            formatter,
            labels: None,
        }
    }

    #[test]
    fn test_parse_shorthand_full() {
        let column = parse_shorthand("price:currency:Unit Price").unwrap();
        assert_eq!(column.attribute.as_deref(), Some("price"));
        assert_eq!(column.format, "currency");
        assert_eq!(column.label.as_deref(), Some("Unit Price"));
    }

    #[test]
    fn test_parse_shorthand_attribute_only() {
        let column = parse_shorthand("name").unwrap();
        assert_eq!(column.attribute.as_deref(), Some("name"));
        assert_eq!(column.format, "raw");
        assert!(column.label.is_none());
    }

    #[test]
    fn test_parse_shorthand_empty_format_defaults_raw() {
        let column = parse_shorthand("name::Full Name").unwrap();
        assert_eq!(column.format, "raw");
        assert_eq!(column.label.as_deref(), Some("Full Name"));
    }

    #[test]
    fn test_parse_shorthand_label_keeps_colons() {
        let column = parse_shorthand("when:date:Time: Start").unwrap();
        assert_eq!(column.label.as_deref(), Some("Time: Start"));
    }

    #[test]
    fn test_parse_shorthand_rejects_empty_attribute() {
        let err = parse_shorthand(":raw").unwrap_err();
        assert!(matches!(
            err,
            ExportError::Config(ConfigError::InvalidColumnFormat(_))
        ));
    }

    #[test]
    fn test_parse_shorthand_rejects_bad_format() {
        let err = parse_shorthand("price:$$").unwrap_err();
        assert!(matches!(
            err,
            ExportError::Config(ConfigError::InvalidColumnFormat(_))
        ));
    }

    #[test]
    fn test_guess_columns_from_object() {
        let row = json!({"id": 1, "name": "x"});
        let columns = resolve_columns(Vec::new(), &row).unwrap();
        let formatter = RawFormatter;
        let ctx = ctx(&formatter);
        let headers: Vec<String> = columns.iter().map(|c| c.render_header(&ctx)).collect();
        assert_eq!(headers, vec!["Id", "Name"]);
    }

    #[test]
    fn test_guess_columns_from_array() {
        let row = json!(["a", "b"]);
        let columns = resolve_columns(Vec::new(), &row).unwrap();
        assert_eq!(columns.len(), 2);
        let formatter = RawFormatter;
        let ctx = ctx(&formatter);
        assert_eq!(columns[0].render_body(&row, &json!(0), 0, &ctx), "a");
    }

    #[test]
    fn test_invisible_columns_dropped() {
        let specs = vec![
            ColumnSpec::from(GenericColumn::new().with_header("a")),
            ColumnSpec::from(GenericColumn::new().with_header("b").with_visible(false)),
            ColumnSpec::from(GenericColumn::new().with_header("c")),
        ];
        let columns = resolve_columns(specs, &json!({})).unwrap();
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn test_generic_column_rendering() {
        let formatter = RawFormatter;
        let ctx = RenderContext {
            empty_cell: "-",
            null_display: "",
            formatter: &formatter,
            labels: None,
        };
        let column = GenericColumn::new()
            .with_header("Head")
            .with_content(|_model, _key, index| format!("row {index}"));
        assert_eq!(column.render_header(&ctx), "Head");
        assert_eq!(column.render_footer(&ctx), "-");
        assert_eq!(column.render_body(&json!({}), &json!(0), 3, &ctx), "row 3");
    }
}
