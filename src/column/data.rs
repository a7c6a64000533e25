//! Data-bound column
//!
//! Renders cell values resolved from the row itself: either through an
//! explicit value source (callback or path) or through the column's bound
//! attribute. Non-null values pass through the grid's formatter; null
//! values render the configured null display text and never reach the
//! formatter.

use serde_json::Value;

use crate::format::humanize;

use super::{Column, ContentFn, RenderContext};

/// How a data column obtains its raw value from a row.
///
/// An explicit value source takes precedence over the column attribute.
pub enum ValueSource {
    /// Dotted/indexed path into the row
    Path(String),
    /// Callback receiving the row, its key and the global row index
    Compute(Box<dyn Fn(&Value, &Value, usize) -> Value + Send + Sync>),
}

/// A column bound to row data.
pub struct DataColumn {
    /// Header cell content; overrides any derived label
    pub header: Option<String>,
    /// Footer cell content
    pub footer: Option<String>,
    /// Optional body content callback, bypassing value resolution entirely
    pub content: Option<ContentFn>,
    /// Whether the column is exported
    pub visible: bool,
    /// Dotted/indexed path into the row used for value lookup and label
    /// derivation
    pub attribute: Option<String>,
    /// Explicit header label; derived from the attribute when absent
    pub label: Option<String>,
    /// Explicit value source, taking precedence over `attribute`
    pub value: Option<ValueSource>,
    /// Opaque format spec handed to the grid's formatter
    pub format: String,
}

impl std::fmt::Debug for DataColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataColumn")
            .field("header", &self.header)
            .field("footer", &self.footer)
            .field("visible", &self.visible)
            .field("attribute", &self.attribute)
            .field("label", &self.label)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl DataColumn {
    pub fn new() -> Self {
        Self {
            header: None,
            footer: None,
            content: None,
            visible: true,
            attribute: None,
            label: None,
            value: None,
            format: "raw".to_string(),
        }
    }

    /// Column bound to `attribute` with the default `"raw"` format
    pub fn from_attribute(attribute: impl Into<String>) -> Self {
        Self {
            attribute: Some(attribute.into()),
            ..Self::new()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn with_value_path(mut self, path: impl Into<String>) -> Self {
        self.value = Some(ValueSource::Path(path.into()));
        self
    }

    pub fn with_value_fn<F>(mut self, value: F) -> Self
    where
        F: Fn(&Value, &Value, usize) -> Value + Send + Sync + 'static,
    {
        self.value = Some(ValueSource::Compute(Box::new(value)));
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

    /// Resolve the raw cell value for a row.
    ///
    /// Priority: explicit value callback, explicit value path, attribute
    /// path, null.
    pub fn data_cell_value(&self, model: &Value, key: &Value, index: usize) -> Value {
        match &self.value {
            Some(ValueSource::Compute(value_fn)) => value_fn(model, key, index),
            Some(ValueSource::Path(path)) => {
                lookup_path(model, path).cloned().unwrap_or(Value::Null)
            }
            None => match &self.attribute {
                Some(attribute) => lookup_path(model, attribute)
                    .cloned()
                    .unwrap_or(Value::Null),
                None => Value::Null,
            },
        }
    }
}

impl Default for DataColumn {
    fn default() -> Self {
        Self::new()
    }
}

impl Column for DataColumn {
    fn visible(&self) -> bool {
        self.visible
    }

    fn render_header(&self, ctx: &RenderContext<'_>) -> String {
        if let Some(header) = &self.header {
            if !header.is_empty() {
                return header.clone();
            }
        }
        if let Some(label) = &self.label {
            return label.clone();
        }
        match &self.attribute {
            Some(attribute) => ctx
                .labels
                .and_then(|labels| labels.attribute_label(attribute))
                .unwrap_or_else(|| humanize(attribute)),
            None => ctx.empty_cell.to_string(),
        }
    }

    fn render_footer(&self, ctx: &RenderContext<'_>) -> String {
        match &self.footer {
            Some(footer) if !footer.is_empty() => footer.clone(),
            _ => ctx.empty_cell.to_string(),
        }
    }

    fn render_body(&self, model: &Value, key: &Value, index: usize, ctx: &RenderContext<'_>) -> String {
        if let Some(content) = &self.content {
            return content(model, key, index);
        }
        match self.data_cell_value(model, key, index) {
            Value::Null => ctx.null_display.to_string(),
            value => ctx.formatter.format(&value, &self.format),
        }
    }
}

/// Walk a dotted/indexed path (`"a.b.0.c"`) into a JSON tree.
fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{LabelSource, RawFormatter};
    use serde_json::json;

    fn ctx<'a>(formatter: &'a RawFormatter) -> RenderContext<'a> {
        RenderContext {
            empty_cell: "",
            null_display: "(null)",
            formatter,
            labels: None,
        }
    }

    #[test]
    fn test_lookup_path_nested() {
        let row = json!({"user": {"tags": ["a", "b"], "name": "x"}});
        assert_eq!(lookup_path(&row, "user.name"), Some(&json!("x")));
        assert_eq!(lookup_path(&row, "user.tags.1"), Some(&json!("b")));
        assert_eq!(lookup_path(&row, "user.missing"), None);
        assert_eq!(lookup_path(&row, "user.tags.7"), None);
        assert_eq!(lookup_path(&row, "user.name.deeper"), None);
    }

    #[test]
    fn test_body_uses_attribute() {
        let formatter = RawFormatter;
        let ctx = ctx(&formatter);
        let column = DataColumn::from_attribute("name");
        let row = json!({"name": "Alice"});
        assert_eq!(column.render_body(&row, &json!(0), 0, &ctx), "Alice");
    }

    #[test]
    fn test_null_renders_null_display_not_formatter() {
        struct PanickyFormatter;
        impl crate::format::ValueFormatter for PanickyFormatter {
            fn format(&self, _value: &Value, _spec: &str) -> String {
                panic!("formatter must not be consulted for null values");
            }
        }
        let formatter = PanickyFormatter;
        let ctx = RenderContext {
            empty_cell: "",
            null_display: "N/A",
            formatter: &formatter,
            labels: None,
        };
        let column = DataColumn::from_attribute("missing");
        assert_eq!(column.render_body(&json!({"a": 1}), &json!(0), 0, &ctx), "N/A");
        let column = DataColumn::from_attribute("field");
        assert_eq!(
            column.render_body(&json!({"field": null}), &json!(0), 0, &ctx),
            "N/A"
        );
    }

    #[test]
    fn test_value_fn_takes_precedence() {
        let formatter = RawFormatter;
        let ctx = ctx(&formatter);
        let column = DataColumn::from_attribute("name")
            .with_value_fn(|model, _key, _index| json!(model["name"].as_str().unwrap_or("").len()));
        assert_eq!(column.render_body(&json!({"name": "Alice"}), &json!(0), 0, &ctx), "5");
    }

    #[test]
    fn test_value_path_takes_precedence_over_attribute() {
        let formatter = RawFormatter;
        let ctx = ctx(&formatter);
        let column = DataColumn::from_attribute("name").with_value_path("nick");
        let row = json!({"name": "Alice", "nick": "Ali"});
        assert_eq!(column.render_body(&row, &json!(0), 0, &ctx), "Ali");
    }

    #[test]
    fn test_header_precedence() {
        let formatter = RawFormatter;
        let ctx = ctx(&formatter);

        let column = DataColumn::from_attribute("created_at");
        assert_eq!(column.render_header(&ctx), "Created At");

        let column = DataColumn::from_attribute("created_at").with_label("When");
        assert_eq!(column.render_header(&ctx), "When");

        let column = DataColumn::from_attribute("created_at")
            .with_label("When")
            .with_header("Header Wins");
        assert_eq!(column.render_header(&ctx), "Header Wins");
    }

    #[test]
    fn test_header_from_label_source() {
        struct Labels;
        impl LabelSource for Labels {
            fn attribute_label(&self, attribute: &str) -> Option<String> {
                (attribute == "uid").then(|| "User ID".to_string())
            }
        }
        let formatter = RawFormatter;
        let labels = Labels;
        let ctx = RenderContext {
            empty_cell: "",
            null_display: "",
            formatter: &formatter,
            labels: Some(&labels),
        };
        assert_eq!(DataColumn::from_attribute("uid").render_header(&ctx), "User ID");
        // Unknown attributes fall back to humanizing
        assert_eq!(DataColumn::from_attribute("full_name").render_header(&ctx), "Full Name");
    }

    #[test]
    fn test_content_bypasses_value_resolution() {
        let formatter = RawFormatter;
        let ctx = ctx(&formatter);
        let column = DataColumn::from_attribute("name")
            .with_content(|_model, key, index| format!("{key}/{index}"));
        assert_eq!(column.render_body(&json!({"name": "x"}), &json!(9), 4, &ctx), "9/4");
    }
}
