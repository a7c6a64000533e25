//! Value formatting and label derivation contracts
//!
//! Value formatting is an external collaborator of the export pipeline: the
//! pipeline hands a raw value and an opaque format spec (e.g. `"raw"`,
//! `"date"`, `"currency"`) to a [`ValueFormatter`] and writes whatever text
//! comes back. The built-in [`RawFormatter`] renders scalars plainly and is
//! used when the caller supplies nothing else.
//!
//! Header derivation for data-bound columns optionally consults a
//! [`LabelSource`]; without one, attribute names are humanized.

use serde_json::Value;

/// Formats a raw cell value according to an opaque format spec.
///
/// Format specs are not interpreted by the pipeline; a formatter may support
/// any vocabulary it wants and should fall back to a plain rendering for
/// unknown specs.
pub trait ValueFormatter: Send + Sync {
    /// Render `value` as cell text according to `spec`.
    fn format(&self, value: &Value, spec: &str) -> String;
}

/// Default formatter: plain text rendering, format specs are ignored.
///
/// Strings are rendered verbatim, numbers and booleans via their natural
/// display form, null as the empty string, and arrays/objects as compact
/// JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawFormatter;

impl ValueFormatter for RawFormatter {
    fn format(&self, value: &Value, _spec: &str) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        }
    }
}

/// Supplies display labels for model attributes.
///
/// Used to derive header cells for data-bound columns without an explicit
/// label. Returning `None` falls back to [`humanize`].
pub trait LabelSource: Send + Sync {
    /// Display label for `attribute`, if the source knows one.
    fn attribute_label(&self, attribute: &str) -> Option<String>;
}

/// Turn an attribute name into a human-readable header.
///
/// Splits on `_`, `-`, `.` and lower-to-upper camel boundaries, then
/// capitalizes each word: `"createdAt"` becomes `"Created At"` and
/// `"first_name"` becomes `"First Name"`.
pub fn humanize(attribute: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in attribute.chars() {
        if ch == '_' || ch == '-' || ch == '.' || ch == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
        } else if ch.is_uppercase() && prev_lower {
            words.push(std::mem::take(&mut current));
            current.push(ch);
            prev_lower = false;
        } else {
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
            current.push(ch);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
