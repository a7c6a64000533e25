//! CSV row encoding
//!
//! Turns a sequence of cell strings into one delimiter-separated,
//! quote-escaped line. Row delimiters are a file-level concern (whether a
//! delimiter precedes a row depends on whether it is the first row written
//! to a file), so the encoder never appends one.

/// Encodes cell sequences into delimited, escaped text lines.
#[derive(Debug, Clone)]
pub struct RowEncoder {
    cell_delimiter: String,
    enclosure: String,
}

impl RowEncoder {
    pub fn new(cell_delimiter: impl Into<String>, enclosure: impl Into<String>) -> Self {
        Self {
            cell_delimiter: cell_delimiter.into(),
            enclosure: enclosure.into(),
        }
    }

    /// Encode one row.
    ///
    /// With a non-empty enclosure, every occurrence of the enclosure inside
    /// a cell is doubled and the cell is wrapped in the enclosure. An empty
    /// enclosure passes cells through unescaped; avoiding delimiter
    /// collisions is then the caller's responsibility.
    pub fn encode(&self, cells: &[String]) -> String {
        cells
            .iter()
            .map(|cell| self.encode_cell(cell))
            .collect::<Vec<_>>()
            .join(&self.cell_delimiter)
    }

    fn encode_cell(&self, cell: &str) -> String {
        if self.enclosure.is_empty() {
            return cell.to_string();
        }
        let doubled = self.enclosure.repeat(2);
        format!(
            "{}{}{}",
            self.enclosure,
            cell.replace(&self.enclosure, &doubled),
            self.enclosure
        )
    }
}

impl Default for RowEncoder {
    fn default() -> Self {
        Self::new(",", "\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal quote-aware reader used to verify the encoding round trip.
    fn decode(line: &str) -> Vec<String> {
        let mut cells = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = line.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '"' if in_quotes => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        current.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                '"' => in_quotes = true,
                ',' if !in_quotes => cells.push(std::mem::take(&mut current)),
                other => current.push(other),
            }
        }
        cells.push(current);
        cells
    }

    #[test]
    fn test_enclosure_doubling() {
        let encoder = RowEncoder::default();
        assert_eq!(encoder.encode(&["a\"b".to_string()]), "\"a\"\"b\"");
    }

    #[test]
    fn test_join_with_delimiter() {
        let encoder = RowEncoder::default();
        let row = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(encoder.encode(&row), "\"a\",\"b\",\"c\"");
    }

    #[test]
    fn test_empty_enclosure_passthrough() {
        let encoder = RowEncoder::new(";", "");
        let row = vec!["a\"b".to_string(), "c".to_string()];
        assert_eq!(encoder.encode(&row), "a\"b;c");
    }

    #[test]
    fn test_no_trailing_row_delimiter() {
        let encoder = RowEncoder::default();
        let encoded = encoder.encode(&["x".to_string()]);
        assert!(!encoded.ends_with('\n'));
        assert!(!encoded.ends_with("\r\n"));
    }

    #[test]
    fn test_round_trip() {
        let encoder = RowEncoder::default();
        let rows: Vec<Vec<String>> = vec![
            vec!["plain".into(), "with,comma".into(), "with\"quote".into()],
            vec!["a\"\"b".into(), "".into(), "line\nbreak".into()],
            vec!["".into()],
        ];
        for row in rows {
            assert_eq!(decode(&encoder.encode(&row)), row);
        }
    }
}
