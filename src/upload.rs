/// Tabular data extracted from an uploaded delimited text file.
///
/// The first line becomes `headers`; every following non-empty line becomes
/// a row. Rows are not padded or truncated to the header width; the
/// assembler aligns them by position.
#[derive(Clone, Debug, PartialEq)]
pub struct TabularData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parse uploaded CSV text. Returns `None` when the text has no non-empty
/// lines.
pub fn parse_delimited(text: &str) -> Option<TabularData> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let headers = parse_csv_row(lines.next()?);
    let rows = lines.map(parse_csv_row).collect();
    Some(TabularData { headers, rows })
}

impl TabularData {
    /// Serialize back to CSV for embedding in the completion prompt.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        push_csv_row(&mut out, &self.headers);
        for row in &self.rows {
            push_csv_row(&mut out, row);
        }
        out
    }
}

fn push_csv_row(out: &mut String, fields: &[String]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}

fn parse_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                // A doubled quote inside a quoted field is a literal quote.
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(field.trim().to_string());
                field = String::new();
            }
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_headers_and_rows() {
        let data = parse_delimited("Name,Amount\nAlice,10\nBob,20\n").unwrap();
        assert_eq!(data.headers, vec!["Name", "Amount"]);
        assert_eq!(data.rows, vec![vec!["Alice", "10"], vec!["Bob", "20"]]);
    }

    #[test]
    fn handles_quoted_fields() {
        let data = parse_delimited("Item,Note\n\"a, b\",\"say \"\"hi\"\"\"\n").unwrap();
        assert_eq!(data.rows, vec![vec!["a, b", "say \"hi\""]]);
    }

    #[test]
    fn skips_blank_lines() {
        let data = parse_delimited("A,B\n\n1,2\n  \n").unwrap();
        assert_eq!(data.rows.len(), 1);
    }

    #[test]
    fn empty_input_yields_none() {
        assert_eq!(parse_delimited(""), None);
        assert_eq!(parse_delimited("\n \n"), None);
    }

    #[test]
    fn csv_round_trip_escapes() {
        let data = TabularData {
            headers: vec!["Item".into(), "Note".into()],
            rows: vec![vec!["a, b".into(), "say \"hi\"".into()]],
        };
        assert_eq!(parse_delimited(&data.to_csv()), Some(data));
    }
}
