use sheetforge::client::{CompletionError, CompletionService};
use sheetforge::infer::SemanticType;
use sheetforge::parser::{FormulaAssignment, ParsedSpreadsheetSpec};
use sheetforge::upload::TabularData;
use sheetforge::{generator, pipeline};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};

struct FakeCompletion {
    reply: String,
}

impl CompletionService for FakeCompletion {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
        Ok(self.reply.clone())
    }
}

// Pull one entry out of the generated xlsx archive as text.
fn read_entry(buffer: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(buffer.to_vec()))
        .expect("generated buffer should be a valid zip archive");
    let mut file = archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("archive entry {name} missing"));
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    content
}

fn spec_with(
    headers: &[&str],
    formulas: &[(&str, &str)],
    rows: Option<Vec<Vec<String>>>,
) -> ParsedSpreadsheetSpec {
    ParsedSpreadsheetSpec {
        description: "test sheet".to_string(),
        headers: headers.iter().map(|h| h.to_string()).collect(),
        formulas: formulas
            .iter()
            .map(|(cell, formula)| FormulaAssignment {
                cell: cell.to_string(),
                formula: formula.to_string(),
                description: None,
            })
            .collect(),
        data_types: BTreeMap::new(),
        modifications: Vec::new(),
        source_rows: rows,
    }
}

#[tokio::test]
async fn end_to_end_budget_tracker() {
    let reply = concat!(
        "---DESCRIPTION---\n",
        "A monthly budget tracker with variance per category.\n",
        "---STRUCTURE---\n",
        r#"{"headers": ["Category", "Budgeted", "Actual"],"#,
        r#" "formulas": [{"cell": "D1", "formula": "=SUM(B2:B99)"}]}"#,
    );
    let client = FakeCompletion {
        reply: reply.to_string(),
    };

    let generation = pipeline::generate(&client, "monthly budget tracker", None)
        .await
        .unwrap();
    assert_eq!(
        generation.spec.description,
        "A monthly budget tracker with variance per category."
    );

    let buffer = generator::to_xlsx(&generation.spec).unwrap();

    // All three headers land in the shared string table, in column order.
    let strings = read_entry(&buffer, "xl/sharedStrings.xml");
    let positions: Vec<usize> = ["Category", "Budgeted", "Actual"]
        .iter()
        .map(|h| strings.find(h).expect("header missing from workbook"))
        .collect();
    assert!(positions[0] < positions[1] && positions[1] < positions[2]);

    let sheet = read_entry(&buffer, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains(r#"<autoFilter ref="A1:C1"/>"#));
    assert!(sheet.contains(r#"r="D1""#));
    assert!(sheet.contains("<f>SUM(B2:B99)</f>"));

    // The header row style is bold.
    let styles = read_entry(&buffer, "xl/styles.xml");
    assert!(styles.contains("<b/>"));
}

#[tokio::test]
async fn downloads_reuse_the_parsed_generation() {
    // Assembly happens from the stored spec, so the fake can be dropped
    // before the binary is ever produced.
    let client = FakeCompletion {
        reply: "---DESCRIPTION---\nOnly text.\n---STRUCTURE---\n{\"headers\": [\"Task\"], \"formulas\": []}".to_string(),
    };
    let generation = pipeline::generate(&client, "todo list", None).await.unwrap();
    drop(client);

    let first = generator::to_xlsx(&generation.spec).unwrap();
    let second = generator::to_xlsx(&generation.spec).unwrap();
    assert!(read_entry(&first, "xl/sharedStrings.xml").contains("Task"));
    assert!(read_entry(&second, "xl/sharedStrings.xml").contains("Task"));
}

#[test]
fn formula_collision_last_write_wins() {
    let spec = spec_with(&["X", "Y"], &[("C1", "=A1"), ("C1", "=B1")], None);
    let buffer = generator::to_xlsx(&spec).unwrap();
    let sheet = read_entry(&buffer, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<f>B1</f>"));
    assert!(!sheet.contains("<f>A1</f>"));
}

#[test]
fn source_rows_are_written_with_numeric_coercion() {
    let rows = vec![
        vec!["Rent".to_string(), "1200.50".to_string()],
        vec!["Food".to_string(), "not a number".to_string()],
    ];
    let spec = spec_with(&["Category", "Cost"], &[], Some(rows));
    let buffer = generator::to_xlsx(&spec).unwrap();

    let sheet = read_entry(&buffer, "xl/worksheets/sheet1.xml");
    // "1200.50" became a native number, "not a number" stayed a string.
    assert!(sheet.contains("<v>1200.5</v>"));
    let strings = read_entry(&buffer, "xl/sharedStrings.xml");
    assert!(strings.contains("not a number"));

    // The "Cost" column carries the monetary number format.
    let styles = read_entry(&buffer, "xl/styles.xml");
    assert!(styles.contains("$#,##0.00"));
}

#[test]
fn explicit_type_hint_overrides_header_inference() {
    // "Notes" classifies as text, so without a hint no monetary format
    // reaches the style table.
    let plain = spec_with(&["Notes"], &[], None);
    let styles = read_entry(
        &generator::to_xlsx(&plain).unwrap(),
        "xl/styles.xml",
    );
    assert!(!styles.contains("$#,##0.00"));

    // A contradicting currency hint wins over the header keyword.
    let mut hinted = spec_with(&["Notes"], &[], None);
    hinted
        .data_types
        .insert("Notes".to_string(), SemanticType::Currency);
    let styles = read_entry(
        &generator::to_xlsx(&hinted).unwrap(),
        "xl/styles.xml",
    );
    assert!(styles.contains("$#,##0.00"));
}

#[tokio::test]
async fn generation_with_uploaded_data_assembles() {
    let data = TabularData {
        headers: vec!["Item".to_string(), "Amount".to_string()],
        rows: vec![vec!["Widget".to_string(), "3".to_string()]],
    };
    let reply = concat!(
        "---DESCRIPTION---\n",
        "Cleaned up your inventory.\n",
        "---STRUCTURE---\n",
        r#"{"headers": ["Item", "Amount"], "formulas": [],"#,
        r#" "dataTypes": {"Amount": "number"},"#,
        r#" "modifications": ["standardized the amount column"]}"#,
    );
    let client = FakeCompletion {
        reply: reply.to_string(),
    };

    let generation = pipeline::generate(&client, "tidy my sheet", Some(&data))
        .await
        .unwrap();
    let spec = generation.spec;
    assert_eq!(spec.modifications, vec!["standardized the amount column"]);
    assert_eq!(spec.source_rows.as_ref().unwrap().len(), 1);

    let buffer = generator::to_xlsx(&spec).unwrap();
    let strings = read_entry(&buffer, "xl/sharedStrings.xml");
    assert!(strings.contains("Widget"));
    let sheet = read_entry(&buffer, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<v>3</v>"));
}
