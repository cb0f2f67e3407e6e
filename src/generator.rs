use crate::cell::CellAddress;
use crate::infer::{self, SemanticType};
use crate::parser::{FormulaAssignment, ParsedSpreadsheetSpec};
use lazy_static::lazy_static;
use regex::Regex;
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet, XlsxError};
use std::collections::BTreeMap;
use thiserror::Error;

lazy_static! {
    // Numeric literal grammar: optional sign, digits, optional decimal point.
    static ref NUMERIC_LITERAL: Regex = Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").unwrap();
}

/// Column width applied when no data rows were supplied.
const DEFAULT_COLUMN_WIDTH: f64 = 15.0;
/// Upper bound on a content-derived column width.
const MAX_COLUMN_WIDTH: f64 = 30.0;
/// Padding added to the longest value when sizing a column.
const WIDTH_PADDING: usize = 2;
/// Data rows below the header that receive column formatting when no rows
/// were supplied; with rows the formatted range covers at least all of them.
const FORMAT_ROW_SPAN: usize = 98;

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("formula targets an invalid cell address: {0}")]
    Address(String),
    #[error("worksheet serialization failed: {0}")]
    Xlsx(#[from] XlsxError),
}

/// Assemble a workbook from a parsed spec and serialize it to a buffer.
pub fn to_xlsx(spec: &ParsedSpreadsheetSpec) -> Result<Vec<u8>, AssembleError> {
    assemble(
        &spec.headers,
        &spec.formulas,
        spec.source_rows.as_deref(),
        &spec.data_types,
    )
}

/// Build a single-sheet xlsx binary from headers, formulas, and optional
/// data rows.
///
/// Steps run in a fixed order because later ones may overwrite earlier cell
/// contents: headers into row 1 with uniform bold/filled/centered styling,
/// data rows (numeric strings coerced to native numbers) with per-column
/// number formats and alignment from each header's [`SemanticType`],
/// formulas in sequence order (last write wins on an address collision),
/// column widths, and an autofilter across the header row. An explicit
/// `data_types` hint wins over header-derived inference for its column.
///
/// An empty header list still serializes; it is not an error here. A
/// formula whose address cannot be parsed aborts the whole assembly, so a
/// corrupt binary is never produced.
///
/// # Arguments
/// * `headers` - Column labels for row 1, in column order
/// * `formulas` - Formula cells to overlay, applied in sequence order
/// * `rows` - Optional data rows, column-aligned with `headers`
/// * `data_types` - Explicit type hints keyed by header name
///
/// # Returns
/// * `Result<Vec<u8>, AssembleError>` - The xlsx file content as bytes
pub fn assemble(
    headers: &[String],
    formulas: &[FormulaAssignment],
    rows: Option<&[Vec<String>]>,
    data_types: &BTreeMap<String, SemanticType>,
) -> Result<Vec<u8>, AssembleError> {
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF2F2F2))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);

    let columns: Vec<(SemanticType, Format)> = headers
        .iter()
        .map(|header| {
            let ty = data_types
                .get(header)
                .copied()
                .unwrap_or_else(|| infer::classify(header));
            (ty, column_format(ty))
        })
        .collect();

    for (c, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, c as u16, header, &header_format)?;
    }

    // Data region: supplied rows, plus blank rows up to the span so the
    // column formatting covers cells the user fills in later.
    let supplied = rows.map_or(0, |rs| rs.len());
    let span = supplied.max(FORMAT_ROW_SPAN);
    for r in 0..span {
        for (c, (_, format)) in columns.iter().enumerate() {
            let value = rows
                .and_then(|rs| rs.get(r))
                .and_then(|row| row.get(c));
            match value {
                Some(v) => match coerce_numeric(v) {
                    Some(n) => {
                        worksheet.write_number_with_format((r + 1) as u32, c as u16, n, format)?
                    }
                    None => worksheet.write_string_with_format(
                        (r + 1) as u32,
                        c as u16,
                        v,
                        format,
                    )?,
                },
                None => worksheet.write_blank((r + 1) as u32, c as u16, format)?,
            };
        }
    }

    for assignment in formulas {
        let addr: CellAddress = assignment
            .cell
            .parse()
            .map_err(|_| AssembleError::Address(assignment.cell.clone()))?;
        let (row, col) = addr.to_indices();
        // Inside the formatted data region the formula keeps its column's
        // format; outside it the cell is written sparsely, unformatted.
        let format = (row >= 1 && row as usize <= span)
            .then(|| columns.get(col as usize))
            .flatten();
        match format {
            Some((_, format)) => worksheet.write_formula_with_format(
                row,
                col,
                assignment.formula.as_str(),
                format,
            )?,
            None => worksheet.write_formula(row, col, assignment.formula.as_str())?,
        };
    }

    for (c, width) in column_widths(headers, rows).into_iter().enumerate() {
        worksheet.set_column_width(c as u16, width)?;
    }

    if !headers.is_empty() {
        worksheet.autofilter(0, 0, 0, (headers.len() - 1) as u16)?;
    }

    workbook.push_worksheet(worksheet);
    let buffer = workbook.save_to_buffer()?;
    Ok(buffer)
}

/// Decide whether a raw cell value is a numeric literal, and its value.
///
/// Uses an explicit grammar rather than `str::parse` alone so that inputs
/// like `"1e99"`, `"NaN"`, or `"0x1f"` stay strings even though Rust's
/// float parser would accept some of them.
pub fn coerce_numeric(value: &str) -> Option<f64> {
    if !NUMERIC_LITERAL.is_match(value) {
        return None;
    }
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Width for each column: a fixed default without data, otherwise the
/// longest stringified value (header included) plus padding, capped.
pub fn column_widths(headers: &[String], rows: Option<&[Vec<String>]>) -> Vec<f64> {
    let Some(rows) = rows else {
        return vec![DEFAULT_COLUMN_WIDTH; headers.len()];
    };
    headers
        .iter()
        .enumerate()
        .map(|(c, header)| {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(c))
                .map(|v| v.chars().count())
                .chain([header.chars().count()])
                .max()
                .unwrap_or(0);
            ((longest + WIDTH_PADDING) as f64).min(MAX_COLUMN_WIDTH)
        })
        .collect()
}

fn column_format(ty: SemanticType) -> Format {
    match ty {
        SemanticType::Currency => Format::new()
            .set_num_format("$#,##0.00")
            .set_align(FormatAlign::Right),
        SemanticType::Percentage => Format::new()
            .set_num_format("0.00%")
            .set_align(FormatAlign::Right),
        SemanticType::Date => Format::new()
            .set_num_format("mm/dd/yyyy")
            .set_align(FormatAlign::Center),
        SemanticType::Number => Format::new()
            .set_num_format("#,##0.00")
            .set_align(FormatAlign::Right),
        SemanticType::Text => Format::new().set_align(FormatAlign::Left),
    }
}
