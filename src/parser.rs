use crate::infer::SemanticType;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Marker opening the free-text section of a model response.
pub const DESCRIPTION_MARKER: &str = "---DESCRIPTION---";
/// Marker separating the free-text section from the JSON payload.
pub const STRUCTURE_MARKER: &str = "---STRUCTURE---";

/// A formula targeted at one cell, written verbatim into the workbook.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormulaAssignment {
    pub cell: String,
    pub formula: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The structured half of a model response, decoded into usable form.
///
/// `headers` are order-significant (column index = position + 1) and may
/// contain duplicates. `data_types` holds the model's explicit hints keyed
/// by header name; absent entries fall back to header-derived inference.
/// `source_rows` carries uploaded tabular data, column-aligned with
/// `headers` by position; it never comes from the model response itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedSpreadsheetSpec {
    pub description: String,
    pub headers: Vec<String>,
    pub formulas: Vec<FormulaAssignment>,
    pub data_types: BTreeMap<String, SemanticType>,
    pub modifications: Vec<String>,
    pub source_rows: Option<Vec<Vec<String>>>,
}

/// Wire shape of the JSON segment. Tolerant reader: every field defaults
/// so a payload missing a key still decodes.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StructurePayload {
    #[serde(default)]
    headers: Vec<String>,
    #[serde(default)]
    formulas: Vec<FormulaAssignment>,
    #[serde(default, rename = "dataTypes", skip_serializing_if = "BTreeMap::is_empty")]
    data_types: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    modifications: Vec<String>,
}

/// How much of a raw model response could be decoded.
#[derive(Clone, Debug, PartialEq)]
pub enum ParseOutcome {
    /// Both sections were present and the JSON payload decoded.
    Complete(ParsedSpreadsheetSpec),
    /// The structure section was missing or unparsable; only the
    /// descriptive text survives.
    DescriptionOnly(String),
    /// The response was empty.
    Empty,
}

impl ParseOutcome {
    /// Collapse the outcome into a usable spec, substituting the empty
    /// structure where decoding fell short.
    pub fn into_spec(self) -> ParsedSpreadsheetSpec {
        match self {
            ParseOutcome::Complete(spec) => spec,
            ParseOutcome::DescriptionOnly(description) => ParsedSpreadsheetSpec {
                description,
                ..Default::default()
            },
            ParseOutcome::Empty => ParsedSpreadsheetSpec::default(),
        }
    }
}

/// Parse a raw completion-service response.
///
/// The response is split on [`STRUCTURE_MARKER`]; the text before it
/// (minus a leading [`DESCRIPTION_MARKER`]) becomes the description and
/// the remainder is decoded as one JSON object. A missing marker treats
/// the whole response as description; a malformed payload is logged and
/// replaced by the empty structure. This function never fails: every call
/// yields a usable spec, degraded gracefully when the model's output does
/// not conform.
///
/// `has_source_data` signals that the request carried uploaded rows, in
/// which case the payload's `modifications` list is meaningful and kept;
/// otherwise it is discarded.
///
/// # Arguments
/// * `raw` - The complete text returned by the completion service
/// * `has_source_data` - Whether the originating request included uploaded data
///
/// # Examples
/// ```
/// use sheetforge::parser::parse;
///
/// let spec = parse("---DESCRIPTION---\nHello\n---STRUCTURE---\n{not json", false);
/// assert_eq!(spec.description, "Hello");
/// assert!(spec.headers.is_empty());
/// ```
pub fn parse(raw: &str, has_source_data: bool) -> ParsedSpreadsheetSpec {
    let mut spec = split_response(raw).into_spec();
    if !has_source_data {
        spec.modifications.clear();
    }
    spec
}

/// Split a raw response into its [`ParseOutcome`] without collapsing it.
pub fn split_response(raw: &str) -> ParseOutcome {
    if raw.trim().is_empty() {
        return ParseOutcome::Empty;
    }

    let Some((description_segment, structure_segment)) = raw.split_once(STRUCTURE_MARKER) else {
        return ParseOutcome::DescriptionOnly(clean_description(raw));
    };
    let description = clean_description(description_segment);

    // One JSON object, possibly with nested braces and quoted strings, so a
    // real JSON parser rather than bracket matching.
    match serde_json::from_str::<StructurePayload>(structure_segment.trim()) {
        Ok(payload) => {
            let data_types = payload
                .data_types
                .into_iter()
                .filter_map(|(header, hint)| match SemanticType::from_hint(&hint) {
                    Some(ty) => Some((header, ty)),
                    None => {
                        warn!("ignoring unknown data type hint {:?} for column {:?}", hint, header);
                        None
                    }
                })
                .collect();
            ParseOutcome::Complete(ParsedSpreadsheetSpec {
                description,
                headers: payload.headers,
                formulas: payload.formulas,
                data_types,
                modifications: payload.modifications,
                source_rows: None,
            })
        }
        Err(e) => {
            warn!("discarding malformed structure payload: {}", e);
            ParseOutcome::DescriptionOnly(description)
        }
    }
}

impl ParsedSpreadsheetSpec {
    /// Serialize back to the marker-delimited wire format consumed by
    /// [`parse`]. `source_rows` is not part of the wire contract.
    pub fn to_wire(&self) -> String {
        let payload = StructurePayload {
            headers: self.headers.clone(),
            formulas: self.formulas.clone(),
            data_types: self
                .data_types
                .iter()
                .map(|(header, ty)| (header.clone(), ty.as_str().to_string()))
                .collect(),
            modifications: self.modifications.clone(),
        };
        // StructurePayload has no non-serializable values, so this cannot fail.
        let json = serde_json::to_string_pretty(&payload).unwrap_or_default();
        format!(
            "{DESCRIPTION_MARKER}\n{}\n{STRUCTURE_MARKER}\n{json}",
            self.description
        )
    }
}

fn clean_description(segment: &str) -> String {
    let trimmed = segment.trim();
    let trimmed = trimmed.strip_prefix(DESCRIPTION_MARKER).unwrap_or(trimmed);
    trimmed.trim().to_string()
}
