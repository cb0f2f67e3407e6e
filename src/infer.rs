use serde::{Deserialize, Serialize};

/// Semantic category of a column, inferred from its header label.
/// Drives the number format and alignment applied to the column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Currency,
    Percentage,
    Date,
    Number,
    Text,
}

impl SemanticType {
    /// Parse an explicit `dataTypes` hint from the wire payload.
    /// Unknown strings yield `None` so a bad hint falls back to inference.
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.to_lowercase().as_str() {
            "currency" => Some(SemanticType::Currency),
            "percentage" => Some(SemanticType::Percentage),
            "date" => Some(SemanticType::Date),
            "number" => Some(SemanticType::Number),
            "text" => Some(SemanticType::Text),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Currency => "currency",
            SemanticType::Percentage => "percentage",
            SemanticType::Date => "date",
            SemanticType::Number => "number",
            SemanticType::Text => "text",
        }
    }
}

/// Classify a column label into a [`SemanticType`].
///
/// The label is lower-cased and tested against keyword groups in a fixed
/// priority order; the first group that matches wins and unmatched labels
/// are `Text`. Total and deterministic.
pub fn classify(label: &str) -> SemanticType {
    let label = label.to_lowercase();

    if label.starts_with('$')
        || ["price", "cost", "revenue", "income", "expense"]
            .iter()
            .any(|kw| label.contains(kw))
    {
        SemanticType::Currency
    } else if label.contains('%') || label.contains("percent") || label.contains("rate") {
        SemanticType::Percentage
    } else if label.contains("date") || label.contains("time") {
        SemanticType::Date
    } else if label.contains("number") || label.contains("count") || label.contains("amount") {
        SemanticType::Number
    } else {
        SemanticType::Text
    }
}
