use crate::client::{CompletionError, CompletionService};
use crate::parser::{self, ParsedSpreadsheetSpec};
use crate::upload::TabularData;
use log::info;
use thiserror::Error;

/// Fixed instruction sent with every generation request. The marker-based
/// reply format is the wire contract [`crate::parser::parse`] consumes.
const GENERATE_SYSTEM_PROMPT: &str = r#"You are an assistant that designs practical spreadsheet structures.

Reply in exactly two sections.

---DESCRIPTION---
A short, human-readable summary of the spreadsheet: its purpose, the
columns you chose, and how to use the formulas.

---STRUCTURE---
A single JSON object with no surrounding prose and no code fences:
{
  "headers": ["Column1", "Column2"],
  "formulas": [{"cell": "C1", "formula": "=A1+B1", "description": "optional"}],
  "dataTypes": {"Column1": "number"}
}

Use A1-style cell references. Every dataTypes value must be one of
"currency", "percentage", "date", "number" or "text". Keep the design
immediately usable: sensible headers, exact formulas."#;

/// Appended to the system instruction when the request carries uploaded data.
const SOURCE_DATA_PROMPT: &str = r#"

The user message includes their uploaded data as CSV. Align your headers
with the uploaded columns, carry their meaning through, and add a
"modifications" array of strings to the JSON object describing each
change you made to the uploaded structure."#;

/// Instruction for the independent prompt-enhancement call. Its output is
/// new input text for the user, never fed back into the pipeline.
const ENHANCE_SYSTEM_PROMPT: &str = r#"You enhance spreadsheet generation prompts. Make the prompt more
specific, detailed, and actionable: name the columns and how the data is
organized, include calculations or formulas that might be needed, and
specify formatting preferences where applicable. Maintain the original
intent. Reply with the enhanced prompt only, concise but comprehensive,
without adding unnecessary complexity."#;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// One finished generation: the parsed spec, kept so repeated downloads
/// assemble from it instead of re-invoking the completion service.
#[derive(Clone, Debug)]
pub struct Generation {
    pub spec: ParsedSpreadsheetSpec,
}

/// Run one generation: validate the prompt, call the completion service,
/// and parse its response.
///
/// An upstream failure is terminal for the request and surfaces as
/// [`GenerateError::Completion`]; no partial structure is fabricated. A
/// malformed structure payload is not an error: the parser recovers with
/// an empty structure and the generation still succeeds. Uploaded data is
/// serialized into the user message and its rows are carried into the
/// resulting spec for assembly.
pub async fn generate<C: CompletionService>(
    client: &C,
    prompt: &str,
    source: Option<&TabularData>,
) -> Result<Generation, GenerateError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(GenerateError::EmptyPrompt);
    }

    let mut system = GENERATE_SYSTEM_PROMPT.to_string();
    let user = match source {
        Some(data) => {
            system.push_str(SOURCE_DATA_PROMPT);
            format!("{prompt}\n\nUploaded data (CSV):\n{}", data.to_csv())
        }
        None => prompt.to_string(),
    };

    let raw = client.complete(&system, &user).await?;
    let mut spec = parser::parse(&raw, source.is_some());
    if let Some(data) = source {
        spec.source_rows = Some(data.rows.clone());
    }
    info!(
        "generated spreadsheet: {} headers, {} formulas",
        spec.headers.len(),
        spec.formulas.len()
    );
    Ok(Generation { spec })
}

/// Rewrite a terse prompt into a detailed one with an independent
/// completion call.
pub async fn enhance<C: CompletionService>(
    client: &C,
    prompt: &str,
) -> Result<String, GenerateError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(GenerateError::EmptyPrompt);
    }
    Ok(client.complete(ENHANCE_SYSTEM_PROMPT, prompt).await?)
}
