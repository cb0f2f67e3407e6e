/*!
# Sheetforge

A web service that turns a natural-language description into a
downloadable spreadsheet, built in Rust.

## Overview

The browser UI posts a prompt (optionally with uploaded CSV data) to the
server, which forwards it to an OpenAI-style completion service. The
model replies with a free-text description and a JSON payload of
headers, formulas, and type hints, delimited by literal section markers.
That semi-structured response is parsed into a typed intermediate
representation and, on an explicit download request, assembled into a
formatted `.xlsx` workbook.

Data flows one direction: raw model text → parsed structure → formatted
binary. Each stage is a stateless transformation, so concurrent
generations need no coordination.

## Architecture

### Core pipeline
- Response Parser (`parser`) - splits the model response on section
  markers, decodes the JSON payload, and degrades gracefully when the
  payload is missing or malformed
- Type Inference (`infer`) - classifies a column label into a semantic
  type (currency, percentage, date, number, text) driving its format
- Document Assembler (`generator`) - builds the workbook: styled header
  row, coerced data rows, formula overlay, per-column number formats,
  content-sized columns, and a header-row autofilter
- Orchestrator (`pipeline`) - validates the prompt, calls the
  completion service, parses the reply, and defers assembly until a
  download is requested

### Collaborators
- Completion service (`client`) - OpenAI chat-completions API behind a
  `CompletionService` trait, constructed once at startup
- Upload handling (`upload`) - splits uploaded CSV text into headers
  and rows
- HTTP layer (`app`) - axum routes for generate, enhance, and download,
  plus the static UI

## Error handling

An unreachable or failing completion service is terminal for that
request. A malformed structure payload is not: the parser logs it and
substitutes an empty structure, so the generation still yields its
description. Assembly either fully succeeds or fails; a corrupt binary
is never produced.

## REST API Endpoints

- `POST /api/generate` - run a generation for a prompt
- `POST /api/enhance` - rewrite a terse prompt into a detailed one
- `GET /api/download` - the latest generation as an `.xlsx` file
*/

pub mod app;
pub mod cell;
pub mod client;
pub mod generator;
pub mod infer;
pub mod parser;
pub mod pipeline;
pub mod upload;

/// Re-export the core types to make the crate easier to use
pub use cell::CellAddress;
pub use generator::{AssembleError, assemble, to_xlsx};
pub use infer::{SemanticType, classify};
pub use parser::{FormulaAssignment, ParseOutcome, ParsedSpreadsheetSpec, parse};
pub use pipeline::{GenerateError, Generation};
pub use upload::TabularData;
