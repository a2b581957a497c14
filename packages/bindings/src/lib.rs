//! Node.js entry points. Every function takes and returns JSON strings so
//! the JavaScript side works with the same field names as the CLI.

use napi::Result as NapiResult;
use napi_derive::napi;

use construction_loan_core::construction_loan::{self as loan, DrawScheduleRequest, LoanInputDraft};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse a possibly incomplete record; missing fields surface as validation
/// issues rather than parse errors.
fn parse_draft(input_json: &str) -> NapiResult<LoanInputDraft> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

/// Full feasibility run. Rejects invalid input with every problem listed in
/// the error message.
#[napi]
pub fn calculate_construction_loan(input_json: String) -> NapiResult<String> {
    let input = parse_draft(&input_json)?.into_input().map_err(to_napi_error)?;
    let output = loan::calculate_construction_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Validation report (`{ is_valid, errors }`); never fails on a
/// well-formed record.
#[napi]
pub fn validate_construction_loan(input_json: String) -> NapiResult<String> {
    let draft = parse_draft(&input_json)?;
    let report = loan::validate_draft(&draft);
    serde_json::to_string(&report).map_err(to_napi_error)
}

#[napi]
pub fn generate_draw_schedule(input_json: String) -> NapiResult<String> {
    let request: DrawScheduleRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan::generate_draw_schedule(&request).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
