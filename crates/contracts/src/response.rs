//! HandlerResponse - what the handler returns to the invoking platform

use serde::{Deserialize, Serialize};

use crate::{ContractError, RunResult};

/// Fixed message of a completed run
pub const RESPONSE_MESSAGE: &str = "Processed image with multiple models";

/// Platform response envelope: `{"statusCode": 200, "body": "<json>"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    /// JSON text of [`ResponseBody`]
    pub body: String,
}

/// Aggregate summary carried in the response body
#[derive(Debug, Serialize)]
pub struct ResponseBody<'a> {
    pub message: &'a str,
    pub results: &'a RunResult,
}

impl HandlerResponse {
    /// Success envelope for a finished run, regardless of per-target failures
    pub fn from_run(result: &RunResult) -> Result<Self, ContractError> {
        let body = ResponseBody {
            message: RESPONSE_MESSAGE,
            results: result,
        };
        Ok(Self {
            status_code: 200,
            body: serde_json::to_string(&body)?,
        })
    }
}
