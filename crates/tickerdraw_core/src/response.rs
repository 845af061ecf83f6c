use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tickerdraw_error::{DrawError, Result};
use tickerdraw_http::jquants::listed::CompanyRecord;

/// Shape of the value returned from an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Only the drawn code. The API is not called.
    Code,
    /// One line describing the company, or a note that none was found.
    Summary,
    /// The company record as returned by the API. Missing records are an
    /// error.
    #[default]
    Record,
}

impl ResponseMode {
    /// Whether this mode needs company info from the API.
    pub fn requires_api(&self) -> bool {
        !matches!(self, ResponseMode::Code)
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code => write!(f, "code"),
            Self::Summary => write!(f, "summary"),
            Self::Record => write!(f, "record"),
        }
    }
}

impl FromStr for ResponseMode {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "code" => Ok(ResponseMode::Code),
            "summary" => Ok(ResponseMode::Summary),
            "record" => Ok(ResponseMode::Record),
            other => Err(DrawError::config(format!(
                "Unknown response mode '{other}', expected one of 'code', 'summary', 'record'"
            ))),
        }
    }
}

/// Value handed back to the runtime.
///
/// Serializes as a bare json string or the record object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InvocationOutput {
    Text(String),
    Record(CompanyRecord),
}

pub fn format_summary(record: &CompanyRecord) -> String {
    format!(
        "Code: {}, Name: {}, Market: {}, Sector: {}",
        record.code, record.company_name, record.market_code_name, record.sector33_code_name
    )
}

pub fn format_not_found(code: &str) -> String {
    format!("Code: {code}, but no company information found in J-Quants API")
}

/// Shape the final output for a mode.
///
/// `record` is the API lookup result and is ignored in `Code` mode.
pub fn build_output(
    mode: ResponseMode,
    code: String,
    record: Option<CompanyRecord>,
) -> Result<InvocationOutput> {
    match (mode, record) {
        (ResponseMode::Code, _) => Ok(InvocationOutput::Text(code)),
        (ResponseMode::Summary, Some(record)) => {
            Ok(InvocationOutput::Text(format_summary(&record)))
        }
        (ResponseMode::Summary, None) => Ok(InvocationOutput::Text(format_not_found(&code))),
        (ResponseMode::Record, Some(record)) => Ok(InvocationOutput::Record(record)),
        (ResponseMode::Record, None) => Err(DrawError::CompanyNotFound { code }),
    }
}
