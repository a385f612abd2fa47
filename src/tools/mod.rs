//! NutriLens Tools module
//!
//! Use-case functions shared by the MCP server and the HTTP proxy.

pub mod history;
pub mod orders;
pub mod profile;
pub mod reports;
pub mod status;

use thiserror::Error;

/// Failure of a tool call, classified so each transport can pick a status
#[derive(Debug, Error, PartialEq)]
pub enum ToolError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Failed(String),
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Parse an optional `YYYY-MM-DD` argument
pub(crate) fn parse_date_arg(name: &str, value: Option<&str>) -> ToolResult<Option<chrono::NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(text) => chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                ToolError::InvalidInput(format!("Invalid {}: expected YYYY-MM-DD, got {:?}", name, text))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_arg() {
        assert_eq!(parse_date_arg("start", None), Ok(None));
        assert_eq!(parse_date_arg("start", Some("  ")), Ok(None));
        assert_eq!(
            parse_date_arg("start", Some("2025-03-10")),
            Ok(chrono::NaiveDate::from_ymd_opt(2025, 3, 10))
        );
        assert!(matches!(
            parse_date_arg("start", Some("03/10/2025")),
            Err(ToolError::InvalidInput(_))
        ));
    }
}
