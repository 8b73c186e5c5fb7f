//! Task message schema.
//!
//! Requests and responses exchanged between the dispatcher and its
//! workers. The `api` selector is a closed, internally tagged enum: the
//! worker dispatches with an exhaustive match, so adding an api without
//! handling it everywhere fails at compile time. Field names follow
//! the host protocol (camelCase on the wire).

use serde::{Deserialize, Serialize};

use crate::errors::TaskError;
use crate::models::enums::{QueryType, ServiceLanguage};
use crate::models::structs::{
    CompletionData, ParserError, StatementSpan, SymbolInfo, Token,
};

fn default_version() -> u32 {
    80031
}

/// One request routed to a worker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskRequest {
    #[serde(rename = "taskId")]
    pub task_id: u64,
    pub data: TaskData,
}

impl TaskRequest {
    /// Parse an external message. Unknown api selectors and missing
    /// required fields surface as protocol errors that fail only the
    /// one task.
    pub fn from_json(raw: &str) -> Result<TaskRequest, TaskError> {
        serde_json::from_str(raw).map_err(|e| TaskError::Protocol(e.to_string()))
    }
}

/// The api selector plus exactly the fields that api needs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "api")]
pub enum TaskData {
    #[serde(rename = "queryType")]
    QueryType {
        language: ServiceLanguage,
        #[serde(default = "default_version")]
        version: u32,
        sql: String,
    },

    #[serde(rename = "split")]
    Split {
        language: ServiceLanguage,
        sql: String,
        #[serde(default = "default_delimiter")]
        delimiter: String,
    },

    #[serde(rename = "validate")]
    Validate {
        language: ServiceLanguage,
        #[serde(default = "default_version")]
        version: u32,
        #[serde(rename = "sqlMode", default)]
        sql_mode: String,
        sql: String,
        #[serde(default)]
        offset: usize,
    },

    #[serde(rename = "info")]
    Info {
        language: ServiceLanguage,
        #[serde(default = "default_version")]
        version: u32,
        sql: String,
        offset: usize,
    },

    #[serde(rename = "suggestion")]
    Suggestion {
        language: ServiceLanguage,
        #[serde(default = "default_version")]
        version: u32,
        sql: String,
        offset: usize,
        #[serde(default)]
        line: u32,
        #[serde(default)]
        column: u32,
        #[serde(rename = "currentSchema", default)]
        current_schema: String,
    },

    #[serde(rename = "preprocessStatement")]
    PreprocessStatement {
        language: ServiceLanguage,
        #[serde(default = "default_version")]
        version: u32,
        #[serde(rename = "sqlMode", default)]
        sql_mode: String,
        sql: String,
        #[serde(default)]
        offset: u64,
        #[serde(default = "default_row_count")]
        count: u64,
        #[serde(rename = "forceSecondaryEngine", default)]
        force_secondary_engine: bool,
    },

    #[serde(rename = "addSemicolon")]
    AddSemicolon {
        language: ServiceLanguage,
        #[serde(default = "default_version")]
        version: u32,
        #[serde(rename = "sqlMode", default)]
        sql_mode: String,
        sql: String,
    },

    #[serde(rename = "parameters")]
    Parameters {
        language: ServiceLanguage,
        #[serde(default = "default_version")]
        version: u32,
        #[serde(rename = "sqlMode", default)]
        sql_mode: String,
        sql: String,
    },

    #[serde(rename = "tokenize")]
    Tokenize {
        language: ServiceLanguage,
        #[serde(default = "default_version")]
        version: u32,
        #[serde(rename = "sqlMode", default)]
        sql_mode: String,
        #[serde(default)]
        sql: Option<String>,
        #[serde(default)]
        statements: Vec<String>,
    },

    /// Control message: drop per-session caches. Produces no response.
    #[serde(rename = "cleanup")]
    Cleanup { language: ServiceLanguage },
}

impl TaskData {
    pub fn language(&self) -> ServiceLanguage {
        match self {
            TaskData::QueryType { language, .. }
            | TaskData::Split { language, .. }
            | TaskData::Validate { language, .. }
            | TaskData::Info { language, .. }
            | TaskData::Suggestion { language, .. }
            | TaskData::PreprocessStatement { language, .. }
            | TaskData::AddSemicolon { language, .. }
            | TaskData::Parameters { language, .. }
            | TaskData::Tokenize { language, .. }
            | TaskData::Cleanup { language } => *language,
        }
    }

    /// Control messages expect no response routed back.
    pub fn expects_response(&self) -> bool {
        !matches!(self, TaskData::Cleanup { .. })
    }
}

fn default_delimiter() -> String {
    crate::splitter::DEFAULT_DELIMITER.to_string()
}

fn default_row_count() -> u64 {
    1000
}

/// One response routed back from a worker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    #[serde(rename = "taskId")]
    pub task_id: u64,
    pub data: TaskResult,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskResult {
    #[serde(flatten)]
    pub payload: ResultPayload,
    /// Marks the last message for a task. The protocol allows non-final
    /// progress messages before it; the current operations send exactly
    /// one final message.
    #[serde(rename = "final")]
    pub final_: bool,
}

impl TaskResult {
    pub fn final_result(payload: ResultPayload) -> Self {
        Self { payload, final_: true }
    }
}

/// Api-specific result fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ResultPayload {
    #[serde(rename = "queryType")]
    QueryType(QueryType),
    #[serde(rename = "ranges")]
    Ranges(Vec<StatementSpan>),
    /// Diagnostics from validation.
    #[serde(rename = "content")]
    Diagnostics(Vec<ParserError>),
    #[serde(rename = "info")]
    Info(Option<SymbolInfo>),
    #[serde(rename = "completions")]
    Completions(CompletionData),
    /// preprocessStatement / addSemicolon: rewritten text plus whether
    /// anything changed.
    #[serde(rename = "query")]
    Rewritten { query: String, changed: bool },
    #[serde(rename = "parameters")]
    Parameters(Vec<(String, String)>),
    #[serde(rename = "tokens")]
    Tokens(Vec<Token>),
    /// Task-level failure (protocol error, panicking operation).
    #[serde(rename = "error")]
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_selector_round_trips() {
        let request = TaskRequest {
            task_id: 7,
            data: TaskData::Split {
                language: ServiceLanguage::MySql,
                sql: "SELECT 1;".into(),
                delimiter: ";".into(),
            },
        };
        let json = serde_json::to_string(&request).expect("serializes");
        assert!(json.contains("\"api\":\"split\""));
        assert!(json.contains("\"taskId\":7"));

        let parsed = TaskRequest::from_json(&json).expect("parses");
        assert!(matches!(parsed.data, TaskData::Split { .. }));
    }

    #[test]
    fn unknown_api_is_a_protocol_error() {
        let raw = r#"{"taskId": 1, "data": {"api": "mystery", "language": "mysql"}}"#;
        assert!(matches!(TaskRequest::from_json(raw), Err(TaskError::Protocol(_))));
    }

    #[test]
    fn missing_field_is_a_protocol_error() {
        let raw = r#"{"taskId": 1, "data": {"api": "split", "language": "mysql"}}"#;
        assert!(matches!(TaskRequest::from_json(raw), Err(TaskError::Protocol(_))));
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let raw = r#"{"taskId": 2, "data": {"api": "validate", "language": "sqlite", "sql": "SELECT 1"}}"#;
        let parsed = TaskRequest::from_json(raw).expect("parses");
        match parsed.data {
            TaskData::Validate { version, offset, sql_mode, .. } => {
                assert_eq!(version, 80031);
                assert_eq!(offset, 0);
                assert!(sql_mode.is_empty());
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn final_flag_serializes_under_its_wire_name() {
        let response = TaskResponse {
            task_id: 3,
            data: TaskResult::final_result(ResultPayload::QueryType(QueryType::Insert)),
        };
        let json = serde_json::to_string(&response).expect("serializes");
        assert!(json.contains("\"final\":true"));
    }
}
