use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggError {
    #[error("Type mismatch on field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("Invalid field type for '{field}': expected {expected}, found {found}")]
    InvalidFieldType {
        field: String,
        expected: String,
        found: String,
    },

    #[error("Index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Invalid field path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Collection not found: {name}")]
    SourceNotFound { name: String },

    #[error("Stage {index} ({stage}) failed: {source}")]
    StageFailed {
        index: usize,
        stage: String,
        #[source]
        source: Box<AggError>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 輸入資料形狀不符
    Data,
    Configuration,
    Io,
}

impl AggError {
    pub fn type_mismatch(field: &str, expected: &str, found: &serde_json::Value) -> Self {
        AggError::TypeMismatch {
            field: field.to_string(),
            expected: expected.to_string(),
            found: type_name(Some(found)).to_string(),
        }
    }

    pub fn invalid_field_type(
        field: &str,
        expected: &str,
        found: Option<&serde_json::Value>,
    ) -> Self {
        AggError::InvalidFieldType {
            field: field.to_string(),
            expected: expected.to_string(),
            found: type_name(found).to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AggError::TypeMismatch { .. }
            | AggError::InvalidFieldType { .. }
            | AggError::IndexOutOfRange { .. } => ErrorCategory::Data,
            AggError::StageFailed { source, .. } => source.category(),
            AggError::InvalidPath { .. }
            | AggError::ConfigError { .. }
            | AggError::ConfigValidationError { .. }
            | AggError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            AggError::SourceNotFound { .. }
            | AggError::IoError(_)
            | AggError::SerializationError(_)
            | AggError::CsvError(_) => ErrorCategory::Io,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Data => format!("Input data does not have the expected shape: {}", self),
            ErrorCategory::Configuration => format!("Pipeline configuration problem: {}", self),
            ErrorCategory::Io => format!("Could not read or write a collection: {}", self),
        }
    }
}

/// 回傳 JSON 值的型別名稱，欄位不存在時為 "missing"
pub fn type_name(value: Option<&serde_json::Value>) -> &'static str {
    match value {
        None => "missing",
        Some(serde_json::Value::Null) => "null",
        Some(serde_json::Value::Bool(_)) => "boolean",
        Some(serde_json::Value::Number(_)) => "number",
        Some(serde_json::Value::String(_)) => "text",
        Some(serde_json::Value::Array(_)) => "sequence",
        Some(serde_json::Value::Object(_)) => "record",
    }
}

pub type Result<T> = std::result::Result<T, AggError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_name_reports_missing() {
        assert_eq!(type_name(None), "missing");
        assert_eq!(type_name(Some(&json!([1, 2]))), "sequence");
        assert_eq!(type_name(Some(&json!({"a": 1}))), "record");
    }

    #[test]
    fn test_stage_failure_keeps_inner_category() {
        let err = AggError::StageFailed {
            index: 2,
            stage: "unwind".to_string(),
            source: Box::new(AggError::IndexOutOfRange { index: 5, len: 3 }),
        };
        assert_eq!(err.category(), ErrorCategory::Data);
        assert!(err.to_string().contains("Stage 2 (unwind)"));
    }

    #[test]
    fn test_invalid_field_type_message() {
        let err = AggError::invalid_field_type("tags", "sequence", Some(&json!("x")));
        assert_eq!(
            err.to_string(),
            "Invalid field type for 'tags': expected sequence, found text"
        );
    }
}
