use crate::core::pipeline::{Pipeline, Stage};
use crate::domain::ports::OutputFormat;
use crate::utils::error::{AggError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_one_of, validate_path, validate_required_field, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub pipeline: PipelineInfo,
    pub source: SourceConfig,
    #[serde(default)]
    pub stages: Vec<Stage>,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    /// 輸入的 Collection 名稱，可由命令列覆寫
    pub input: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
    pub filename: Option<String>,
}

fn default_formats() -> Vec<String> {
    vec!["json".to_string()]
}

impl PipelineConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AggError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AggError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AggError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.stages.clone())
    }

    pub fn input_name(&self) -> Option<&str> {
        self.pipeline.input.as_deref()
    }

    /// 輸出檔名，未指定時使用 pipeline 名稱
    pub fn output_name(&self) -> &str {
        self.output
            .filename
            .as_deref()
            .unwrap_or(&self.pipeline.name)
    }

    /// 不認得的格式名稱回傳 InvalidConfigValueError，不會被略過
    pub fn output_formats(&self) -> Result<Vec<OutputFormat>> {
        self.output
            .formats
            .iter()
            .map(|name| {
                OutputFormat::parse(name).ok_or_else(|| AggError::InvalidConfigValueError {
                    field: "output.formats".to_string(),
                    value: name.clone(),
                    reason: format!(
                        "Unsupported value. Allowed values: {}",
                        OutputFormat::NAMES.join(", ")
                    ),
                })
            })
            .collect()
    }
}

impl Validate for PipelineConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        let input = validate_required_field("pipeline.input", &self.pipeline.input)?;
        validate_non_empty_string("pipeline.input", input)?;

        validate_path("source.path", &self.source.path)?;
        validate_path("output.path", &self.output.path)?;

        if self.output.formats.is_empty() {
            return Err(AggError::ConfigValidationError {
                field: "output.formats".to_string(),
                message: "at least one output format is required".to_string(),
            });
        }
        validate_one_of("output.formats", &self.output.formats, &OutputFormat::NAMES)?;

        if let Some(filename) = &self.output.filename {
            validate_non_empty_string("output.filename", filename)?;
        }

        self.pipeline().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expr::Expr;
    use crate::core::path::FieldPath;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[pipeline]
name = "orders-report"
description = "Join orders with customers"
input = "orders"

[source]
path = "./data"

[[stages]]
type = "lookup"
from = "customers"
local_field = "customerId"
foreign_field = "_id"
as = "customerInfo"

[[stages]]
type = "unwind"
field = "tags"
preserve_empty = true
include_array_index = "tagIndex"

[[stages]]
type = "add_fields"
field = "total"
expr = { sum = "scores" }

[[stages]]
type = "map"
source = "prices"
output = "withTax"
expr = { multiply = ["current", { literal = 1.1 }] }

[[stages]]
type = "merge_objects"
fields = ["defaults", "overrides"]
into = "settings"

[output]
path = "./output"
formats = ["json", "csv"]
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = PipelineConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.pipeline.name, "orders-report");
        assert_eq!(config.input_name(), Some("orders"));
        assert_eq!(config.stages.len(), 5);
        assert_eq!(
            config.stages[0],
            Stage::Lookup {
                from: "customers".to_string(),
                local_field: "customerId".to_string(),
                foreign_field: "_id".to_string(),
                output_field: "customerInfo".to_string(),
            }
        );
        assert_eq!(
            config.stages[2],
            Stage::AddFields {
                field: "total".to_string(),
                expr: Expr::Sum(FieldPath::parse("scores").unwrap()),
            }
        );
        assert_eq!(
            config.output_formats().unwrap(),
            vec![OutputFormat::Json, OutputFormat::Csv]
        );
        assert_eq!(config.output_name(), "orders-report");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SMALL_AGG_TEST_DATA_DIR", "/srv/data");

        let toml_content = r#"
[pipeline]
name = "env"
input = "orders"

[source]
path = "${SMALL_AGG_TEST_DATA_DIR}"

[output]
path = "${SMALL_AGG_TEST_UNSET_DIR}"
"#;

        let config = PipelineConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.source.path, "/srv/data");
        assert_eq!(config.output.path, "${SMALL_AGG_TEST_UNSET_DIR}");
        assert_eq!(config.output.formats, vec!["json".to_string()]);

        std::env::remove_var("SMALL_AGG_TEST_DATA_DIR");
    }

    #[test]
    fn test_config_validation() {
        let unknown_format = BASIC.replace(r#"formats = ["json", "csv"]"#, r#"formats = ["xml"]"#);
        let config = PipelineConfig::from_toml_str(&unknown_format).unwrap();
        assert!(config.validate().is_err());

        let no_input = BASIC.replace(r#"input = "orders""#, "");
        let config = PipelineConfig::from_toml_str(&no_input).unwrap();
        assert!(config.validate().is_err());

        let bad_field = BASIC.replace(r#"field = "total""#, r#"field = "$total""#);
        let config = PipelineConfig::from_toml_str(&bad_field).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_path_fails_to_parse() {
        let bad_path = BASIC.replace(r#"{ sum = "scores" }"#, r#"{ sum = "scores[" }"#);
        assert!(PipelineConfig::from_toml_str(&bad_path).is_err());
    }

    #[test]
    fn test_unknown_stage_type() {
        let unknown = BASIC.replace(r#"type = "unwind""#, r#"type = "group""#);
        assert!(matches!(
            PipelineConfig::from_toml_str(&unknown),
            Err(AggError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = PipelineConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.pipeline.name, "orders-report");
    }
}
