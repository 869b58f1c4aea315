use crate::config::toml_config::PipelineConfig;
use crate::core::{CollectionSink, CollectionSource};
use crate::utils::error::{AggError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub input_records: usize,
    pub output_records: usize,
    pub outputs: Vec<String>,
}

/// 讀取輸入 Collection、執行管線並寫出結果
pub struct PipelineEngine<S: CollectionSource, K: CollectionSink> {
    source: S,
    sink: K,
    config: PipelineConfig,
}

impl<S: CollectionSource, K: CollectionSink> PipelineEngine<S, K> {
    pub fn new(source: S, sink: K, config: PipelineConfig) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self) -> Result<RunSummary> {
        let input_name = self
            .config
            .input_name()
            .ok_or_else(|| AggError::ConfigValidationError {
                field: "pipeline.input".to_string(),
                message: "Required field is missing".to_string(),
            })?;

        let formats = self.config.output_formats()?;

        tracing::info!("🚀 Starting pipeline '{}'", self.config.pipeline.name);

        // Extract
        let input = self.source.load(input_name)?;
        let input_records = input.len();
        tracing::info!("📥 Loaded {} records from '{}'", input_records, input_name);

        // Transform
        let pipeline = self.config.pipeline();
        let output = pipeline.run(input, &self.source)?;
        tracing::info!(
            "🔄 Applied {} stages: {} -> {} records",
            pipeline.stages().len(),
            input_records,
            output.len()
        );

        // Load
        let mut outputs = Vec::new();
        for format in formats {
            let location = self
                .sink
                .write(self.config.output_name(), format, &output)?;
            tracing::info!("📁 Output saved to: {}", location);
            outputs.push(location);
        }

        Ok(RunSummary {
            input_records,
            output_records: output.len(),
            outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::model::collection_from_value;
    use serde_json::json;

    const CONFIG: &str = r#"
[pipeline]
name = "report"
input = "orders"

[source]
path = "unused"

[[stages]]
type = "lookup"
from = "customers"
local_field = "customerId"
foreign_field = "_id"
as = "customerInfo"

[output]
path = "unused"
formats = ["json", "jsonl"]
"#;

    fn source() -> InMemoryStore {
        InMemoryStore::new()
            .with_collection(
                "orders",
                collection_from_value(json!([
                    {"orderId": 1, "customerId": 101},
                    {"orderId": 2, "customerId": 102}
                ]))
                .unwrap(),
            )
            .with_collection(
                "customers",
                collection_from_value(json!([{"_id": 101, "name": "John Doe"}])).unwrap(),
            )
    }

    #[test]
    fn test_run_writes_every_format() {
        let config = PipelineConfig::from_toml_str(CONFIG).unwrap();
        let engine = PipelineEngine::new(source(), InMemoryStore::new(), config);

        let summary = engine.run().unwrap();
        assert_eq!(summary.input_records, 2);
        assert_eq!(summary.output_records, 2);
        assert_eq!(
            summary.outputs,
            vec!["memory://report.json", "memory://report.jsonl"]
        );

        let written = engine.sink.written("report.json").unwrap();
        assert_eq!(
            written[0].get("customerInfo"),
            Some(&json!([{"_id": 101, "name": "John Doe"}]))
        );
        assert_eq!(written[1].get("customerInfo"), Some(&json!([])));
    }

    #[test]
    fn test_missing_input_collection() {
        let config = PipelineConfig::from_toml_str(&CONFIG.replace(
            r#"input = "orders""#,
            r#"input = "invoices""#,
        ))
        .unwrap();
        let engine = PipelineEngine::new(source(), InMemoryStore::new(), config);

        assert!(matches!(
            engine.run(),
            Err(AggError::SourceNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_output_format_fails_before_writing() {
        let config = PipelineConfig::from_toml_str(&CONFIG.replace(
            r#"formats = ["json", "jsonl"]"#,
            r#"formats = ["json", "xml"]"#,
        ))
        .unwrap();
        let engine = PipelineEngine::new(source(), InMemoryStore::new(), config);

        match engine.run() {
            Err(AggError::InvalidConfigValueError { field, value, .. }) => {
                assert_eq!(field, "output.formats");
                assert_eq!(value, "xml");
            }
            other => panic!("expected invalid format error, got {:?}", other),
        }
        assert!(engine.sink.written("report.json").is_none());
    }
}
