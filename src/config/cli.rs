use crate::config::toml_config::PipelineConfig;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "small-agg")]
#[command(about = "Run document transformation pipelines described in TOML")]
pub struct CliConfig {
    /// Path to TOML pipeline configuration
    #[arg(short, long, default_value = "pipeline.toml")]
    pub config: String,

    /// Override the input collection name
    #[arg(long)]
    pub input: Option<String>,

    /// Override the output directory
    #[arg(long)]
    pub output: Option<String>,

    /// Override output formats (comma separated: json,jsonl,csv)
    #[arg(long, value_delimiter = ',')]
    pub formats: Vec<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Dry run - show the stages without reading or writing data
    #[arg(long)]
    pub dry_run: bool,
}

impl CliConfig {
    /// 套用命令列覆寫設定
    pub fn apply_overrides(&self, config: &mut PipelineConfig) {
        if let Some(input) = &self.input {
            tracing::info!("🔧 Input overridden to: {}", input);
            config.pipeline.input = Some(input.clone());
        }
        if let Some(output) = &self.output {
            tracing::info!("🔧 Output path overridden to: {}", output);
            config.output.path = output.clone();
        }
        if !self.formats.is_empty() {
            tracing::info!("🔧 Output formats overridden to: {}", self.formats.join(","));
            config.output.formats = self.formats.clone();
        }
    }
}
