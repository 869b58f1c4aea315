use clap::Parser;
use small_agg::utils::error::ErrorCategory;
use small_agg::utils::{logger, validation::Validate};
use small_agg::{CliConfig, LocalStorage, PipelineConfig, PipelineEngine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match PipelineConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    args.apply_overrides(&mut config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No data will be read or written");
        return Ok(());
    }

    let source = LocalStorage::new(&config.source.path);
    let sink = LocalStorage::new(&config.output.path);
    let engine = PipelineEngine::new(source, sink, config);

    match engine.run() {
        Ok(summary) => {
            println!(
                "✅ Pipeline completed: {} -> {} records",
                summary.input_records, summary.output_records
            );
            for location in &summary.outputs {
                println!("📁 Output saved to: {}", location);
            }
        }
        Err(e) => {
            tracing::error!("❌ Pipeline failed: {} (Category: {:?})", e, e.category());
            eprintln!("❌ {}", e.user_friendly_message());

            let exit_code = match e.category() {
                ErrorCategory::Configuration => 1,
                ErrorCategory::Data => 2,
                ErrorCategory::Io => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn display_config_summary(config: &PipelineConfig) {
    tracing::info!("📋 Pipeline: {}", config.pipeline.name);
    if let Some(description) = &config.pipeline.description {
        tracing::info!("   {}", description);
    }
    tracing::info!(
        "📥 Input: {} (from {})",
        config.input_name().unwrap_or("-"),
        config.source.path
    );
    for (index, stage) in config.stages.iter().enumerate() {
        tracing::info!("   [{}] {}", index, stage.name());
    }
    tracing::info!(
        "📤 Output: {} as {}",
        config.output.path,
        config.output.formats.join(", ")
    );
}
