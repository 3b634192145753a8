use air_quality_etl::core::ConfigProvider;
use air_quality_etl::utils::{logger, validation::Validate};
use air_quality_etl::{
    render_text, AirQualityPipeline, CliConfig, EtlEngine, EtlError, LocalStorage, TomlConfig,
};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let result = match cli.config.clone() {
        Some(path) => match TomlConfig::from_file(&path) {
            Ok(config) => {
                logger::init_cli_logger(
                    cli.verbose,
                    config.log_level(),
                    cli.json_logs || config.json_logs(),
                );
                tracing::info!("📁 Loaded configuration from: {}", path);
                run(config).await
            }
            Err(e) => {
                logger::init_cli_logger(cli.verbose, None, cli.json_logs);
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => {
            logger::init_cli_logger(cli.verbose, None, cli.json_logs);
            if cli.verbose {
                tracing::debug!("CLI config: {:?}", cli);
            }
            run(cli).await
        }
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ Air quality ETL failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        std::process::exit(e.exit_code());
    }
}

async fn run<C>(config: C) -> Result<(), EtlError>
where
    C: ConfigProvider + Validate,
{
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        return Err(e);
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = AirQualityPipeline::new(storage, config);
    let engine = EtlEngine::new(pipeline);

    let outcome = engine.run().await?;

    print!("{}", render_text(&outcome.report));
    if let Some(path) = outcome.output_path {
        println!();
        println!("📁 Report files saved to: {}", path);
    }

    Ok(())
}
