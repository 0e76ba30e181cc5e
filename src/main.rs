use disposable_domains::telemetry::init_tracing;
use disposable_domains::{Config, Error, SourceDeclaration, SourceErrors, run_with_shutdown};
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, warn};

/// Source diagnostics under `strict`
const EXIT_DIAGNOSTICS: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config_exists = Path::new(&config_path).exists();

    let config = if config_exists {
        match Config::load(&config_path) {
            Ok(config) => config,
            Err(e) => {
                init_tracing(&Config::default().log_level);
                error!(path = %config_path, error = %e, "Failed to load config");
                return ExitCode::FAILURE;
            }
        }
    } else {
        Config::default()
    };

    init_tracing(&config.log_level);
    if !config_exists {
        info!(path = %config_path, "Config file not found, using defaults");
    }

    match generate(&config).await {
        Ok(Some(diagnostics)) if config.strict => {
            error!(error = %diagnostics, "Some sources failed (strict mode)");
            ExitCode::from(EXIT_DIAGNOSTICS)
        }
        Ok(Some(diagnostics)) => {
            warn!(error = %diagnostics, "Some sources failed");
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Generation failed");
            ExitCode::FAILURE
        }
    }
}

async fn generate(config: &Config) -> Result<Option<SourceErrors>, Error> {
    let sources = SourceDeclaration::load(&config.sources)?;
    let start = Instant::now();
    let report = run_with_shutdown(config, &sources).await?;
    info!(
        deny = report.deny_count,
        allow = report.allow_count,
        elapsed_ms = start.elapsed().as_millis(),
        "Lists generated"
    );
    Ok(report.diagnostics)
}
