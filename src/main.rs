use faqrag::cli::{Cli, Commands, ConfigAction};
use faqrag::config::Config;
use faqrag::error::{FaqragError, Result};
use faqrag::server::{self, AppContext};
use faqrag::telemetry::MetricsAggregator;
use std::path::PathBuf;
use std::sync::Arc;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Serve { bind } => {
            cmd_serve(cli.config, bind)?;
        }
        Commands::Ask { question, json } => {
            cmd_ask(cli.config, &question, json)?;
        }
        Commands::Metrics { json } => {
            cmd_metrics(cli.config, json)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "faqrag=debug" } else { "faqrag=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn cmd_serve(config_path: Option<PathBuf>, bind: Option<String>) -> Result<()> {
    let config = load_config(config_path)?;
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());

    // Provider clients are blocking, so the context is built and dropped outside the runtime
    let ctx = Arc::new(AppContext::from_config(&config)?);

    let runtime = tokio::runtime::Runtime::new().map_err(|e| FaqragError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })?;
    let result = runtime.block_on(server::serve(ctx.clone(), &bind));
    drop(runtime);
    drop(ctx);

    result
}

fn cmd_ask(config_path: Option<PathBuf>, question: &str, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let ctx = AppContext::from_config(&config)?;
    let outcome = ctx.assistant.ask(question)?;

    if json {
        let body = server::AskResponse {
            answer: outcome.answer.text,
            sources: outcome.answer.sources,
        };
        let json = serde_json::to_string_pretty(&body).map_err(|e| FaqragError::Json {
            source: e,
            context: "Failed to serialize answer".to_string(),
        })?;
        println!("{}", json);
        return Ok(());
    }

    println!("{}", outcome.answer.text);
    if !outcome.answer.sources.is_empty() {
        println!("\nSources:");
        for source in &outcome.answer.sources {
            println!("  - {} ({})", source.title, source.url);
        }
    }
    println!("\n[{}]", outcome.origin);

    Ok(())
}

fn cmd_metrics(config_path: Option<PathBuf>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let snapshot = MetricsAggregator::new(config.storage.log_path.clone()).snapshot()?;

    if json {
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| FaqragError::Json {
            source: e,
            context: "Failed to serialize metrics".to_string(),
        })?;
        println!("{}", json);
        return Ok(());
    }

    println!("Request log: {}", config.storage.log_path.display());
    if snapshot.counts.is_empty() {
        println!("No requests logged yet");
    } else {
        for (topic, count) in &snapshot.counts {
            println!("  {:<10} {}", topic, count);
        }
    }
    println!("p95 latency: {:.3}s", snapshot.p95_latency);
    if snapshot.malformed_lines > 0 {
        println!("⚠ {} malformed lines skipped", snapshot.malformed_lines);
    }

    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let toml = toml::to_string_pretty(&config)?;
            println!("{}", toml);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| FaqragError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'faqrag config init' to create one."
        );
        return Config::from_env();
    }

    Config::load(&path)
}
