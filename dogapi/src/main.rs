//! dogapi CLI: query a Datadog-style monitoring API from the terminal.

mod output;

use clap::{Parser, Subcommand, ValueEnum};
use dogapi_lib::{split_tag, ApiRequest, Client, ClientConfig, Params};
use serde_json::{json, Value};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dogapi")]
#[command(about = "Monitoring API CLI: validate keys, inspect host tags, issue raw requests", long_about = None)]
struct Cli {
    /// Output format: plain (human-readable), json (structured).
    #[arg(short, long, default_value = "plain", value_enum)]
    output: OutputFormatArg,

    /// API key (sent as the api_key query parameter).
    #[arg(long, env = "DD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Application key (sent as the application_key query parameter).
    #[arg(long, env = "DD_APP_KEY", hide_env_values = true)]
    app_key: Option<String>,

    /// API host, e.g. https://api.datadoghq.eu
    #[arg(long, env = "DD_HOST")]
    host: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, env = "DD_TIMEOUT_SECS")]
    timeout: Option<u64>,

    /// Print the latest rate-limit snapshot to stderr after the request.
    #[arg(long)]
    rate_limit: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the API key is valid
    Validate,
    /// List host tags
    Tags {
        /// Only tags from this source (e.g. users, chef)
        #[arg(long)]
        source: Option<String>,
    },
    /// Remove all tags from a host
    DeleteTags {
        host: String,
        #[arg(long)]
        source: Option<String>,
    },
    /// Issue a GET request and print the JSON response
    Get {
        /// Path below the host, e.g. /api/v1/hosts
        path: String,
        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Split key:value tags into their parts (no request is made)
    SplitTag {
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Show version
    Version,
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {s:?}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let format = match cli.output {
        OutputFormatArg::Plain => output::OutputFormat::Plain,
        OutputFormatArg::Json => output::OutputFormat::Json,
    };

    // Commands that never talk to the API.
    match &cli.command {
        Commands::Version => {
            println!("dogapi {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        Commands::SplitTag { tags } => {
            let parts: Vec<Value> = tags
                .iter()
                .map(|t| {
                    let (key, value) = split_tag(t);
                    json!({"key": key, "value": value})
                })
                .collect();
            output::print(&Value::Array(parts), format);
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    let mut client = match build_client(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = run(&client, cli.command, format).await;
    if cli.rate_limit {
        match client.latest_rate_limit() {
            Some(rl) => eprintln!("{}", output::format_rate_limit(&rl)),
            None => eprintln!("rate limit: not reported"),
        }
    }
    client.close();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("DOGAPI_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn build_client(cli: &Cli) -> Result<Client, dogapi_lib::ConfigError> {
    let config = resolve_config(cli)?;
    tracing::debug!(?config, "building client");
    Client::from_config(config)
}

/// Flags (and the env vars clap maps onto them) win; remaining fallbacks
/// are resolved the same way `ClientConfig::from_env` does.
fn resolve_config(cli: &Cli) -> Result<ClientConfig, dogapi_lib::ConfigError> {
    let mut config = match &cli.api_key {
        Some(key) => ClientConfig::new(key.as_str()),
        None => ClientConfig::from_env()?,
    };
    if let Some(app_key) = cli.app_key.clone().or_else(ClientConfig::app_key_from_env) {
        config = config.with_app_key(app_key);
    }
    if let Some(host) = &cli.host {
        config = config.with_host(host.as_str());
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

async fn run(client: &Client, cmd: Commands, format: output::OutputFormat) -> Result<(), String> {
    match cmd {
        Commands::Validate => {
            let res = client.validate().await.map_err(|e| e.to_string())?;
            output::print(&serde_json::to_value(&res).map_err(|e| e.to_string())?, format);
        }
        Commands::Tags { source } => {
            let res = client
                .host_tags(source.as_deref())
                .await
                .map_err(|e| e.to_string())?;
            output::print(&serde_json::to_value(&res).map_err(|e| e.to_string())?, format);
        }
        Commands::DeleteTags { host, source } => {
            client
                .delete_host_tags(&host, source.as_deref())
                .await
                .map_err(|e| e.to_string())?;
            output::print(&json!({"deleted": host}), format);
        }
        Commands::Get { path, params } => {
            let params: Params = params.into_iter().collect();
            let res: Value = client
                .execute(ApiRequest::get(path).params(&params))
                .await
                .map_err(|e| e.to_string())?;
            output::print(&res, format);
        }
        Commands::SplitTag { .. } | Commands::Version => {}
    }
    Ok(())
}
