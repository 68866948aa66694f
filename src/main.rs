use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use midaz_mcp::config::{Config, ConfigFile};
use midaz_mcp::error::ToolError;
use midaz_mcp::resource::{Component, Registry};
use midaz_mcp::tools::{discover, execute, DiscoverParams, ExecuteParams};
use midaz_mcp::BackendClient;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Discover and call the Midaz ledger APIs
#[derive(Parser, Debug)]
#[command(name = "midaz-mcp", version = midaz_mcp::VERSION, about, long_about = None)]
struct Args {
    /// Onboarding service base URL
    #[arg(long, global = true)]
    onboarding_url: Option<String>,

    /// Transaction service base URL
    #[arg(long, global = true)]
    transaction_url: Option<String>,

    /// CRM service base URL
    #[arg(long, global = true)]
    crm_url: Option<String>,

    /// Ledger service base URL
    #[arg(long, global = true)]
    ledger_url: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Explore resources, actions and parameters
    Discover {
        /// list-resources, describe-resource, describe-action, search or list-by-component
        intent: String,
        #[arg(long)]
        resource: Option<String>,
        #[arg(long)]
        action: Option<String>,
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        component: Option<String>,
    },
    /// Execute one resource action against its backend
    Execute {
        resource: String,
        action: String,
        /// Path parameter, repeatable
        #[arg(long = "path", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        path_params: Vec<(String, String)>,
        /// Query parameter, repeatable; JSON values are passed through as JSON
        #[arg(long = "query", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        query_params: Vec<(String, String)>,
        /// Request body as JSON
        #[arg(long)]
        body: Option<String>,
    },
    /// Probe the health endpoint of one or all components
    Health {
        /// onboarding, transaction, crm or ledger
        component: Option<String>,
    },
    /// Print the resolved configuration
    Config,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

/// Query values that parse as JSON keep their type; anything else is a string
fn query_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", log_path.display(), e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("midaz-mcp started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("midaz-mcp").join("midaz-mcp.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".midaz-mcp").join("midaz-mcp.log");
    }
    PathBuf::from("midaz-mcp.log")
}

/// CLI flags > environment > config file > defaults
fn load_config(args: &Args) -> Result<Config> {
    let cli = ConfigFile {
        onboarding_url: args.onboarding_url.clone(),
        transaction_url: args.transaction_url.clone(),
        crm_url: args.crm_url.clone(),
        ledger_url: args.ledger_url.clone(),
        timeout_ms: args.timeout_ms,
        api_token: None,
    };

    let layered = ConfigFile::load()?
        .merge(ConfigFile::from_env(|key| std::env::var(key).ok())?)
        .merge(cli);

    Config::resolve(layered)
}

fn print_json(value: &Value) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to render output")?
    );
    Ok(())
}

async fn run(args: Args) -> Result<Result<Value, ToolError>> {
    let registry = Registry::load().context("Failed to load resource definitions")?;

    match args.command {
        Command::Discover {
            ref intent,
            ref resource,
            ref action,
            ref query,
            ref component,
        } => {
            let params = DiscoverParams {
                intent: intent.clone(),
                resource: resource.clone(),
                action: action.clone(),
                query: query.clone(),
                component: component.clone(),
            };
            Ok(discover(&registry, &params))
        }
        Command::Execute {
            ref resource,
            ref action,
            ref path_params,
            ref query_params,
            ref body,
        } => {
            let body = match body {
                Some(raw) => {
                    let parsed = serde_json::from_str(raw);
                    match parsed {
                        Ok(value) => Some(value),
                        Err(e) => {
                            return Ok(Err(ToolError::invalid_params(format!(
                                "--body is not valid JSON: {e}"
                            ))))
                        }
                    }
                }
                None => None,
            };

            let params = ExecuteParams {
                resource: resource.clone(),
                action: action.clone(),
                path_params: path_params
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect::<Map<String, Value>>(),
                query_params: query_params
                    .iter()
                    .map(|(k, v)| (k.clone(), query_value(v.clone())))
                    .collect::<Map<String, Value>>(),
                body,
            };

            let client = BackendClient::new(load_config(&args)?)?;
            Ok(execute(&registry, &client, &params).await)
        }
        Command::Health { ref component } => {
            let client = BackendClient::new(load_config(&args)?)?;
            let statuses = match component {
                Some(name) => {
                    let Some(component) = Component::parse(name) else {
                        let valid: Vec<&str> = Component::ALL.iter().map(|c| c.as_str()).collect();
                        return Ok(Err(ToolError::invalid_params(format!(
                            "Unknown component '{}'. Valid components: {}",
                            name,
                            valid.join(", ")
                        ))));
                    };
                    vec![client.check_health(component).await]
                }
                None => client.check_all_health().await,
            };
            Ok(Ok(serde_json::to_value(statuses)?))
        }
        Command::Config => {
            let config = load_config(&args)?;
            let mut value = serde_json::to_value(&config)?;
            if let Value::Object(map) = &mut value {
                let token = config.api_token.as_ref().map(|_| "<redacted>");
                map.insert("api_token".to_string(), serde_json::json!(token));
            }
            Ok(Ok(value))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    match run(args).await {
        Ok(Ok(value)) => match print_json(&value) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("Error: {err:?}");
                ExitCode::FAILURE
            }
        },
        Ok(Err(tool_error)) => {
            let _ = print_json(&tool_error.to_json());
            ExitCode::from(1)
        }
        Err(err) => {
            tracing::error!("fatal: {:#}", err);
            eprintln!("Error: {err:?}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_value_splits_on_first_equals() {
        assert_eq!(
            parse_key_value("filter=a=b").unwrap(),
            ("filter".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_query_values_keep_json_types() {
        assert_eq!(query_value("10".into()), serde_json::json!(10));
        assert_eq!(query_value("true".into()), serde_json::json!(true));
        assert_eq!(query_value("desc".into()), serde_json::json!("desc"));
    }

    #[test]
    fn test_execute_subcommand_parses_repeated_params() {
        let args = Args::try_parse_from([
            "midaz-mcp",
            "execute",
            "ledgers",
            "get",
            "--path",
            "organization_id=o1",
            "--path",
            "id=l1",
            "--query",
            "limit=5",
        ])
        .unwrap();

        match args.command {
            Command::Execute {
                path_params,
                query_params,
                ..
            } => {
                assert_eq!(path_params.len(), 2);
                assert_eq!(query_params[0], ("limit".to_string(), "5".to_string()));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
