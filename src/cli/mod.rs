//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod ask;
pub mod health;
pub mod settings;

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::HttpQueryClient;
use crate::cli::ask::run_ask;
use crate::cli::health::run_health;
use crate::cli::settings::{SetContext, SettingError, SettingRegistry};
use crate::core::app::App;
use crate::core::config::defaults::BASE_URL_ENV;
use crate::core::config::io::project_dirs;
use crate::core::config::{Config, ConfigStore};
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::LoggingState;

/// Environment variable holding the diagnostics filter.
pub const LOG_FILTER_ENV: &str = "FINANCI_LOG";
const DEFAULT_LOG_FILTER: &str = "financi=info,warn";

#[derive(Parser)]
#[command(name = "financi")]
#[command(version)]
#[command(about = "A terminal client for the Financi multi-agent financial assistant")]
#[command(
    long_about = "Financi is a full-screen terminal client for a multi-agent financial \
answering service. Questions are routed to a database, search or visualization agent; \
answers arrive with citations and, for charts, an image reference.\n\n\
Environment Variables:\n\
  FINANCI_BASE_URL  Service root (overrides the config file)\n\
  FINANCI_LOG       Diagnostics filter (default: financi=info,warn)\n\n\
Controls:\n\
  Enter             Send the question\n\
  Alt+Enter         Insert a newline\n\
  Up/Down/PgUp/PgDn Scroll the transcript\n\
  Ctrl+C            Quit the application\n\n\
Commands:\n\
  /help             Show extended help with keyboard shortcuts\n\
  /agents           List the agents and what they do\n\
  /log <filename>   Enable logging to specified file\n\
  /log              Toggle logging pause/resume\n\
  /dump [filename]  Write the conversation to a file"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Service root, e.g. http://localhost:8080
    #[arg(short = 'u', long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Append the conversation transcript to this file (chat and ask)
    #[arg(short = 'l', long, global = true)]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Ask one question without the interface and print the answer
    Ask {
        /// The question (several words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        question: Vec<String>,
        /// Write an inline chart to this file
        #[arg(long, value_name = "PATH")]
        save_chart: Option<PathBuf>,
    },
    /// Check that the service is reachable
    Health,
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key (list keys take several values)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Print the current configuration
    Config,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Commands::Chat);
    init_tracing(matches!(command, Commands::Chat));
    if let Err(message) = check_log_flag(&command, args.log.as_deref()) {
        eprintln!("❌ {message}");
        std::process::exit(2);
    }

    match command {
        Commands::Set { key, value } => {
            let store = ConfigStore::platform()?;
            exit_on_setting_error(apply_set(&store, &key, &value));
            Ok(())
        }
        Commands::Unset { key } => {
            let store = ConfigStore::platform()?;
            exit_on_setting_error(apply_unset(&store, &key));
            Ok(())
        }
        Commands::Config => {
            let store = ConfigStore::platform()?;
            let config = store.load()?;
            println!("Config file: {}", store.path().display());
            println!("{}", describe_config(&config));
            Ok(())
        }
        Commands::Health => {
            let (config, _) = load_config()?;
            let endpoint = config.endpoint(args.base_url.as_deref(), env_base_url().as_deref());
            run_health(endpoint, config.request_timeout()).await
        }
        Commands::Ask {
            question,
            save_chart,
        } => {
            let (config, _) = load_config()?;
            let endpoint = config.endpoint(args.base_url.as_deref(), env_base_url().as_deref());
            run_ask(question, &config, endpoint, save_chart, args.log).await
        }
        Commands::Chat => {
            let (config, store) = load_config()?;
            let endpoint = config.endpoint(args.base_url.as_deref(), env_base_url().as_deref());
            let client = HttpQueryClient::new(endpoint.clone(), config.request_timeout())?;
            let logging = LoggingState::new(args.log)?;

            let mut app = App::with_endpoint(config, endpoint, logging);
            app.session.config_store = store;
            info!(base_url = %app.session.endpoint.base_url, "Starting chat");
            run_chat(app, Arc::new(client)).await
        }
    }
}

/// `--log` records a conversation, so only `chat` and `ask` accept it.
pub(crate) fn check_log_flag(command: &Commands, log: Option<&str>) -> Result<(), String> {
    let name = match command {
        Commands::Chat | Commands::Ask { .. } => return Ok(()),
        Commands::Health => "health",
        Commands::Set { .. } => "set",
        Commands::Unset { .. } => "unset",
        Commands::Config => "config",
    };
    match log {
        Some(_) => Err(format!("--log records a conversation and cannot be used with '{name}'")),
        None => Ok(()),
    }
}

fn env_base_url() -> Option<String> {
    std::env::var(BASE_URL_ENV).ok()
}

/// Load the platform config. Without a config directory the defaults apply
/// and nothing can be persisted.
fn load_config() -> Result<(Config, Option<ConfigStore>), Box<dyn Error>> {
    match ConfigStore::platform() {
        Ok(store) => {
            let config = store.load()?;
            Ok((config, Some(store)))
        }
        Err(err) => {
            warn!(error = %err, "No config directory; using defaults");
            Ok((Config::default(), None))
        }
    }
}

pub(crate) fn apply_set(
    store: &ConfigStore,
    key: &str,
    value: &[String],
) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
    let config = store
        .load()
        .map_err(|e| SettingError::ConfigError(e.to_string()))?;
    let mut ctx = SetContext {
        store,
        config: &config,
    };
    handler.set(value, &mut ctx)
}

pub(crate) fn apply_unset(store: &ConfigStore, key: &str) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
    let config = store
        .load()
        .map_err(|e| SettingError::ConfigError(e.to_string()))?;
    let mut ctx = SetContext {
        store,
        config: &config,
    };
    handler.unset(&mut ctx)
}

/// Every known key with its current value, in display order.
pub(crate) fn describe_config(config: &Config) -> String {
    let registry = SettingRegistry::new();
    let mut lines = vec!["Current configuration:".to_string()];
    for key in registry.keys_display_order() {
        if let Some(handler) = registry.get(key) {
            lines.push(handler.format(config));
        }
    }
    lines.join("\n")
}

fn exit_on_setting_error(result: Result<String, SettingError>) {
    match result {
        Ok(message) => println!("{message}"),
        Err(err) => {
            err.print();
            std::process::exit(err.exit_code());
        }
    }
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// The interactive UI owns the terminal, so its diagnostics go to a file in
/// the data directory. Everything else logs to stderr.
fn init_tracing(interactive: bool) {
    if interactive {
        let Some(file) = diagnostics_log_path().and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        }) else {
            return;
        };
        let _ = tracing_subscriber::registry()
            .with(log_filter())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .try_init();
        return;
    }

    let _ = tracing_subscriber::registry()
        .with(log_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn diagnostics_log_path() -> Option<PathBuf> {
    let dirs = project_dirs()?;
    let dir = dirs.data_local_dir();
    fs::create_dir_all(dir).ok()?;
    Some(dir.join("financi.log"))
}
