//! hactl: command-line access to a Home Assistant instance
//!
//! REST-backed commands (`status`, `states`, `service`, `history`,
//! `automation`, `script`, ...) and WebSocket-backed ones (`registry`,
//! `lovelace`, `ws`) share one client.

mod automation;
mod input;
mod lovelace;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use ha_client::{
    Client, ClientConfig, HistoryOptions, LogbookOptions, RegistryKind, ServiceCallRequest,
    StateUpdate,
};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use automation::{AutomationCommand, ScriptCommand};
use input::{parse_duration, parse_object};
use lovelace::LovelaceCommand;
use output::{print, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "hactl")]
#[command(about = "Query and control a Home Assistant instance")]
#[command(version)]
struct Cli {
    /// Base URL of the instance
    #[arg(long, env = "HA_URL")]
    url: Option<String>,

    /// Long-lived access token
    #[arg(long, env = "HA_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// YAML config file (url, token, timeout, handshake_timeout); replaces --url/--token
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// REST request timeout in seconds [default: 30]; overrides the config file
    #[arg(long)]
    timeout: Option<u64>,

    /// WebSocket handshake timeout in seconds [default: 10]; overrides the config file
    #[arg(long)]
    handshake_timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the API is running
    Status,
    /// Show the core configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommand>,
    },
    /// List loaded components
    Components,
    /// Print the error log
    #[command(name = "errorlog")]
    ErrorLog,
    /// List all states, or show one entity
    States { entity_id: Option<String> },
    /// Create or update an entity state
    SetState {
        entity_id: String,
        state: String,
        /// Attributes as a JSON object
        #[arg(long)]
        attributes: Option<String>,
    },
    /// Call a service
    Service {
        domain: String,
        service: String,
        /// Target entity
        #[arg(long)]
        entity_id: Option<String>,
        /// Service data as a JSON object
        #[arg(long)]
        data: Option<String>,
    },
    /// Render a template
    Template { template: String },
    /// State history of an entity
    History {
        entity_id: String,
        /// How far back to look, e.g. 30m, 24h, 7d
        #[arg(short, long, default_value = "24h")]
        duration: String,
        /// Only state and last_changed
        #[arg(long)]
        minimal: bool,
        #[arg(long)]
        no_attributes: bool,
    },
    /// Logbook entries
    Logbook {
        /// How far back to look, e.g. 30m, 24h, 7d
        #[arg(short, long, default_value = "24h")]
        duration: String,
        /// Only entries for this entity
        #[arg(short, long)]
        entity: Option<String>,
    },
    /// Event listeners and firing
    Event {
        #[command(subcommand)]
        command: EventCommand,
    },
    /// Calendars and their events
    Calendar {
        #[command(subcommand)]
        command: CalendarCommand,
    },
    /// Automations
    Automation {
        #[command(subcommand)]
        command: AutomationCommand,
    },
    /// Scripts
    Script {
        #[command(subcommand)]
        command: ScriptCommand,
    },
    /// List a registry (entity, device, area, label, floor)
    Registry { kind: String },
    /// Dashboards
    Lovelace {
        #[command(subcommand)]
        command: LovelaceCommand,
    },
    /// Send a raw WebSocket command, e.g. '{"type": "ping"}'
    Ws { command: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the configuration files
    Check,
}

#[derive(Subcommand, Debug)]
enum EventCommand {
    /// List event types and their listener counts
    List,
    /// Fire an event
    Fire {
        event_type: String,
        /// Event data as a JSON object
        #[arg(short, long)]
        data: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum CalendarCommand {
    /// List calendar entities
    List,
    /// Upcoming events of a calendar
    Events {
        entity_id: String,
        /// Number of days ahead
        #[arg(short, long, default_value_t = 7)]
        days: u32,
    },
}

impl Cli {
    /// Connection settings: the config file or --url/--token, then timeout flags on top
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => {
                let (Some(url), Some(token)) = (&self.url, &self.token) else {
                    bail!("--url and --token (or HA_URL and HA_TOKEN, or --config) are required");
                };
                ClientConfig::new(url, token.clone())
            }
        };

        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.handshake_timeout {
            config = config.with_handshake_timeout(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.client_config()?;
    debug!(url = %config.base_url, "Using Home Assistant instance");

    let client = Client::new(&config)?;
    let result = run(&client, cli.command, cli.output).await;
    client.close_websocket().await;
    result
}

async fn run(client: &Client, command: Command, format: OutputFormat) -> Result<()> {
    let rest = client.rest();
    let ws = client.ws();

    match command {
        Command::Status => print(&rest.status().await?, format),
        Command::Config { command: None } => print(&rest.config().await?, format),
        Command::Config {
            command: Some(ConfigCommand::Check),
        } => {
            let check = rest.check_config().await?;
            print(&check, format)?;
            if check.result != "valid" {
                bail!("configuration is {}", check.result);
            }
            Ok(())
        }
        Command::Components => print(&rest.components().await?, format),
        Command::ErrorLog => {
            println!("{}", rest.error_log().await?);
            Ok(())
        }
        Command::States { entity_id: None } => print(&rest.states().await?, format),
        Command::States {
            entity_id: Some(entity_id),
        } => print(&rest.state(&entity_id).await?, format),
        Command::SetState {
            entity_id,
            state,
            attributes,
        } => {
            let update = StateUpdate {
                state,
                attributes: parse_object(attributes.as_deref(), "--attributes")?,
            };
            print(&rest.set_state(&entity_id, &update).await?, format)
        }
        Command::Service {
            domain,
            service,
            entity_id,
            data,
        } => {
            let request = ServiceCallRequest {
                entity_id,
                data: parse_object(data.as_deref(), "--data")?,
            };
            let changed = rest.call_service(&domain, &service, Some(&request)).await?;
            print(&changed, format)
        }
        Command::Template { template } => {
            println!("{}", rest.render_template(&template).await?);
            Ok(())
        }
        Command::History {
            entity_id,
            duration,
            minimal,
            no_attributes,
        } => {
            let start = Utc::now() - parse_duration(&duration)?;
            let options = HistoryOptions {
                filter_entity_id: Some(entity_id),
                minimal_response: minimal,
                no_attributes,
                ..Default::default()
            };
            print(&rest.history(&start, &options).await?, format)
        }
        Command::Logbook { duration, entity } => {
            let start = Utc::now() - parse_duration(&duration)?;
            let options = LogbookOptions {
                entity,
                ..Default::default()
            };
            print(&rest.logbook(&start, &options).await?, format)
        }
        Command::Event { command } => match command {
            EventCommand::List => print(&rest.events().await?, format),
            EventCommand::Fire { event_type, data } => {
                let data = parse_object(data.as_deref(), "--data")?;
                rest.fire_event(&event_type, &data).await?;
                println!("Event {} fired", event_type);
                Ok(())
            }
        },
        Command::Calendar { command } => match command {
            CalendarCommand::List => print(&rest.calendars().await?, format),
            CalendarCommand::Events { entity_id, days } => {
                let start = Utc::now();
                let end = start + chrono::Duration::days(i64::from(days));
                print(&rest.calendar_events(&entity_id, &start, &end).await?, format)
            }
        },
        Command::Automation { command } => automation::run_automation(rest, command, format).await,
        Command::Script { command } => automation::run_script(rest, command, format).await,
        Command::Registry { kind } => {
            let kind: RegistryKind = kind.parse()?;
            print(&ws.registry_raw(kind).await?, format)
        }
        Command::Lovelace { command } => lovelace::run(ws, command, format).await,
        Command::Ws { command } => {
            let command: Value =
                serde_json::from_str(&command).context("command must be valid JSON")?;
            print(&ws.call(&command).await?, format)
        }
    }
}
