//! `hactl lovelace`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use ha_client::lovelace::CreateDashboardRequest;
use ha_client::WsClient;
use serde_json::Value;
use tracing::{info, warn};

use crate::input::read_document;
use crate::output::{print, render, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum LovelaceCommand {
    /// List dashboards
    #[command(visible_alias = "dashboards")]
    List,
    /// Show a dashboard config; the default dashboard when no path is given
    #[command(visible_alias = "config")]
    Get {
        dashboard: Option<String>,
        /// Bypass the server-side cache
        #[arg(long)]
        force: bool,
    },
    /// Replace a dashboard config from a JSON or YAML document
    Save {
        dashboard: Option<String>,
        /// Config file; read from stdin when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Reset a dashboard config
    Delete { dashboard: Option<String> },
    /// Create a dashboard
    Create {
        url_path: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        icon: Option<String>,
        /// Hide from the sidebar
        #[arg(long)]
        no_sidebar: bool,
        #[arg(long)]
        require_admin: bool,
    },
    /// Remove a dashboard by ID
    RemoveDashboard { dashboard_id: String },
    /// List frontend resources
    Resources,
    /// Write every dashboard config to a directory
    Export {
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
        /// Write YAML instead of JSON
        #[arg(long)]
        yaml: bool,
    },
}

pub async fn run(ws: &WsClient, command: LovelaceCommand, format: OutputFormat) -> Result<()> {
    match command {
        LovelaceCommand::List => print(&ws.lovelace_dashboards().await?, format),
        LovelaceCommand::Get { dashboard, force } => {
            print(&ws.lovelace_config(dashboard.as_deref(), force).await?, format)
        }
        LovelaceCommand::Save { dashboard, file } => {
            let config: Value = read_document(file.as_deref())?;
            ws.lovelace_save_config(dashboard.as_deref(), &config).await?;
            println!("Dashboard '{}' saved", display_name(dashboard.as_deref()));
            Ok(())
        }
        LovelaceCommand::Delete { dashboard } => {
            ws.lovelace_delete_config(dashboard.as_deref()).await?;
            println!("Dashboard '{}' config deleted", display_name(dashboard.as_deref()));
            Ok(())
        }
        LovelaceCommand::Create {
            url_path,
            title,
            icon,
            no_sidebar,
            require_admin,
        } => {
            let request = CreateDashboardRequest {
                url_path,
                title,
                icon,
                show_in_sidebar: !no_sidebar,
                require_admin,
                allow_single_word: false,
            };
            print(&ws.lovelace_create_dashboard(&request).await?, format)
        }
        LovelaceCommand::RemoveDashboard { dashboard_id } => {
            ws.lovelace_delete_dashboard(&dashboard_id).await?;
            println!("Dashboard '{}' removed", dashboard_id);
            Ok(())
        }
        LovelaceCommand::Resources => print(&ws.lovelace_resources().await?, format),
        LovelaceCommand::Export { dir, yaml } => {
            let format = if yaml {
                OutputFormat::Yaml
            } else {
                OutputFormat::Json
            };
            export(ws, &dir, format).await
        }
    }
}

async fn export(ws: &WsClient, dir: &Path, format: OutputFormat) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut url_paths = vec![None];
    url_paths.extend(
        ws.lovelace_dashboards()
            .await?
            .into_iter()
            .map(|dashboard| Some(dashboard.url_path)),
    );

    let mut exported = 0;
    for url_path in &url_paths {
        let name = display_name(url_path.as_deref());
        let config = match ws.lovelace_config(url_path.as_deref(), false).await {
            Ok(config) => config,
            Err(e) => {
                warn!(dashboard = name, error = %e, "Skipping dashboard");
                continue;
            }
        };

        let path = export_path(dir, url_path.as_deref(), format);
        let written = render(&config, format)
            .and_then(|content| std::fs::write(&path, content).map_err(Into::into));
        match written {
            Ok(()) => {
                info!(dashboard = name, path = %path.display(), "Exported dashboard");
                exported += 1;
            }
            Err(e) => warn!(dashboard = name, error = %e, "Failed to write dashboard"),
        }
    }

    println!("Exported {} of {} dashboards to {}", exported, url_paths.len(), dir.display());
    Ok(())
}

fn display_name(url_path: Option<&str>) -> &str {
    url_path.unwrap_or("default")
}

/// File a dashboard is exported to
pub fn export_path(dir: &Path, url_path: Option<&str>, format: OutputFormat) -> PathBuf {
    let extension = match format {
        OutputFormat::Json => "json",
        OutputFormat::Yaml => "yaml",
    };
    dir.join(format!("{}.{}", display_name(url_path), extension))
}
