//! `hactl automation` and `hactl script`

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use ha_client::{AutomationConfig, HaClient, ScriptConfig};

use crate::input::{parse_object, read_document};
use crate::output::{print, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum AutomationCommand {
    /// List automation configurations
    List,
    /// Show one automation configuration
    Get { id: String },
    /// Create or update an automation from a JSON or YAML document
    Save {
        id: String,
        /// Config file; read from stdin when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Delete an automation configuration
    DeleteConfig { id: String },
    /// Trigger an automation
    Trigger {
        entity_id: String,
        /// Skip the automation's conditions
        #[arg(long)]
        skip_condition: bool,
    },
    /// Enable an automation
    #[command(visible_alias = "enable")]
    TurnOn { entity_id: String },
    /// Disable an automation
    #[command(visible_alias = "disable")]
    TurnOff { entity_id: String },
    /// Toggle an automation
    Toggle { entity_id: String },
    /// Reload automations from YAML
    Reload,
}

#[derive(Subcommand, Debug)]
pub enum ScriptCommand {
    /// List script configurations
    List,
    /// Show one script configuration
    Get { id: String },
    /// Create or update a script from a JSON or YAML document
    Save {
        id: String,
        /// Config file; read from stdin when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Delete a script configuration
    DeleteConfig { id: String },
    /// Run a script and wait for it to finish
    Run {
        entity_id: String,
        /// Variables as a JSON object
        #[arg(long)]
        vars: Option<String>,
    },
    /// Start a script without waiting
    #[command(visible_alias = "start")]
    TurnOn {
        entity_id: String,
        /// Variables as a JSON object
        #[arg(long)]
        vars: Option<String>,
    },
    /// Stop a running script
    #[command(visible_alias = "stop")]
    TurnOff { entity_id: String },
    /// Toggle a script
    Toggle { entity_id: String },
    /// Reload scripts from YAML
    Reload,
}

pub async fn run_automation(
    rest: &HaClient,
    command: AutomationCommand,
    format: OutputFormat,
) -> Result<()> {
    match command {
        AutomationCommand::List => print(&rest.automation_list().await?, format),
        AutomationCommand::Get { id } => print(&rest.automation_get(&id).await?, format),
        AutomationCommand::Save { id, file } => {
            let mut config: AutomationConfig = read_document(file.as_deref())?;
            config.id = id;
            rest.automation_save(&config).await?;
            println!("Automation configuration '{}' saved", config.id);
            Ok(())
        }
        AutomationCommand::DeleteConfig { id } => {
            rest.automation_delete_config(&id).await?;
            println!("Automation configuration '{}' deleted", id);
            Ok(())
        }
        AutomationCommand::Trigger {
            entity_id,
            skip_condition,
        } => {
            rest.automation_trigger(&entity_id, skip_condition.then_some(true))
                .await?;
            println!("Automation {} triggered", entity_id);
            Ok(())
        }
        AutomationCommand::TurnOn { entity_id } => {
            rest.automation_turn_on(&entity_id).await?;
            println!("Automation {} enabled", entity_id);
            Ok(())
        }
        AutomationCommand::TurnOff { entity_id } => {
            rest.automation_turn_off(&entity_id).await?;
            println!("Automation {} disabled", entity_id);
            Ok(())
        }
        AutomationCommand::Toggle { entity_id } => {
            rest.automation_toggle(&entity_id).await?;
            println!("Automation {} toggled", entity_id);
            Ok(())
        }
        AutomationCommand::Reload => {
            rest.automation_reload().await?;
            println!("Automations reloaded");
            Ok(())
        }
    }
}

pub async fn run_script(
    rest: &HaClient,
    command: ScriptCommand,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ScriptCommand::List => print(&rest.script_list().await?, format),
        ScriptCommand::Get { id } => print(&rest.script_get(&id).await?, format),
        ScriptCommand::Save { id, file } => {
            let mut config: ScriptConfig = read_document(file.as_deref())?;
            config.id = id;
            rest.script_save(&config).await?;
            println!("Script configuration '{}' saved", config.id);
            Ok(())
        }
        ScriptCommand::DeleteConfig { id } => {
            rest.script_delete_config(&id).await?;
            println!("Script configuration '{}' deleted", id);
            Ok(())
        }
        ScriptCommand::Run { entity_id, vars } => {
            let variables = parse_object(vars.as_deref(), "--vars")?;
            rest.script_run(&entity_id, &variables).await?;
            println!("Script {} executed", entity_id);
            Ok(())
        }
        ScriptCommand::TurnOn { entity_id, vars } => {
            let variables = parse_object(vars.as_deref(), "--vars")?;
            rest.script_turn_on(&entity_id, &variables).await?;
            println!("Script {} started", entity_id);
            Ok(())
        }
        ScriptCommand::TurnOff { entity_id } => {
            rest.script_turn_off(&entity_id).await?;
            println!("Script {} stopped", entity_id);
            Ok(())
        }
        ScriptCommand::Toggle { entity_id } => {
            rest.script_toggle(&entity_id).await?;
            println!("Script {} toggled", entity_id);
            Ok(())
        }
        ScriptCommand::Reload => {
            rest.script_reload().await?;
            println!("Scripts reloaded");
            Ok(())
        }
    }
}
