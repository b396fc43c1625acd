//! memo CLI - Manage notes in a remote notes service
//!
//! A thin command-line view over the notes sync engine in memo-core.

mod cli;
mod commands;
mod config_profiles;
mod error;

use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::resolve_client_config;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::{run_edit, EditArgs};
use crate::commands::health::run_health;
use crate::commands::list::run_list;
use crate::commands::pokedex::run_pokedex;
use crate::commands::show::run_show;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("memo=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();
    let api_url = cli.api_url.as_deref();

    match cli.command {
        Some(Commands::List { page, search, json }) => {
            let config = resolve_client_config(profile, api_url)?;
            run_list(page, search.as_deref(), json, &config).await?;
        }
        Some(Commands::Show { id, json }) => {
            let config = resolve_client_config(profile, api_url)?;
            run_show(&id, json, &config).await?;
        }
        Some(Commands::Add {
            title,
            content,
            tags,
        }) => {
            let config = resolve_client_config(profile, api_url)?;
            run_add(&title, &content, &tags, &config).await?;
        }
        Some(Commands::Edit {
            id,
            title,
            content,
            tags,
            archive,
            unarchive,
        }) => {
            let config = resolve_client_config(profile, api_url)?;
            let args = EditArgs {
                title,
                content,
                tags,
                archive,
                unarchive,
            };
            run_edit(&id, args, &config).await?;
        }
        Some(Commands::Delete { id, yes }) => {
            let config = resolve_client_config(profile, api_url)?;
            run_delete(&id, yes, &config).await?;
        }
        Some(Commands::Health { json }) => {
            let config = resolve_client_config(profile, api_url)?;
            run_health(json, &config).await?;
        }
        Some(Commands::Pokedex { command }) => {
            let config = resolve_client_config(profile, api_url)?;
            run_pokedex(command, &config).await?;
        }
        Some(Commands::Config { command }) => run_config(command, profile)?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        None => {
            Cli::command().print_help().map_err(CliError::Io)?;
            println!();
        }
    }

    Ok(())
}
