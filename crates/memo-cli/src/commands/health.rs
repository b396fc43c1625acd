use memo_core::ClientConfig;

use crate::commands::common::build_notes_client;
use crate::error::CliError;

pub async fn run_health(as_json: bool, config: &ClientConfig) -> Result<(), CliError> {
    let client = build_notes_client(config)?;
    let health = client.health().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&health)?);
    } else {
        match &health.version {
            Some(version) => println!("{} (version {version})", health.status),
            None => println!("{}", health.status),
        }
    }

    Ok(())
}
