use memo_core::pokedex::{sort_pokemon, PokedexClient, Pokemon};
use memo_core::ClientConfig;

use crate::cli::PokedexCommands;
use crate::error::CliError;

pub async fn run_pokedex(command: PokedexCommands, config: &ClientConfig) -> Result<(), CliError> {
    let client = PokedexClient::new(config)?;

    match command {
        PokedexCommands::List {
            limit,
            offset,
            details,
            sort,
            json,
        } => {
            if details {
                let mut rows = client.list_with_details(limit, offset).await?;
                sort_pokemon(&mut rows, sort.into());
                if json {
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                } else {
                    for line in format_detail_lines(&rows) {
                        println!("{line}");
                    }
                }
            } else {
                let list = client.list(limit, offset).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&list)?);
                } else {
                    for entry in &list.results {
                        println!("{}", entry.name);
                    }
                    println!("{} of {} total", list.results.len(), list.count);
                }
            }
        }
        PokedexCommands::Show { name, json } => {
            let pokemon = client.details(&name).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&pokemon)?);
            } else {
                for line in format_detail_lines(std::slice::from_ref(&pokemon)) {
                    println!("{line}");
                }
            }
        }
        PokedexCommands::Types => {
            let types = client.types().await?;
            for entry in &types.results {
                println!("{}", entry.name);
            }
        }
        PokedexCommands::Type { name } => {
            let members = client.by_type(&name).await?;
            for member in &members {
                println!("{}", member.name);
            }
            println!("{} pokemon", members.len());
        }
    }

    Ok(())
}

pub fn format_detail_lines(rows: &[Pokemon]) -> Vec<String> {
    rows.iter()
        .map(|pokemon| {
            let types = pokemon
                .types
                .iter()
                .map(|slot| slot.kind.name.as_str())
                .collect::<Vec<_>>()
                .join("/");
            format!(
                "#{:<4} {:<14} height {:<4} weight {:<5} {types}",
                pokemon.id, pokemon.name, pokemon.height, pokemon.weight
            )
        })
        .collect()
}
