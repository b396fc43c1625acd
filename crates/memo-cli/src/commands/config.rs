use crate::cli::ConfigCommands;
use crate::commands::common::resolve_client_config;
use crate::config_profiles::{normalize_profile_url, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            api_url,
            pokedex_url,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            api_url,
            pokedex_url,
            no_activate,
        ),
        ConfigCommands::Show => run_config_show(global_profile),
    }
}

fn run_config_init(
    profile_name: Option<&str>,
    api_url: Option<String>,
    pokedex_url: Option<String>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);

    let api_url = api_url
        .map(|url| normalize_profile_url(url, "--api-url"))
        .transpose()
        .map_err(CliError::Config)?;
    let pokedex_url = pokedex_url
        .map(|url| normalize_profile_url(url, "--pokedex-url"))
        .transpose()
        .map_err(CliError::Config)?;

    let entry = config.profile_mut_or_default(&profile_name);
    if api_url.is_some() {
        entry.notes_api_url = api_url;
    }
    if pokedex_url.is_some() {
        entry.pokedex_api_url = pokedex_url;
    }

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!("Profile '{profile_name}' saved to {}", path.display());
    Ok(())
}

fn run_config_show(global_profile: Option<&str>) -> Result<(), CliError> {
    let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = profiles.resolve_profile_name(global_profile);
    let effective = resolve_client_config(global_profile, None)?;

    println!("profile: {profile_name}");
    println!("notes service: {}", effective.notes_base_url);
    println!("pokedex API: {}", effective.pokedex_base_url);
    println!("request timeout: {}s", effective.timeout_secs);
    Ok(())
}
