use super::prompts;
use super::progress::ProgressUI;
use crate::output::{Output, OutputFormat};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use dvr_sync_config::{Config, CredentialStore, PathManager};
use dvr_sync_sources::plex::auth;
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_config(cmd: crate::ConfigCommands, paths: &PathManager, output: &Output) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show { full } => show_config(full, paths, output),
        crate::ConfigCommands::Plex { token, server_url } => configure_plex(token, server_url, paths, output).await,
    }
}

fn load_config(paths: &PathManager) -> Result<Config> {
    let config_file = paths.config_file();
    Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))
}

fn load_credentials(paths: &PathManager) -> Result<CredentialStore> {
    let credentials_file = paths.credentials_file();
    let mut store = CredentialStore::new(credentials_file.clone());
    store
        .load()
        .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
    Ok(store)
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

/// The typed token, or the stored one when the input is blank.
fn choose_token(input: &str, existing: Option<&str>) -> Option<String> {
    let input = input.trim();
    if !input.is_empty() {
        return Some(input.to_string());
    }
    existing.map(str::to_string)
}

fn titled_table(title: &str) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![Cell::new(title).fg(Color::Cyan).add_attribute(Attribute::Bold)]);
    table
}

fn show_config(full: bool, paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run 'watchlist-dvr config plex' to create it. Showing defaults.");
    }

    let config = load_config(paths)?;
    let credentials = load_credentials(paths)?;
    let token = credentials.get_plex_token().map(String::as_str).unwrap_or("");
    let token_display = if full { token.to_string() } else { mask_string(token) };

    if output.format() != OutputFormat::Human {
        output.json(&json!({
            "config_file": config_file.display().to_string(),
            "credentials_file": paths.credentials_file().display().to_string(),
            "plex_token": token_display,
            "config": config,
        }));
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    println!("\n{}", "Configuration".bright_cyan().bold());
    println!("{}\n", config_file.display());

    let mut plex = titled_table("Plex");
    plex.add_row(vec![Cell::new("Server URL"), Cell::new(&config.plex.server_url)]);
    plex.add_row(vec![Cell::new("Discover URL"), Cell::new(&config.plex.discover_url)]);
    plex.add_row(vec![Cell::new("Token"), Cell::new(token_display)]);
    println!("{}\n", plex);

    let mut sections = titled_table("Sections");
    sections.add_row(vec![Cell::new("Movie library"), Cell::new(&config.sections.movie_library)]);
    sections.add_row(vec![Cell::new("Show library"), Cell::new(&config.sections.show_library)]);
    sections.add_row(vec![Cell::new("Movie DVR section"), Cell::new(&config.sections.movie_dvr)]);
    sections.add_row(vec![Cell::new("Show DVR section"), Cell::new(&config.sections.show_dvr)]);
    println!("{}\n", sections);

    let mut recording = titled_table("Recording");
    recording.add_row(vec![
        Cell::new("Movie target section"),
        Cell::new(&config.recording.movie_target_section_id),
    ]);
    recording.add_row(vec![
        Cell::new("Show target section"),
        Cell::new(&config.recording.show_target_section_id),
    ]);
    recording.add_row(vec![
        Cell::new("On submit error"),
        Cell::new(format!("{:?}", config.recording.on_submit_error).to_lowercase()),
    ]);
    for (id, value) in &config.recording.prefs {
        recording.add_row(vec![Cell::new(format!("prefs.{}", id)), Cell::new(value)]);
    }
    println!("{}", recording);

    Ok(())
}

async fn configure_plex(
    token_arg: Option<String>,
    server_url_arg: Option<String>,
    paths: &PathManager,
    output: &Output,
) -> Result<()> {
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create configuration directories: {}", e))?;

    let mut config = load_config(paths)?;
    let mut credentials = load_credentials(paths)?;

    let server_url = match server_url_arg {
        Some(url) => url.trim().to_string(),
        None => {
            let existing = Some(config.plex.server_url.as_str()).filter(|u| !u.is_empty());
            prompts::prompt_string("Plex Server URL (e.g. http://127.0.0.1:32400)", existing)?
                .trim()
                .to_string()
        }
    };

    let token = match token_arg {
        Some(token) => token.trim().to_string(),
        None => {
            let existing = credentials.get_plex_token().cloned();
            let prompt = if existing.is_some() {
                "Plex Token (Enter keeps the current one)"
            } else {
                "Plex Token"
            };
            let input = prompts::prompt_secret(prompt, existing.is_none(), existing.is_some())?;
            choose_token(&input, existing.as_deref()).unwrap_or_default()
        }
    };
    if token.is_empty() {
        return Err(eyre!("Plex token is required"));
    }

    config.plex.server_url = server_url;
    config.validate().map_err(|e| eyre!("Invalid configuration: {}", e))?;

    let ui = ProgressUI::new(output.is_human());
    ui.set_message("Verifying Plex token...");
    let verified = auth::verify_token(&token).await;
    ui.finish();

    match verified {
        Ok(true) => output.success("Token verified"),
        Ok(false) => {
            output.warn("Token verification failed. The token may be invalid.");
            if !output.is_human() || !prompts::prompt_yes_no("Save it anyway?", false)? {
                return Err(eyre!("Token verification failed"));
            }
        }
        Err(e) => output.warn(format!("Could not verify token: {}. Saving anyway.", e)),
    }

    let config_file = paths.config_file();
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    credentials.set_plex_token(token);
    credentials
        .save()
        .map_err(|e| eyre!("Failed to save credentials to {}: {}", paths.credentials_file().display(), e))?;

    output.success(format!("Plex configuration saved to {}", config_file.display()));
    Ok(())
}
