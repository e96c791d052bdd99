use super::progress::ProgressUI;
use crate::output::Output;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use dvr_sync_config::{Config, CredentialStore, PathManager, SubmitErrorPolicy};
use dvr_sync_core::{ReconcileOptions, Reconciler};
use dvr_sync_models::MediaType;
use dvr_sync_sources::PlexClient;

pub struct ReconcileArgs {
    pub media_type: MediaType,
    pub server_url: Option<String>,
    pub token: Option<String>,
    pub continue_on_error: bool,
}

/// Config file plus command-line overrides, validated, and the token to use.
pub fn resolve_settings(args: &ReconcileArgs, paths: &PathManager) -> Result<(Config, String)> {
    let config_file = paths.config_file();
    let mut config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    if let Some(ref url) = args.server_url {
        config.plex.server_url = url.trim().to_string();
    }
    if args.continue_on_error {
        config.recording.on_submit_error = SubmitErrorPolicy::Continue;
    }
    config
        .validate()
        .map_err(|e| eyre!("Invalid configuration: {}", e))?;

    let token = match args.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => token.to_string(),
        None => {
            let credentials_file = paths.credentials_file();
            let mut store = CredentialStore::new(credentials_file.clone());
            store
                .load()
                .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
            store.get_plex_token().cloned().ok_or_else(|| {
                eyre!("No Plex token configured. Run 'watchlist-dvr config plex' or pass --token")
            })?
        }
    };

    Ok((config, token))
}

pub async fn run_reconcile(args: ReconcileArgs, paths: &PathManager, output: &Output) -> Result<()> {
    tracing::debug!("Reconcile command started");
    let (config, token) = resolve_settings(&args, paths)?;

    let client = PlexClient::from_config(&config, &token)
        .map_err(|e| eyre!("Failed to create Plex client: {}", e))?;
    let options = ReconcileOptions::from_config(&config, args.media_type);
    tracing::info!(
        server = %config.server_url(),
        media_type = %args.media_type,
        library = %options.library_section,
        dvr = %options.dvr_section,
        "Reconciling watchlist"
    );

    let ui = ProgressUI::new(output.is_human() && !output.is_quiet());
    ui.set_message(format!("Reconciling {} watchlist against {}...", args.media_type, config.server_url()));

    let result = Reconciler::new(&client, options).run().await;
    ui.finish();

    let report = result.wrap_err("Reconciliation failed")?;
    output.report(&report);
    Ok(())
}
