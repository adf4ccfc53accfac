// Entrypoint for the CLI application.
// - Keeps `main` small: read config, build the API client, dispatch.
// - `upload` / `retry` run one batch unattended; no argument opens the menu.

use asset_uploader::{api::ApiClient, config::Config, ui};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let api = ApiClient::from_config(&config)?;

    match std::env::args().nth(1).as_deref() {
        None => ui::main_menu(&api, &config)?,
        Some("upload") => ui::upload_flow(&api, &config)?,
        Some("retry") => ui::retry_flow(&api, &config)?,
        Some(other) => {
            eprintln!("Unknown command '{}'. Usage: asset-uploader [upload|retry]", other);
        }
    }
    Ok(())
}
