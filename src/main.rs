use models::settings::{parse_flag, AppState, Settings};
use services::diagnostic_logger;

mod commands;
mod error;
mod models;
mod services;
mod utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging comes up before settings so file problems are visible
    let diagnostics = std::env::var("STREAMRELAY_DIAGNOSTICS")
        .map(|v| parse_flag(&v))
        .unwrap_or(true);
    diagnostic_logger::init_logging(diagnostics);

    let settings = Settings::load()?;
    diagnostic_logger::set_diagnostics_enabled(settings.diagnostics_enabled);

    log::info!(
        "[Main] Starting StreamRelay against {} (diagnostics {})",
        settings.twitch.api_base_url,
        if diagnostic_logger::is_diagnostics_enabled() { "on" } else { "off" }
    );

    let state = AppState::new(settings);
    utils::relay_server::serve(state).await;

    Ok(())
}
