// Year Progress - headless startup sync
// Loads settings and re-mirrors them for the live wallpaper

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yearprogress::{app, commands, config::AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yearprogress=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Year Progress");

    let config = AppConfig::from_env()?;
    let state = app::setup(config).await?;

    let progress = commands::get_year_progress();
    tracing::info!(
        "{}: day {} of {} ({}% of {})",
        progress.formatted_date,
        progress.day_of_year,
        progress.days_in_year,
        progress.percent,
        progress.year
    );

    let info = commands::get_app_info(&state);
    tracing::info!(
        "Settings synced to namespace {} (v{})",
        info.shared_prefs_namespace,
        info.version
    );

    // Let the startup mirror land before exiting
    state.settings.flush().await;

    match state.settings.mirrored().await {
        Ok(mirrored) if mirrored == state.settings.current() => {
            tracing::info!("Wallpaper preferences match the loaded settings");
        }
        Ok(_) => tracing::warn!("Wallpaper preferences differ from the loaded settings"),
        Err(e) => tracing::error!("Failed to read back wallpaper preferences: {}", e),
    }

    Ok(())
}
