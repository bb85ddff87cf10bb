//! Wearcast command line entry point.
//!
//! Scores the weather for a coordinate given as arguments, or for the
//! host's IP-derived position when none are given, and prints the
//! resulting outfit recommendation.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;

use wearcast_app::{App, ViewState};
use wearcast_client::RequestGateway;
use wearcast_core::Config;
use wearcast_location::Coordinate;

#[tokio::main]
async fn main() -> Result<()> {
    wearcast_core::init()?;

    let (config, _validation) = Config::load_validated()?;
    tracing::info!(backend = %config.backend.base_url, "Wearcast started");

    let timeout = Duration::from_millis(config.backend.request_timeout_ms);
    let gateway = RequestGateway::new(&config.backend.base_url, timeout);
    match gateway.health(&CancellationToken::new()).await {
        Ok(true) => tracing::debug!("Backend healthy"),
        Ok(false) => tracing::warn!("Backend health check reported a problem"),
        Err(err) => tracing::warn!(error = %err, "Backend health check failed"),
    }

    let app = App::from_config(&config);

    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [] => {
            tracing::info!("No coordinates given, resolving position");
            if !app.use_my_location().await {
                let view = app.view();
                bail!(
                    "could not resolve a position: {}",
                    view.location_error
                        .unwrap_or_else(|| "unknown error".to_string())
                );
            }
        }
        [latitude, longitude] => {
            submit_coordinates(&app, latitude, longitude, None)?;
        }
        [latitude, longitude, comfort] => {
            submit_coordinates(&app, latitude, longitude, Some(comfort.as_str()))?;
        }
        _ => bail!("usage: wearcast [latitude longitude [comfort_f]]"),
    }

    let view = settled_view(&app).await?;
    if let Some(failure) = view.fetch_error {
        bail!("recommendation failed: {}", failure);
    }
    let recommendation = match view.recommendation {
        Some(recommendation) => recommendation,
        None => bail!("the service returned no recommendation"),
    };

    if let Some(label) = &view.place_label {
        println!("Location: {}", label);
    }
    if let Some((latitude, longitude)) = view.coordinate {
        println!("Coordinates: {}, {}", latitude, longitude);
    }
    let weather = &recommendation.weather;
    println!(
        "Weather: {} ({:.0} F, wind {:.0} mph)",
        weather.short_forecast, weather.temp_f, weather.wind_mph
    );
    println!("Comfort score: {:.1}", recommendation.comfort_score);
    if !recommendation.clothing_recommendations.is_empty() {
        println!("\nWhat to wear:");
        for item in &recommendation.clothing_recommendations {
            if item.category.is_empty() {
                println!("  - {}", item.name);
            } else {
                println!("  - {} ({})", item.name, item.category);
            }
        }
    }

    Ok(())
}

/// Feed the coordinate form the way a frontend would; the request fires
/// once both fields resolve.
fn submit_coordinates(
    app: &App,
    latitude: &str,
    longitude: &str,
    comfort: Option<&str>,
) -> Result<()> {
    if let Some(comfort) = comfort {
        app.set_comfort_input(comfort);
    }
    app.edit_latitude(latitude);
    app.edit_longitude(longitude);
    match app.field_values() {
        (Some(latitude), Some(longitude)) => {
            Coordinate::new(latitude, longitude)
                .context("coordinates must be within -90..=90 and -180..=180")?;
            Ok(())
        }
        _ => bail!("coordinates must be decimal degrees, e.g. wearcast 40.7128 -74.006"),
    }
}

async fn settled_view(app: &App) -> Result<ViewState> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(15);
    loop {
        let view = app.view();
        if !view.fetching && !view.locating {
            return Ok(view);
        }
        if tokio::time::Instant::now() >= deadline {
            bail!("timed out waiting for the recommendation");
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
