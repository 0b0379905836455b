// UI layer: implements the two command flows (single asset and `all`)
// on top of the API client. The functions are small and synchronous to
// make the flow easy to follow.

use crate::api::ApiClient;
use anyhow::Result;
use chrono::NaiveDateTime;
use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info};

/// Run the encode flow for `asset_id`. The special value `all` searches
/// the whole library for motion photos and queues one batch job after
/// asking for confirmation; any other value targets a single asset.
pub fn run(api: &ApiClient, asset_id: &str, taken_after: Option<NaiveDateTime>) -> Result<()> {
    info!("Starting for asset id {}", asset_id);

    if asset_id.eq_ignore_ascii_case("all") {
        encode_all(api, taken_after)
    } else {
        encode_single(api, asset_id)
    }
}

/// Bulk flow: find every motion photo, confirm, queue one batch job.
fn encode_all(api: &ApiClient, taken_after: Option<NaiveDateTime>) -> Result<()> {
    println!("Searching for MP assets...");

    // The scan can take a while on large libraries; show a spinner while
    // the pagination loop runs.
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spinner.set_message("Scanning library...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    let mp_assets = api.get_mp_assets(taken_after);
    spinner.finish_and_clear();

    let Some(mp_assets) = mp_assets? else {
        println!("{}", style("Found 0 MP assets").bold());
        return Ok(());
    };

    let proceed = Confirm::new()
        .with_prompt(format!(
            "Found {} MP assets. Start encoding?",
            mp_assets.len()
        ))
        .default(false)
        .interact()?;
    if !proceed {
        println!("Aborted.");
        return Ok(());
    }

    // Every asset survived the live-video filter, so the ids are present.
    let live_video_ids: Vec<String> = mp_assets
        .iter()
        .filter_map(|asset| asset.live_photo_video_id.clone())
        .collect();

    println!("Queuing encoding jobs...");
    match api.transcode_assets(&live_video_ids) {
        Ok(()) => println!(
            "{}",
            style(format!("{} jobs queued!", mp_assets.len())).bold()
        ),
        Err(e) => {
            debug!("Transcode submission failed: {:#}", e);
            println!("{}", style("An error occurred!").red().bold());
        }
    }
    Ok(())
}

/// Single-asset flow: look the asset up and queue a job for its live
/// video, reporting the miss cases distinctly.
fn encode_single(api: &ApiClient, asset_id: &str) -> Result<()> {
    let asset = api.get_asset_info(asset_id)?;
    debug!("Asset data: {:?}", asset);

    let Some(asset) = asset else {
        println!(
            "{}",
            style(format!("No asset found with id {}!", asset_id))
                .yellow()
                .bold()
        );
        return Ok(());
    };

    let Some(live_video_id) = asset.live_photo_video_id else {
        println!(
            "{}",
            style(format!("Asset {} has no live video", asset_id))
                .yellow()
                .bold()
        );
        return Ok(());
    };

    println!(
        "Found live video with id {}. Queuing encoding job...",
        live_video_id
    );
    match api.transcode_assets(&[live_video_id]) {
        Ok(()) => println!("{}", style("Encoding job queued!").bold()),
        Err(e) => {
            debug!("Transcode submission failed: {:#}", e);
            println!("{}", style("An error occurred!").red().bold());
        }
    }
    Ok(())
}
