use std::path::PathBuf;

use crate::app::{AppContext, Result};
use crate::domain::ValidatedImage;
use crate::server::{self, PHOTO_FILENAME, PROFILE_FILENAME};

pub async fn serve(ctx: &AppContext, port: Option<u16>) -> Result<()> {
    let mut config = ctx.config.server.clone();
    if let Some(port) = port {
        config.port = port;
    }
    println!("Listening on {}:{}", config.bind, config.port);
    server::serve(ctx.app_state(), &config).await
}

pub async fn scrape(ctx: &AppContext, url: &str) -> Result<()> {
    let metadata = ctx.orchestrator.scrape_video(url).await?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}

pub async fn description(ctx: &AppContext, url: &str) -> Result<()> {
    let description = ctx.orchestrator.describe(url).await?;
    println!("{}", serde_json::to_string_pretty(&description)?);
    Ok(())
}

pub async fn photo(ctx: &AppContext, url: &str, output: Option<PathBuf>) -> Result<()> {
    let selection = ctx.orchestrator.scrape_photo(url).await?;
    println!("Tried {} candidates", selection.tried.len());
    let image = selection.into_result()?;
    save_image(&image, output, PHOTO_FILENAME).await
}

pub async fn profile(ctx: &AppContext, url: &str, output: Option<PathBuf>) -> Result<()> {
    let selection = ctx.orchestrator.download_profile_picture(url).await?;
    println!("Tried {} candidates", selection.tried.len());
    let image = selection.into_result()?;
    save_image(&image, output, PROFILE_FILENAME).await
}

pub async fn candidates(ctx: &AppContext, url: &str, profile: bool) -> Result<()> {
    let candidates = if profile {
        ctx.orchestrator.profile_candidates(url).await?
    } else {
        ctx.orchestrator.photo_candidates(url).await?
    };

    if candidates.is_empty() {
        println!("No candidates");
        return Ok(());
    }
    for (rank, candidate) in candidates.iter().enumerate() {
        println!("{:>3}. {}", rank + 1, candidate);
    }
    Ok(())
}

async fn save_image(image: &ValidatedImage, output: Option<PathBuf>, stem: &str) -> Result<()> {
    let path = output.unwrap_or_else(|| default_output(stem, image));
    tokio::fs::write(&path, &image.bytes).await?;
    println!(
        "Saved {} ({} bytes) from {}",
        path.display(),
        image.size_bytes(),
        image.source_url
    );
    Ok(())
}

fn default_output(stem: &str, image: &ValidatedImage) -> PathBuf {
    PathBuf::from(format!("{}.{}", stem, image.format.extension()))
}
