use log::{error, info};
use std::env;
use std::sync::atomic::Ordering;
use tokio::io::{AsyncBufReadExt, BufReader};

use recipe_harvest::{HarvestConfig, RecipeHarvester};

/// URLs from the command line, or one per line on stdin when none are given.
async fn read_urls() -> Result<Vec<String>, std::io::Error> {
    let args: Vec<String> = env::args().skip(1).collect();
    if !args.is_empty() {
        return Ok(args);
    }

    let mut urls = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if !line.is_empty() {
            urls.push(line.to_string());
        }
    }
    Ok(urls)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = HarvestConfig::load()?;
    let urls = read_urls().await?;
    if urls.is_empty() {
        return Err("Please provide URLs as arguments or on stdin".into());
    }

    let mut harvester = RecipeHarvester::builder().config(config).build()?;

    let stop = harvester.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, finishing the current URL");
            stop.store(true, Ordering::SeqCst);
        }
    });

    let result = harvester.process_urls(&urls).await;
    harvester.shutdown();

    match result {
        Ok(summary) => {
            println!(
                "{} new recipes, {} duplicates, {} of {} URLs failed",
                summary.accepted, summary.duplicates, summary.failed, summary.processed
            );
            Ok(())
        }
        Err(e) => {
            error!("Batch failed: {}", e);
            Err(e.into())
        }
    }
}
