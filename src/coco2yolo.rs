use clap::Parser;
use log::{error, info};

use hotdog_yolo::{process_dataset, ConvertArgs};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = ConvertArgs::parse();

    info!("Starting the COCO to YOLO label conversion...");

    match process_dataset(&args) {
        Ok(summary) => summary.print_summary(),
        Err(e) => {
            error!("Failed to convert dataset: {}", e);
            std::process::exit(1);
        }
    }
}
