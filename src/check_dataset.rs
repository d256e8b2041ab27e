use clap::Parser;
use log::error;

use hotdog_yolo::{scan_split, CheckArgs};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CheckArgs::parse();

    for split in &args.splits {
        match scan_split(&args.yolo_root, split) {
            Ok(audit) => audit.print_summary(),
            Err(e) => {
                error!("Failed to scan split {}: {}", split, e);
                std::process::exit(1);
            }
        }
    }
}
