use clap::Parser;
use log::error;

use hotdog_yolo::{run_training_pipeline, TrainArgs, UltralyticsCli};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = TrainArgs::parse();

    let config = match args.to_train_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid training configuration: {}", e);
            std::process::exit(1);
        }
    };
    let mut backend = UltralyticsCli::new(&args.yolo_bin);
    let mut stdout = std::io::stdout();

    if let Err(e) = run_training_pipeline(&mut backend, &config, &mut stdout) {
        error!("Training pipeline failed: {}", e);
        std::process::exit(1);
    }
}
