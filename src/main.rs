use anyhow::Result;
use log::{debug, info};

use config::{Config, USAGE};

mod config;
mod convert;
mod crop;
mod error;
mod frame;
mod loader;
mod rgb565;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        eprintln!("{USAGE}");
        return;
    }

    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("错误: {err:#}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    let _ = env_logger::builder()
        .filter_level(config.log_level())
        .try_init();

    if let Err(err) = run(&config) {
        debug!("{err:?}");
        eprintln!("Error loading or processing image: {err:#}");
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<()> {
    info!("{} -> {}", config.input.display(), config.output.display());
    if let Some(size) = config.crop {
        info!("居中裁剪到 {size} ({:?})", config.crop_policy);
    }
    let summary = convert::run(config)?;
    info!("完成: {} {} 字节", summary.size, summary.bytes);
    Ok(())
}
