use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use usacres::error::Result;
use usacres::{ensure_output_dir, Args, Downloader};

/// Main entry point for the application.
///
/// # Steps
/// 1. Parses arguments and initializes logging
/// 2. Builds and validates the configuration
/// 3. Creates the output directory (a failure is logged, not fatal)
/// 4. Downloads every strip in the date range
///
/// # Errors
/// Returns error if the arguments or the configuration are invalid. Failed
/// downloads do not affect the exit status.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.quiet, args.verbose);

    let config = args.into_config()?;
    info!(
        "Downloading strips {} through {} into {} with {} connections",
        config.start_date,
        config.end_date,
        config.output_dir.display(),
        config.workers
    );

    if let Err(e) = ensure_output_dir(&config.output_dir).await {
        error!("Could not create output directory ({})", e);
    }

    let downloader = Downloader::new(config)?;
    let summary = downloader.run(downloader.targets()).await;

    info!("{}", summary);
    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) {
    let level = if quiet {
        LevelFilter::ERROR
    } else if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
