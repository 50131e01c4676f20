use clap::Parser;
use image_grab::{GrabberConfig, logging};
use std::process::ExitCode;

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command-line arguments
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => GrabberConfig::from_file(path),
        None => Ok(GrabberConfig::default()),
    };
    let (mut config, config_error) = match loaded {
        Ok(config) => (config.with_env_overrides(), None),
        Err(e) => (GrabberConfig::default(), Some(e)),
    };
    args.apply_to(&mut config);

    if let Err(e) = logging::init(&config.log_level, config.log_file.as_deref()) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }
    if let Some(e) = config_error {
        ::log::error!("{}", e);
        return ExitCode::FAILURE;
    }

    match &args.command {
        Command::Search(search) => {
            let request = search.to_request(&config);
            match image_grab::run(&config, request).await {
                Ok(report) => {
                    let (saved, total) = report.saved_of_total();
                    println!(
                        "{}: {} links found, {} of {} images saved",
                        report.query,
                        report.links.len(),
                        saved,
                        total
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    ::log::error!("Session failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Command::Download(download) => {
            match image_grab::download_links_file(
                &config,
                &download.links_file,
                &download.destination,
            )
            .await
            {
                Ok(summary) => {
                    println!("{} of {} images saved", summary.saved, summary.total);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    ::log::error!("Download failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
