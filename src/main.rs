use clap::Parser;
use ttg_dl::{CategoryDownload, Credentials, Error};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();
    let credentials = Credentials::new(args.username, args.password);

    let mut download = CategoryDownload::new(args.id).with_output_root(args.output_dir);
    if let Some(path) = &args.config {
        download = match download.with_config_file(path) {
            Ok(download) => download,
            Err(e) => exit_with(e),
        };
    }
    if let Some(url) = args.webdriver_url.filter(|url| !url.is_empty()) {
        download = download.with_webdriver_url(url);
    }
    if args.headful {
        download = download.with_headless(false);
    }
    if let Some(seconds) = args.download_wait {
        download = download.with_download_wait(seconds);
    }

    ::log::info!(
        "Using WebDriver at {} (headless: {})",
        download.config().webdriver_url,
        download.config().headless
    );

    let start_time = std::time::Instant::now();
    match download.run(&credentials).await {
        Ok(summary) => {
            ::log::info!(
                "Archived {} items from {} pages in {:.2} seconds",
                summary.items.len(),
                summary.pages_visited,
                start_time.elapsed().as_secs_f64()
            );
        }
        Err(e) => exit_with(e),
    }
}

fn exit_with(error: Error) -> ! {
    match &error {
        Error::LoginTimeout { .. } => {
            eprintln!("Could not log in! Are your credentials correct?");
        }
        other => {
            ::log::error!("Archiving failed: {}", other);
            eprintln!("Error: {}", other);
        }
    }
    std::process::exit(error.exit_code())
}
