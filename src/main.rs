use clap::Parser;
use docs_harvest::persist::SaveOutcome;
use docs_harvest::settings::SettingsStore;
use docs_harvest::{CaptureState, ExportError, ExportReport, Exporter};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    ::log::info!("Exporting document: {}", args.url);

    let mut exporter = Exporter::new(&args.url);
    if let Some(path) = &args.config {
        exporter = match exporter.with_config_file(path) {
            Ok(exporter) => exporter,
            Err(e) => {
                ::log::error!("Failed to load config {}: {}", path, e);
                std::process::exit(2);
            }
        };
    }
    if let Some(output) = &args.output {
        exporter = exporter.with_output_dir(output);
    }
    if let Some(webdriver_url) = &args.webdriver_url {
        exporter = exporter.with_webdriver_url(webdriver_url);
    }

    // An explicit mode is remembered; otherwise the saved one is used
    match SettingsStore::open(&args.settings) {
        Ok(mut settings) => {
            let mode = match args.mode {
                Some(mode) => {
                    let mode = mode.into();
                    if let Err(e) = settings.set_export_mode(mode) {
                        ::log::warn!("Could not save export mode: {}", e);
                    }
                    mode
                }
                None => exporter
                    .config()
                    .export_mode
                    .unwrap_or_else(|| settings.export_mode()),
            };
            exporter = exporter.with_export_mode(mode);
        }
        Err(e) => {
            ::log::warn!("Ignoring unreadable settings {}: {}", args.settings, e);
            if let Some(mode) = args.mode {
                exporter = exporter.with_export_mode(mode.into());
            }
        }
    }

    println!("Note: exporting requires a WebDriver server (e.g., ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444"
    );

    // First Ctrl-C stops scrolling and exports what was captured; a second one exits
    let stop = exporter.stop_handle();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if stop.is_stop_requested() {
                eprintln!("Interrupted");
                std::process::exit(130);
            }
            ::log::info!("Stop requested, finishing with the blocks captured so far");
            println!("Stopping; press Ctrl-C again to quit immediately");
            stop.request_stop();
        }
    });

    let start_time = std::time::Instant::now();
    match exporter.run().await {
        Ok(report) => {
            print_report(&report);
            ::log::info!(
                "Export complete in {:.2} seconds",
                start_time.elapsed().as_secs_f64()
            );
        }
        Err(e) => match e.downcast_ref::<ExportError>() {
            Some(ExportError::NoContentCaptured) => {
                println!("No content captured; is the document empty or still loading?");
            }
            Some(ExportError::CaptureCancelled) => {
                println!("Export cancelled before capture started");
                std::process::exit(130);
            }
            _ => {
                ::log::error!("Export failed: {}", e);
                std::process::exit(1);
            }
        },
    }
}

fn print_report(report: &ExportReport) {
    if report.state == CaptureState::Stopping {
        println!("Capture stopped early; exporting the partial document");
    }
    println!("Title:  {}", report.title);
    println!("Blocks: {}", report.blocks);
    println!("Images: {} saved", report.images_saved);
    if !report.images_failed.is_empty() {
        println!("        {} failed:", report.images_failed.len());
        for url in &report.images_failed {
            println!("          {}", url);
        }
    }

    match &report.outcome {
        SaveOutcome::Folder { location, files } => {
            println!("Saved {} files to {}", files.len(), location);
            for file in files {
                println!("  {}", file);
            }
        }
        SaveOutcome::SingleFile { location, file } => {
            println!("Folder export was refused; saved {} to {}", file, location);
        }
        SaveOutcome::Cancelled => println!("Save cancelled"),
    }
}
