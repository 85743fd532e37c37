//! Application startup
//!
//! Wires the pieces together: settings, logging, the lookup client, one
//! explicitly constructed controller, the display subscriber, and the
//! Ctrl-C handler that turns an interrupt into a cooperative stop.

use crate::app::cli::args::Args;
use crate::app::cli::config::Settings;
use crate::app::display;
use crate::batch::api::BatchController;
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::init_logging;
use crate::export::{export_csv, export_json, ExportFormat, ExportOptions};
use crate::lookup::api::BreachClient;
use crate::notifications::api::{
    AsyncNotificationManager, Event, EventFilter, ManagerSink,
};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Exit codes: 0 success, 1 scan failed, 2 usage/configuration problem.
pub async fn run() -> u8 {
    let args = Args::parse();

    let settings = match Settings::load(&args).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            return 2;
        }
    };

    if let Some(color) = settings.color {
        colored::control::set_override(color);
    }
    let color_enabled = settings.color.unwrap_or(true);

    if let Err(e) = init_logging(
        settings.log_level.as_deref(),
        settings.log_format.as_deref(),
        settings.log_file.as_deref(),
        color_enabled,
    ) {
        eprintln!("Error initialising logging: {e}");
        return 2;
    }

    log::info!(
        "breachscan {} ({} {})",
        env!("CARGO_PKG_VERSION"),
        crate::BUILD_TIME,
        crate::GIT_HASH
    );

    let emails = match collect_emails(&args).await {
        Ok(emails) => emails,
        Err(code) => return code,
    };

    let Some(api_key) = settings.api_key.clone() else {
        log::error!(
            "An API key is required. Set it via --api-key, the config file, \
             or the HIBP_API_KEY environment variable."
        );
        return 2;
    };

    let client = match BreachClient::new(&api_key) {
        Ok(client) => client,
        Err(e) => {
            log_error_with_context(&e, "Failed to construct lookup client");
            return 2;
        }
    };

    // Event plumbing: one manager, a display subscriber, and a lifecycle
    // subscriber this function blocks on.
    let manager = Arc::new(Mutex::new(AsyncNotificationManager::new()));
    let (display_rx, mut lifecycle_rx) = {
        let mut guard = manager.lock().await;
        let display_rx = guard
            .subscribe(
                "display".to_string(),
                EventFilter::All,
                "cli:display".to_string(),
            )
            .expect("fresh manager accepts subscribers");
        let lifecycle_rx = guard
            .subscribe(
                "lifecycle".to_string(),
                EventFilter::Lifecycle,
                "cli:startup".to_string(),
            )
            .expect("fresh manager accepts subscribers");
        (display_rx, lifecycle_rx)
    };

    let controller = Arc::new(BatchController::new(
        Arc::new(client),
        Arc::new(ManagerSink::new(Arc::clone(&manager))),
        settings.rate_limit_per_minute,
        settings.check_pastes,
    ));

    let display_task = display::spawn_display(display_rx);

    let batch_id = match controller.start(&emails).await {
        Ok(batch_id) => batch_id,
        Err(e) => {
            log_error_with_context(&e, "Failed to start batch scan");
            return 1;
        }
    };

    // Block until the batch reaches a terminal state. Ctrl-C requests a
    // cooperative stop; the worker still publishes its completion event,
    // which ends this loop.
    let exit_code = loop {
        tokio::select! {
            event = lifecycle_rx.recv() => match event {
                Some(Event::Completed(_)) => break 0,
                Some(Event::Error(_)) => break 1,
                None => break 1,
                Some(_) => {}
            },
            _ = tokio::signal::ctrl_c() => {
                log::warn!("Interrupt received; stopping after the current address");
                if let Err(e) = controller.stop().await {
                    log_error_with_context(&e, "Failed to stop batch scan");
                    break 1;
                }
            }
        }
    };

    if let Some(format) = &args.export {
        export_results(&args, &settings, &controller, &batch_id, format).await;
    }

    // Dropping the controller and manager closes the event channels,
    // letting the display task drain and exit.
    drop(controller);
    drop(manager);
    let _ = display_task.await;

    exit_code
}

async fn collect_emails(args: &Args) -> Result<Vec<String>, u8> {
    let mut emails = args.emails.clone();

    if let Some(path) = &args.input {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                emails.extend(
                    contents
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(str::to_string),
                );
            }
            Err(e) => {
                log::error!("Failed to read input file {}: {}", path.display(), e);
                return Err(2);
            }
        }
    }

    if emails.is_empty() {
        log::error!("No email addresses given; use --email or --input");
        return Err(2);
    }

    Ok(emails)
}

async fn export_results(
    args: &Args,
    settings: &Settings,
    controller: &BatchController,
    batch_id: &str,
    format: &str,
) {
    let Ok(format) = format.parse::<ExportFormat>() else {
        log::error!("Unknown export format '{format}'");
        return;
    };

    let results = match controller.results() {
        Ok(results) => results,
        Err(e) => {
            log_error_with_context(&e, "Failed to read scan results");
            return;
        }
    };
    let statistics = controller.statistics().ok().flatten();

    let options = ExportOptions {
        exclude_clean: args.exclude_clean,
        only_high_severity: args.only_high_severity,
    };

    let outcome = match format {
        ExportFormat::Json => {
            export_json(
                &results,
                statistics.as_ref(),
                batch_id,
                &settings.export_dir,
                &options,
            )
            .await
        }
        ExportFormat::Csv => {
            export_csv(&results, batch_id, &settings.export_dir, &options).await
        }
    };

    match outcome {
        Ok(path) => println!("Results exported to {}", path.display()),
        Err(e) => log_error_with_context(&e, "Export failed"),
    }
}
