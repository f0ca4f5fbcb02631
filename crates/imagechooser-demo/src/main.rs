// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image chooser desktop harness.
//
// Entry point. Initialises logging, loads the chooser config, opens the native
// file dialog through the chooser module, and prints the selection as JSON.
//
// Usage: imagechooser-demo [PATH]
//   With PATH the dialog is skipped and PATH is reported as the user's pick.
//   Ctrl-C while the dialog is open cancels the pick.
//
// The interactive dialog is supported on Linux and Windows only; on macOS
// pass PATH.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use imagechooser_bridge::PlatformBridge;
use imagechooser_bridge::desktop::DesktopBridge;
use imagechooser_core::{ChooserConfig, ChooserError};
use imagechooser_module::ImageChooserModule;

/// Config file looked up in the working directory.
const CONFIG_FILE: &str = "imagechooser.json";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config(Path::new(CONFIG_FILE));

    let (bridge, mut results) = match std::env::args().nth(1) {
        Some(path) => DesktopBridge::preselected(path),
        None => DesktopBridge::new(),
    };
    tracing::info!(platform = bridge.platform_name(), "Image chooser demo starting");
    let chooser = Arc::new(ImageChooserModule::new(Box::new(bridge), config));

    // Stand-in for the host's onActivityResult forwarding. Resolution reads
    // the picked file, so it runs on the blocking pool.
    let host = Arc::clone(&chooser);
    tokio::spawn(async move {
        while let Some(event) = results.recv().await {
            let host = Arc::clone(&host);
            match tokio::task::spawn_blocking(move || host.handle_activity_result(event)).await {
                Ok(true) => {}
                Ok(false) => tracing::warn!("Unrecognised activity result dropped"),
                Err(e) => tracing::error!(error = %e, "Activity result handler failed"),
            }
        }
    });

    let mut handle = chooser.pick_image();
    let finished = tokio::select! {
        outcome = &mut handle => Some(outcome),
        Ok(()) = tokio::signal::ctrl_c() => None,
    };
    let outcome = match finished {
        Some(outcome) => outcome,
        None => {
            tracing::info!("Interrupted, cancelling outstanding pick");
            chooser.reject_pending(ChooserError::Cancelled);
            handle.await
        }
    };

    let outcome = outcome.and_then(|selection| selection.to_json());
    match outcome {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {e}", e.code());
            ExitCode::FAILURE
        }
    }
}

/// Read the config file, falling back to defaults when absent or invalid.
fn load_config(path: &Path) -> ChooserConfig {
    if !path.exists() {
        return ChooserConfig::default();
    }
    match ChooserConfig::load(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "Loaded chooser config");
            config
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Invalid chooser config, using defaults");
            ChooserConfig::default()
        }
    }
}
