// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structura CLI entrypoint.
//!
//! Opens the persisted state, wires up a generation backend (HTTP endpoint or the offline demo)
//! and runs the terminal UI. Logs go to a file in the state directory so they never end up on
//! the terminal the UI draws to.

use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use structura::config::Cli;
use structura::generate::{DemoBackend, HttpBackend};
use structura::store::ContentStore;
use structura::workbench::Workbench;

fn setup_logging(log_path: &Path, verbose: bool) -> Result<(), Box<dyn Error>> {
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir)?;
    }
    let log_file = fs::File::create(log_path)?;

    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = match std::env::var("STRUCTURA_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::from_default_env().add_directive(level.into()),
    };

    tracing_subscriber::fmt().with_writer(log_file).with_ansi(false).with_env_filter(filter).init();
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    setup_logging(&cli.log_path(), cli.verbose)?;
    info!(state_dir = %cli.state_dir().display(), demo = cli.demo, persona = %cli.persona, "starting");

    let store = ContentStore::open(cli.snapshot_backend());
    let workbench = Workbench::new(store, cli.workbench_config());
    let workbench = if cli.demo {
        workbench.with_backend(Arc::new(DemoBackend::new()))
    } else {
        workbench.with_backend(Arc::new(HttpBackend::new(&cli.endpoint, cli.timeout())?))
    };

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let topic = cli.topic.clone();
    runtime.block_on(async move {
        let handle = tokio::runtime::Handle::current();
        tokio::task::spawn_blocking(move || {
            structura::tui::run(workbench, topic, handle).map_err(|err| err.to_string())
        })
        .await
    })??;

    info!("bye");
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("structura: {err}");
        std::process::exit(1);
    }
}
