// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Command-line and environment configuration for the `structura` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::generate::DEFAULT_ENDPOINT;
use crate::model::Persona;
use crate::store::{JsonFileBackend, WriteDurability};
use crate::viewport::ViewportConfig;
use crate::workbench::WorkbenchConfig;

pub const APP_DIR_NAME: &str = "structura";
pub const LOG_FILE_NAME: &str = "structura.log";

/// Structura - turn a topic into a roadmap and a flowchart, then dive into any step.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "structura",
    version,
    about = "Turn a topic into a step-by-step roadmap plus a flowchart, with recursive deep-dives",
    after_help = "Logs are written to <state-dir>/structura.log (filter with STRUCTURA_LOG or RUST_LOG)."
)]
pub struct Cli {
    /// Directory holding the persisted state and the log file
    #[arg(long, env = "STRUCTURA_STATE_DIR", value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Generation endpoint that receives POSTed JSON requests
    #[arg(long, env = "STRUCTURA_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Audience for generated roadmaps (neutral, novice, engineer, academic)
    #[arg(long, env = "STRUCTURA_PERSONA", default_value = "neutral")]
    pub persona: Persona,

    /// Request timeout for the generation endpoint
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Directory exported diagrams are written to (defaults to the working directory)
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Sync persisted state to disk after every write
    #[arg(long)]
    pub durable_writes: bool,

    /// Serve canned results offline instead of calling the endpoint
    #[arg(long)]
    pub demo: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Topic to generate right after start-up
    #[arg(value_name = "TOPIC")]
    pub topic: Option<String>,
}

impl Cli {
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(default_state_dir)
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir().join(LOG_FILE_NAME)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn durability(&self) -> WriteDurability {
        if self.durable_writes {
            WriteDurability::Durable
        } else {
            WriteDurability::BestEffort
        }
    }

    pub fn snapshot_backend(&self) -> JsonFileBackend {
        JsonFileBackend::new(self.state_dir()).with_durability(self.durability())
    }

    pub fn workbench_config(&self) -> WorkbenchConfig {
        WorkbenchConfig { persona: self.persona, viewport: ViewportConfig::default(), export_dir: self.export_dir() }
    }
}

fn default_state_dir() -> PathBuf {
    dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR_NAME)
}
