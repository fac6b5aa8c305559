// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structura: turn a topic into a step roadmap plus a flowchart, then deep-dive any step.
//!
//! The library holds everything but the terminal plumbing: the content store with its persisted
//! snapshot, the lazily expanded exploration tree, the diagram viewport (Mermaid flowchart
//! parsing, layout, SVG/PNG rendering) and the generation backends.

pub mod config;
pub mod explore;
pub mod format;
pub mod generate;
pub mod history;
pub mod layout;
pub mod model;
pub mod render;
pub mod store;
pub mod tui;
pub mod viewport;
pub mod workbench;
