// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mermaid flowchart parsing.

pub mod flowchart;
mod ident;

pub use flowchart::{
    parse_flowchart, MermaidFlowchartParseError, MermaidIdentError, MAX_FLOWCHART_EDGES,
    MAX_FLOWCHART_NODES,
};
