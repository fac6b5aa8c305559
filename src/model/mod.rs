// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A [`TopicResult`] holds the roadmap steps and the flowchart source produced for one topic.
//! The flowchart source parses into a [`FlowchartAst`].

pub mod fixtures;
pub mod flow_ast;
pub mod persona;
pub mod topic;
pub mod view;

pub use flow_ast::{FlowEdge, FlowNode, FlowchartAst};
pub use persona::{ParsePersonaError, Persona};
pub use topic::{ResourceLink, Step, TopicResult, TopicResultError};
pub use view::ViewMode;
