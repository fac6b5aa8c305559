// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt::Write as _;

use structura::layout::DiagramLayout;
use structura::model::fixtures::{DNS_DIAGRAM_SOURCE, SHOWCASE_DIAGRAM_SOURCE};

#[derive(Debug, Clone, Copy)]
pub enum Case {
    Dns,
    Showcase,
    /// Generated: `layers` layers of `width` nodes with forward fan-out and a few back edges.
    Layered { layers: usize, width: usize },
}

impl Case {
    pub const ALL: [Case; 4] = [
        Case::Dns,
        Case::Showcase,
        Case::Layered { layers: 8, width: 6 },
        Case::Layered { layers: 20, width: 12 },
    ];

    /// Stable benchmark id; keep these unchanged so results stay comparable.
    pub fn id(self) -> String {
        match self {
            Self::Dns => "dns".to_owned(),
            Self::Showcase => "showcase".to_owned(),
            Self::Layered { layers, width } => format!("layered_{layers}x{width}"),
        }
    }

    pub fn source(self) -> String {
        match self {
            Self::Dns => DNS_DIAGRAM_SOURCE.to_owned(),
            Self::Showcase => SHOWCASE_DIAGRAM_SOURCE.to_owned(),
            Self::Layered { layers, width } => layered_source(layers, width),
        }
    }
}

fn layered_source(layers: usize, width: usize) -> String {
    let mut out = String::from("flowchart TD\n");
    for layer in 0..layers {
        for idx in 0..width {
            let _ = writeln!(out, "  n{layer}_{idx}[\"Step {layer}.{idx}<br>detail\"]");
        }
    }
    for layer in 1..layers {
        for idx in 0..width {
            let from = (idx * 7 + layer) % width;
            let _ = writeln!(out, "  n{}_{from} --> n{layer}_{idx}", layer - 1);
            if idx % 3 == 0 {
                let _ = writeln!(out, "  n{}_{idx} -.->|retry| n{layer}_{}", layer - 1, (idx + 1) % width);
            }
        }
        if layer % 4 == 0 {
            let _ = writeln!(out, "  n{layer}_0 ==> n{}_0", layer - 3);
        }
    }
    out
}

/// Folds a layout into one number so the optimizer cannot drop the work.
pub fn checksum_layout(layout: &DiagramLayout) -> u64 {
    let mut acc = (layout.width() as u64) ^ ((layout.height() as u64) << 20);
    for node in layout.nodes() {
        acc = acc.wrapping_mul(31).wrapping_add(node.center().x as u64 ^ node.center().y as u64);
    }
    for edge in layout.edges() {
        acc = acc.wrapping_mul(17).wrapping_add(edge.points().len() as u64);
    }
    acc
}
