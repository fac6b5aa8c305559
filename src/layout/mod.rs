// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Layout for flowcharts.
//!
//! Computes layered node placement in pixel units plus orthogonal edge routes.

pub mod flowchart;

pub use flowchart::{
    layout_flowchart, node_size, DiagramLayout, FlowchartLayoutError, PlacedNode, Point,
    RoutedEdge, CHAR_WIDTH, LINE_HEIGHT,
};
