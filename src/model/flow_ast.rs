// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use smol_str::SmolStr;

/// Parsed flowchart: nodes keyed by their source identifier plus edges in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlowchartAst {
    direction: FlowDirection,
    nodes: BTreeMap<SmolStr, FlowNode>,
    edges: Vec<FlowEdge>,
}

impl FlowchartAst {
    pub fn new(direction: FlowDirection) -> Self {
        Self { direction, ..Self::default() }
    }

    pub fn direction(&self) -> FlowDirection {
        self.direction
    }

    pub fn set_direction(&mut self, direction: FlowDirection) {
        self.direction = direction;
    }

    pub fn nodes(&self) -> &BTreeMap<SmolStr, FlowNode> {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut BTreeMap<SmolStr, FlowNode> {
        &mut self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.get(id)
    }

    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    pub fn push_edge(&mut self, edge: FlowEdge) {
        self.edges.push(edge);
    }

    /// Node ids in the order they first appeared in the source.
    pub fn node_ids_in_declaration_order(&self) -> Vec<SmolStr> {
        let mut ids = self.nodes.iter().map(|(id, node)| (node.declared, id.clone())).collect::<Vec<_>>();
        ids.sort();
        ids.into_iter().map(|(_, id)| id).collect()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    #[default]
    TopDown,
    BottomUp,
    LeftRight,
    RightLeft,
}

impl FlowDirection {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "TD" | "TB" => Some(Self::TopDown),
            "BT" => Some(Self::BottomUp),
            "LR" => Some(Self::LeftRight),
            "RL" => Some(Self::RightLeft),
            _ => None,
        }
    }

    /// Whether layers advance along the vertical axis.
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::TopDown | Self::BottomUp)
    }

    pub fn is_reversed(self) -> bool {
        matches!(self, Self::BottomUp | Self::RightLeft)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    #[default]
    Rect,
    Round,
    Stadium,
    Circle,
    Diamond,
    Hexagon,
    Subroutine,
    Cylinder,
    Asymmetric,
}

impl NodeShape {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::Round => "round",
            Self::Stadium => "stadium",
            Self::Circle => "circle",
            Self::Diamond => "diamond",
            Self::Hexagon => "hexagon",
            Self::Subroutine => "subroutine",
            Self::Cylinder => "cylinder",
            Self::Asymmetric => "asymmetric",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowNode {
    label: String,
    shape: NodeShape,
    explicit: bool,
    declared: u32,
}

impl FlowNode {
    /// A node referenced only by id; its label is the id until an explicit declaration appears.
    pub fn implicit(id: &str, declared: u32) -> Self {
        Self { label: id.to_owned(), shape: NodeShape::Rect, explicit: false, declared }
    }

    pub fn new(label: impl Into<String>, shape: NodeShape, declared: u32) -> Self {
        Self { label: label.into(), shape, explicit: true, declared }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Label split on `<br>` variants and newlines.
    pub fn label_lines(&self) -> Vec<&str> {
        split_label_lines(&self.label)
    }

    pub fn shape(&self) -> NodeShape {
        self.shape
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn declared(&self) -> u32 {
        self.declared
    }

    pub fn redeclare(&mut self, label: impl Into<String>, shape: NodeShape) {
        self.label = label.into();
        self.shape = shape;
        self.explicit = true;
    }
}

pub(crate) fn split_label_lines(label: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = label;
    loop {
        let lower = rest.to_ascii_lowercase();
        let next_break = ["<br/>", "<br />", "<br>", "\n"]
            .iter()
            .filter_map(|tag| lower.find(tag).map(|idx| (idx, tag.len())))
            .min();
        match next_break {
            Some((idx, len)) => {
                lines.push(rest[..idx].trim());
                rest = &rest[idx + len..];
            }
            None => {
                lines.push(rest.trim());
                break;
            }
        }
    }
    lines
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EdgeStroke {
    #[default]
    Solid,
    Dotted,
    Thick,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ArrowHead {
    None,
    #[default]
    Arrow,
    Circle,
    Cross,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEdge {
    from: SmolStr,
    to: SmolStr,
    label: Option<String>,
    stroke: EdgeStroke,
    start: ArrowHead,
    end: ArrowHead,
}

impl FlowEdge {
    pub fn new(from: impl Into<SmolStr>, to: impl Into<SmolStr>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: None,
            stroke: EdgeStroke::Solid,
            start: ArrowHead::None,
            end: ArrowHead::Arrow,
        }
    }

    pub fn with_label<T: Into<String>>(mut self, label: Option<T>) -> Self {
        self.label = label.map(Into::into);
        self
    }

    pub fn with_stroke(mut self, stroke: EdgeStroke) -> Self {
        self.stroke = stroke;
        self
    }

    pub fn with_heads(mut self, start: ArrowHead, end: ArrowHead) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn stroke(&self) -> EdgeStroke {
        self.stroke
    }

    pub fn start_head(&self) -> ArrowHead {
        self.start
    }

    pub fn end_head(&self) -> ArrowHead {
        self.end
    }
}
