// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};

use smol_str::SmolStr;
use thiserror::Error;

use crate::model::flow_ast::{ArrowHead, EdgeStroke, FlowDirection, FlowchartAst, NodeShape};

/// Average glyph advance used for label metrics.
pub const CHAR_WIDTH: f32 = 8.0;
pub const LINE_HEIGHT: f32 = 18.0;

const PADDING_X: f32 = 16.0;
const PADDING_Y: f32 = 10.0;
const MIN_NODE_WIDTH: f32 = 64.0;
const NODE_GAP: f32 = 40.0;
const LAYER_GAP: f32 = 64.0;
const MARGIN: f32 = 24.0;
const BACK_EDGE_LANE_GAP: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Positioned flowchart in pixel units.
///
/// The size is intrinsic to the graph; zooming a viewport never changes it.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramLayout {
    direction: FlowDirection,
    width: f32,
    height: f32,
    layers: Vec<Vec<SmolStr>>,
    nodes: Vec<PlacedNode>,
    edges: Vec<RoutedEdge>,
}

impl DiagramLayout {
    pub fn direction(&self) -> FlowDirection {
        self.direction
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn layers(&self) -> &[Vec<SmolStr>] {
        &self.layers
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> &[PlacedNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&PlacedNode> {
        self.nodes.iter().find(|node| node.id.as_str() == id)
    }

    pub fn edges(&self) -> &[RoutedEdge] {
        &self.edges
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    id: SmolStr,
    label_lines: Vec<String>,
    shape: NodeShape,
    center: Point,
    width: f32,
    height: f32,
    layer: usize,
    index_in_layer: usize,
}

impl PlacedNode {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label_lines(&self) -> &[String] {
        &self.label_lines
    }

    pub fn shape(&self) -> NodeShape {
        self.shape
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Top-left corner.
    pub fn origin(&self) -> Point {
        Point::new(self.center.x - self.width / 2.0, self.center.y - self.height / 2.0)
    }

    pub fn layer(&self) -> usize {
        self.layer
    }

    pub fn index_in_layer(&self) -> usize {
        self.index_in_layer
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutedEdge {
    from: SmolStr,
    to: SmolStr,
    points: Vec<Point>,
    label: Option<String>,
    label_anchor: Point,
    stroke: EdgeStroke,
    start: ArrowHead,
    end: ArrowHead,
    back_edge: bool,
}

impl RoutedEdge {
    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    /// Orthogonal polyline from the source boundary to the target boundary.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn label_anchor(&self) -> Point {
        self.label_anchor
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

    /// Whether the edge closes a cycle and is routed around the outside.
    pub fn is_back_edge(&self) -> bool {
        self.back_edge
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowchartLayoutError {
    #[error("flowchart has no nodes to lay out")]
    Empty,
    #[error("edge {from} -> {to} references unknown node {missing}")]
    UnknownNode { from: String, to: String, missing: String },
}

/// Width and height of a node box for its label and shape.
pub fn node_size(lines: &[&str], shape: NodeShape) -> (f32, f32) {
    let widest = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0) as f32;
    let text_w = widest * CHAR_WIDTH;
    let text_h = lines.len().max(1) as f32 * LINE_HEIGHT;

    let mut width = (text_w + 2.0 * PADDING_X).max(MIN_NODE_WIDTH);
    let mut height = text_h + 2.0 * PADDING_Y;
    match shape {
        NodeShape::Diamond => {
            width += height;
            height *= 1.6;
        }
        NodeShape::Hexagon | NodeShape::Asymmetric => width += 24.0,
        NodeShape::Circle => {
            let side = width.max(height);
            width = side;
            height = side;
        }
        NodeShape::Stadium => width += height / 2.0,
        NodeShape::Subroutine | NodeShape::Cylinder => {
            width += 12.0;
            height += 8.0;
        }
        NodeShape::Rect | NodeShape::Round => {}
    }
    (width, height)
}

/// Splits edges into forward edges (respecting a DFS order from declaration order) and back
/// edges that would close a cycle. Self-loops are back edges.
fn classify_back_edges(node_count: usize, edges: &[(usize, usize)]) -> BTreeSet<usize> {
    let mut outgoing = vec![Vec::<(usize, usize)>::new(); node_count];
    for (edge_idx, (from, to)) in edges.iter().enumerate() {
        outgoing[*from].push((*to, edge_idx));
    }

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; node_count];
    let mut back = BTreeSet::new();

    for root in 0..node_count {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::OnStack;

        while let Some((node, next_child)) = stack.last_mut() {
            let node = *node;
            if let Some(&(to, edge_idx)) = outgoing[node].get(*next_child) {
                *next_child += 1;
                match marks[to] {
                    Mark::OnStack => {
                        back.insert(edge_idx);
                    }
                    Mark::Unvisited => {
                        marks[to] = Mark::OnStack;
                        stack.push((to, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }

    back
}

fn topo_sort(node_count: usize, outgoing: &[Vec<usize>]) -> Vec<usize> {
    let mut indegree = vec![0usize; node_count];
    for tos in outgoing {
        for to in tos {
            indegree[*to] += 1;
        }
    }

    let mut ready = (0..node_count).filter(|idx| indegree[*idx] == 0).collect::<BTreeSet<_>>();
    let mut topo = Vec::with_capacity(node_count);
    while let Some(next) = ready.pop_first() {
        topo.push(next);
        for to in &outgoing[next] {
            indegree[*to] = indegree[*to].saturating_sub(1);
            if indegree[*to] == 0 {
                ready.insert(*to);
            }
        }
    }
    topo
}

fn assign_layers(topo: &[usize], outgoing: &[Vec<usize>]) -> Vec<usize> {
    let mut layers = vec![0usize; outgoing.len()];
    for from in topo {
        for to in &outgoing[*from] {
            layers[*to] = layers[*to].max(layers[*from] + 1);
        }
    }
    layers
}

fn sort_layer_by_barycenter(
    layer_nodes: &mut [usize],
    prev_positions: &BTreeMap<usize, usize>,
    predecessors: &[Vec<usize>],
) {
    let barycenter = |node: usize| {
        let (sum, count) = predecessors[node]
            .iter()
            .filter_map(|p| prev_positions.get(p).copied())
            .fold((0usize, 0usize), |(sum, count), pos| (sum + pos, count + 1));
        (count > 0).then_some((sum, count))
    };

    layer_nodes.sort_by(|a, b| match (barycenter(*a), barycenter(*b)) {
        (None, None) => a.cmp(b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (Some((sum_a, count_a)), Some((sum_b, count_b))) => {
            // sum_a/count_a vs sum_b/count_b without floats.
            let left = (sum_a as u128) * (count_b as u128);
            let right = (sum_b as u128) * (count_a as u128);
            left.cmp(&right).then_with(|| a.cmp(b))
        }
    });
}

/// Maps layout-space `(main, cross)` coordinates to pixels for a direction.
#[derive(Debug, Clone, Copy)]
struct Axes {
    vertical: bool,
    reversed: bool,
    main_extent: f32,
}

impl Axes {
    fn point(&self, main: f32, cross: f32) -> Point {
        let main = if self.reversed { self.main_extent - main } else { main };
        if self.vertical {
            Point::new(cross, main)
        } else {
            Point::new(main, cross)
        }
    }

    fn main_size(&self, width: f32, height: f32) -> f32 {
        if self.vertical {
            height
        } else {
            width
        }
    }

    fn cross_size(&self, width: f32, height: f32) -> f32 {
        if self.vertical {
            width
        } else {
            height
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    main: f32,
    cross: f32,
    main_size: f32,
    cross_size: f32,
}

/// Deterministic layered layout for flowcharts.
///
/// - Cycles are tolerated: edges closing a cycle do not constrain layering and are routed
///   around the outside of the graph.
/// - Layers come from longest-path layering over a topological order of the remaining edges.
/// - One downward barycenter sweep orders nodes within each layer.
pub fn layout_flowchart(ast: &FlowchartAst) -> Result<DiagramLayout, FlowchartLayoutError> {
    let order = ast.node_ids_in_declaration_order();
    if order.is_empty() {
        return Err(FlowchartLayoutError::Empty);
    }
    let index_of = order
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.clone(), idx))
        .collect::<BTreeMap<_, _>>();

    let mut edge_pairs = Vec::with_capacity(ast.edges().len());
    for edge in ast.edges() {
        let lookup = |id: &str| {
            index_of.get(id).copied().ok_or_else(|| FlowchartLayoutError::UnknownNode {
                from: edge.from().to_owned(),
                to: edge.to().to_owned(),
                missing: id.to_owned(),
            })
        };
        edge_pairs.push((lookup(edge.from())?, lookup(edge.to())?));
    }

    let node_count = order.len();
    let back_edges = classify_back_edges(node_count, &edge_pairs);

    let mut outgoing = vec![Vec::<usize>::new(); node_count];
    let mut predecessors = vec![Vec::<usize>::new(); node_count];
    for (edge_idx, (from, to)) in edge_pairs.iter().enumerate() {
        if back_edges.contains(&edge_idx) {
            continue;
        }
        outgoing[*from].push(*to);
        predecessors[*to].push(*from);
    }
    for tos in outgoing.iter_mut() {
        tos.sort_unstable();
        tos.dedup();
    }
    for preds in predecessors.iter_mut() {
        preds.sort_unstable();
        preds.dedup();
    }

    let topo = topo_sort(node_count, &outgoing);
    let node_layers = assign_layers(&topo, &outgoing);

    let max_layer = node_layers.iter().copied().max().unwrap_or(0);
    let mut layers = vec![Vec::<usize>::new(); max_layer + 1];
    for (idx, layer) in node_layers.iter().enumerate() {
        layers[*layer].push(idx);
    }
    for layer_idx in 1..layers.len() {
        let prev_positions = layers[layer_idx - 1]
            .iter()
            .enumerate()
            .map(|(pos, node)| (*node, pos))
            .collect::<BTreeMap<_, _>>();
        sort_layer_by_barycenter(&mut layers[layer_idx], &prev_positions, &predecessors);
    }

    let mut axes = Axes {
        vertical: ast.direction().is_vertical(),
        reversed: ast.direction().is_reversed(),
        main_extent: 0.0,
    };

    let mut labels = Vec::with_capacity(node_count);
    let mut sizes = Vec::with_capacity(node_count);
    for id in &order {
        let (lines, shape) = match ast.node(id) {
            Some(node) => (node.label_lines(), node.shape()),
            None => (vec![id.as_str()], NodeShape::Rect),
        };
        sizes.push(node_size(&lines, shape));
        labels.push((lines.into_iter().map(str::to_owned).collect::<Vec<_>>(), shape));
    }

    let layer_spans = layers
        .iter()
        .map(|nodes| {
            let sum = nodes.iter().map(|n| axes.cross_size(sizes[*n].0, sizes[*n].1)).sum::<f32>();
            sum + NODE_GAP * nodes.len().saturating_sub(1) as f32
        })
        .collect::<Vec<_>>();
    let max_span = layer_spans.iter().copied().fold(0.0f32, f32::max);

    let mut slots = vec![Slot { main: 0.0, cross: 0.0, main_size: 0.0, cross_size: 0.0 }; node_count];
    let mut main_cursor = MARGIN;
    for (layer_idx, nodes) in layers.iter().enumerate() {
        let thickness = nodes
            .iter()
            .map(|n| axes.main_size(sizes[*n].0, sizes[*n].1))
            .fold(0.0f32, f32::max);
        let mut cross_cursor = MARGIN + (max_span - layer_spans[layer_idx]) / 2.0;
        for node in nodes {
            let (w, h) = sizes[*node];
            let cross_size = axes.cross_size(w, h);
            slots[*node] = Slot {
                main: main_cursor + thickness / 2.0,
                cross: cross_cursor + cross_size / 2.0,
                main_size: axes.main_size(w, h),
                cross_size,
            };
            cross_cursor += cross_size + NODE_GAP;
        }
        main_cursor += thickness + LAYER_GAP;
    }
    axes.main_extent = main_cursor - LAYER_GAP + MARGIN;

    let lane_base = MARGIN + max_span;
    let mut lanes_used = 0usize;
    let mut edges = Vec::with_capacity(ast.edges().len());
    for (edge_idx, edge) in ast.edges().iter().enumerate() {
        let (from, to) = edge_pairs[edge_idx];
        let a = slots[from];
        let b = slots[to];
        let is_back = back_edges.contains(&edge_idx) || node_layers[to] <= node_layers[from];

        let (points, anchor) = if is_back {
            lanes_used += 1;
            let lane = lane_base + BACK_EDGE_LANE_GAP * lanes_used as f32;
            let (exit_main, enter_main) = if from == to {
                (a.main - a.main_size / 4.0, a.main + a.main_size / 4.0)
            } else {
                (a.main, b.main)
            };
            let points = vec![
                axes.point(exit_main, a.cross + a.cross_size / 2.0),
                axes.point(exit_main, lane),
                axes.point(enter_main, lane),
                axes.point(enter_main, b.cross + b.cross_size / 2.0),
            ];
            (points, axes.point((exit_main + enter_main) / 2.0, lane))
        } else {
            let start_main = a.main + a.main_size / 2.0;
            let end_main = b.main - b.main_size / 2.0;
            let elbow = end_main - LAYER_GAP / 2.0;
            let points = if (a.cross - b.cross).abs() < f32::EPSILON {
                vec![axes.point(start_main, a.cross), axes.point(end_main, b.cross)]
            } else {
                vec![
                    axes.point(start_main, a.cross),
                    axes.point(elbow, a.cross),
                    axes.point(elbow, b.cross),
                    axes.point(end_main, b.cross),
                ]
            };
            (points, axes.point(elbow, (a.cross + b.cross) / 2.0))
        };

        edges.push(RoutedEdge {
            from: order[from].clone(),
            to: order[to].clone(),
            points,
            label: edge.label().map(str::to_owned),
            label_anchor: anchor,
            stroke: edge.stroke(),
            start: edge.start_head(),
            end: edge.end_head(),
            back_edge: is_back,
        });
    }

    let cross_extent = lane_base + BACK_EDGE_LANE_GAP * lanes_used as f32 + MARGIN;
    let (width, height) = if axes.vertical {
        (cross_extent, axes.main_extent)
    } else {
        (axes.main_extent, cross_extent)
    };

    let mut layer_ids = vec![Vec::<SmolStr>::new(); layers.len()];
    let mut nodes = Vec::with_capacity(node_count);
    for (layer_idx, members) in layers.iter().enumerate() {
        for (index_in_layer, node) in members.iter().enumerate() {
            layer_ids[layer_idx].push(order[*node].clone());
            let slot = slots[*node];
            let (w, h) = sizes[*node];
            let (lines, shape) = labels[*node].clone();
            nodes.push(PlacedNode {
                id: order[*node].clone(),
                label_lines: lines,
                shape,
                center: axes.point(slot.main, slot.cross),
                width: w,
                height: h,
                layer: layer_idx,
                index_in_layer,
            });
        }
    }
    nodes.sort_by_key(|node| index_of.get(&node.id).copied().unwrap_or(usize::MAX));

    Ok(DiagramLayout { direction: ast.direction(), width, height, layers: layer_ids, nodes, edges })
}
