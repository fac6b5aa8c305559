// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Terminal preview of a laid-out flowchart.
//!
//! Pixel coordinates are projected onto a character grid whose density follows the zoom
//! factor. Node boxes never shrink below three cells; labels that no longer fit are truncated
//! with an ellipsis.

use thiserror::Error;

use super::text::{canvas_to_string_trimmed, text_len, truncate_with_ellipsis};
use super::{Canvas, CanvasError};
use crate::layout::{DiagramLayout, PlacedNode, Point, RoutedEdge, CHAR_WIDTH};
use crate::model::flow_ast::{ArrowHead, NodeShape};

/// Vertical pixels per terminal row at zoom 1.
const ROW_PX: f32 = 12.0;
const MAX_EDGE_LABEL_LEN: usize = 24;
const MAX_PREVIEW_CELLS: usize = 4_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewOptions {
    pub zoom: f32,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self { zoom: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreviewError {
    #[error("zoom must be a finite number greater than zero, got {zoom}")]
    InvalidZoom { zoom: f32 },
    #[error("preview of {width}x{height} cells exceeds the {max} cell limit")]
    TooLarge { width: usize, height: usize, max: usize },
    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Travel {
    Up,
    Down,
    Left,
    Right,
}

impl Travel {
    fn between(a: Point, b: Point) -> Option<Self> {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        if dx.abs() < f32::EPSILON && dy.abs() < f32::EPSILON {
            return None;
        }
        Some(if dx.abs() > dy.abs() {
            if dx > 0.0 {
                Self::Right
            } else {
                Self::Left
            }
        } else if dy > 0.0 {
            Self::Down
        } else {
            Self::Up
        })
    }

    fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    fn arrow(self) -> char {
        match self {
            Self::Up => '▲',
            Self::Down => '▼',
            Self::Left => '◀',
            Self::Right => '▶',
        }
    }

    fn reversed(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    fn step(self, (x, y): (usize, usize)) -> (usize, usize) {
        match self {
            Self::Up => (x, y.saturating_sub(1)),
            Self::Down => (x, y + 1),
            Self::Left => (x.saturating_sub(1), y),
            Self::Right => (x + 1, y),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Grid {
    sx: f32,
    sy: f32,
}

impl Grid {
    fn cell(&self, p: Point) -> (usize, usize) {
        ((p.x * self.sx).round().max(0.0) as usize, (p.y * self.sy).round().max(0.0) as usize)
    }
}

/// Inclusive cell rectangle of a node box.
#[derive(Debug, Clone, Copy)]
struct CellBox {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

impl CellBox {
    fn of(grid: Grid, node: &PlacedNode) -> Self {
        let (cx, cy) = grid.cell(node.center());
        let cols = ((node.width() * grid.sx).round() as usize).max(3);
        let rows = ((node.height() * grid.sy).round() as usize).max(3);
        let x0 = cx.saturating_sub(cols / 2);
        let y0 = cy.saturating_sub(rows / 2);
        Self { x0, y0, x1: x0 + cols - 1, y1: y0 + rows - 1 }
    }

    /// Border cell where an edge leaving in `travel` exits the box.
    fn exit(&self, travel: Travel, (x, y): (usize, usize)) -> (usize, usize) {
        let x = x.clamp(self.x0 + 1, self.x1 - 1);
        let y = y.clamp(self.y0 + 1, self.y1 - 1);
        match travel {
            Travel::Down => (x, self.y1),
            Travel::Up => (x, self.y0),
            Travel::Right => (self.x1, y),
            Travel::Left => (self.x0, y),
        }
    }

    /// Cell just outside the box where an edge arriving in `travel` ends.
    fn entry(&self, travel: Travel, (x, y): (usize, usize)) -> (usize, usize) {
        let x = x.clamp(self.x0 + 1, self.x1 - 1);
        let y = y.clamp(self.y0 + 1, self.y1 - 1);
        match travel {
            Travel::Down => (x, self.y0.saturating_sub(1)),
            Travel::Up => (x, self.y1 + 1),
            Travel::Right => (self.x0.saturating_sub(1), y),
            Travel::Left => (self.x1 + 1, y),
        }
    }
}

struct EdgeCells {
    cells: Vec<(usize, usize)>,
    travels: Vec<Option<Travel>>,
    start_head: Option<((usize, usize), char)>,
    end_head: Option<((usize, usize), char)>,
}

fn head_glyph(head: ArrowHead, travel: Travel) -> Option<char> {
    match head {
        ArrowHead::None => None,
        ArrowHead::Arrow => Some(travel.arrow()),
        ArrowHead::Circle => Some('o'),
        ArrowHead::Cross => Some('x'),
    }
}

fn edge_cells(
    grid: Grid,
    layout: &DiagramLayout,
    boxes: &[CellBox],
    edge: &RoutedEdge,
) -> Option<EdgeCells> {
    let points = edge.points();
    if points.len() < 2 {
        return None;
    }
    let box_of = |id: &str| layout.nodes().iter().position(|node| node.id() == id).map(|idx| boxes[idx]);

    let mut cells = points.iter().map(|p| grid.cell(*p)).collect::<Vec<_>>();
    let travels = points.windows(2).map(|pair| Travel::between(pair[0], pair[1])).collect::<Vec<_>>();
    let last = cells.len() - 1;

    let mut start_head = None;
    if let (Some(source), Some(Some(first))) = (box_of(edge.from()), travels.first().copied()) {
        cells[0] = source.exit(first, cells[0]);
        let outside = first.step(cells[0]);
        start_head = head_glyph(edge.start_head(), first.reversed()).map(|glyph| (outside, glyph));
    }

    let mut end_head = None;
    if let (Some(target), Some(Some(final_travel))) = (box_of(edge.to()), travels.last().copied()) {
        cells[last] = target.entry(final_travel, cells[last]);
        end_head = head_glyph(edge.end_head(), final_travel).map(|glyph| (cells[last], glyph));
    }

    Some(EdgeCells { cells, travels, start_head, end_head })
}

fn draw_edge_lines(canvas: &mut Canvas, edge: &EdgeCells) -> Result<(), CanvasError> {
    for (idx, pair) in edge.cells.windows(2).enumerate() {
        let ((ax, ay), (bx, by)) = (pair[0], pair[1]);
        let vertical_first = edge.travels[idx].is_some_and(Travel::is_vertical);
        if vertical_first {
            canvas.draw_vline(ax, ay, by)?;
            canvas.draw_hline(ax, bx, by)?;
        } else {
            canvas.draw_hline(ax, bx, ay)?;
            canvas.draw_vline(bx, ay, by)?;
        }
    }
    Ok(())
}

fn draw_edge_label(canvas: &mut Canvas, grid: Grid, edge: &RoutedEdge) -> Result<(), CanvasError> {
    let Some(label) = edge.label() else {
        return Ok(());
    };
    let label = truncate_with_ellipsis(label, MAX_EDGE_LABEL_LEN);
    let (ax, ay) = grid.cell(edge.label_anchor());
    let x = ax.saturating_sub(text_len(&label) / 2);
    if ay < canvas.height() && x < canvas.width() {
        canvas.write_str(x, ay, &label)?;
    }
    Ok(())
}

fn draw_node(canvas: &mut Canvas, cell_box: CellBox, node: &PlacedNode) -> Result<(), CanvasError> {
    let CellBox { x0, y0, x1, y1 } = cell_box;
    for y in y0 + 1..y1 {
        for x in x0 + 1..x1 {
            canvas.set(x, y, ' ')?;
        }
    }
    canvas.draw_box(x0, y0, x1, y1)?;

    let corners = match node.shape() {
        NodeShape::Round | NodeShape::Stadium | NodeShape::Circle | NodeShape::Cylinder => {
            Some(['╭', '╮', '╰', '╯'])
        }
        NodeShape::Diamond | NodeShape::Hexagon => Some(['/', '\\', '\\', '/']),
        NodeShape::Rect | NodeShape::Subroutine | NodeShape::Asymmetric => None,
    };
    if let Some([tl, tr, bl, br]) = corners {
        canvas.set(x0, y0, tl)?;
        canvas.set(x1, y0, tr)?;
        canvas.set(x0, y1, bl)?;
        canvas.set(x1, y1, br)?;
    }
    match node.shape() {
        NodeShape::Subroutine => {
            for y in y0 + 1..y1 {
                canvas.set(x0, y, '║')?;
                canvas.set(x1, y, '║')?;
            }
        }
        NodeShape::Asymmetric => canvas.set(x0, (y0 + y1) / 2, '>')?,
        _ => {}
    }

    let inner_cols = x1 - x0 - 1;
    let inner_rows = y1 - y0 - 1;
    let lines = node.label_lines();
    let shown = lines.len().min(inner_rows);
    let top = y0 + 1 + (inner_rows - shown) / 2;
    for (row, line) in lines.iter().take(shown).enumerate() {
        let mut text = truncate_with_ellipsis(line, inner_cols);
        if row + 1 == shown && shown < lines.len() {
            text = truncate_with_ellipsis(&format!("{text}…"), inner_cols);
        }
        let x = x0 + 1 + (inner_cols - text_len(&text)) / 2;
        canvas.write_str(x, top + row, &text)?;
    }
    Ok(())
}

/// Renders the layout as box-drawing text at `options.zoom`.
pub fn render_preview(layout: &DiagramLayout, options: &PreviewOptions) -> Result<String, PreviewError> {
    let zoom = options.zoom;
    if !zoom.is_finite() || zoom <= 0.0 {
        return Err(PreviewError::InvalidZoom { zoom });
    }
    let grid = Grid { sx: zoom / CHAR_WIDTH, sy: zoom / ROW_PX };

    let boxes = layout.nodes().iter().map(|node| CellBox::of(grid, node)).collect::<Vec<_>>();
    let width = boxes
        .iter()
        .map(|b| b.x1 + 2)
        .fold((layout.width() * grid.sx).ceil() as usize + 1, usize::max);
    let height = boxes
        .iter()
        .map(|b| b.y1 + 2)
        .fold((layout.height() * grid.sy).ceil() as usize + 1, usize::max);
    if width.saturating_mul(height) > MAX_PREVIEW_CELLS {
        return Err(PreviewError::TooLarge { width, height, max: MAX_PREVIEW_CELLS });
    }

    let mut canvas = Canvas::new(width, height)?;
    let edges = layout
        .edges()
        .iter()
        .filter_map(|edge| edge_cells(grid, layout, &boxes, edge))
        .collect::<Vec<_>>();

    for edge in &edges {
        draw_edge_lines(&mut canvas, edge)?;
    }
    for edge in layout.edges() {
        draw_edge_label(&mut canvas, grid, edge)?;
    }
    for (node, cell_box) in layout.nodes().iter().zip(&boxes) {
        draw_node(&mut canvas, *cell_box, node)?;
    }
    for edge in &edges {
        for ((x, y), glyph) in [edge.start_head, edge.end_head].into_iter().flatten() {
            if x < width && y < height {
                canvas.set(x, y, glyph)?;
            }
        }
    }

    Ok(canvas_to_string_trimmed(&canvas))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{render_preview, PreviewError, PreviewOptions};
    use crate::format::mermaid::parse_flowchart;
    use crate::layout::{layout_flowchart, DiagramLayout};
    use crate::model::fixtures::{DNS_DIAGRAM_SOURCE, SHOWCASE_DIAGRAM_SOURCE};

    fn layout(source: &str) -> DiagramLayout {
        layout_flowchart(&parse_flowchart(source).expect("parse")).expect("layout")
    }

    fn preview(source: &str, zoom: f32) -> String {
        render_preview(&layout(source), &PreviewOptions { zoom }).expect("preview")
    }

    fn widest_line(text: &str) -> usize {
        text.lines().map(|line| line.chars().count()).max().unwrap_or(0)
    }

    #[test]
    fn shows_labels_and_arrows_at_default_zoom() {
        let text = preview(DNS_DIAGRAM_SOURCE, 1.0);
        for label in ["User", "Cache?", "IP Found", "Resolver", "Yes", "No"] {
            assert!(text.contains(label), "missing {label} in\n{text}");
        }
        assert!(text.contains('▼'), "arrow heads point down in\n{text}");
        assert!(text.contains('┌') && text.contains('/'), "rect and diamond boxes in\n{text}");
    }

    #[test]
    fn zoom_scales_the_grid() {
        let small = preview(DNS_DIAGRAM_SOURCE, 0.5);
        let normal = preview(DNS_DIAGRAM_SOURCE, 1.0);
        let large = preview(DNS_DIAGRAM_SOURCE, 2.0);

        assert!(widest_line(&small) < widest_line(&normal));
        assert!(widest_line(&normal) < widest_line(&large));
        assert!(small.contains('…'), "labels are truncated when zoomed out:\n{small}");
    }

    #[test]
    fn left_right_flow_points_right() {
        let text = preview("graph LR\nA[Start] --> B[End]", 1.0);
        assert!(text.contains('▶'), "{text}");
        assert_eq!(text.lines().filter(|line| line.contains("Start")).count(), 1);
    }

    #[test]
    fn renders_every_shape() {
        let text = preview(SHOWCASE_DIAGRAM_SOURCE, 1.0);
        for glyph in ['╭', '║', '>', 'o', 'x'] {
            assert!(text.contains(glyph), "missing {glyph} in\n{text}");
        }
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f32::NAN)]
    fn rejects_non_positive_zoom(#[case] zoom: f32) {
        let err = render_preview(&layout(DNS_DIAGRAM_SOURCE), &PreviewOptions { zoom }).unwrap_err();
        assert!(matches!(err, PreviewError::InvalidZoom { .. }));
    }

    #[test]
    fn output_is_deterministic() {
        assert_eq!(preview(SHOWCASE_DIAGRAM_SOURCE, 1.4), preview(SHOWCASE_DIAGRAM_SOURCE, 1.4));
    }
}
