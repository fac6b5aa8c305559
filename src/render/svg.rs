// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt::Write as _;

use super::text::escape_xml;
use crate::layout::{DiagramLayout, PlacedNode, Point, RoutedEdge, LINE_HEIGHT};
use crate::model::flow_ast::{ArrowHead, EdgeStroke, NodeShape};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgOptions {
    /// Always painted as a full-size rectangle so exports are opaque.
    pub background: String,
    pub node_fill: String,
    pub stroke: String,
    pub text: String,
    pub font_family: String,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            background: "#ffffff".to_owned(),
            node_fill: "#eef2ff".to_owned(),
            stroke: "#4f46e5".to_owned(),
            text: "#1f2937".to_owned(),
            font_family: "Inter, Helvetica, Arial, sans-serif".to_owned(),
        }
    }
}

fn fmt_num(value: f32) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

fn write_defs(out: &mut String, options: &SvgOptions) {
    let color = &options.stroke;
    let _ = write!(
        out,
        "<defs>\
<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"7\" markerHeight=\"7\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{color}\"/></marker>\
<marker id=\"circle\" viewBox=\"0 0 10 10\" refX=\"9\" refY=\"5\" markerWidth=\"7\" markerHeight=\"7\" orient=\"auto-start-reverse\"><circle cx=\"5\" cy=\"5\" r=\"4\" fill=\"{color}\"/></marker>\
<marker id=\"cross\" viewBox=\"0 0 10 10\" refX=\"5\" refY=\"5\" markerWidth=\"8\" markerHeight=\"8\" orient=\"auto-start-reverse\"><path d=\"M 1 1 L 9 9 M 9 1 L 1 9\" stroke=\"{color}\" stroke-width=\"2\"/></marker>\
</defs>"
    );
}

fn marker_ref(head: ArrowHead) -> Option<&'static str> {
    match head {
        ArrowHead::None => None,
        ArrowHead::Arrow => Some("url(#arrow)"),
        ArrowHead::Circle => Some("url(#circle)"),
        ArrowHead::Cross => Some("url(#cross)"),
    }
}

fn write_node_shape(out: &mut String, node: &PlacedNode, options: &SvgOptions) {
    let Point { x, y } = node.origin();
    let (w, h) = (node.width(), node.height());
    let c = node.center();
    let style = format!("fill=\"{}\" stroke=\"{}\" stroke-width=\"1.5\"", options.node_fill, options.stroke);

    let polygon = |points: &[(f32, f32)]| {
        let list = points
            .iter()
            .map(|(px, py)| format!("{},{}", fmt_num(*px), fmt_num(*py)))
            .collect::<Vec<_>>()
            .join(" ");
        format!("<polygon points=\"{list}\" {style}/>")
    };
    let rect = |rx: f32| {
        format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" {style}/>",
            fmt_num(x),
            fmt_num(y),
            fmt_num(w),
            fmt_num(h),
            fmt_num(rx)
        )
    };

    let markup = match node.shape() {
        NodeShape::Rect => rect(0.0),
        NodeShape::Round => rect(8.0),
        NodeShape::Stadium => rect(h / 2.0),
        NodeShape::Circle => format!(
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" {style}/>",
            fmt_num(c.x),
            fmt_num(c.y),
            fmt_num(w.min(h) / 2.0)
        ),
        NodeShape::Diamond => polygon(&[(c.x, y), (x + w, c.y), (c.x, y + h), (x, c.y)]),
        NodeShape::Hexagon => {
            let inset = 12.0f32.min(w / 4.0);
            polygon(&[
                (x + inset, y),
                (x + w - inset, y),
                (x + w, c.y),
                (x + w - inset, y + h),
                (x + inset, y + h),
                (x, c.y),
            ])
        }
        NodeShape::Asymmetric => {
            polygon(&[(x, y), (x + w, y), (x + w, y + h), (x, y + h), (x + 12.0, c.y)])
        }
        NodeShape::Subroutine => format!(
            "{}<path d=\"M {} {} L {} {} M {} {} L {} {}\" stroke=\"{}\" stroke-width=\"1.5\"/>",
            rect(0.0),
            fmt_num(x + 6.0),
            fmt_num(y),
            fmt_num(x + 6.0),
            fmt_num(y + h),
            fmt_num(x + w - 6.0),
            fmt_num(y),
            fmt_num(x + w - 6.0),
            fmt_num(y + h),
            options.stroke
        ),
        NodeShape::Cylinder => {
            let ry = 6.0f32.min(h / 4.0);
            format!(
                "{}<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" {style}/>",
                rect(ry),
                fmt_num(c.x),
                fmt_num(y + ry),
                fmt_num(w / 2.0),
                fmt_num(ry)
            )
        }
    };
    out.push_str(&markup);
}

fn write_multiline_text(out: &mut String, center: Point, lines: &[String], options: &SvgOptions) {
    let first_dy = -(lines.len().saturating_sub(1) as f32) * LINE_HEIGHT / 2.0;
    let _ = write!(
        out,
        "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"14\" fill=\"{}\">",
        fmt_num(center.x),
        fmt_num(center.y),
        escape_xml(&options.font_family),
        options.text
    );
    for (idx, line) in lines.iter().enumerate() {
        let dy = if idx == 0 { first_dy } else { LINE_HEIGHT };
        let _ = write!(
            out,
            "<tspan x=\"{}\" dy=\"{}\">{}</tspan>",
            fmt_num(center.x),
            fmt_num(dy),
            escape_xml(line)
        );
    }
    out.push_str("</text>");
}

fn write_edge(out: &mut String, edge: &RoutedEdge, options: &SvgOptions) {
    let Some((first, rest)) = edge.points().split_first() else {
        return;
    };
    let mut d = format!("M {} {}", fmt_num(first.x), fmt_num(first.y));
    for p in rest {
        let _ = write!(d, " L {} {}", fmt_num(p.x), fmt_num(p.y));
    }

    let (width, dash) = match edge.stroke() {
        EdgeStroke::Solid => ("1.5", ""),
        EdgeStroke::Dotted => ("1.5", " stroke-dasharray=\"4 3\""),
        EdgeStroke::Thick => ("3", ""),
    };
    let _ = write!(
        out,
        "<path d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{width}\"{dash}",
        options.stroke
    );
    if let Some(marker) = marker_ref(edge.start_head()) {
        let _ = write!(out, " marker-start=\"{marker}\"");
    }
    if let Some(marker) = marker_ref(edge.end_head()) {
        let _ = write!(out, " marker-end=\"{marker}\"");
    }
    out.push_str("/>");
}

fn write_edge_label(out: &mut String, edge: &RoutedEdge, options: &SvgOptions) {
    let Some(label) = edge.label() else {
        return;
    };
    let anchor = edge.label_anchor();
    let width = label.chars().count() as f32 * crate::layout::CHAR_WIDTH + 8.0;
    let _ = write!(
        out,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
        fmt_num(anchor.x - width / 2.0),
        fmt_num(anchor.y - LINE_HEIGHT / 2.0),
        fmt_num(width),
        fmt_num(LINE_HEIGHT),
        options.background
    );
    write_multiline_text(out, anchor, &[label.to_owned()], options);
}

/// Renders the layout as a standalone SVG document at its intrinsic size.
pub fn render_svg(layout: &DiagramLayout, options: &SvgOptions) -> String {
    let width = fmt_num(layout.width().ceil());
    let height = fmt_num(layout.height().ceil());

    let mut out = String::with_capacity(1024 + layout.nodes().len() * 256);
    let _ = write!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
    );
    write_defs(&mut out, options);
    let _ = write!(
        out,
        "<rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"{}\"/>",
        options.background
    );

    for edge in layout.edges() {
        write_edge(&mut out, edge, options);
    }
    for node in layout.nodes() {
        write_node_shape(&mut out, node, options);
        write_multiline_text(&mut out, node.center(), node.label_lines(), options);
    }
    for edge in layout.edges() {
        write_edge_label(&mut out, edge, options);
    }

    out.push_str("</svg>");
    out
}

#[cfg(test)]
mod tests {
    use super::{fmt_num, render_svg, SvgOptions};
    use crate::format::mermaid::parse_flowchart;
    use crate::layout::layout_flowchart;
    use crate::model::fixtures::{DNS_DIAGRAM_SOURCE, SHOWCASE_DIAGRAM_SOURCE};

    fn svg_for(source: &str) -> String {
        let ast = parse_flowchart(source).expect("parse");
        render_svg(&layout_flowchart(&ast).expect("layout"), &SvgOptions::default())
    }

    #[test]
    fn paints_opaque_background_first() {
        let svg = svg_for(DNS_DIAGRAM_SOURCE);
        let defs_end = svg.find("</defs>").expect("defs");
        let background = svg.find("fill=\"#ffffff\"").expect("background");
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(background > defs_end);
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn draws_every_node_label_and_edge() {
        let svg = svg_for(DNS_DIAGRAM_SOURCE);
        for label in ["User", "Cache?", "IP Found", "Resolver", "Yes", "No"] {
            assert!(svg.contains(&format!(">{label}</tspan>")), "missing {label}");
        }
        assert_eq!(svg.matches("marker-end=\"url(#arrow)\"").count(), 3);
        assert!(svg.contains("<polygon"), "diamond renders as polygon");
    }

    #[test]
    fn escapes_label_markup() {
        let svg = svg_for("graph TD\nA[\"a < b & c\"]");
        assert!(svg.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn styles_follow_link_kinds() {
        let svg = svg_for(SHOWCASE_DIAGRAM_SOURCE);
        assert!(svg.contains("stroke-dasharray"));
        assert!(svg.contains("stroke-width=\"3\""));
        assert!(svg.contains("marker-start=\"url(#arrow)\""));
        assert!(svg.contains("url(#circle)") && svg.contains("url(#cross)"));
    }

    #[test]
    fn numbers_are_compact() {
        assert_eq!(fmt_num(12.0), "12");
        assert_eq!(fmt_num(12.345), "12.35");
    }
}
