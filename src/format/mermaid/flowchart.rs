// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::OnceLock;

use regex::Regex;
use smol_str::SmolStr;
use thiserror::Error;

use super::ident::{is_ident_char, validate_mermaid_ident};
pub use super::ident::MermaidIdentError;

use crate::model::flow_ast::{
    ArrowHead, EdgeStroke, FlowDirection, FlowEdge, FlowNode, FlowchartAst, NodeShape,
};

pub const MAX_FLOWCHART_NODES: usize = 400;
pub const MAX_FLOWCHART_EDGES: usize = 1000;

const OTHER_DIAGRAM_KEYWORDS: &[&str] = &[
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram",
    "stateDiagram-v2",
    "erDiagram",
    "gantt",
    "pie",
    "journey",
    "gitGraph",
    "mindmap",
    "timeline",
    "quadrantChart",
    "requirementDiagram",
    "C4Context",
    "sankey-beta",
    "xychart-beta",
    "block-beta",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MermaidFlowchartParseError {
    #[error("expected 'graph' or 'flowchart' as the first statement")]
    MissingHeader,
    #[error("unsupported diagram type on line {line_no}: {keyword} (only flowcharts can be drawn)")]
    UnsupportedDiagram { line_no: usize, keyword: String },
    #[error("invalid flowchart direction on line {line_no}: {direction} (expected TD/TB/LR/RL/BT)")]
    InvalidDirection { line_no: usize, direction: String },
    #[error("invalid node id on line {line_no}: {name} ({reason})")]
    InvalidNodeId { line_no: usize, name: String, reason: MermaidIdentError },
    #[error("unclosed node label on line {line_no}: {token}")]
    UnclosedLabel { line_no: usize, token: String },
    #[error("unclosed edge label on line {line_no}: {statement}")]
    UnclosedEdgeLabel { line_no: usize, statement: String },
    #[error("edge without a target on line {line_no}: {statement}")]
    DanglingEdge { line_no: usize, statement: String },
    #[error("flowchart declares no nodes")]
    Empty,
    #[error(
        "flowchart is too large to draw: {nodes} nodes, {edges} edges (limits {max_nodes} nodes, {max_edges} edges)",
        max_nodes = MAX_FLOWCHART_NODES,
        max_edges = MAX_FLOWCHART_EDGES
    )]
    TooLarge { nodes: usize, edges: usize },
}

impl MermaidFlowchartParseError {
    pub fn line_no(&self) -> Option<usize> {
        match self {
            Self::UnsupportedDiagram { line_no, .. }
            | Self::InvalidDirection { line_no, .. }
            | Self::InvalidNodeId { line_no, .. }
            | Self::UnclosedLabel { line_no, .. }
            | Self::UnclosedEdgeLabel { line_no, .. }
            | Self::DanglingEdge { line_no, .. } => Some(*line_no),
            Self::MissingHeader | Self::Empty | Self::TooLarge { .. } => None,
        }
    }
}

fn fence_pattern() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"^```[\w-]*$").ok()).as_ref()
}

fn class_suffix_pattern() -> Option<&'static Regex> {
    static CLASS_SUFFIX: OnceLock<Option<Regex>> = OnceLock::new();
    CLASS_SUFFIX.get_or_init(|| Regex::new(r":::[\w-]+").ok()).as_ref()
}

/// Splits the source into `(line_no, statement)` pairs.
///
/// Statements end at a newline or at a `;` outside labels and quotes. Markdown fence lines are
/// dropped.
fn statements(input: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if fence_pattern().is_some_and(|fence| fence.is_match(line)) {
            continue;
        }

        let mut depth = 0i32;
        let mut in_quote = false;
        let mut start = 0usize;
        for (pos, ch) in line.char_indices() {
            match ch {
                '"' => in_quote = !in_quote,
                '[' | '(' | '{' if !in_quote => depth += 1,
                ']' | ')' | '}' if !in_quote => depth = (depth - 1).max(0),
                ';' if !in_quote && depth == 0 => {
                    out.push((line_no, line[start..pos].trim()));
                    start = pos + 1;
                }
                _ => {}
            }
        }
        out.push((line_no, line[start..].trim()));
    }
    out
}

fn is_comment(statement: &str) -> bool {
    statement.starts_with("%%")
}

fn is_ignorable_statement(statement: &str) -> bool {
    let keyword = statement.split_whitespace().next().unwrap_or_default();
    matches!(
        keyword,
        "subgraph" | "end" | "style" | "classDef" | "class" | "click" | "linkStyle" | "direction"
    )
}

fn is_edge_op_start_char(ch: char) -> bool {
    matches!(ch, '<' | '-' | '=' | '.')
}

fn is_edge_op_char(ch: char) -> bool {
    matches!(ch, '<' | '>' | '-' | '=' | '.' | 'o' | 'x')
}

fn is_probable_edge_operator(op: &str) -> bool {
    op.chars().filter(|ch| matches!(ch, '-' | '=' | '.')).count() >= 2
}

/// Finds the first edge operator outside of labels and returns `(lhs, op, rhs)`.
///
/// `lhs` is never empty. Candidate operators that turn out not to be links (a lone `-`) are
/// skipped and scanning continues.
fn split_once_edge_operator(statement: &str) -> Option<(&str, &str, &str)> {
    let mut closing: Option<char> = None;
    let mut quoted_label = false;
    let mut prev: Option<char> = None;
    let mut chars = statement.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if let Some(close) = closing {
            // Brackets inside a quoted label do not close the shape.
            if ch == '"' && close != '"' {
                quoted_label = !quoted_label;
            } else if ch == close && !quoted_label {
                closing = None;
            }
            prev = Some(ch);
            continue;
        }

        match ch {
            '"' => closing = Some('"'),
            '[' => closing = Some(']'),
            '(' => closing = Some(')'),
            '{' => closing = Some('}'),
            '>' if prev.is_some_and(is_ident_char) => closing = Some(']'),
            _ => {}
        }
        if closing.is_some() {
            prev = Some(ch);
            continue;
        }

        if is_edge_op_start_char(ch) {
            let mut end = statement.len();
            for (offset, op_ch) in statement[idx..].char_indices() {
                if !is_edge_op_char(op_ch) {
                    end = idx + offset;
                    break;
                }
            }

            // `-->xenon`: a trailing head letter glued to the next id belongs to the id.
            let mut op = &statement[idx..end];
            if let Some(last) = op.chars().last() {
                let glued = statement[end..].chars().next().is_some_and(is_ident_char);
                if matches!(last, 'o' | 'x') && glued {
                    op = &op[..op.len() - 1];
                    end -= 1;
                }
            }

            let lhs = &statement[..idx];
            if !lhs.trim().is_empty() && is_probable_edge_operator(op) {
                return Some((lhs, op, &statement[end..]));
            }

            // Not a link; resume after the candidate.
            while chars.peek().is_some_and(|(next_idx, _)| *next_idx < end) {
                chars.next();
            }
            prev = statement[..end].chars().last();
            continue;
        }

        prev = Some(ch);
    }

    None
}

/// Link openers that take an inline label (`A -- label --> B`).
fn is_label_opener(op: &str) -> bool {
    matches!(op, "--" | "==" | "-.")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LinkStyle {
    stroke: EdgeStroke,
    start: ArrowHead,
    end: ArrowHead,
}

fn head_from_char(ch: Option<char>) -> ArrowHead {
    match ch {
        Some('>') | Some('<') => ArrowHead::Arrow,
        Some('o') => ArrowHead::Circle,
        Some('x') => ArrowHead::Cross,
        _ => ArrowHead::None,
    }
}

fn link_style(op: &str) -> LinkStyle {
    let stroke = if op.contains('=') {
        EdgeStroke::Thick
    } else if op.contains('.') {
        EdgeStroke::Dotted
    } else {
        EdgeStroke::Solid
    };
    let start = match op.chars().next() {
        Some('<') => ArrowHead::Arrow,
        _ => ArrowHead::None,
    };
    let end = head_from_char(op.chars().last());
    LinkStyle { stroke, start, end }
}

fn unquote(label: &str) -> &str {
    let trimmed = label.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NodeSpec {
    id: SmolStr,
    label: Option<String>,
    shape: Option<NodeShape>,
}

/// Delimiters ordered so that two-character openers are tried before their one-character
/// prefixes.
const SHAPE_DELIMITERS: &[(&str, &str, NodeShape)] = &[
    ("([", "])", NodeShape::Stadium),
    ("((", "))", NodeShape::Circle),
    ("[[", "]]", NodeShape::Subroutine),
    ("[(", ")]", NodeShape::Cylinder),
    ("{{", "}}", NodeShape::Hexagon),
    ("[", "]", NodeShape::Rect),
    ("(", ")", NodeShape::Round),
    ("{", "}", NodeShape::Diamond),
    (">", "]", NodeShape::Asymmetric),
];

fn parse_node_spec(token: &str, line_no: usize) -> Result<NodeSpec, MermaidFlowchartParseError> {
    let trimmed = token.trim();
    let open_idx = trimmed
        .char_indices()
        .find(|(idx, ch)| matches!(ch, '[' | '(' | '{') || (*ch == '>' && *idx > 0))
        .map(|(idx, _)| idx);

    let Some(open_idx) = open_idx else {
        validate_mermaid_ident(trimmed).map_err(|reason| {
            MermaidFlowchartParseError::InvalidNodeId { line_no, name: trimmed.to_owned(), reason }
        })?;
        return Ok(NodeSpec { id: SmolStr::new(trimmed), label: None, shape: None });
    };

    let id = trimmed[..open_idx].trim();
    validate_mermaid_ident(id).map_err(|reason| MermaidFlowchartParseError::InvalidNodeId {
        line_no,
        name: id.to_owned(),
        reason,
    })?;

    let body = &trimmed[open_idx..];
    let Some((open, close, shape)) = SHAPE_DELIMITERS
        .iter()
        .find(|(open, close, _)| {
            body.len() >= open.len() + close.len()
                && body.starts_with(*open)
                && body.ends_with(*close)
        })
        .copied()
    else {
        return Err(MermaidFlowchartParseError::UnclosedLabel {
            line_no,
            token: trimmed.to_owned(),
        });
    };

    let label = unquote(&body[open.len()..body.len() - close.len()]);
    let label = if label.is_empty() { id } else { label };

    Ok(NodeSpec { id: SmolStr::new(id), label: Some(label.to_owned()), shape: Some(shape) })
}

/// Splits `a & b` into its members, respecting labels.
fn parse_node_group(raw: &str, line_no: usize) -> Result<Vec<NodeSpec>, MermaidFlowchartParseError> {
    let mut members = Vec::new();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut start = 0usize;
    for (idx, ch) in raw.char_indices() {
        match ch {
            '"' => in_quote = !in_quote,
            '[' | '(' | '{' if !in_quote => depth += 1,
            ']' | ')' | '}' if !in_quote => depth = (depth - 1).max(0),
            '&' if !in_quote && depth == 0 => {
                members.push(parse_node_spec(&raw[start..idx], line_no)?);
                start = idx + 1;
            }
            _ => {}
        }
    }
    members.push(parse_node_spec(&raw[start..], line_no)?);
    Ok(members)
}

#[derive(Debug, Default)]
struct FlowchartBuilder {
    ast: FlowchartAst,
    declared: u32,
}

impl FlowchartBuilder {
    fn ensure_node(&mut self, spec: &NodeSpec) -> Result<SmolStr, MermaidFlowchartParseError> {
        match self.ast.nodes_mut().get_mut(&spec.id) {
            Some(existing) => {
                // Last explicit declaration wins; bare references keep what is there.
                if let Some(label) = &spec.label {
                    existing.redeclare(label.clone(), spec.shape.unwrap_or_default());
                }
            }
            None => {
                if self.ast.nodes().len() >= MAX_FLOWCHART_NODES {
                    return Err(MermaidFlowchartParseError::TooLarge {
                        nodes: self.ast.nodes().len() + 1,
                        edges: self.ast.edges().len(),
                    });
                }
                let node = match &spec.label {
                    Some(label) => {
                        FlowNode::new(label.clone(), spec.shape.unwrap_or_default(), self.declared)
                    }
                    None => FlowNode::implicit(&spec.id, self.declared),
                };
                self.declared += 1;
                self.ast.nodes_mut().insert(spec.id.clone(), node);
            }
        }
        Ok(spec.id.clone())
    }

    fn push_edges(
        &mut self,
        sources: &[NodeSpec],
        targets: &[NodeSpec],
        style: LinkStyle,
        label: Option<&str>,
    ) -> Result<(), MermaidFlowchartParseError> {
        for source in sources {
            let from = self.ensure_node(source)?;
            for target in targets {
                let to = self.ensure_node(target)?;
                if self.ast.edges().len() >= MAX_FLOWCHART_EDGES {
                    return Err(MermaidFlowchartParseError::TooLarge {
                        nodes: self.ast.nodes().len(),
                        edges: self.ast.edges().len() + 1,
                    });
                }

                // `B <-- A` reads as `A --> B`.
                let (from, to, start, end) =
                    if style.start == ArrowHead::Arrow && style.end == ArrowHead::None {
                        (to, from.clone(), ArrowHead::None, ArrowHead::Arrow)
                    } else {
                        (from.clone(), to, style.start, style.end)
                    };

                self.ast.push_edge(
                    FlowEdge::new(from, to)
                        .with_label(label)
                        .with_stroke(style.stroke)
                        .with_heads(start, end),
                );
            }
        }
        Ok(())
    }

    fn statement(&mut self, statement: &str, line_no: usize) -> Result<(), MermaidFlowchartParseError> {
        let Some((first_raw, first_op, tail)) = split_once_edge_operator(statement) else {
            for spec in parse_node_group(statement, line_no)? {
                self.ensure_node(&spec)?;
            }
            return Ok(());
        };

        let dangling = || MermaidFlowchartParseError::DanglingEdge {
            line_no,
            statement: statement.to_owned(),
        };

        let mut sources = parse_node_group(first_raw, line_no)?;
        let mut op = first_op;
        let mut rest = tail;

        loop {
            let mut label: Option<String> = None;
            let mut after = rest.trim_start();

            if is_label_opener(op) {
                let (label_raw, real_op, remainder) =
                    split_once_edge_operator(after).ok_or_else(dangling)?;
                label = Some(unquote(label_raw).to_owned()).filter(|l| !l.is_empty());
                op = real_op;
                after = remainder.trim_start();
            }

            if let Some(inner) = after.strip_prefix('|') {
                let Some(end_idx) = inner.find('|') else {
                    return Err(MermaidFlowchartParseError::UnclosedEdgeLabel {
                        line_no,
                        statement: statement.to_owned(),
                    });
                };
                label = Some(unquote(&inner[..end_idx]).to_owned()).filter(|l| !l.is_empty());
                after = inner[end_idx + 1..].trim_start();
            }

            let (rhs_raw, next) = match split_once_edge_operator(after) {
                Some((rhs_raw, next_op, next_rest)) => (rhs_raw, Some((next_op, next_rest))),
                None => (after, None),
            };
            if rhs_raw.trim().is_empty() {
                return Err(dangling());
            }

            let targets = parse_node_group(rhs_raw, line_no)?;
            self.push_edges(&sources, &targets, link_style(op), label.as_deref())?;

            let Some((next_op, next_rest)) = next else {
                break;
            };
            sources = targets;
            op = next_op;
            rest = next_rest;
        }

        Ok(())
    }
}

/// Parses the header statement, returning the direction plus any trailing statement that
/// shares the header line (`graph TD A-->B`).
fn parse_header(
    statement: &str,
    line_no: usize,
) -> Result<(FlowDirection, Option<&str>), MermaidFlowchartParseError> {
    let mut parts = statement.splitn(3, char::is_whitespace);
    let keyword = parts.next().unwrap_or_default();

    if !matches!(keyword, "graph" | "flowchart" | "flowchart-elk") {
        if OTHER_DIAGRAM_KEYWORDS.contains(&keyword) {
            return Err(MermaidFlowchartParseError::UnsupportedDiagram {
                line_no,
                keyword: keyword.to_owned(),
            });
        }
        return Err(MermaidFlowchartParseError::MissingHeader);
    }

    let Some(direction_raw) = parts.next().map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok((FlowDirection::default(), None));
    };
    let direction =
        FlowDirection::from_keyword(&direction_raw.to_ascii_uppercase()).ok_or_else(|| {
            MermaidFlowchartParseError::InvalidDirection {
                line_no,
                direction: direction_raw.to_owned(),
            }
        })?;

    let trailing = parts.next().map(str::trim).filter(|rest| !rest.is_empty());
    Ok((direction, trailing))
}

/// Parse the Mermaid flowchart subset produced by generation backends.
///
/// The input is untrusted. Supported:
/// - an optional Markdown code fence around the source
/// - `graph`/`flowchart` header with optional direction (`TD`, `TB`, `LR`, `RL`, `BT`)
/// - statements separated by newlines or `;`
/// - node shapes `[]`, `()`, `([])`, `(())`, `{}`, `{{}}`, `[[]]`, `[()]`, `>]`, quoted labels
///   (which may contain brackets)
/// - word ids in any script, optionally joined by single dashes (`node-1`)
/// - links `-->`, `---`, `-.->`, `==>`, `--o`, `--x`, `<-->`, `<--` with `|label|` or
///   `-- label -->` labels, chains and `&` groups
/// - `%%` comments; styling, class and subgraph statements are skipped
pub fn parse_flowchart(input: &str) -> Result<FlowchartAst, MermaidFlowchartParseError> {
    let mut builder = FlowchartBuilder::default();
    let mut saw_header = false;

    for (line_no, raw) in statements(input) {
        if raw.is_empty() || is_comment(raw) {
            continue;
        }

        let cleaned = match class_suffix_pattern() {
            Some(pattern) => pattern.replace_all(raw, ""),
            None => raw.into(),
        };
        let statement = cleaned.trim();

        if !saw_header {
            let (direction, trailing) = parse_header(statement, line_no)?;
            builder.ast.set_direction(direction);
            saw_header = true;
            if let Some(trailing) = trailing {
                builder.statement(trailing, line_no)?;
            }
            continue;
        }

        if is_ignorable_statement(statement) {
            continue;
        }

        builder.statement(statement, line_no)?;
    }

    if !saw_header {
        return Err(MermaidFlowchartParseError::MissingHeader);
    }
    if builder.ast.nodes().is_empty() {
        return Err(MermaidFlowchartParseError::Empty);
    }

    Ok(builder.ast)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rstest::rstest;

    use super::{parse_flowchart, MermaidFlowchartParseError};
    use crate::model::fixtures::{DNS_DIAGRAM_SOURCE, SHOWCASE_DIAGRAM_SOURCE};
    use crate::model::flow_ast::{ArrowHead, EdgeStroke, FlowDirection, FlowchartAst, NodeShape};

    type EdgeView = Vec<(String, String, Option<String>)>;

    fn node_view(ast: &FlowchartAst) -> BTreeMap<String, (String, NodeShape)> {
        ast.nodes()
            .iter()
            .map(|(id, node)| (id.to_string(), (node.label().to_owned(), node.shape())))
            .collect()
    }

    fn edge_view(ast: &FlowchartAst) -> EdgeView {
        ast.edges()
            .iter()
            .map(|edge| {
                (edge.from().to_owned(), edge.to().to_owned(), edge.label().map(str::to_owned))
            })
            .collect()
    }

    #[test]
    fn parses_semicolon_separated_generated_source() {
        let ast = parse_flowchart(DNS_DIAGRAM_SOURCE).expect("parse");

        assert_eq!(ast.direction(), FlowDirection::TopDown);
        let nodes = node_view(&ast);
        assert_eq!(nodes["A"], ("User".to_owned(), NodeShape::Rect));
        assert_eq!(nodes["B"], ("Cache?".to_owned(), NodeShape::Diamond));
        assert_eq!(nodes["D"], ("Resolver".to_owned(), NodeShape::Rect));
        assert_eq!(
            edge_view(&ast),
            vec![
                ("A".to_owned(), "B".to_owned(), None),
                ("B".to_owned(), "C".to_owned(), Some("Yes".to_owned())),
                ("B".to_owned(), "D".to_owned(), Some("No".to_owned())),
            ]
        );
        assert_eq!(ast.node_ids_in_declaration_order(), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn parses_every_shape_and_link_form() {
        let ast = parse_flowchart(SHOWCASE_DIAGRAM_SOURCE).expect("parse");
        let nodes = node_view(&ast);

        assert_eq!(ast.direction(), FlowDirection::LeftRight);
        assert_eq!(nodes["client"].1, NodeShape::Stadium);
        assert_eq!(nodes["cache"].1, NodeShape::Diamond);
        assert_eq!(nodes["answer"].1, NodeShape::Circle);
        assert_eq!(nodes["resolver"].1, NodeShape::Subroutine);
        assert_eq!(nodes["root"].1, NodeShape::Cylinder);
        assert_eq!(nodes["tld"].1, NodeShape::Hexagon);
        assert_eq!(nodes["auth"], ("Authoritative".to_owned(), NodeShape::Asymmetric));

        let thick = ast
            .edges()
            .iter()
            .filter(|edge| edge.stroke() == EdgeStroke::Thick)
            .map(|edge| edge.to().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(thick, vec!["root", "tld"]);

        let heads = ast
            .edges()
            .iter()
            .map(|edge| (edge.from().to_owned(), edge.to().to_owned(), edge.start_head(), edge.end_head()))
            .collect::<Vec<_>>();
        assert!(heads.contains(&("auth".into(), "resolver".into(), ArrowHead::None, ArrowHead::Circle)));
        assert!(heads.contains(&("resolver".into(), "client".into(), ArrowHead::None, ArrowHead::Cross)));
        assert!(heads.contains(&("answer".into(), "client".into(), ArrowHead::Arrow, ArrowHead::Arrow)));
    }

    #[test]
    fn strips_markdown_fences_and_class_suffixes() {
        let input = "```mermaid\ngraph LR\n  a:::hot --> b[\"Quoted ; label\"]\n```\n";
        let ast = parse_flowchart(input).expect("parse");

        assert_eq!(node_view(&ast)["b"].0, "Quoted ; label");
        assert_eq!(edge_view(&ast), vec![("a".to_owned(), "b".to_owned(), None)]);
    }

    #[rstest]
    #[case::square_in_rect("graph TD\nA[\"Label with [brackets]\"] --> B", "A", "Label with [brackets]", NodeShape::Rect)]
    #[case::paren_in_round("graph TD\nB(\"Браузер (Chrome)\") --> C", "B", "Браузер (Chrome)", NodeShape::Round)]
    #[case::brace_in_diamond("graph TD\nD{\"ok {x}?\"} --> E", "D", "ok {x}?", NodeShape::Diamond)]
    fn parses_brackets_inside_quoted_labels(
        #[case] input: &str,
        #[case] id: &str,
        #[case] label: &str,
        #[case] shape: NodeShape,
    ) {
        let ast = parse_flowchart(input).expect("parse");

        assert_eq!(node_view(&ast)[id], (label.to_owned(), shape));
        assert_eq!(ast.edges().len(), 1);
        assert_eq!(ast.edges()[0].from(), id);
    }

    #[test]
    fn parses_hyphenated_ids() {
        let ast = parse_flowchart("graph LR\nnode-1 --> node-2[Second]\nnode-2-->node-3").expect("parse");

        assert_eq!(
            edge_view(&ast),
            vec![
                ("node-1".to_owned(), "node-2".to_owned(), None),
                ("node-2".to_owned(), "node-3".to_owned(), None),
            ]
        );
        assert_eq!(node_view(&ast)["node-2"].0, "Second");
    }

    #[test]
    fn later_explicit_declaration_wins() {
        let ast = parse_flowchart("graph TD\nA --> B\nA[Start]\nA(Begin)\nA --> C").expect("parse");
        let nodes = node_view(&ast);

        assert_eq!(nodes["A"], ("Begin".to_owned(), NodeShape::Round));
        assert_eq!(nodes["B"], ("B".to_owned(), NodeShape::Rect));
    }

    #[test]
    fn expands_chains_and_groups() {
        let ast = parse_flowchart("flowchart TD\na & b --> c --> d").expect("parse");
        assert_eq!(
            edge_view(&ast),
            vec![
                ("a".to_owned(), "c".to_owned(), None),
                ("b".to_owned(), "c".to_owned(), None),
                ("c".to_owned(), "d".to_owned(), None),
            ]
        );
    }

    #[test]
    fn reverse_arrow_is_normalized() {
        let ast = parse_flowchart("graph TD\nB <-- A").expect("parse");
        let edge = &ast.edges()[0];
        assert_eq!((edge.from(), edge.to()), ("A", "B"));
        assert_eq!((edge.start_head(), edge.end_head()), (ArrowHead::None, ArrowHead::Arrow));
    }

    #[test]
    fn head_letter_glued_to_target_stays_in_id() {
        let ast = parse_flowchart("graph TD\nA-->xenon").expect("parse");
        assert_eq!(edge_view(&ast), vec![("A".to_owned(), "xenon".to_owned(), None)]);
    }

    #[test]
    fn header_may_share_line_with_first_statement() {
        let ast = parse_flowchart("graph TD A-->B").expect("parse");
        assert_eq!(edge_view(&ast).len(), 1);
    }

    #[rstest]
    #[case::no_header("A --> B", MermaidFlowchartParseError::MissingHeader)]
    #[case::empty("", MermaidFlowchartParseError::MissingHeader)]
    #[case::sequence(
        "sequenceDiagram\nA->>B: hi",
        MermaidFlowchartParseError::UnsupportedDiagram { line_no: 1, keyword: "sequenceDiagram".to_owned() }
    )]
    #[case::direction(
        "graph XY\nA",
        MermaidFlowchartParseError::InvalidDirection { line_no: 1, direction: "XY".to_owned() }
    )]
    #[case::unclosed(
        "graph TD\nA[Start --> B",
        MermaidFlowchartParseError::UnclosedLabel { line_no: 2, token: "A[Start --> B".to_owned() }
    )]
    #[case::dangling(
        "graph TD\nA -->",
        MermaidFlowchartParseError::DanglingEdge { line_no: 2, statement: "A -->".to_owned() }
    )]
    #[case::edge_label(
        "graph TD\nA -->|yes B",
        MermaidFlowchartParseError::UnclosedEdgeLabel { line_no: 2, statement: "A -->|yes B".to_owned() }
    )]
    #[case::no_nodes("graph TD\n%% nothing\n", MermaidFlowchartParseError::Empty)]
    fn rejects_malformed_sources(#[case] input: &str, #[case] expected: MermaidFlowchartParseError) {
        assert_eq!(parse_flowchart(input).unwrap_err(), expected);
    }

    #[test]
    fn rejects_oversized_graphs() {
        let mut input = String::from("graph TD\n");
        for idx in 0..=super::MAX_FLOWCHART_NODES {
            input.push_str(&format!("n{idx}\n"));
        }
        let err = parse_flowchart(&input).unwrap_err();
        assert!(matches!(err, MermaidFlowchartParseError::TooLarge { .. }), "{err}");
    }

    #[test]
    fn errors_report_line_numbers() {
        let err = parse_flowchart("graph TD\nA --> B\n\nbad id --> C").unwrap_err();
        assert_eq!(err.line_no(), Some(4));
    }
}
