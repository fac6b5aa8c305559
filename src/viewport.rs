// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Diagram viewport: renders a flowchart source and manages zoom, pan, fullscreen and export.
//!
//! Graph sources come from a generation backend and are untrusted. Parse and layout failures
//! turn into an inline placeholder instead of an error. Zoom and pan only change how the
//! current artifact is projected; the artifact itself (and every export) keeps the intrinsic
//! size computed by the layout engine.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

use base64::Engine as _;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::format::mermaid::{parse_flowchart, MermaidFlowchartParseError};
use crate::layout::{layout_flowchart, DiagramLayout, FlowchartLayoutError};
use crate::render::{render_png, render_preview, render_svg, PreviewOptions, RasterError, SvgOptions};

pub const EXPORT_FILE_STEM: &str = "structura-diagram";

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_step: f32,
    /// How long the viewport stays busy after an export starts, successful or not.
    pub export_cooldown: Duration,
    pub svg: SvgOptions,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 5.0,
            zoom_step: 0.2,
            export_cooldown: Duration::from_secs(1),
            svg: SvgOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Raster PNG.
    Png,
    /// Vector SVG.
    Svg,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }

    pub fn file_name(self) -> String {
        format!("{EXPORT_FILE_STEM}.{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" | "raster" => Ok(Self::Png),
            "svg" | "vector" => Ok(Self::Svg),
            other => Err(format!("unknown export format {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagramError {
    #[error(transparent)]
    Parse(#[from] MermaidFlowchartParseError),
    #[error(transparent)]
    Layout(#[from] FlowchartLayoutError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no rendered diagram to export")]
    NotRendered,
    #[error("an export is already in progress ({remaining:?} left)")]
    Busy { remaining: Duration },
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A successfully rendered diagram: the source it came from, its layout and its SVG markup.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDiagram {
    source: String,
    layout: DiagramLayout,
    svg: String,
}

impl RenderedDiagram {
    /// Parses and lays out `source`, then renders it to SVG.
    pub fn build(source: &str, svg_options: &SvgOptions) -> Result<Self, DiagramError> {
        let ast = parse_flowchart(source)?;
        let layout = layout_flowchart(&ast)?;
        let svg = render_svg(&layout, svg_options);
        Ok(Self { source: source.to_owned(), layout, svg })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn layout(&self) -> &DiagramLayout {
        &self.layout
    }

    pub fn svg(&self) -> &str {
        &self.svg
    }

    /// Intrinsic pixel size of the artifact.
    pub fn size(&self) -> (f32, f32) {
        (self.layout.width(), self.layout.height())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewportContent {
    Empty,
    Rendered(RenderedDiagram),
    /// Shown in place of a diagram whose source failed to parse or lay out.
    Placeholder { source: String, message: String },
}

impl ViewportContent {
    fn source(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Rendered(diagram) => Some(diagram.source()),
            Self::Placeholder { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    format: ExportFormat,
    bytes: Vec<u8>,
}

impl ExportedImage {
    pub fn format(&self) -> ExportFormat {
        self.format
    }

    pub fn file_name(&self) -> String {
        self.format.file_name()
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{encoded}", self.mime_type())
    }

    /// Writes the image into `dir` under its download file name.
    pub fn write_into(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(dir).map_err(|source| ExportError::Io { path: dir.to_path_buf(), source })?;
        let path = dir.join(self.file_name());
        fs::write(&path, &self.bytes).map_err(|source| ExportError::Io { path: path.clone(), source })?;
        Ok(path)
    }
}

#[derive(Debug, Clone)]
pub struct Viewport {
    config: ViewportConfig,
    content: ViewportContent,
    zoom: f32,
    pan: (i32, i32),
    fullscreen: bool,
    busy_until: Option<Instant>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config,
            content: ViewportContent::Empty,
            zoom: 1.0,
            pan: (0, 0),
            fullscreen: false,
            busy_until: None,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn content(&self) -> &ViewportContent {
        &self.content
    }

    pub fn rendered(&self) -> Option<&RenderedDiagram> {
        match &self.content {
            ViewportContent::Rendered(diagram) => Some(diagram),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.content, ViewportContent::Placeholder { .. })
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> (i32, i32) {
        self.pan
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Renders `source` unless it is already the current content.
    ///
    /// Returns whether the content changed. Failures leave a placeholder and drop any
    /// previously rendered diagram.
    pub fn render(&mut self, source: &str) -> bool {
        if self.content.source() == Some(source) {
            return false;
        }

        self.content = match RenderedDiagram::build(source, &self.config.svg) {
            Ok(diagram) => {
                let (width, height) = diagram.size();
                debug!(width, height, nodes = diagram.layout().nodes().len(), "diagram rendered");
                ViewportContent::Rendered(diagram)
            }
            Err(err) => {
                warn!(error = %err, "diagram render failed; showing placeholder");
                ViewportContent::Placeholder {
                    source: source.to_owned(),
                    message: format!("Render error (try regenerating): {err}"),
                }
            }
        };
        true
    }

    /// Drops the current content so the next [`Viewport::render`] starts from scratch.
    pub fn clear(&mut self) {
        self.content = ViewportContent::Empty;
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.set_zoom(self.zoom + self.config.zoom_step)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.set_zoom(self.zoom - self.config.zoom_step)
    }

    /// Zoom back to exactly 1.0 and the pan offset back to the origin.
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan = (0, 0);
    }

    pub fn pan_by(&mut self, dx: i32, dy: i32) {
        self.pan = (self.pan.0.saturating_add(dx), self.pan.1.saturating_add(dy));
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        self.fullscreen
    }

    pub fn exit_fullscreen(&mut self) {
        self.fullscreen = false;
    }

    /// Escape leaves fullscreen; returns whether it was consumed.
    pub fn handle_escape(&mut self) -> bool {
        std::mem::replace(&mut self.fullscreen, false)
    }

    pub fn is_busy(&self, now: Instant) -> bool {
        self.busy_until.is_some_and(|until| now < until)
    }

    /// Clears an elapsed export cooldown.
    pub fn settle(&mut self, now: Instant) {
        if !self.is_busy(now) {
            self.busy_until = None;
        }
    }

    pub fn can_export(&self, now: Instant) -> bool {
        self.rendered().is_some() && !self.is_busy(now)
    }

    /// Captures the current diagram at unit scale on an opaque background.
    ///
    /// Starting an export makes the viewport busy for the configured cooldown whatever the
    /// outcome.
    pub fn export(&mut self, format: ExportFormat, now: Instant) -> Result<ExportedImage, ExportError> {
        if let Some(until) = self.busy_until.filter(|until| now < *until) {
            return Err(ExportError::Busy { remaining: until - now });
        }
        let Some(diagram) = self.rendered() else {
            return Err(ExportError::NotRendered);
        };

        let captured = match format {
            ExportFormat::Svg => Ok(diagram.svg().as_bytes().to_vec()),
            ExportFormat::Png => render_png(diagram.svg(), 1.0),
        };
        self.busy_until = Some(now + self.config.export_cooldown);

        match captured {
            Ok(bytes) => {
                debug!(format = format.extension(), len = bytes.len(), "diagram exported");
                Ok(ExportedImage { format, bytes })
            }
            Err(err) => {
                error!(format = format.extension(), error = %err, "diagram export failed");
                Err(err.into())
            }
        }
    }

    /// Terminal text for the current content at the current zoom.
    pub fn preview_text(&self) -> String {
        match &self.content {
            ViewportContent::Empty => String::new(),
            ViewportContent::Placeholder { message, .. } => message.clone(),
            ViewportContent::Rendered(diagram) => {
                match render_preview(diagram.layout(), &PreviewOptions { zoom: self.zoom }) {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(error = %err, zoom = self.zoom, "diagram preview failed");
                        format!("Preview unavailable: {err}")
                    }
                }
            }
        }
    }

    fn set_zoom(&mut self, zoom: f32) -> f32 {
        // Keep repeated steps on the 0.01 grid so 1.0 + 5 * 0.2 lands exactly on 2.0.
        let rounded = (zoom * 100.0).round() / 100.0;
        self.zoom = rounded.clamp(self.config.min_zoom, self.config.max_zoom);
        self.zoom
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use proptest::prelude::*;
    use rstest::rstest;

    use super::{ExportError, ExportFormat, Viewport, ViewportContent};
    use crate::model::fixtures::DNS_DIAGRAM_SOURCE;

    fn rendered() -> Viewport {
        let mut viewport = Viewport::default();
        assert!(viewport.render(DNS_DIAGRAM_SOURCE));
        viewport
    }

    #[test]
    fn render_is_idempotent_for_the_same_source() {
        let mut viewport = rendered();
        let before = viewport.content().clone();
        assert!(!viewport.render(DNS_DIAGRAM_SOURCE));
        assert_eq!(viewport.content(), &before);
    }

    #[rstest]
    #[case("sequenceDiagram\nA->>B: hi")]
    #[case("graph TD\nA[unclosed --> B")]
    #[case("")]
    fn malformed_source_degrades_to_placeholder(#[case] source: &str) {
        let mut viewport = rendered();
        viewport.render(source);

        assert!(viewport.is_placeholder());
        assert!(viewport.rendered().is_none(), "stale diagram dropped");
        assert!(!viewport.can_export(Instant::now()));
        assert!(viewport.preview_text().starts_with("Render error"));
    }

    #[rstest]
    #[case("graph TD\nA[\"Label with [brackets]\"] --> B")]
    #[case("graph LR\nA --> B(\"Браузер (Chrome)\") --> C")]
    #[case("graph TD\nnode-1 --> node-2")]
    fn generated_label_forms_render(#[case] source: &str) {
        let mut viewport = Viewport::default();
        assert!(viewport.render(source));

        assert!(!viewport.is_placeholder(), "{}", viewport.preview_text());
        assert!(viewport.rendered().is_some());
    }

    #[test]
    fn clear_allows_rendering_the_same_source_again() {
        let mut viewport = Viewport::default();
        viewport.render("not a graph");
        viewport.clear();
        assert_eq!(viewport.content(), &ViewportContent::Empty);
        assert!(viewport.render("not a graph"));
    }

    #[test]
    fn zoom_steps_and_clamps() {
        let mut viewport = Viewport::default();
        for _ in 0..5 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.zoom(), 2.0);
        for _ in 0..100 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.zoom(), 5.0);
        for _ in 0..100 {
            viewport.zoom_out();
        }
        assert_eq!(viewport.zoom(), 0.5);

        viewport.pan_by(4, -2);
        viewport.reset();
        assert_eq!(viewport.zoom(), 1.0);
        assert_eq!(viewport.pan(), (0, 0));
    }

    #[test]
    fn escape_leaves_fullscreen() {
        let mut viewport = Viewport::default();
        assert!(!viewport.handle_escape());
        assert!(viewport.toggle_fullscreen());
        assert!(viewport.handle_escape());
        assert!(!viewport.is_fullscreen());
    }

    #[test]
    fn export_requires_a_rendered_diagram() {
        let mut viewport = Viewport::default();
        let now = Instant::now();
        assert!(matches!(viewport.export(ExportFormat::Svg, now), Err(ExportError::NotRendered)));
        assert!(!viewport.is_busy(now), "a refused export does not start the cooldown");
    }

    #[test]
    fn svg_export_ignores_zoom_and_blocks_for_the_cooldown() {
        let mut viewport = rendered();
        viewport.zoom_in();
        viewport.pan_by(10, 10);
        let now = Instant::now();

        let image = viewport.export(ExportFormat::Svg, now).expect("export");
        assert_eq!(image.file_name(), "structura-diagram.svg");
        assert_eq!(image.bytes(), viewport.rendered().expect("rendered").svg().as_bytes());
        assert!(image.to_data_url().starts_with("data:image/svg+xml;base64,"));

        let half = now + Duration::from_millis(500);
        assert!(matches!(viewport.export(ExportFormat::Png, half), Err(ExportError::Busy { .. })));
        assert!(!viewport.can_export(half));

        let later = now + Duration::from_secs(1);
        viewport.settle(later);
        assert!(viewport.can_export(later));
    }

    #[test]
    fn png_export_writes_a_png_file() {
        let mut viewport = rendered();
        let image = viewport.export(ExportFormat::Png, Instant::now()).expect("export");
        assert_eq!(image.mime_type(), "image/png");
        assert!(image.bytes().starts_with(b"\x89PNG"));

        let dir = tempfile::tempdir().expect("tempdir");
        let path = image.write_into(dir.path()).expect("write");
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("structura-diagram.png"));
        assert_eq!(std::fs::read(path).expect("read"), image.bytes());
    }

    #[test]
    fn preview_follows_zoom() {
        let mut viewport = rendered();
        let normal = viewport.preview_text();
        viewport.zoom_in();
        viewport.zoom_in();
        assert_ne!(viewport.preview_text(), normal);
        assert!(normal.contains("Resolver"));
    }

    #[rstest]
    #[case("png", ExportFormat::Png)]
    #[case("SVG", ExportFormat::Svg)]
    #[case("vector", ExportFormat::Svg)]
    fn export_format_parses(#[case] input: &str, #[case] expected: ExportFormat) {
        assert_eq!(input.parse::<ExportFormat>(), Ok(expected));
    }

    proptest! {
        #[test]
        fn zoom_stays_in_bounds(steps in prop::collection::vec(any::<bool>(), 0..80)) {
            let mut viewport = Viewport::default();
            for zoom_in in steps {
                let zoom = if zoom_in { viewport.zoom_in() } else { viewport.zoom_out() };
                prop_assert!((0.5..=5.0).contains(&zoom));
            }
            viewport.reset();
            prop_assert_eq!(viewport.zoom(), 1.0);
        }
    }
}
