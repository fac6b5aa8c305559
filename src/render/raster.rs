// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RasterError {
    #[error("scale must be a finite number greater than zero, got {scale}")]
    InvalidScale { scale: f32 },
    #[error("failed to parse SVG for PNG export: {0}")]
    Parse(String),
    #[error("failed to allocate {width}x{height} surface for PNG export")]
    Allocate { width: u32, height: u32 },
    #[error("failed to encode PNG output: {0}")]
    Encode(String),
}

/// Rasterizes an SVG document into PNG bytes at `scale` times its intrinsic size.
pub fn render_png(svg: &str, scale: f32) -> Result<Vec<u8>, RasterError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RasterError::InvalidScale { scale });
    }

    let mut options = usvg::Options::default();
    options.font_family = "Inter".to_owned();
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &options).map_err(|err| RasterError::Parse(err.to_string()))?;

    let size = tree.size().to_int_size();
    let width = ((size.width() as f32) * scale).ceil().max(1.0) as u32;
    let height = ((size.height() as f32) * scale).ceil().max(1.0) as u32;

    let mut pixmap = Pixmap::new(width, height).ok_or(RasterError::Allocate { width, height })?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    pixmap.encode_png().map_err(|err| RasterError::Encode(err.to_string()))
}
