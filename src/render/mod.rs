// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Rendering for laid-out flowcharts.
//!
//! Three targets share one [`DiagramLayout`](crate::layout::DiagramLayout): SVG markup (the
//! export artifact), PNG rasterized from that SVG, and a Unicode box-drawing preview for the
//! terminal.

use std::fmt;

use thiserror::Error;

pub mod preview;
pub mod raster;
pub mod svg;
mod text;

pub use preview::{render_preview, PreviewError, PreviewOptions};
pub use raster::{render_png, RasterError};
pub use svg::{render_svg, SvgOptions};

pub const UNICODE_BOX_HORIZONTAL: char = '─';
pub const UNICODE_BOX_VERTICAL: char = '│';
pub const UNICODE_BOX_TOP_LEFT: char = '┌';
pub const UNICODE_BOX_TOP_RIGHT: char = '┐';
pub const UNICODE_BOX_BOTTOM_LEFT: char = '└';
pub const UNICODE_BOX_BOTTOM_RIGHT: char = '┘';
pub const UNICODE_BOX_TEE_RIGHT: char = '├';
pub const UNICODE_BOX_TEE_LEFT: char = '┤';
pub const UNICODE_BOX_TEE_DOWN: char = '┬';
pub const UNICODE_BOX_TEE_UP: char = '┴';
pub const UNICODE_BOX_CROSS: char = '┼';

/// Which arms of a box-drawing glyph are present, as a 4-bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Arms(u8);

impl Arms {
    const NONE: Self = Self(0);
    const LEFT: Self = Self(1 << 0);
    const RIGHT: Self = Self(1 << 1);
    const UP: Self = Self(1 << 2);
    const DOWN: Self = Self(1 << 3);

    const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    fn has(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn of(ch: char) -> Option<Self> {
        let horizontal = Self::LEFT.with(Self::RIGHT);
        let vertical = Self::UP.with(Self::DOWN);
        Some(match ch {
            UNICODE_BOX_HORIZONTAL => horizontal,
            UNICODE_BOX_VERTICAL => vertical,
            UNICODE_BOX_TOP_LEFT => Self::RIGHT.with(Self::DOWN),
            UNICODE_BOX_TOP_RIGHT => Self::LEFT.with(Self::DOWN),
            UNICODE_BOX_BOTTOM_LEFT => Self::RIGHT.with(Self::UP),
            UNICODE_BOX_BOTTOM_RIGHT => Self::LEFT.with(Self::UP),
            UNICODE_BOX_TEE_RIGHT => vertical.with(Self::RIGHT),
            UNICODE_BOX_TEE_LEFT => vertical.with(Self::LEFT),
            UNICODE_BOX_TEE_DOWN => horizontal.with(Self::DOWN),
            UNICODE_BOX_TEE_UP => horizontal.with(Self::UP),
            UNICODE_BOX_CROSS => horizontal.with(vertical),
            _ => return None,
        })
    }

    fn glyph(self) -> char {
        match self.0 {
            0 => ' ',
            1..=3 => UNICODE_BOX_HORIZONTAL,
            4 | 8 | 12 => UNICODE_BOX_VERTICAL,
            10 => UNICODE_BOX_TOP_LEFT,
            9 => UNICODE_BOX_TOP_RIGHT,
            6 => UNICODE_BOX_BOTTOM_LEFT,
            5 => UNICODE_BOX_BOTTOM_RIGHT,
            14 => UNICODE_BOX_TEE_RIGHT,
            13 => UNICODE_BOX_TEE_LEFT,
            11 => UNICODE_BOX_TEE_DOWN,
            7 => UNICODE_BOX_TEE_UP,
            _ => UNICODE_BOX_CROSS,
        }
    }
}

/// A fixed-size character grid.
///
/// Box-drawing characters written on top of each other merge into junctions (`┼`, `├`, ...);
/// any other character overwrites the cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: usize,
    height: usize,
    cells: Vec<char>,
    arms: Vec<Arms>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Result<Self, CanvasError> {
        let len = width.checked_mul(height).ok_or(CanvasError::AreaOverflow { width, height })?;
        Ok(Self { width, height, cells: vec![' '; len], arms: vec![Arms::NONE; len] })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Result<char, CanvasError> {
        let idx = self.index_of(x, y)?;
        Ok(self.glyph_at(x, y, idx))
    }

    pub fn set(&mut self, x: usize, y: usize, ch: char) -> Result<(), CanvasError> {
        let idx = self.index_of(x, y)?;
        match Arms::of(ch) {
            Some(arms) => self.arms[idx] = self.arms[idx].with(arms),
            None => {
                self.cells[idx] = ch;
                self.arms[idx] = Arms::NONE;
            }
        }
        Ok(())
    }

    /// Writes `text` left-to-right from `(x, y)`, clipping at the right edge.
    pub fn write_str(&mut self, x: usize, y: usize, text: &str) -> Result<(), CanvasError> {
        if y >= self.height {
            return Err(self.out_of_bounds(x, y));
        }
        for (offset, ch) in text.chars().enumerate() {
            if x + offset >= self.width {
                break;
            }
            self.set(x + offset, y, ch)?;
        }
        Ok(())
    }

    pub fn draw_hline(&mut self, x0: usize, x1: usize, y: usize) -> Result<(), CanvasError> {
        for x in x0.min(x1)..=x0.max(x1) {
            self.set(x, y, UNICODE_BOX_HORIZONTAL)?;
        }
        Ok(())
    }

    pub fn draw_vline(&mut self, x: usize, y0: usize, y1: usize) -> Result<(), CanvasError> {
        for y in y0.min(y1)..=y0.max(y1) {
            self.set(x, y, UNICODE_BOX_VERTICAL)?;
        }
        Ok(())
    }

    /// Draws a single-line box with corners at `(x0, y0)` and `(x1, y1)` (inclusive).
    pub fn draw_box(&mut self, x0: usize, y0: usize, x1: usize, y1: usize) -> Result<(), CanvasError> {
        let (min_x, max_x) = (x0.min(x1), x0.max(x1));
        let (min_y, max_y) = (y0.min(y1), y0.max(y1));
        if min_x == max_x || min_y == max_y {
            self.draw_hline(min_x, max_x, min_y)?;
            return self.draw_vline(min_x, min_y, max_y);
        }

        if max_x - min_x >= 2 {
            self.draw_hline(min_x + 1, max_x - 1, min_y)?;
            self.draw_hline(min_x + 1, max_x - 1, max_y)?;
        }
        if max_y - min_y >= 2 {
            self.draw_vline(min_x, min_y + 1, max_y - 1)?;
            self.draw_vline(max_x, min_y + 1, max_y - 1)?;
        }
        self.set(min_x, min_y, UNICODE_BOX_TOP_LEFT)?;
        self.set(max_x, min_y, UNICODE_BOX_TOP_RIGHT)?;
        self.set(min_x, max_y, UNICODE_BOX_BOTTOM_LEFT)?;
        self.set(max_x, max_y, UNICODE_BOX_BOTTOM_RIGHT)
    }

    fn out_of_bounds(&self, x: usize, y: usize) -> CanvasError {
        CanvasError::OutOfBounds { x, y, width: self.width, height: self.height }
    }

    fn index_of(&self, x: usize, y: usize) -> Result<usize, CanvasError> {
        if x >= self.width || y >= self.height {
            return Err(self.out_of_bounds(x, y));
        }
        Ok(y * self.width + x)
    }

    fn arms_at(&self, x: usize, y: usize) -> Arms {
        self.arms[y * self.width + x]
    }

    /// Box glyph for a cell, keeping only arms that meet a neighbour's arm.
    fn glyph_at(&self, x: usize, y: usize, idx: usize) -> char {
        let arms = self.arms[idx];
        if arms.is_empty() {
            return self.cells[idx];
        }

        let mut connected = Arms::NONE;
        if arms.has(Arms::LEFT) && x > 0 && self.arms_at(x - 1, y).has(Arms::RIGHT) {
            connected = connected.with(Arms::LEFT);
        }
        if arms.has(Arms::RIGHT) && x + 1 < self.width && self.arms_at(x + 1, y).has(Arms::LEFT) {
            connected = connected.with(Arms::RIGHT);
        }
        if arms.has(Arms::UP) && y > 0 && self.arms_at(x, y - 1).has(Arms::DOWN) {
            connected = connected.with(Arms::UP);
        }
        if arms.has(Arms::DOWN) && y + 1 < self.height && self.arms_at(x, y + 1).has(Arms::UP) {
            connected = connected.with(Arms::DOWN);
        }

        if connected.is_empty() { arms } else { connected }.glyph()
    }
}

impl fmt::Display for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use std::fmt::Write as _;

        for y in 0..self.height {
            for x in 0..self.width {
                f.write_char(self.glyph_at(x, y, y * self.width + x))?;
            }
            if y + 1 < self.height {
                f.write_char('\n')?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    #[error("canvas area overflow: {width}*{height}")]
    AreaOverflow { width: usize, height: usize },
    #[error("out of bounds: ({x},{y}) for {width}x{height} canvas")]
    OutOfBounds { x: usize, y: usize, width: usize, height: usize },
}
