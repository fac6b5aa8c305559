// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MermaidIdentError {
    #[error("must not be empty")]
    Empty,
    #[error("must not contain whitespace")]
    ContainsWhitespace,
    #[error("contains invalid character: '{ch}'")]
    InvalidChar { ch: char },
}

pub(super) fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Node ids are word characters in any script; generated diagrams occasionally use
/// non-Latin ids. A single `-` may join two word runs (`node-1`); the edge scanner never
/// treats a lone dash as a link.
pub(super) fn validate_mermaid_ident(ident: &str) -> Result<(), MermaidIdentError> {
    if ident.is_empty() {
        return Err(MermaidIdentError::Empty);
    }
    if ident.chars().any(char::is_whitespace) {
        return Err(MermaidIdentError::ContainsWhitespace);
    }
    for part in ident.split('-') {
        if part.is_empty() {
            return Err(MermaidIdentError::InvalidChar { ch: '-' });
        }
        if let Some(ch) = part.chars().find(|c| !is_ident_char(*c)) {
            return Err(MermaidIdentError::InvalidChar { ch });
        }
    }
    Ok(())
}
