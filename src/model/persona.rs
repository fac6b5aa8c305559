// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Audience the generated roadmap is written for.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    #[default]
    Neutral,
    Novice,
    Engineer,
    Academic,
}

impl Persona {
    pub const ALL: [Persona; 4] =
        [Persona::Neutral, Persona::Novice, Persona::Engineer, Persona::Academic];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Novice => "novice",
            Self::Engineer => "engineer",
            Self::Academic => "academic",
        }
    }

    /// Next persona in selector order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown persona '{value}' (expected neutral, novice, engineer or academic)")]
pub struct ParsePersonaError {
    value: String,
}

impl FromStr for Persona {
    type Err = ParsePersonaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|persona| persona.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParsePersonaError { value: wanted.to_owned() })
    }
}
