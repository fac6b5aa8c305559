// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

/// Which representation of the active result is shown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Roadmap,
    Diagram,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Roadmap => Self::Diagram,
            Self::Diagram => Self::Roadmap,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Roadmap => "Roadmap",
            Self::Diagram => "Diagram",
        }
    }
}
