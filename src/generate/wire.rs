// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! JSON shapes exchanged with the generation endpoint.

use serde::{Deserialize, Serialize};

use super::{GenerationError, GenerationRequest};
use crate::model::{Persona, TopicResult};

const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Serialize)]
pub(super) struct WireRequest<'a> {
    topic: &'a str,
    persona: Persona,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_topic: Option<&'a str>,
}

impl<'a> From<&'a GenerationRequest> for WireRequest<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self { topic: request.topic(), persona: request.persona(), parent_topic: request.parent_topic() }
    }
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
}

fn clip(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_owned();
    }
    let mut clipped = body.chars().take(MAX_ERROR_BODY_CHARS).collect::<String>();
    clipped.push('…');
    clipped
}

/// Decodes a 2xx body. A `{ "error": ... }` body is reported as a backend error even with a
/// success status.
pub(super) fn decode_result(status: u16, body: &str) -> Result<TopicResult, GenerationError> {
    if let Ok(WireError { error }) = serde_json::from_str::<WireError>(body) {
        return Err(GenerationError::Backend { status, message: error });
    }
    serde_json::from_str::<TopicResult>(body)
        .map_err(|err| GenerationError::Malformed { reason: err.to_string() })
}

pub(super) fn decode_error(status: u16, body: &str) -> GenerationError {
    let message = match serde_json::from_str::<WireError>(body) {
        Ok(WireError { error }) => error,
        Err(_) => clip(body),
    };
    GenerationError::Backend { status, message }
}
