// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use super::wire::{decode_error, decode_result, WireRequest};
use super::{GenerationBackend, GenerationError, GenerationRequest};
use crate::model::TopicResult;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/api/generate";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Posts generation requests as JSON to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    endpoint: Url,
    http: Client,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, GenerationError> {
        let endpoint = Url::parse(endpoint).map_err(|err| GenerationError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason: err.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(GenerationError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: format!("unsupported scheme {:?}", endpoint.scheme()),
            });
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GenerationError::Transport(err.to_string()))?;
        Ok(Self { endpoint, http, timeout })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn transport_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.timeout)
        } else {
            GenerationError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<TopicResult, GenerationError> {
        debug!(endpoint = %self.endpoint, topic = request.topic(), persona = %request.persona(), "generate: posting");

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&WireRequest::from(&request))
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|err| self.transport_error(err))?;

        if !(200..300).contains(&status) {
            let err = decode_error(status, &body);
            warn!(status, error = %err, "generate: backend returned an error");
            return Err(err);
        }
        decode_result(status, &body)
    }
}
