// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{GenerationBackend, GenerationError, GenerationRequest};
use crate::model::fixtures::{deep_dive_result, dns_result, DNS_TOPIC};
use crate::model::TopicResult;

/// Offline backend serving canned results.
///
/// The DNS topic gets its hand-written plan; any other topic (and every deep-dive) gets a
/// deterministic three-step plan.
#[derive(Debug, Default)]
pub struct DemoBackend {
    calls: AtomicUsize,
    latency: Option<Duration>,
    failure: Option<GenerationError>,
    deep_dive_failure: Option<GenerationError>,
}

impl DemoBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps for `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fails every request with `err`.
    pub fn with_failure(mut self, err: GenerationError) -> Self {
        self.failure = Some(err);
        self
    }

    /// Fails only requests that carry a parent topic.
    pub fn with_deep_dive_failure(mut self, err: GenerationError) -> Self {
        self.deep_dive_failure = Some(err);
        self
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(request: &GenerationRequest) -> Result<TopicResult, GenerationError> {
        let result = match request.parent_topic() {
            None if request.topic().eq_ignore_ascii_case(DNS_TOPIC) => dns_result(),
            None => deep_dive_result(request.topic(), request.topic()),
            Some(parent) => deep_dive_result(request.topic(), parent),
        };
        result.map_err(|err| GenerationError::Malformed { reason: err.to_string() })
    }
}

#[async_trait]
impl GenerationBackend for DemoBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<TopicResult, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(call, topic = request.topic(), parent = ?request.parent_topic(), "demo generate");

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if let (Some(err), Some(_)) = (&self.deep_dive_failure, request.parent_topic()) {
            return Err(err.clone());
        }
        Self::answer(&request)
    }
}
