// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Generation backends: turn a topic into a [`TopicResult`].
//!
//! [`GenerationBackend`] serves top-level requests. [`DeepDiveProvider`] is the narrower
//! capability handed to the exploration tree; every generation backend is one.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::model::{Persona, TopicResult};

mod demo;
mod http;
mod wire;

pub use demo::DemoBackend;
pub use http::{HttpBackend, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("topic must not be empty")]
    EmptyTopic,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("invalid generation endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("generation backend error {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("malformed generation result: {reason}")]
    Malformed { reason: String },
}

/// A validated top-level generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    topic: String,
    persona: Persona,
    parent_topic: Option<String>,
}

impl GenerationRequest {
    /// Rejects topics that are empty after trimming.
    pub fn new(topic: &str, persona: Persona) -> Result<Self, InputError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(InputError::EmptyTopic);
        }
        Ok(Self { topic: topic.to_owned(), persona, parent_topic: None })
    }

    pub fn with_parent_topic(mut self, parent_topic: &str) -> Self {
        let parent_topic = parent_topic.trim();
        self.parent_topic = (!parent_topic.is_empty()).then(|| parent_topic.to_owned());
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn parent_topic(&self) -> Option<&str> {
        self.parent_topic.as_deref()
    }
}

/// A sub-plan request for one step, keyed by the step title and the topic it sits under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepDiveRequest {
    step_title: String,
    enclosing_topic: String,
    persona: Persona,
}

impl DeepDiveRequest {
    pub fn new(step_title: impl Into<String>, enclosing_topic: impl Into<String>, persona: Persona) -> Self {
        Self { step_title: step_title.into(), enclosing_topic: enclosing_topic.into(), persona }
    }

    pub fn step_title(&self) -> &str {
        &self.step_title
    }

    pub fn enclosing_topic(&self) -> &str {
        &self.enclosing_topic
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn to_generation_request(&self) -> Result<GenerationRequest, InputError> {
        Ok(GenerationRequest::new(&self.step_title, self.persona)?.with_parent_topic(&self.enclosing_topic))
    }
}

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<TopicResult, GenerationError>;
}

#[async_trait]
pub trait DeepDiveProvider: Send + Sync {
    async fn deep_dive(&self, request: DeepDiveRequest) -> Result<TopicResult, GenerationError>;
}

#[async_trait]
impl<T: GenerationBackend + ?Sized> DeepDiveProvider for T {
    async fn deep_dive(&self, request: DeepDiveRequest) -> Result<TopicResult, GenerationError> {
        debug!(
            step = request.step_title(),
            enclosing = request.enclosing_topic(),
            "deep-dive requested"
        );
        let request = request.to_generation_request()?;
        self.generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{DeepDiveRequest, GenerationRequest, InputError};
    use crate::model::Persona;

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\n\t")]
    fn blank_topics_are_rejected(#[case] topic: &str) {
        assert_eq!(GenerationRequest::new(topic, Persona::Neutral), Err(InputError::EmptyTopic));
    }

    #[test]
    fn topics_are_trimmed() {
        let request = GenerationRequest::new("  DNS  ", Persona::Novice).expect("valid");
        assert_eq!(request.topic(), "DNS");
        assert_eq!(request.persona(), Persona::Novice);
        assert_eq!(request.parent_topic(), None);
    }

    #[test]
    fn deep_dive_maps_to_a_nested_request() {
        let request = DeepDiveRequest::new("DNS Резолвер", "Как работает DNS", Persona::Engineer)
            .to_generation_request()
            .expect("valid");
        assert_eq!(request.topic(), "DNS Резолвер");
        assert_eq!(request.parent_topic(), Some("Как работает DNS"));
        assert_eq!(request.persona(), Persona::Engineer);
    }
}
