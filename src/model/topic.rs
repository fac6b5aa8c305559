// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Topic results: the roadmap steps plus the flowchart source generated for one topic.

use std::collections::BTreeSet;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const RESOURCE_SEARCH_BASE: &str = "https://www.google.com/search";

/// One generated answer for a topic.
///
/// Values are validated on construction (and on deserialization) and never mutated afterwards;
/// callers share them behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTopicResult")]
pub struct TopicResult {
    topic: String,
    steps: Vec<Step>,
    diagram_source: String,
}

impl TopicResult {
    /// Builds a result, sorting steps by `order` and rejecting inconsistent data.
    pub fn new(
        topic: impl Into<String>,
        steps: Vec<Step>,
        diagram_source: impl Into<String>,
    ) -> Result<Self, TopicResultError> {
        let topic = topic.into().trim().to_owned();
        if topic.is_empty() {
            return Err(TopicResultError::EmptyTopic);
        }
        if steps.is_empty() {
            return Err(TopicResultError::NoSteps);
        }

        let mut steps = steps;
        steps.sort_by_key(Step::order);

        let mut seen = BTreeSet::<u32>::new();
        for step in &steps {
            if step.order == 0 {
                return Err(TopicResultError::ZeroOrder);
            }
            if !seen.insert(step.order) {
                return Err(TopicResultError::DuplicateOrder { order: step.order });
            }
            if step.title.trim().is_empty() {
                return Err(TopicResultError::EmptyStepTitle { order: step.order });
            }
        }

        for (expected, step) in (1u32..).zip(&steps) {
            if step.order != expected {
                return Err(TopicResultError::OrderGap { expected, found: step.order });
            }
        }

        Ok(Self { topic, steps, diagram_source: diagram_source.into() })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, order: u32) -> Option<&Step> {
        self.steps.iter().find(|step| step.order == order)
    }

    pub fn diagram_source(&self) -> &str {
        &self.diagram_source
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(alias = "step")]
    order: u32,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    resources: Vec<String>,
}

impl Step {
    pub fn new(
        order: u32,
        title: impl Into<String>,
        description: impl Into<String>,
        resources: Vec<String>,
    ) -> Self {
        Self { order, title: title.into(), description: description.into(), resources }
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// Outbound web-search links for this step's resources, in declaration order.
    pub fn resource_links(&self) -> Vec<ResourceLink> {
        self.resources
            .iter()
            .filter(|resource| !resource.trim().is_empty())
            .filter_map(|resource| ResourceLink::search(resource))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLink {
    label: String,
    url: Url,
}

impl ResourceLink {
    fn search(resource: &str) -> Option<Self> {
        let label = resource.trim();
        let url = Url::parse_with_params(RESOURCE_SEARCH_BASE, &[("q", label)]).ok()?;
        Some(Self { label: label.to_owned(), url })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicResultError {
    #[error("topic must not be empty")]
    EmptyTopic,
    #[error("result contains no steps")]
    NoSteps,
    #[error("step order must start at 1")]
    ZeroOrder,
    #[error("step order {order} appears more than once")]
    DuplicateOrder { order: u32 },
    #[error("step orders are not contiguous: expected {expected}, found {found}")]
    OrderGap { expected: u32, found: u32 },
    #[error("step {order} has an empty title")]
    EmptyStepTitle { order: u32 },
}

/// Accepts both the generation endpoint field names (`roadmap`, `mermaid_code`) and the
/// canonical names written by [`TopicResult`]'s serializer.
#[derive(Debug, Deserialize)]
struct RawTopicResult {
    topic: String,
    #[serde(alias = "roadmap")]
    steps: Vec<Step>,
    #[serde(alias = "mermaid_code", default)]
    diagram_source: String,
}

impl TryFrom<RawTopicResult> for TopicResult {
    type Error = TopicResultError;

    fn try_from(raw: RawTopicResult) -> Result<Self, Self::Error> {
        TopicResult::new(raw.topic, raw.steps, raw.diagram_source)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Step, TopicResult, TopicResultError};

    fn step(order: u32, title: &str) -> Step {
        Step::new(order, title, "", Vec::new())
    }

    #[test]
    fn sorts_steps_by_order() {
        let result = TopicResult::new(
            "Rust",
            vec![step(2, "Borrowing"), step(1, "Ownership"), step(3, "Lifetimes")],
            "graph TD; A-->B",
        )
        .expect("valid result");

        let titles = result.steps().iter().map(Step::title).collect::<Vec<_>>();
        assert_eq!(titles, vec!["Ownership", "Borrowing", "Lifetimes"]);
        assert_eq!(result.step(3).map(Step::title), Some("Lifetimes"));
    }

    #[rstest]
    #[case::empty_topic("  ", vec![step(1, "a")], TopicResultError::EmptyTopic)]
    #[case::no_steps("t", vec![], TopicResultError::NoSteps)]
    #[case::zero("t", vec![step(0, "a")], TopicResultError::ZeroOrder)]
    #[case::duplicate("t", vec![step(1, "a"), step(1, "b")], TopicResultError::DuplicateOrder { order: 1 })]
    #[case::gap("t", vec![step(1, "a"), step(3, "b")], TopicResultError::OrderGap { expected: 2, found: 3 })]
    #[case::blank_title("t", vec![step(1, " ")], TopicResultError::EmptyStepTitle { order: 1 })]
    fn rejects_inconsistent_results(
        #[case] topic: &str,
        #[case] steps: Vec<Step>,
        #[case] expected: TopicResultError,
    ) {
        assert_eq!(TopicResult::new(topic, steps, "").unwrap_err(), expected);
    }

    #[test]
    fn deserializes_endpoint_field_names() {
        let json = r#"{
            "topic": "Как работает DNS",
            "roadmap": [
                {"step": 2, "title": "Hosts файл", "description": "d2", "resources": ["hosts"]},
                {"step": 1, "title": "Локальный кэш", "description": "d1", "resources": []}
            ],
            "mermaid_code": "graph TD; A-->B;"
        }"#;

        let result: TopicResult = serde_json::from_str(json).expect("decode");
        assert_eq!(result.topic(), "Как работает DNS");
        assert_eq!(result.steps()[0].title(), "Локальный кэш");
        assert_eq!(result.diagram_source(), "graph TD; A-->B;");
    }

    #[test]
    fn deserialization_runs_validation() {
        let json = r#"{"topic":"x","roadmap":[{"step":1,"title":"a"},{"step":1,"title":"b"}]}"#;
        let err = serde_json::from_str::<TopicResult>(json).unwrap_err();
        assert!(err.to_string().contains("more than once"), "{err}");
    }

    #[test]
    fn resource_links_are_query_encoded_searches() {
        let step = Step::new(1, "Cache", "", vec!["DNS cache TTL".to_owned(), " ".to_owned()]);
        let links = step.resource_links();

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].label(), "DNS cache TTL");
        assert_eq!(links[0].url().as_str(), "https://www.google.com/search?q=DNS+cache+TTL");
    }
}
