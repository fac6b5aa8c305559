// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Canned topic results used by the demo backend, tests and benches.

use super::topic::{Step, TopicResult, TopicResultError};

pub const DNS_TOPIC: &str = "Как работает DNS";

pub const DNS_DIAGRAM_SOURCE: &str =
    "graph TD; A[User] --> B{Cache?}; B -- Yes --> C[IP Found]; B -- No --> D[Resolver];";

pub fn dns_result() -> Result<TopicResult, TopicResultError> {
    TopicResult::new(
        DNS_TOPIC,
        vec![
            Step::new(
                1,
                "Локальный кэш",
                "Браузер проверяет свой кэш.",
                vec!["browser dns cache".to_owned()],
            ),
            Step::new(2, "Hosts файл", "ОС проверяет файл hosts.", vec!["hosts file".to_owned()]),
            Step::new(3, "DNS Резолвер", "Запрос уходит к провайдеру.", vec!["ISP DNS".to_owned()]),
        ],
        DNS_DIAGRAM_SOURCE,
    )
}

/// A three-step sub-plan for `title`, nested under `parent`.
///
/// Deterministic so repeated deep-dives on the same step produce equal results.
pub fn deep_dive_result(title: &str, parent: &str) -> Result<TopicResult, TopicResultError> {
    let title = title.trim();
    let steps = ["Основы", "Как это устроено", "Практика"]
        .iter()
        .enumerate()
        .map(|(idx, phase)| {
            Step::new(
                idx as u32 + 1,
                format!("{title}: {phase}"),
                format!("{phase} в контексте темы «{parent}»."),
                vec![format!("{title} {phase}")],
            )
        })
        .collect();

    let diagram = format!(
        "graph TD\n  A[\"{title}\"] --> B[Основы]\n  B --> C[Как это устроено]\n  C --> D[Практика]\n  D -.-> A\n"
    );

    TopicResult::new(title, steps, diagram)
}

/// A flowchart that exercises every supported node shape and edge form.
pub const SHOWCASE_DIAGRAM_SOURCE: &str = r#"flowchart LR
    %% request path
    client([Client]) --> cache{Cache hit?}
    cache -->|yes| answer((Answer))
    cache -- no --> resolver[[Recursive resolver]]
    resolver ==> root[(Root zone)] & tld{{TLD server}}
    tld -.-> auth>Authoritative]
    auth --o resolver
    resolver --x client
    answer <--> client
    style client fill:#eee
    classDef hot stroke:#f00
    class cache hot
"#;
