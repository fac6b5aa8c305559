// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The controller behind the shell.
//!
//! Owns the content store, the exploration tree and the diagram viewport and keeps them in step:
//! a new active result re-roots the tree and (in diagram mode) re-renders the viewport. Network
//! work never happens here. Callers get tickets, run them wherever they like and hand the
//! results back, so everything in this module is synchronous and single-threaded.

use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::explore::{
    Completion, DeepDiveTicket, ExplorationTree, FetchedDeepDive, NodePath, ToggleOutcome, TreeError,
};
use crate::generate::{
    DeepDiveProvider, GenerationBackend, GenerationError, GenerationRequest, InputError,
};
use crate::model::{Persona, TopicResult, ViewMode};
use crate::store::ContentStore;
use crate::viewport::{ExportError, ExportFormat, Viewport, ViewportConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct WorkbenchConfig {
    pub persona: Persona,
    pub viewport: ViewportConfig,
    /// Where exported diagrams are written.
    pub export_dir: PathBuf,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self { persona: Persona::default(), viewport: ViewportConfig::default(), export_dir: PathBuf::from(".") }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message for the user. Errors are shown until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    level: NoticeLevel,
    message: String,
}

impl Notice {
    fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }

    pub fn level(&self) -> NoticeLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_blocking(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StartError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("no generation backend is configured")]
    Offline,
    #[error("a generation is already in progress")]
    Busy,
}

/// Permission to run one top-level generation.
pub struct GenerationTicket {
    seq: u64,
    request: GenerationRequest,
    backend: Arc<dyn GenerationBackend>,
}

impl fmt::Debug for GenerationTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationTicket").field("seq", &self.seq).field("request", &self.request).finish()
    }
}

impl GenerationTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    pub fn fetch(self) -> BoxFuture<'static, FetchedGeneration> {
        async move {
            let outcome = self.backend.generate(self.request).await;
            FetchedGeneration { seq: self.seq, outcome }
        }
        .boxed()
    }

    pub fn resolve(self, outcome: Result<TopicResult, GenerationError>) -> FetchedGeneration {
        FetchedGeneration { seq: self.seq, outcome }
    }
}

#[derive(Debug)]
pub struct FetchedGeneration {
    seq: u64,
    outcome: Result<TopicResult, GenerationError>,
}

impl FetchedGeneration {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn outcome(&self) -> &Result<TopicResult, GenerationError> {
        &self.outcome
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Accepted(Arc<TopicResult>),
    Failed(GenerationError),
    /// The result does not belong to the pending generation.
    Discarded,
}

pub struct Workbench {
    store: ContentStore,
    tree: ExplorationTree,
    viewport: Viewport,
    backend: Option<Arc<dyn GenerationBackend>>,
    persona: Persona,
    export_dir: PathBuf,
    next_seq: u64,
    pending: Option<u64>,
    notices: VecDeque<Notice>,
}

impl fmt::Debug for Workbench {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workbench")
            .field("store", &self.store)
            .field("tree", &self.tree)
            .field("persona", &self.persona)
            .field("online", &self.backend.is_some())
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl Workbench {
    /// A workbench without a backend: persisted results can be browsed but nothing new is
    /// generated.
    pub fn new(store: ContentStore, config: WorkbenchConfig) -> Self {
        let mut workbench = Self {
            store,
            tree: ExplorationTree::new(None, config.persona),
            viewport: Viewport::new(config.viewport),
            backend: None,
            persona: config.persona,
            export_dir: config.export_dir,
            next_seq: 0,
            pending: None,
            notices: VecDeque::new(),
        };
        workbench.sync_active();
        workbench
    }

    /// Uses `backend` for top-level generation and for deep-dives.
    pub fn with_backend<B>(mut self, backend: Arc<B>) -> Self
    where
        B: GenerationBackend + 'static,
    {
        let provider: Arc<dyn DeepDiveProvider> = backend.clone();
        let generation: Arc<dyn GenerationBackend> = backend;
        self.backend = Some(generation);
        self.tree = ExplorationTree::new(Some(provider), self.persona);
        self.sync_active();
        self
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn tree(&self) -> &ExplorationTree {
        &self.tree
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Zoom, pan and fullscreen are purely visual and go straight to the viewport.
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn is_online(&self) -> bool {
        self.backend.is_some()
    }

    pub fn is_generating(&self) -> bool {
        self.pending.is_some()
    }

    pub fn set_persona(&mut self, persona: Persona) {
        self.persona = persona;
        self.tree.set_persona(persona);
    }

    /// Validates `topic` and hands out a ticket for the request. Only one generation runs at a
    /// time; while it is loading further requests are refused with [`StartError::Busy`].
    pub fn begin_generation(&mut self, topic: &str) -> Result<GenerationTicket, StartError> {
        let request = GenerationRequest::new(topic, self.persona)?;
        let backend = self.backend.clone().ok_or(StartError::Offline)?;
        if let Some(pending) = self.pending {
            debug!(pending, topic = request.topic(), "generation refused while loading");
            return Err(StartError::Busy);
        }

        self.next_seq += 1;
        let seq = self.next_seq;
        self.pending = Some(seq);
        self.store.set_loading(true);
        info!(seq, topic = request.topic(), persona = %request.persona(), "generation started");
        Ok(GenerationTicket { seq, request, backend })
    }

    pub fn finish_generation(&mut self, fetched: FetchedGeneration) -> GenerationOutcome {
        let FetchedGeneration { seq, outcome } = fetched;
        if self.pending != Some(seq) {
            debug!(seq, pending = ?self.pending, "late generation result discarded");
            return GenerationOutcome::Discarded;
        }
        self.pending = None;
        self.store.set_loading(false);

        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                info!(seq, topic = result.topic(), steps = result.steps().len(), "generation accepted");
                self.store.accept_result(Arc::clone(&result));
                self.sync_active();
                GenerationOutcome::Accepted(result)
            }
            Err(err) => {
                warn!(seq, error = %err, "generation failed");
                self.notices.push_back(Notice::error(format!("Generation failed: {err}")));
                GenerationOutcome::Failed(err)
            }
        }
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.store.set_mode(mode);
        self.sync_viewport();
    }

    pub fn toggle_mode(&mut self) -> ViewMode {
        let mode = self.store.mode().toggled();
        self.set_mode(mode);
        mode
    }

    /// Makes a history entry active; returns whether one existed.
    pub fn restore(&mut self, topic: &str) -> bool {
        if self.store.restore(topic).is_none() {
            return false;
        }
        self.sync_active();
        true
    }

    pub fn remove_history(&mut self, topic: &str) -> bool {
        self.store.remove_history(topic)
    }

    pub fn clear_history(&mut self) {
        self.store.clear_history();
    }

    pub fn toggle_completed(&mut self, path: &NodePath) -> Result<bool, TreeError> {
        self.tree.toggle_completed(path)
    }

    /// Toggles a node. A returned ticket must be fetched and fed back through
    /// [`Workbench::finish_deep_dive`].
    pub fn toggle_expansion(&mut self, path: &NodePath) -> Result<Option<DeepDiveTicket>, TreeError> {
        match self.tree.toggle_expansion(path)? {
            ToggleOutcome::FetchStarted(ticket) => Ok(Some(ticket)),
            ToggleOutcome::Unavailable => {
                self.notices.push_back(Notice::info("Deep-dive is unavailable offline"));
                Ok(None)
            }
            ToggleOutcome::Collapsed | ToggleOutcome::Expanded | ToggleOutcome::Ignored => Ok(None),
        }
    }

    pub fn finish_deep_dive(&mut self, fetched: FetchedDeepDive) -> Completion {
        let path = fetched.key().path().clone();
        let completion = self.tree.complete_deep_dive(fetched);
        if let Completion::Failed(err) = &completion {
            warn!(%path, error = %err, "deep-dive failed");
            self.notices.push_back(Notice::error(format!("Deep-dive failed: {err}")));
        }
        completion
    }

    /// Re-renders the active diagram from scratch, e.g. after a placeholder.
    pub fn rerender(&mut self) {
        self.viewport.clear();
        self.sync_viewport();
    }

    /// Exports the current diagram into the export directory.
    pub fn export(&mut self, format: ExportFormat, now: Instant) -> Result<PathBuf, ExportError> {
        let written = self.viewport.export(format, now).and_then(|image| image.write_into(&self.export_dir));
        match &written {
            Ok(path) => self.notices.push_back(Notice::info(format!("Exported {}", path.display()))),
            Err(ExportError::Busy { .. }) => {}
            Err(err) => self.notices.push_back(Notice::error(format!("Export failed: {err}"))),
        }
        written
    }

    /// The oldest unacknowledged notice.
    pub fn notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }

    /// Time-driven housekeeping; call once per UI tick.
    pub fn tick(&mut self, now: Instant) {
        self.viewport.settle(now);
    }

    fn sync_active(&mut self) {
        self.tree.set_root(self.store.active_result());
        self.sync_viewport();
    }

    fn sync_viewport(&mut self) {
        if self.store.mode() != ViewMode::Diagram {
            return;
        }
        match self.store.active_result() {
            Some(result) => {
                self.viewport.render(result.diagram_source());
            }
            None => self.viewport.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use rstest::{fixture, rstest};

    use super::{GenerationOutcome, NoticeLevel, StartError, Workbench, WorkbenchConfig};
    use crate::explore::{Completion, ExpansionState, NodePath};
    use crate::generate::{DemoBackend, GenerationError, InputError};
    use crate::model::fixtures::{deep_dive_result, dns_result, DNS_TOPIC};
    use crate::model::{Persona, TopicResult, ViewMode};
    use crate::store::{ContentStore, MemoryBackend};
    use crate::viewport::{ExportError, ExportFormat};

    fn dns() -> Result<TopicResult, GenerationError> {
        Ok(dns_result().expect("fixture"))
    }

    #[fixture]
    fn workbench() -> Workbench {
        Workbench::new(ContentStore::open(MemoryBackend::new()), WorkbenchConfig::default())
            .with_backend(Arc::new(DemoBackend::new()))
    }

    #[rstest]
    fn empty_topics_change_nothing(mut workbench: Workbench) {
        let err = workbench.begin_generation("   ").unwrap_err();
        assert_eq!(err, StartError::Input(InputError::EmptyTopic));
        assert!(!workbench.store().is_loading());
        assert!(!workbench.is_generating());
        assert_eq!(workbench.store().snapshot().rev(), 0);
    }

    #[test]
    fn offline_workbench_refuses_to_generate() {
        let mut workbench = Workbench::new(ContentStore::open(MemoryBackend::new()), WorkbenchConfig::default());
        assert_eq!(workbench.begin_generation(DNS_TOPIC).unwrap_err(), StartError::Offline);
        assert!(!workbench.store().is_loading());
    }

    #[rstest]
    #[tokio::test]
    async fn accepted_results_become_active_and_root_the_tree(mut workbench: Workbench) {
        let ticket = workbench.begin_generation(DNS_TOPIC).expect("start");
        assert!(workbench.store().is_loading());

        let outcome = workbench.finish_generation(ticket.fetch().await);
        assert!(matches!(outcome, GenerationOutcome::Accepted(_)));
        assert!(!workbench.store().is_loading());
        assert_eq!(workbench.store().active_result().map(|r| r.topic().to_owned()).as_deref(), Some(DNS_TOPIC));
        assert_eq!(workbench.store().snapshot().history().len(), 1);
        assert_eq!(workbench.tree().len(), 3);
    }

    #[rstest]
    fn failures_keep_the_previous_result(mut workbench: Workbench) {
        let first = workbench.begin_generation(DNS_TOPIC).expect("start");
        workbench.finish_generation(first.resolve(dns()));

        let second = workbench.begin_generation("Rust").expect("start");
        let err = GenerationError::Malformed { reason: "no steps".to_owned() };
        assert_eq!(workbench.finish_generation(second.resolve(Err(err.clone()))), GenerationOutcome::Failed(err));

        assert!(!workbench.store().is_loading());
        assert_eq!(workbench.store().active_result().map(|r| r.topic().to_owned()).as_deref(), Some(DNS_TOPIC));
        assert_eq!(workbench.store().snapshot().history().len(), 1);
        let notice = workbench.dismiss_notice().expect("notice");
        assert_eq!(notice.level(), NoticeLevel::Error);
        assert!(notice.is_blocking());
        assert!(notice.message().contains("no steps"));
    }

    #[rstest]
    fn second_generation_is_refused_while_loading(mut workbench: Workbench) {
        let current = workbench.begin_generation(DNS_TOPIC).expect("start");
        let rev = workbench.store().snapshot().rev();

        assert_eq!(workbench.begin_generation("Rust").unwrap_err(), StartError::Busy);
        assert!(workbench.store().is_loading());
        assert!(workbench.is_generating());
        assert_eq!(workbench.store().snapshot().rev(), rev);
        assert!(workbench.store().snapshot().history().is_empty());

        let accepted = workbench.finish_generation(current.resolve(dns()));
        assert!(matches!(accepted, GenerationOutcome::Accepted(result) if result.topic() == DNS_TOPIC));
        assert!(!workbench.store().is_loading());
        workbench.begin_generation("Rust").expect("free again");
    }

    #[rstest]
    fn results_from_another_sequence_are_discarded(mut workbench: Workbench) {
        let mut other = Workbench::new(ContentStore::open(MemoryBackend::new()), WorkbenchConfig::default())
            .with_backend(Arc::new(DemoBackend::new()));
        let foreign = other.begin_generation("Rust").expect("start");

        let first = workbench.begin_generation(DNS_TOPIC).expect("start");
        workbench.finish_generation(first.resolve(dns()));
        let _current = workbench.begin_generation("Go").expect("start");

        let late = deep_dive_result("Rust", "Rust").expect("fixture");
        assert_eq!(workbench.finish_generation(foreign.resolve(Ok(late))), GenerationOutcome::Discarded);
        assert!(workbench.store().is_loading(), "pending generation untouched");
        assert_eq!(workbench.store().active_result().map(|r| r.topic().to_owned()).as_deref(), Some(DNS_TOPIC));
    }

    #[rstest]
    fn diagram_mode_renders_the_active_result(mut workbench: Workbench) {
        let ticket = workbench.begin_generation(DNS_TOPIC).expect("start");
        workbench.finish_generation(ticket.resolve(dns()));
        assert!(workbench.viewport().rendered().is_none(), "roadmap mode renders nothing");

        assert_eq!(workbench.toggle_mode(), ViewMode::Diagram);
        assert!(workbench.viewport().rendered().is_some());
        assert!(!workbench.viewport().is_placeholder());
    }

    #[rstest]
    fn restore_re_roots_without_reordering(mut workbench: Workbench) {
        for topic in ["Rust", DNS_TOPIC] {
            let ticket = workbench.begin_generation(topic).expect("start");
            let result = if topic == DNS_TOPIC { dns_result() } else { deep_dive_result(topic, topic) };
            workbench.finish_generation(ticket.resolve(Ok(result.expect("fixture"))));
        }

        assert!(workbench.restore("Rust"));
        assert!(!workbench.restore("Go"));
        let snapshot = workbench.store().snapshot();
        let topics = snapshot.history().iter().map(|entry| entry.topic()).collect::<Vec<_>>();
        assert_eq!(topics, [DNS_TOPIC, "Rust"]);
        assert_eq!(workbench.tree().root().map(|root| root.topic()), Some("Rust"));
    }

    #[rstest]
    fn deep_dive_failures_are_scoped_to_the_node(mut workbench: Workbench) {
        let ticket = workbench.begin_generation(DNS_TOPIC).expect("start");
        workbench.finish_generation(ticket.resolve(dns()));
        let rev = workbench.store().snapshot().rev();

        let ticket = workbench.toggle_expansion(&NodePath::root(3)).expect("toggle").expect("ticket");
        let err = GenerationError::Timeout(Duration::from_secs(60));
        assert_eq!(workbench.finish_deep_dive(ticket.resolve(Err(err.clone()))), Completion::Failed(err));

        assert_eq!(workbench.tree().node(&NodePath::root(3)).expect("node").expansion(), ExpansionState::Collapsed);
        assert_eq!(workbench.store().snapshot().rev(), rev, "store untouched");
        assert!(workbench.notice().is_some_and(|notice| notice.message().starts_with("Deep-dive failed")));
    }

    #[test]
    fn export_writes_into_the_export_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = WorkbenchConfig { export_dir: dir.path().to_path_buf(), ..WorkbenchConfig::default() };
        let mut workbench = Workbench::new(ContentStore::open(MemoryBackend::new()), config)
            .with_backend(Arc::new(DemoBackend::new()));
        let now = Instant::now();

        assert!(matches!(workbench.export(ExportFormat::Svg, now), Err(ExportError::NotRendered)));

        let ticket = workbench.begin_generation(DNS_TOPIC).expect("start");
        workbench.finish_generation(ticket.resolve(dns()));
        workbench.set_mode(ViewMode::Diagram);

        let path = workbench.export(ExportFormat::Svg, now).expect("export");
        assert_eq!(path, dir.path().join("structura-diagram.svg"));
        assert!(std::fs::read_to_string(&path).expect("read").starts_with("<svg"));
        assert!(matches!(workbench.export(ExportFormat::Png, now), Err(ExportError::Busy { .. })));

        workbench.tick(now + Duration::from_secs(2));
        assert!(workbench.viewport().can_export(now + Duration::from_secs(2)));
    }

    #[test]
    fn persona_flows_into_new_requests() {
        let config = WorkbenchConfig { persona: Persona::Academic, ..WorkbenchConfig::default() };
        let mut workbench = Workbench::new(ContentStore::open(MemoryBackend::new()), config)
            .with_backend(Arc::new(DemoBackend::new()));

        assert_eq!(workbench.begin_generation("Rust").expect("start").request().persona(), Persona::Academic);
        workbench.set_persona(Persona::Novice);
        assert_eq!(workbench.tree().persona(), Persona::Novice);
        assert_eq!(workbench.begin_generation("Rust").expect("start").request().persona(), Persona::Novice);
    }
}
