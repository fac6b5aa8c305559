// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Recursive, lazily expanded exploration tree.
//!
//! Every step of the active result is an [`ExpansionNode`] addressed by a [`NodePath`]: the step
//! orders from the root down to the node. Expanding a node without a cached sub-plan hands out a
//! [`DeepDiveTicket`]; the caller runs the fetch wherever it likes and feeds the outcome back
//! through [`ExplorationTree::complete_deep_dive`]. Results for nodes that no longer exist (an
//! ancestor collapsed, or the tree was re-rooted) are discarded.
//!
//! Nodes live in one ordered map. Path ordering is lexicographic, so iterating the map yields the
//! visible tree in pre-order.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use crate::generate::{DeepDiveProvider, DeepDiveRequest, GenerationError};
use crate::model::{Persona, Step, TopicResult};

/// Step orders from the root result down to a node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodePath(SmallVec<[u32; 4]>);

impl NodePath {
    pub fn root(order: u32) -> Self {
        Self(SmallVec::from_slice(&[order]))
    }

    pub fn from_orders(orders: &[u32]) -> Self {
        Self(SmallVec::from_slice(orders))
    }

    pub fn child(&self, order: u32) -> Self {
        let mut segments = self.0.clone();
        segments.push(order);
        Self(segments)
    }

    pub fn parent(&self) -> Option<Self> {
        match self.0.len() {
            0 | 1 => None,
            len => Some(Self(SmallVec::from_slice(&self.0[..len - 1]))),
        }
    }

    pub fn orders(&self) -> &[u32] {
        &self.0
    }

    /// Zero for top-level steps.
    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn is_descendant_of(&self, ancestor: &NodePath) -> bool {
        self.0.len() > ancestor.0.len() && self.0.starts_with(&ancestor.0)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, order) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            write!(f, "{order}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionState {
    #[default]
    Collapsed,
    Loading,
    Expanded,
}

/// One step in the tree plus its transient UI state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionNode {
    step: Step,
    enclosing_topic: Arc<str>,
    completed: bool,
    expansion: ExpansionState,
    cached_child: Option<Arc<TopicResult>>,
    generation: u64,
}

impl ExpansionNode {
    pub fn step(&self) -> &Step {
        &self.step
    }

    /// Topic of the result this step belongs to.
    pub fn enclosing_topic(&self) -> &str {
        &self.enclosing_topic
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn expansion(&self) -> ExpansionState {
        self.expansion
    }

    pub fn cached_child(&self) -> Option<&Arc<TopicResult>> {
        self.cached_child.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.expansion == ExpansionState::Loading
    }
}

/// Identifies one node instance. A re-created node at the same path gets a new generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeKey {
    path: NodePath,
    generation: u64,
}

impl NodeKey {
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Permission to run one deep-dive fetch for a loading node.
pub struct DeepDiveTicket {
    key: NodeKey,
    request: DeepDiveRequest,
    provider: Arc<dyn DeepDiveProvider>,
}

impl fmt::Debug for DeepDiveTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepDiveTicket").field("key", &self.key).field("request", &self.request).finish()
    }
}

impl DeepDiveTicket {
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    pub fn path(&self) -> &NodePath {
        &self.key.path
    }

    pub fn request(&self) -> &DeepDiveRequest {
        &self.request
    }

    /// Runs the fetch to completion. The future owns everything it needs.
    pub fn fetch(self) -> BoxFuture<'static, FetchedDeepDive> {
        async move {
            let outcome = self.provider.deep_dive(self.request).await;
            FetchedDeepDive { key: self.key, outcome }
        }
        .boxed()
    }

    /// Pairs the ticket with an outcome obtained some other way.
    pub fn resolve(self, outcome: Result<TopicResult, GenerationError>) -> FetchedDeepDive {
        FetchedDeepDive { key: self.key, outcome }
    }
}

#[derive(Debug)]
pub struct FetchedDeepDive {
    key: NodeKey,
    outcome: Result<TopicResult, GenerationError>,
}

impl FetchedDeepDive {
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    pub fn outcome(&self) -> &Result<TopicResult, GenerationError> {
        &self.outcome
    }
}

#[derive(Debug)]
pub enum ToggleOutcome {
    Collapsed,
    /// Re-expanded from the cached sub-plan without a fetch.
    Expanded,
    FetchStarted(DeepDiveTicket),
    /// A fetch for this node is already in flight.
    Ignored,
    /// No deep-dive provider is configured and nothing is cached.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Expanded,
    Failed(GenerationError),
    /// The node was torn down or replaced while the fetch ran.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("no node at path {path}")]
    UnknownPath { path: NodePath },
}

/// A visible node together with its path, in pre-order.
#[derive(Debug, Clone, Copy)]
pub struct VisibleNode<'a> {
    pub path: &'a NodePath,
    pub node: &'a ExpansionNode,
}

impl VisibleNode<'_> {
    pub fn depth(&self) -> usize {
        self.path.depth()
    }
}

#[derive(Default)]
pub struct ExplorationTree {
    root: Option<Arc<TopicResult>>,
    persona: Persona,
    provider: Option<Arc<dyn DeepDiveProvider>>,
    nodes: BTreeMap<NodePath, ExpansionNode>,
    next_generation: u64,
}

impl fmt::Debug for ExplorationTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplorationTree")
            .field("root", &self.root.as_ref().map(|root| root.topic()))
            .field("persona", &self.persona)
            .field("deep_dive", &self.provider.is_some())
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl ExplorationTree {
    /// A tree without a root. Without a provider, nodes can only re-expand cached sub-plans.
    pub fn new(provider: Option<Arc<dyn DeepDiveProvider>>, persona: Persona) -> Self {
        Self { provider, persona, ..Self::default() }
    }

    pub fn root(&self) -> Option<&Arc<TopicResult>> {
        self.root.as_ref()
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    /// Persona used for fetches started from now on.
    pub fn set_persona(&mut self, persona: Persona) {
        self.persona = persona;
    }

    pub fn has_deep_dive(&self) -> bool {
        self.provider.is_some()
    }

    /// Replaces the whole tree. Outstanding fetches for the old tree will be discarded.
    pub fn set_root(&mut self, root: Option<Arc<TopicResult>>) {
        let unchanged = match (&self.root, &root) {
            (Some(old), Some(new)) => Arc::ptr_eq(old, new),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        self.nodes.clear();
        self.root = root;
        if let Some(root) = self.root.clone() {
            debug!(topic = root.topic(), steps = root.steps().len(), "exploration tree re-rooted");
            self.mount(None, &root);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, path: &NodePath) -> Result<&ExpansionNode, TreeError> {
        self.nodes.get(path).ok_or_else(|| TreeError::UnknownPath { path: path.clone() })
    }

    /// Visible nodes in pre-order.
    pub fn visible_nodes(&self) -> impl Iterator<Item = VisibleNode<'_>> + '_ {
        self.nodes.iter().map(|(path, node)| VisibleNode { path, node })
    }

    /// Flips the completion mark; independent of expansion.
    pub fn toggle_completed(&mut self, path: &NodePath) -> Result<bool, TreeError> {
        let node = self.node_mut(path)?;
        node.completed = !node.completed;
        Ok(node.completed)
    }

    pub fn toggle_expansion(&mut self, path: &NodePath) -> Result<ToggleOutcome, TreeError> {
        let persona = self.persona;
        let provider = self.provider.clone();
        let node = self.node_mut(path)?;

        let outcome = match (node.expansion, node.cached_child.clone()) {
            (ExpansionState::Loading, _) => ToggleOutcome::Ignored,
            (ExpansionState::Expanded, _) => {
                node.expansion = ExpansionState::Collapsed;
                self.remove_descendants(path);
                ToggleOutcome::Collapsed
            }
            (ExpansionState::Collapsed, Some(child)) => {
                node.expansion = ExpansionState::Expanded;
                self.mount(Some(path), &child);
                ToggleOutcome::Expanded
            }
            (ExpansionState::Collapsed, None) => match provider {
                None => ToggleOutcome::Unavailable,
                Some(provider) => {
                    node.expansion = ExpansionState::Loading;
                    let request =
                        DeepDiveRequest::new(node.step.title(), &*node.enclosing_topic, persona);
                    let key = NodeKey { path: path.clone(), generation: node.generation };
                    ToggleOutcome::FetchStarted(DeepDiveTicket { key, request, provider })
                }
            },
        };

        debug!(%path, outcome = outcome_label(&outcome), "toggle expansion");
        debug_assert!(self.is_consistent());
        Ok(outcome)
    }

    /// Applies a finished fetch to the node it was started for.
    pub fn complete_deep_dive(&mut self, fetched: FetchedDeepDive) -> Completion {
        let FetchedDeepDive { key, outcome } = fetched;
        let node = match self.nodes.get_mut(&key.path) {
            Some(node) if node.generation == key.generation && node.is_loading() => node,
            _ => {
                debug!(path = %key.path, generation = key.generation, "late deep-dive result discarded");
                return Completion::Discarded;
            }
        };

        let completion = match outcome {
            Ok(result) => {
                let child = Arc::new(result);
                node.cached_child = Some(Arc::clone(&child));
                node.expansion = ExpansionState::Expanded;
                self.mount(Some(&key.path), &child);
                Completion::Expanded
            }
            Err(err) => {
                node.expansion = ExpansionState::Collapsed;
                debug!(path = %key.path, error = %err, "deep-dive failed");
                Completion::Failed(err)
            }
        };
        debug_assert!(self.is_consistent());
        completion
    }

    /// Whether the structural invariants hold: expanded nodes have a cached sub-plan, every
    /// nested node sits under an expanded parent, and expanded parents show all their children.
    pub fn is_consistent(&self) -> bool {
        self.nodes.iter().all(|(path, node)| {
            let cache_ok = node.expansion != ExpansionState::Expanded || node.cached_child.is_some();
            let parent_ok = match path.parent() {
                None => true,
                Some(parent) => {
                    self.nodes.get(&parent).is_some_and(|p| p.expansion == ExpansionState::Expanded)
                }
            };
            let children_ok = match (&node.cached_child, node.expansion) {
                (Some(child), ExpansionState::Expanded) => {
                    child.steps().iter().all(|step| self.nodes.contains_key(&path.child(step.order())))
                }
                _ => !self.nodes.keys().any(|other| other.parent().as_ref() == Some(path)),
            };
            cache_ok && parent_ok && children_ok
        })
    }

    fn node_mut(&mut self, path: &NodePath) -> Result<&mut ExpansionNode, TreeError> {
        self.nodes.get_mut(path).ok_or_else(|| TreeError::UnknownPath { path: path.clone() })
    }

    /// Inserts fresh nodes for `result`'s steps below `parent` (or at the top level).
    fn mount(&mut self, parent: Option<&NodePath>, result: &TopicResult) {
        let enclosing: Arc<str> = Arc::from(result.topic());
        for step in result.steps() {
            let path = match parent {
                Some(parent) => parent.child(step.order()),
                None => NodePath::root(step.order()),
            };
            self.next_generation += 1;
            let node = ExpansionNode {
                step: step.clone(),
                enclosing_topic: Arc::clone(&enclosing),
                completed: false,
                expansion: ExpansionState::Collapsed,
                cached_child: None,
                generation: self.next_generation,
            };
            self.nodes.insert(path, node);
        }
    }

    fn remove_descendants(&mut self, path: &NodePath) {
        let doomed = self
            .nodes
            .range(path.clone()..)
            .skip(1)
            .take_while(|(candidate, _)| candidate.is_descendant_of(path))
            .map(|(candidate, _)| candidate.clone())
            .collect::<Vec<_>>();
        for candidate in doomed {
            self.nodes.remove(&candidate);
        }
    }
}

fn outcome_label(outcome: &ToggleOutcome) -> &'static str {
    match outcome {
        ToggleOutcome::Collapsed => "collapsed",
        ToggleOutcome::Expanded => "expanded",
        ToggleOutcome::FetchStarted(_) => "fetch-started",
        ToggleOutcome::Ignored => "ignored",
        ToggleOutcome::Unavailable => "unavailable",
    }
}

#[cfg(test)]
mod tests;
