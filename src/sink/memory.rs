// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! In-memory [`ReportSink`] implementation.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, MutexGuard,
    },
    time::SystemTime,
};

use linked_hash_map::LinkedHashMap;
use serde::{Serialize, Serializer};

use crate::ReportStatus;

use super::{Error, Message, NodeId, ReportSink, Result};

/// Hierarchical report tree.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Report {
    /// Run-wide metadata in insertion order.
    pub metadata: LinkedHashMap<String, String>,

    /// Top-level nodes in creation order.
    pub roots: Vec<NodeId>,

    /// All the nodes, indexed by their [`NodeId`].
    pub nodes: Vec<Node>,
}

/// Single node of a [`Report`].
#[derive(Clone, Debug, Serialize)]
pub struct Node {
    /// [`NodeId`] of this [`Node`].
    pub id: NodeId,

    /// Title of this [`Node`].
    pub title: String,

    /// Parent of this [`Node`], unless it's a root one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,

    /// Children of this [`Node`] in creation order.
    pub children: Vec<NodeId>,

    /// Categories assigned to this [`Node`].
    pub categories: Vec<String>,

    /// Entries logged on this [`Node`].
    pub entries: Vec<Entry>,
}

/// Entry logged on a [`Node`].
#[derive(Clone, Debug, Serialize)]
pub struct Entry {
    /// [`ReportStatus`] of this [`Entry`].
    pub status: ReportStatus,

    /// Logged [`Message`].
    pub message: Message,

    /// Time this [`Entry`] was logged at.
    #[serde(serialize_with = "rfc3339")]
    pub at: SystemTime,
}

impl Report {
    /// Returns the [`Node`] with the given [`NodeId`].
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Iterates over the root [`Node`]s in creation order.
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.roots.iter().filter_map(|id| self.node(*id))
    }

    /// Iterates over the children of the given [`Node`] in creation order.
    pub fn children<'s>(
        &'s self,
        node: &'s Node,
    ) -> impl Iterator<Item = &'s Node> + 's {
        node.children.iter().filter_map(|id| self.node(*id))
    }

    /// Finds the first [`Node`] titled exactly `title`.
    #[must_use]
    pub fn find(&self, title: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.title == title)
    }

    /// Derives the [`ReportStatus`] of the given [`Node`] as the most severe
    /// one among its [`Entry`]s and children.
    #[must_use]
    pub fn status(&self, id: NodeId) -> ReportStatus {
        self.node(id).map_or(ReportStatus::Info, |node| {
            node.entries
                .iter()
                .map(|e| e.status)
                .chain(node.children.iter().map(|c| self.status(*c)))
                .max()
                .unwrap_or_default()
        })
    }

    /// Returns the mutable [`Node`] with the given [`NodeId`].
    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(Error::UnknownNode { node: id })
    }

    /// Allocates a new [`Node`].
    fn push(&mut self, title: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            title: title.to_owned(),
            parent,
            children: vec![],
            categories: vec![],
            entries: vec![],
        });
        id
    }
}

/// Thread-safe in-memory [`ReportSink`] building a [`Report`].
///
/// [`ReportSink::flush()`] only counts its invocations, so this sink is
/// suitable for tests and as a building block of other sinks.
#[derive(Debug, Default)]
pub struct Memory {
    /// [`Report`] being built.
    report: Mutex<Report>,

    /// Number of [`ReportSink::flush()`] calls.
    flushes: AtomicUsize,
}

impl Memory {
    /// Creates a new empty [`Memory`] sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the [`Report`] built so far.
    #[must_use]
    pub fn snapshot(&self) -> Report {
        self.report
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times this sink has been flushed.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Report>> {
        self.report.lock().map_err(|_| Error::Poisoned)
    }
}

impl ReportSink for Memory {
    fn create_root_node(&self, title: &str) -> Result<NodeId> {
        let mut report = self.lock()?;
        let id = report.push(title, None);
        report.roots.push(id);
        Ok(id)
    }

    fn create_child_node(&self, parent: NodeId, title: &str) -> Result<NodeId> {
        let mut report = self.lock()?;
        _ = report.node_mut(parent)?;
        let id = report.push(title, Some(parent));
        report.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    fn log_on_node(
        &self,
        node: NodeId,
        status: ReportStatus,
        message: Message,
    ) -> Result<()> {
        self.lock()?.node_mut(node)?.entries.push(Entry {
            status,
            message,
            at: SystemTime::now(),
        });
        Ok(())
    }

    fn set_node_category(&self, node: NodeId, tag: &str) -> Result<()> {
        let mut report = self.lock()?;
        let categories = &mut report.node_mut(node)?.categories;
        if !categories.iter().any(|c| c == tag) {
            categories.push(tag.to_owned());
        }
        Ok(())
    }

    fn set_run_metadata(&self, key: &str, value: &str) -> Result<()> {
        _ = self.lock()?.metadata.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        _ = self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Serializes a [`SystemTime`] as an [RFC 3339] timestamp.
///
/// [RFC 3339]: https://www.rfc-editor.org/rfc/rfc3339
fn rfc3339<S: Serializer>(
    at: &SystemTime,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(&humantime::format_rfc3339_millis(*at))
}
