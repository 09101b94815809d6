// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Destinations of the hierarchical report.
//!
//! A [`ReportSink`] materializes report nodes handed out as [`NodeId`]s and
//! owns the final artifact. The [`Aggregator`] never reads anything back from
//! a [`ReportSink`] besides the issued [`NodeId`]s.
//!
//! Provided implementations:
//! - [`Memory`]: thread-safe in-memory [`Report`] tree;
//! - [`File`]: [`Memory`] rendered into a file on [`ReportSink::flush()`] in
//!   the [`Html`] or [`Json`] [`Format`].
//!
//! [`Aggregator`]: crate::Aggregator

mod file;
mod html;
mod json;
mod memory;

use std::{io, path::PathBuf, sync::Arc};

use derive_more::with_trait::{Display, Error as StdError};
use serde::Serialize;

use crate::ReportStatus;

#[doc(inline)]
pub use self::{
    file::{File, Format},
    html::Html,
    json::Json,
    memory::{Entry, Memory, Node, Report},
};

/// Handle of a node issued by a [`ReportSink`].
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[display("#{_0}")]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Payload of an entry logged on a node.
#[derive(Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Message {
    /// Plain text.
    #[display("{_0}")]
    Text(String),

    /// Collapsible block, shown folded behind its `summary`.
    #[display("{summary}:\n{body}")]
    Details {
        /// Always visible part.
        summary: String,

        /// Folded part.
        body: String,
    },
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// Errors of a [`ReportSink`].
#[derive(Debug, Display, StdError)]
pub enum Error {
    /// I/O error while writing the artifact.
    #[display("I/O error: {_0}")]
    Io(io::Error),

    /// Failed to serialize the [`Report`].
    #[display("Serialization failed: {_0}")]
    Serialization(serde_json::Error),

    /// Node was never issued by this [`ReportSink`].
    #[display("Unknown report node {node}")]
    UnknownNode {
        /// Requested [`NodeId`].
        #[error(not(source))]
        node: NodeId,
    },

    /// Internal state of the [`ReportSink`] is poisoned by a panic.
    #[display("Report state is poisoned")]
    Poisoned,

    /// [`ReportSink`] refused to perform the operation.
    #[display("Report operation rejected: {reason}")]
    Rejected {
        /// Reason of the rejection.
        #[error(not(source))]
        reason: String,
    },
}

impl Error {
    /// Creates a new [`Error::Rejected`].
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected { reason: reason.into() }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

/// Result of [`ReportSink`] operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Receiver of report node creations and log entries.
///
/// Implementations are shared between all the workers, so have to be
/// [`Sync`].
pub trait ReportSink: Send + Sync {
    /// Creates a new top-level node titled `title`.
    ///
    /// # Errors
    ///
    /// If the node cannot be allocated.
    fn create_root_node(&self, title: &str) -> Result<NodeId>;

    /// Creates a new node titled `title` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// If `parent` is unknown or the node cannot be allocated.
    fn create_child_node(&self, parent: NodeId, title: &str) -> Result<NodeId>;

    /// Appends an entry to the `node`.
    ///
    /// # Errors
    ///
    /// If `node` is unknown or the entry cannot be recorded.
    fn log_on_node(
        &self,
        node: NodeId,
        status: ReportStatus,
        message: Message,
    ) -> Result<()>;

    /// Assigns a category `tag` to the `node`.
    ///
    /// # Errors
    ///
    /// If `node` is unknown.
    fn set_node_category(&self, node: NodeId, tag: &str) -> Result<()>;

    /// Records a run-wide `key`/`value` pair (platform, environment, etc.).
    ///
    /// # Errors
    ///
    /// If the pair cannot be recorded.
    fn set_run_metadata(&self, key: &str, value: &str) -> Result<()>;

    /// Writes out the final artifact.
    ///
    /// Calling this more than once isn't guaranteed to be idempotent.
    ///
    /// # Errors
    ///
    /// If the artifact cannot be written.
    fn flush(&self) -> Result<()>;

    /// Location of the artifact written by [`ReportSink::flush()`], if any.
    fn artifact(&self) -> Option<PathBuf> {
        None
    }
}

impl<S: ReportSink + ?Sized> ReportSink for Arc<S> {
    fn create_root_node(&self, title: &str) -> Result<NodeId> {
        (**self).create_root_node(title)
    }

    fn create_child_node(&self, parent: NodeId, title: &str) -> Result<NodeId> {
        (**self).create_child_node(parent, title)
    }

    fn log_on_node(
        &self,
        node: NodeId,
        status: ReportStatus,
        message: Message,
    ) -> Result<()> {
        (**self).log_on_node(node, status, message)
    }

    fn set_node_category(&self, node: NodeId, tag: &str) -> Result<()> {
        (**self).set_node_category(node, tag)
    }

    fn set_run_metadata(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_run_metadata(key, value)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }

    fn artifact(&self) -> Option<PathBuf> {
        (**self).artifact()
    }
}

impl<S: ReportSink + ?Sized> ReportSink for &S {
    fn create_root_node(&self, title: &str) -> Result<NodeId> {
        (**self).create_root_node(title)
    }

    fn create_child_node(&self, parent: NodeId, title: &str) -> Result<NodeId> {
        (**self).create_child_node(parent, title)
    }

    fn log_on_node(
        &self,
        node: NodeId,
        status: ReportStatus,
        message: Message,
    ) -> Result<()> {
        (**self).log_on_node(node, status, message)
    }

    fn set_node_category(&self, node: NodeId, tag: &str) -> Result<()> {
        (**self).set_node_category(node, tag)
    }

    fn set_run_metadata(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_run_metadata(key, value)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }

    fn artifact(&self) -> Option<PathBuf> {
        (**self).artifact()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(
            Error::UnknownNode { node: NodeId(7) }.to_string(),
            "Unknown report node #7",
        );
        assert_eq!(
            Error::rejected("disk full").to_string(),
            "Report operation rejected: disk full",
        );
        let io: Error = io::Error::other("nope").into();
        assert!(io.to_string().starts_with("I/O error"));
    }

    #[test]
    fn arc_delegates_to_inner_sink() {
        let sink = Arc::new(Memory::new());
        let root = sink.create_root_node("Feature: A").unwrap();
        sink.log_on_node(root, ReportStatus::Pass, "ok".into()).unwrap();

        assert_eq!(sink.snapshot().node(root).unwrap().entries.len(), 1);
    }
}
