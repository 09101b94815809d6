// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`ReportSink`] rendering its [`Report`] into a file.

use std::{
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
};

use crate::ReportStatus;

use super::{Memory, Message, NodeId, Report, ReportSink, Result};

/// Output format of a [`File`] sink.
pub trait Format: Send + Sync {
    /// Renders the whole `report` into the `out`put.
    ///
    /// # Errors
    ///
    /// If writing or serialization fails.
    fn render(&self, report: &Report, out: &mut dyn io::Write) -> Result<()>;
}

impl<F: Format + ?Sized> Format for Box<F> {
    fn render(&self, report: &Report, out: &mut dyn io::Write) -> Result<()> {
        (**self).render(report, out)
    }
}

/// [`ReportSink`] collecting the [`Report`] in [`Memory`] and writing it into
/// a file in the given [`Format`] on every [`ReportSink::flush()`].
///
/// Parent directories of the file are created if missing.
#[derive(Debug)]
pub struct File<F> {
    /// [`Report`] being built.
    memory: Memory,

    /// Path of the file to write the [`Report`] into.
    path: PathBuf,

    /// [`Format`] to render the [`Report`] in.
    format: F,
}

impl<F: Format> File<F> {
    /// Creates a new [`File`] sink writing into the given `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, format: F) -> Self {
        Self { memory: Memory::new(), path: path.into(), format }
    }

    /// Returns the underlying [`Memory`] sink.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Returns the path this sink writes into.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<F: Format> ReportSink for File<F> {
    fn create_root_node(&self, title: &str) -> Result<NodeId> {
        self.memory.create_root_node(title)
    }

    fn create_child_node(&self, parent: NodeId, title: &str) -> Result<NodeId> {
        self.memory.create_child_node(parent, title)
    }

    fn log_on_node(
        &self,
        node: NodeId,
        status: ReportStatus,
        message: Message,
    ) -> Result<()> {
        self.memory.log_on_node(node, status, message)
    }

    fn set_node_category(&self, node: NodeId, tag: &str) -> Result<()> {
        self.memory.set_node_category(node, tag)
    }

    fn set_run_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.memory.set_run_metadata(key, value)
    }

    fn flush(&self) -> Result<()> {
        let dir = self.path.parent().filter(|d| !d.as_os_str().is_empty());
        if let Some(dir) = dir {
            fs::create_dir_all(dir)?;
        }

        let mut out = io::BufWriter::new(fs::File::create(&self.path)?);
        self.format.render(&self.memory.snapshot(), &mut out)?;
        out.flush()?;

        self.memory.flush()
    }

    fn artifact(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::Json;

    #[test]
    fn flush_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Reports").join("run").join("report.json");
        let sink = File::new(&path, Json);
        let root = sink.create_root_node("Feature: A").unwrap();
        sink.log_on_node(root, ReportStatus::Pass, "ok".into()).unwrap();

        sink.flush().unwrap();

        assert!(path.exists());
        assert_eq!(sink.artifact(), Some(path));
        assert_eq!(sink.memory().flush_count(), 1);
    }

    #[test]
    fn flush_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let sink = File::new(blocker.join("report.json"), Json);

        assert!(sink.flush().is_err());
        assert_eq!(sink.memory().flush_count(), 0);
    }
}
