// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Common test utilities for this crate.

#[cfg(test)]
pub(crate) mod common {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use crate::{
        sink::{self, Memory, Message, NodeId},
        ReportSink, ReportStatus,
    };

    /// [`Memory`] sink failing on demand.
    #[derive(Debug, Default)]
    pub(crate) struct Faulty {
        /// Sink recording successful operations.
        pub(crate) memory: Memory,

        /// Whether [`ReportSink::log_on_node()`] fails.
        pub(crate) fail_logging: AtomicBool,

        /// Number of upcoming [`ReportSink::create_root_node()`] calls to
        /// fail.
        pub(crate) root_failures: AtomicUsize,
    }

    impl Faulty {
        pub(crate) fn set_fail_logging(&self, fail: bool) {
            self.fail_logging.store(fail, Ordering::SeqCst);
        }

        pub(crate) fn fail_next_roots(&self, n: usize) {
            self.root_failures.store(n, Ordering::SeqCst);
        }
    }

    impl ReportSink for Faulty {
        fn create_root_node(&self, title: &str) -> sink::Result<NodeId> {
            let failed = self
                .root_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    n.checked_sub(1)
                })
                .is_ok();
            if failed {
                return Err(sink::Error::rejected("injected root failure"));
            }
            self.memory.create_root_node(title)
        }

        fn create_child_node(
            &self,
            parent: NodeId,
            title: &str,
        ) -> sink::Result<NodeId> {
            self.memory.create_child_node(parent, title)
        }

        fn log_on_node(
            &self,
            node: NodeId,
            status: ReportStatus,
            message: Message,
        ) -> sink::Result<()> {
            if self.fail_logging.load(Ordering::SeqCst) {
                return Err(sink::Error::rejected("injected logging failure"));
            }
            self.memory.log_on_node(node, status, message)
        }

        fn set_node_category(
            &self,
            node: NodeId,
            tag: &str,
        ) -> sink::Result<()> {
            self.memory.set_node_category(node, tag)
        }

        fn set_run_metadata(&self, key: &str, value: &str) -> sink::Result<()> {
            self.memory.set_run_metadata(key, value)
        }

        fn flush(&self) -> sink::Result<()> {
            self.memory.flush()
        }
    }
}
