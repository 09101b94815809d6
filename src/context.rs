// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Per-worker execution state.

use std::ops::{Deref, DerefMut};

use crate::sink::NodeId;

/// Report nodes of the scenario and the step a single worker is currently
/// executing.
///
/// Every worker owns its own [`ExecutionContext`] and passes it to the
/// [`Aggregator`] along with its events, so workers never observe each
/// other's nodes.
///
/// [`Aggregator`]: crate::Aggregator
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ExecutionContext {
    /// Node of the currently executing scenario.
    scenario: Option<NodeId>,

    /// Node of the currently executing step.
    step: Option<NodeId>,
}

impl ExecutionContext {
    /// Creates a new idle [`ExecutionContext`].
    #[must_use]
    pub const fn new() -> Self {
        Self { scenario: None, step: None }
    }

    /// Sets the node of the currently executing scenario.
    pub fn set_scenario(&mut self, node: NodeId) {
        self.scenario = Some(node);
    }

    /// Returns the node of the currently executing scenario, if any.
    #[must_use]
    pub const fn scenario(&self) -> Option<NodeId> {
        self.scenario
    }

    /// Sets the node of the currently executing step.
    pub fn set_step(&mut self, node: NodeId) {
        self.step = Some(node);
    }

    /// Returns the node of the currently executing step, if any.
    #[must_use]
    pub const fn step(&self) -> Option<NodeId> {
        self.step
    }

    /// Forgets the currently executing step, returning its node.
    pub fn take_step(&mut self) -> Option<NodeId> {
        self.step.take()
    }

    /// Forgets both the scenario and the step.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Indicates whether neither a scenario nor a step is executing.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.scenario.is_none() && self.step.is_none()
    }

    /// Wraps this [`ExecutionContext`] into a guard [clearing](Self::clear)
    /// it once dropped, on every exit path including panics.
    pub fn clear_on_drop(&mut self) -> ClearOnDrop<'_> {
        ClearOnDrop(self)
    }
}

/// Guard [clearing](ExecutionContext::clear) the borrowed
/// [`ExecutionContext`] when dropped.
#[derive(Debug)]
pub struct ClearOnDrop<'ctx>(&'ctx mut ExecutionContext);

impl Deref for ClearOnDrop<'_> {
    type Target = ExecutionContext;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl DerefMut for ClearOnDrop<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0
    }
}

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        self.0.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use super::*;

    #[test]
    fn tracks_scenario_and_step() {
        let mut ctx = ExecutionContext::new();
        assert!(ctx.is_idle());

        ctx.set_scenario(NodeId(1));
        ctx.set_step(NodeId(2));
        assert_eq!(ctx.scenario(), Some(NodeId(1)));
        assert_eq!(ctx.take_step(), Some(NodeId(2)));
        assert_eq!(ctx.step(), None);

        ctx.clear();
        assert!(ctx.is_idle());
    }

    #[test]
    fn guard_clears_on_normal_exit() {
        let mut ctx = ExecutionContext::new();
        ctx.set_scenario(NodeId(1));
        {
            let guard = ctx.clear_on_drop();
            assert_eq!(guard.scenario(), Some(NodeId(1)));
        }
        assert!(ctx.is_idle());
    }

    #[test]
    fn guard_clears_on_panic() {
        let mut ctx = ExecutionContext::new();
        ctx.set_scenario(NodeId(1));
        ctx.set_step(NodeId(2));

        let res = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = ctx.clear_on_drop();
            panic!("logging failed");
        }));

        assert!(res.is_err());
        assert!(ctx.is_idle());
    }
}
