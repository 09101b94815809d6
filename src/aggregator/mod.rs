// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Event-driven builder of the hierarchical report.
//!
//! An [`Aggregator`] is shared between all the workers of a test run. Each
//! worker feeds it with its own [`Lifecycle`] events in order, along with its
//! own [`ExecutionContext`], and the [`Aggregator`] turns them into
//! `feature → scenario → step` nodes of a [`ReportSink`].

mod event_handlers;
pub mod formatting;

use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::SystemTime,
};

use linked_hash_map::LinkedHashMap;

use crate::{
    event::Lifecycle,
    resolver::probe::{self, SourceProbe},
    Event, ExecutionContext, FeatureNameResolver, FeatureRegistry, ReportSink,
};

/// Global state of a test run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RunState {
    /// No `run-started` event has been received yet.
    #[default]
    NotStarted,

    /// Test run is in progress.
    Running {
        /// Time the test run has started at.
        started_at: SystemTime,
    },

    /// Report has been flushed. Terminal.
    Flushed,
}

/// Dispatcher of [`Lifecycle`] events into a [`ReportSink`].
///
/// # Failures
///
/// [`Aggregator::handle_event()`] never fails: any error of the
/// [`ReportSink`] is logged via [`tracing`] and the event is dropped, so a
/// single malformed event never aborts the run or affects unrelated
/// scenarios.
#[derive(Debug)]
pub struct Aggregator<S, P = probe::Fs> {
    /// [`ReportSink`] receiving report nodes.
    sink: S,

    /// [`FeatureNameResolver`] naming features of test cases.
    resolver: FeatureNameResolver<P>,

    /// [`FeatureRegistry`] of already created feature nodes.
    registry: FeatureRegistry,

    /// Global [`RunState`].
    run: Mutex<RunState>,

    /// Run metadata pushed into the [`ReportSink`] on `run-started`.
    metadata: LinkedHashMap<String, String>,
}

impl<S: ReportSink> Aggregator<S> {
    /// Creates a new [`Aggregator`] reporting into the given [`ReportSink`]
    /// and resolving feature names with the default [`FeatureNameResolver`].
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self::with_resolver(sink, FeatureNameResolver::default())
    }
}

impl<S: ReportSink, P: SourceProbe> Aggregator<S, P> {
    /// Creates a new [`Aggregator`] reporting into the given [`ReportSink`]
    /// and resolving feature names with the given [`FeatureNameResolver`].
    #[must_use]
    pub fn with_resolver(sink: S, resolver: FeatureNameResolver<P>) -> Self {
        Self {
            sink,
            resolver,
            registry: FeatureRegistry::new(),
            run: Mutex::new(RunState::NotStarted),
            metadata: LinkedHashMap::new(),
        }
    }

    /// Adds a run metadata `key`/`value` pair (platform, environment, etc.),
    /// passed through to the [`ReportSink`] on `run-started`.
    #[must_use]
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        _ = self.metadata.insert(key.into(), value.into());
        self
    }

    /// Adds all the given run metadata `key`/`value` pairs.
    ///
    /// See [`Aggregator::with_metadata()`] for details.
    #[must_use]
    pub fn with_metadata_pairs<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs.into_iter().fold(self, |agg, (k, v)| agg.with_metadata(k, v))
    }

    /// Returns the underlying [`ReportSink`].
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns the underlying [`FeatureNameResolver`].
    #[must_use]
    pub const fn resolver(&self) -> &FeatureNameResolver<P> {
        &self.resolver
    }

    /// Returns the underlying [`FeatureRegistry`].
    #[must_use]
    pub const fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    /// Returns the current [`RunState`].
    #[must_use]
    pub fn state(&self) -> RunState {
        *self.lock_run()
    }

    /// Unwraps the underlying [`ReportSink`].
    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Creates a new [`Worker`] feeding this [`Aggregator`] with its own
    /// fresh [`ExecutionContext`].
    #[must_use]
    pub const fn worker(&self) -> Worker<'_, S, P> {
        Worker { aggregator: self, context: ExecutionContext::new() }
    }

    /// Handles a single [`Lifecycle`] event of the worker owning the given
    /// [`ExecutionContext`].
    pub fn handle_event(
        &self,
        ctx: &mut ExecutionContext,
        event: Event<Lifecycle>,
    ) {
        let kind = event.kind();
        let (event, at) = event.split();

        match event {
            Lifecycle::RunStarted => self.run_started(at),
            Lifecycle::CaseStarted { case } => self.case_started(ctx, &case),
            Lifecycle::StepStarted { step } => self.step_started(ctx, &step),
            Lifecycle::StepFinished { step, result } => {
                self.step_finished(ctx, &step, &result)
            }
            Lifecycle::CaseFinished { case, result } => {
                self.case_finished(ctx, &case, &result)
            }
            Lifecycle::RunFinished => self.run_finished(at),
        }
        .unwrap_or_else(|e| {
            tracing::error!("failed to report `{kind}` event: {e}");
        });
    }

    /// Locks the [`RunState`], ignoring poisoning as it's always left
    /// consistent.
    fn lock_run(&self) -> MutexGuard<'_, RunState> {
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Single worker of a test run, owning its [`ExecutionContext`].
#[derive(Debug)]
pub struct Worker<'a, S, P = probe::Fs> {
    /// [`Aggregator`] to feed events into.
    aggregator: &'a Aggregator<S, P>,

    /// [`ExecutionContext`] of this [`Worker`].
    context: ExecutionContext,
}

impl<S: ReportSink, P: SourceProbe> Worker<'_, S, P> {
    /// Handles a single [`Lifecycle`] event of this [`Worker`].
    pub fn handle(&mut self, event: Event<Lifecycle>) {
        self.aggregator.handle_event(&mut self.context, event);
    }

    /// Handles a single [`Lifecycle`] event of this [`Worker`] happening now.
    pub fn handle_now(&mut self, event: Lifecycle) {
        self.handle(Event::new(event));
    }

    /// Returns the [`ExecutionContext`] of this [`Worker`].
    #[must_use]
    pub const fn context(&self) -> &ExecutionContext {
        &self.context
    }
}
