// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Handlers of separate [`Lifecycle`] events.
//!
//! [`Lifecycle`]: crate::event::Lifecycle

use std::{
    mem,
    time::{Duration, SystemTime},
};

use crate::{
    event::{Case, Outcome, TestStep},
    resolver::probe::SourceProbe,
    sink::{self, Message},
    status, ExecutionContext, ReportSink, ReportStatus,
};

use super::{formatting, Aggregator, RunState};

/// Category assigned to every feature node.
const FEATURE_CATEGORY: &str = "Feature";

/// Run metadata key of the test run start time.
const START_TIME: &str = "Start Time";

/// Summary of a collapsible stack trace entry.
const STACK_TRACE: &str = "Stack Trace";

impl<S: ReportSink, P: SourceProbe> Aggregator<S, P> {
    /// Handles a `run-started` event, pushing the run metadata.
    pub(super) fn run_started(&self, at: SystemTime) -> sink::Result<()> {
        {
            let mut run = self.lock_run();
            match *run {
                RunState::NotStarted => {
                    *run = RunState::Running { started_at: at };
                }
                RunState::Running { .. } => {
                    tracing::warn!("duplicate `run-started` event ignored");
                    return Ok(());
                }
                RunState::Flushed => {
                    tracing::warn!(
                        "`run-started` event after the report has been \
                         flushed ignored",
                    );
                    return Ok(());
                }
            }
        }

        let started = humantime::format_rfc3339_seconds(at).to_string();
        tracing::info!("test run started at {started}");

        for (key, value) in &self.metadata {
            self.sink.set_run_metadata(key, value)?;
        }
        self.sink.set_run_metadata(START_TIME, &started)
    }

    /// Handles a `case-started` event, creating a scenario node under the
    /// node of its feature.
    pub(super) fn case_started(
        &self,
        ctx: &mut ExecutionContext,
        case: &Case,
    ) -> sink::Result<()> {
        if !ctx.is_idle() {
            tracing::warn!(
                "`case-started` of `{}` while the previous scenario is still \
                 open, discarding it",
                case.name,
            );
            ctx.clear();
        }

        let feature = self.resolver.resolve(&case.locator, &case.name);
        let feature_node = self.registry.get_or_create(&feature, || {
            let node = self
                .sink
                .create_root_node(&formatting::feature_title(&feature))?;
            if let Err(e) = self.sink.set_node_category(node, FEATURE_CATEGORY)
            {
                tracing::warn!("failed to categorize feature `{feature}`: {e}");
            }
            Ok::<_, sink::Error>(node)
        })?;

        tracing::debug!(
            "scenario `{}` of feature `{feature}` started",
            case.name,
        );

        let scenario = self.sink.create_child_node(
            feature_node,
            &formatting::scenario_title(&case.name),
        )?;
        ctx.set_scenario(scenario);

        let tags = case
            .tags
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| formatting::tag(t))
            .collect::<Vec<_>>();
        if !tags.is_empty() {
            self.sink.log_on_node(
                scenario,
                ReportStatus::Info,
                formatting::tags_message(&tags).into(),
            )?;
            for tag in &tags {
                self.sink.set_node_category(scenario, tag)?;
            }
        }
        Ok(())
    }

    /// Handles a `step-started` event, creating a step node under the current
    /// scenario node.
    ///
    /// Hooks are ignored.
    pub(super) fn step_started(
        &self,
        ctx: &mut ExecutionContext,
        step: &TestStep,
    ) -> sink::Result<()> {
        let Some(step) = step.as_step() else {
            return Ok(());
        };
        let Some(scenario) = ctx.scenario() else {
            tracing::warn!(
                "`step-started` of `{}` outside of any scenario dropped",
                step.text,
            );
            return Ok(());
        };
        if ctx.take_step().is_some() {
            tracing::warn!(
                "`step-started` of `{}` while the previous step is still open",
                step.text,
            );
        }

        let node = self
            .sink
            .create_child_node(scenario, &formatting::step_title(step))?;
        ctx.set_step(node);
        Ok(())
    }

    /// Handles a `step-finished` event, logging its [`Outcome`] on the current
    /// step node.
    ///
    /// Hooks are ignored.
    pub(super) fn step_finished(
        &self,
        ctx: &mut ExecutionContext,
        step: &TestStep,
        outcome: &Outcome,
    ) -> sink::Result<()> {
        let Some(step) = step.as_step() else {
            return Ok(());
        };
        let Some(node) = ctx.take_step() else {
            tracing::warn!(
                "`step-finished` of `{}` without a started step dropped",
                step.text,
            );
            return Ok(());
        };

        let status = status::map(outcome.status);
        let Some(error) = &outcome.error else {
            return self.sink.log_on_node(
                node,
                status,
                formatting::step_summary(status, outcome).into(),
            );
        };

        self.sink
            .log_on_node(node, status, formatting::step_failure(error).into())?;
        if let Some(trace) =
            error.trace.as_deref().filter(|t| !t.trim().is_empty())
        {
            self.sink.log_on_node(
                node,
                status,
                Message::Details {
                    summary: STACK_TRACE.to_owned(),
                    body: formatting::truncate_trace(trace).into_owned(),
                },
            )?;
        }
        Ok(())
    }

    /// Handles a `case-finished` event, logging its [`Outcome`] on the current
    /// scenario node.
    ///
    /// The [`ExecutionContext`] is cleared on every exit path.
    pub(super) fn case_finished(
        &self,
        ctx: &mut ExecutionContext,
        case: &Case,
        outcome: &Outcome,
    ) -> sink::Result<()> {
        let ctx = ctx.clear_on_drop();

        let Some(scenario) = ctx.scenario() else {
            tracing::warn!(
                "`case-finished` of `{}` without a started scenario dropped",
                case.name,
            );
            return Ok(());
        };
        if ctx.step().is_some() {
            tracing::debug!(
                "scenario `{}` finished with an open step",
                case.name,
            );
        }

        let status = status::map(outcome.status);
        self.sink.log_on_node(
            scenario,
            status,
            formatting::case_summary(status, outcome).into(),
        )
    }

    /// Handles a `run-finished` event, flushing the [`ReportSink`] exactly
    /// once.
    pub(super) fn run_finished(&self, at: SystemTime) -> sink::Result<()> {
        let previous = mem::replace(&mut *self.lock_run(), RunState::Flushed);
        let started_at = match previous {
            RunState::Flushed => {
                tracing::debug!(
                    "report has been flushed already, `run-finished` ignored",
                );
                return Ok(());
            }
            RunState::NotStarted => {
                tracing::warn!("`run-finished` without `run-started`");
                None
            }
            RunState::Running { started_at } => Some(started_at),
        };

        self.sink.flush()?;

        let elapsed = started_at
            .and_then(|s| at.duration_since(s).ok())
            .map(|d| Duration::new(d.as_secs(), d.subsec_millis() * 1_000_000))
            .map_or_else(String::new, |d| {
                format!(" in {}", humantime::format_duration(d))
            });
        match self.sink.artifact() {
            Some(path) => tracing::info!(
                "test run finished{elapsed}, report written to {}",
                path.display(),
            ),
            None => {
                tracing::info!("test run finished{elapsed}, report flushed");
            }
        }
        Ok(())
    }
}
