// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Event-driven hierarchical execution report for [Cucumber] runs.
//!
//! Test runners emit [`Lifecycle`] events (run started, case started, step
//! started, step finished, case finished, run finished), possibly from many
//! workers executing scenarios concurrently. An [`Aggregator`] incrementally
//! turns them into a `feature → scenario → step` tree of a [`ReportSink`]:
//! - feature names are derived from test case locators by a memoizing
//!   [`FeatureNameResolver`];
//! - every feature node is created exactly once by the [`FeatureRegistry`],
//!   no matter how many workers reach it simultaneously;
//! - each worker's current scenario and step live in its own
//!   [`ExecutionContext`], so workers never observe each other's nodes.
//!
//! # Example
//!
//! ```rust
//! use cucumber_report::{
//!     event::{Case, Lifecycle, Outcome, Step},
//!     sink::Memory,
//!     Aggregator,
//! };
//!
//! let aggregator = Aggregator::new(Memory::new());
//! let mut worker = aggregator.worker();
//!
//! let case = Case::new("classpath:features/login.feature", "Valid login");
//! let step = Step::new("Given ", "a registered user");
//!
//! worker.handle_now(Lifecycle::RunStarted);
//! worker.handle_now(Lifecycle::case_started(case.clone()));
//! worker.handle_now(Lifecycle::step_started(step.clone()));
//! worker.handle_now(Lifecycle::step_finished(step, Outcome::passed()));
//! worker.handle_now(Lifecycle::case_finished(case, Outcome::passed()));
//! worker.handle_now(Lifecycle::RunFinished);
//!
//! let report = aggregator.sink().snapshot();
//! assert!(report.find("Feature: Login").is_some());
//! assert!(report.find("Scenario: Valid login").is_some());
//! assert_eq!(aggregator.sink().flush_count(), 1);
//! ```
//!
//! [Cucumber]: https://cucumber.io

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod registry;
pub mod replay;
pub mod resolver;
pub mod sink;
pub mod status;
mod test_utils;

#[doc(inline)]
pub use self::{
    aggregator::{Aggregator, RunState, Worker},
    config::Config,
    context::ExecutionContext,
    error::{Error, Result},
    event::{Event, Lifecycle},
    registry::FeatureRegistry,
    resolver::FeatureNameResolver,
    sink::ReportSink,
    status::{ReportStatus, Status},
};
