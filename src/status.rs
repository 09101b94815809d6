// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Runner-native outcomes and their normalized report counterparts.

use derive_more::with_trait::Display;
use serde::{Deserialize, Serialize};

/// Outcome of a test case or a step, as reported by a test runner.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Executed successfully.
    #[display("PASSED")]
    Passed,

    /// Executed and failed.
    #[display("FAILED")]
    Failed,

    /// Not executed because of a preceding failure or a filter.
    #[display("SKIPPED")]
    Skipped,

    /// Step definition signalled it's not implemented yet.
    #[display("PENDING")]
    Pending,

    /// More than one step definition matched.
    #[display("AMBIGUOUS")]
    Ambiguous,

    /// No step definition matched.
    #[display("UNDEFINED")]
    Undefined,
}

impl Status {
    /// All the [`Status`] variants.
    pub const ALL: [Self; 6] = [
        Self::Passed,
        Self::Failed,
        Self::Skipped,
        Self::Pending,
        Self::Ambiguous,
        Self::Undefined,
    ];
}

/// Normalized status of a report node entry.
///
/// Variants are declared from the least to the most severe, so the derived
/// [`Ord`] picks the one dominating a node.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// Informational entry.
    #[default]
    #[display("info")]
    Info,

    /// Successful entry.
    #[display("pass")]
    Pass,

    /// Skipped entry.
    #[display("skip")]
    Skip,

    /// Entry requiring attention without being a failure.
    #[display("warning")]
    Warning,

    /// Failed entry.
    #[display("fail")]
    Fail,
}

impl From<Status> for ReportStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Passed => Self::Pass,
            Status::Failed => Self::Fail,
            Status::Skipped => Self::Skip,
            Status::Pending | Status::Ambiguous | Status::Undefined => {
                Self::Warning
            }
        }
    }
}

/// Maps an optional runner-native [`Status`] to a [`ReportStatus`].
///
/// An absent [`Status`] maps to [`ReportStatus::Info`].
#[must_use]
pub fn map(status: Option<Status>) -> ReportStatus {
    status.map_or(ReportStatus::Info, ReportStatus::from)
}
