// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Rendering of report node titles and log messages.

use std::{borrow::Cow, time::Duration};

use itertools::Itertools as _;

use crate::{
    event::{Argument, Failure, Outcome, Step},
    ReportStatus,
};

/// Maximum number of characters of a logged error message.
pub const MAX_MESSAGE_LEN: usize = 500;

/// Maximum number of characters of a logged stack trace.
pub const MAX_TRACE_LEN: usize = 2000;

/// Marker appended to a truncated error message.
const MESSAGE_ELLIPSIS: &str = "...";

/// Marker appended to a truncated stack trace.
const TRACE_ELLIPSIS: &str = "\n... (truncated)";

/// Title of a feature node.
pub(super) fn feature_title(name: &str) -> String {
    format!("Feature: {name}")
}

/// Title of a scenario node.
pub(super) fn scenario_title(name: &str) -> String {
    format!("Scenario: {name}")
}

/// Normalizes a tag to its `@`-prefixed form.
pub(super) fn tag(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with('@') {
        raw.to_owned()
    } else {
        format!("@{raw}")
    }
}

/// Informational message listing the `tags` of a scenario.
pub(super) fn tags_message(tags: &[String]) -> String {
    format!("Tags: {}", tags.iter().join(", "))
}

/// Title of a step node: its keyword and text, followed by a rendering of its
/// [`Argument`], if any.
///
/// Doc strings are inlined in a fenced block, while tables are only marked to
/// keep the node small.
pub(super) fn step_title(step: &Step) -> String {
    let mut title = if step.keyword.is_empty()
        || step.keyword.ends_with(char::is_whitespace)
    {
        format!("{}{}", step.keyword, step.text)
    } else {
        format!("{} {}", step.keyword, step.text)
    };
    match &step.argument {
        Some(Argument::DocString { content }) => {
            title.push_str("\n```\n");
            title.push_str(content);
            title.push_str("\n```");
        }
        Some(Argument::DataTable { .. }) => title.push_str(" [DataTable]"),
        None => {}
    }
    title
}

/// Cuts `text` down to `max` characters, appending the `marker` if anything
/// was cut.
fn truncate<'t>(text: &'t str, max: usize, marker: &str) -> Cow<'t, str> {
    match text.char_indices().nth(max) {
        Some((at, _)) => format!("{}{marker}", &text[..at]).into(),
        None => text.into(),
    }
}

/// Truncates an error message to [`MAX_MESSAGE_LEN`] characters.
pub fn truncate_message(message: &str) -> Cow<'_, str> {
    truncate(message, MAX_MESSAGE_LEN, MESSAGE_ELLIPSIS)
}

/// Truncates a stack trace to [`MAX_TRACE_LEN`] characters.
pub fn truncate_trace(trace: &str) -> Cow<'_, str> {
    truncate(trace, MAX_TRACE_LEN, TRACE_ELLIPSIS)
}

/// Formats a `duration` in whole milliseconds.
pub(super) fn millis(duration: Duration) -> String {
    format!("{} ms", duration.as_millis())
}

/// Message logged on a failed step node.
pub(super) fn step_failure(error: &Failure) -> String {
    match error.message.as_deref().map(str::trim) {
        Some(msg) if !msg.is_empty() => {
            format!("Step failed: {}", truncate_message(msg))
        }
        _ => "Step failed".to_owned(),
    }
}

/// Message logged on a step node finished without an error.
pub(super) fn step_summary(status: ReportStatus, outcome: &Outcome) -> String {
    match outcome.duration {
        Some(d) => format!("Step {status} ({})", millis(d)),
        None => format!("Step {status}"),
    }
}

/// One-line summary logged on a finished scenario node.
///
/// The error message, if any, is flattened to a single line and truncated.
pub(super) fn case_summary(status: ReportStatus, outcome: &Outcome) -> String {
    let mut summary = format!("Scenario {status}");
    if let Some(d) = outcome.duration {
        summary.push_str(" in ");
        summary.push_str(&millis(d));
    }
    let message = outcome
        .error
        .as_ref()
        .and_then(|e| e.message.as_deref())
        .map(|m| m.split_whitespace().join(" "))
        .filter(|m| !m.is_empty());
    if let Some(message) = message {
        summary.push_str(" - ");
        summary.push_str(&truncate_message(&message));
    }
    summary
}
