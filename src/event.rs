// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Key occurrences in the lifecycle of a test run.
//!
//! The top-level enum here is [`Lifecycle`]. Every occurrence is wrapped into
//! an [`Event`] carrying the time it happened at.

use std::time::{Duration, SystemTime};

use derive_more::with_trait::{AsRef, Deref, DerefMut, Display, From};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{resolver::file_locator, Status};

/// Arbitrary event paired with the [`SystemTime`] it has happened at.
#[derive(AsRef, Clone, Copy, Debug, Deref, DerefMut)]
pub struct Event<T: ?Sized> {
    /// [`SystemTime`] when this [`Event`] has happened.
    pub at: SystemTime,

    /// Actual value of this [`Event`].
    #[as_ref]
    #[deref]
    #[deref_mut]
    pub value: T,
}

impl<T> Event<T> {
    /// Creates a new [`Event`] out of the given `value`, happening now.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self { at: SystemTime::now(), value }
    }

    /// Creates a new [`Event`] happened at the given [`SystemTime`].
    #[must_use]
    pub const fn at(value: T, at: SystemTime) -> Self {
        Self { at, value }
    }

    /// Unwraps the inner [`Event::value`] loosing the timestamp.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Splits this [`Event`] into the inner [`Event::value`] and its
    /// timestamp.
    #[must_use]
    pub fn split(self) -> (T, SystemTime) {
        (self.value, self.at)
    }
}

/// Identifier of an independent unit of test execution (a thread or a task),
/// driving one scenario at a time.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(transparent)]
pub struct WorkerId(pub u64);

/// Top-level test run lifecycle event.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Lifecycle {
    /// Test run has started.
    RunStarted,

    /// [`Case`] execution has started.
    CaseStarted {
        /// Started [`Case`].
        case: Case,
    },

    /// [`TestStep`] execution has started.
    StepStarted {
        /// Started [`TestStep`].
        step: TestStep,
    },

    /// [`TestStep`] execution has finished.
    StepFinished {
        /// Finished [`TestStep`].
        step: TestStep,

        /// [`Outcome`] of the [`TestStep`].
        result: Outcome,
    },

    /// [`Case`] execution has finished.
    CaseFinished {
        /// Finished [`Case`].
        case: Case,

        /// [`Outcome`] of the whole [`Case`].
        result: Outcome,
    },

    /// Test run has finished.
    RunFinished,
}

impl Lifecycle {
    /// Short name of this [`Lifecycle`] event kind, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RunStarted => "run-started",
            Self::CaseStarted { .. } => "case-started",
            Self::StepStarted { .. } => "step-started",
            Self::StepFinished { .. } => "step-finished",
            Self::CaseFinished { .. } => "case-finished",
            Self::RunFinished => "run-finished",
        }
    }

    /// Indicates whether this event concerns the whole run rather than a
    /// single worker.
    #[must_use]
    pub const fn is_run_level(&self) -> bool {
        matches!(self, Self::RunStarted | Self::RunFinished)
    }

    /// Constructs an event of the given [`Case`] being started.
    #[must_use]
    pub const fn case_started(case: Case) -> Self {
        Self::CaseStarted { case }
    }

    /// Constructs an event of the given [`Case`] being finished.
    #[must_use]
    pub const fn case_finished(case: Case, result: Outcome) -> Self {
        Self::CaseFinished { case, result }
    }

    /// Constructs an event of the given [`TestStep`] being started.
    #[must_use]
    pub fn step_started(step: impl Into<TestStep>) -> Self {
        Self::StepStarted { step: step.into() }
    }

    /// Constructs an event of the given [`TestStep`] being finished.
    #[must_use]
    pub fn step_finished(step: impl Into<TestStep>, result: Outcome) -> Self {
        Self::StepFinished { step: step.into(), result }
    }
}

/// Single executed test case (a scenario, or one example of an outline).
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Case {
    /// Opaque locator of the source this [`Case`] comes from.
    ///
    /// Usually a `file:` URI or a `classpath:` resource path of the
    /// `.feature` file.
    pub locator: String,

    /// Display name of this [`Case`].
    pub name: String,

    /// Tags of this [`Case`].
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Case {
    /// Creates a new untagged [`Case`].
    #[must_use]
    pub fn new(locator: impl Into<String>, name: impl Into<String>) -> Self {
        Self { locator: locator.into(), name: name.into(), tags: vec![] }
    }

    /// Attaches the given tags to this [`Case`].
    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Creates a [`Case`] out of a parsed [`gherkin::Scenario`] of the given
    /// [`gherkin::Feature`].
    ///
    /// The locator is a `file:` URI of the [`gherkin::Feature::path`], or
    /// empty if the [`gherkin::Feature`] wasn't read from a file.
    #[must_use]
    pub fn from_gherkin(
        feature: &gherkin::Feature,
        scenario: &gherkin::Scenario,
    ) -> Self {
        let locator =
            feature.path.as_deref().map(file_locator).unwrap_or_default();

        Self::new(locator, scenario.name.clone()).with_tags(
            feature.tags.iter().chain(&scenario.tags).cloned(),
        )
    }
}

/// Step of a [`Case`] being executed.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestStep {
    /// [`Step`] written in a `.feature` file.
    Step(Step),

    /// Hook executed around a [`Case`] or a [`Step`].
    Hook {
        /// Type of the executed hook.
        hook: HookType,
    },
}

impl From<Step> for TestStep {
    fn from(step: Step) -> Self {
        Self::Step(step)
    }
}

impl TestStep {
    /// Returns the [`Step`], unless this is a hook.
    #[must_use]
    pub const fn as_step(&self) -> Option<&Step> {
        match self {
            Self::Step(step) => Some(step),
            Self::Hook { .. } => None,
        }
    }
}

/// Type of a hook.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookType {
    /// Executing before every [`Case`].
    #[display("Before")]
    Before,

    /// Executing after every [`Case`].
    #[display("After")]
    After,

    /// Executing before every [`Step`].
    #[display("BeforeStep")]
    BeforeStep,

    /// Executing after every [`Step`].
    #[display("AfterStep")]
    AfterStep,
}

/// `.feature` file step.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Step {
    /// Keyword of this [`Step`] (`Given`, `When`, `And`, etc.).
    pub keyword: String,

    /// Text following the keyword.
    pub text: String,

    /// [`Argument`] attached to this [`Step`], if any.
    #[serde(default)]
    pub argument: Option<Argument>,
}

impl Step {
    /// Creates a new [`Step`] without an [`Argument`].
    #[must_use]
    pub fn new(keyword: impl Into<String>, text: impl Into<String>) -> Self {
        Self { keyword: keyword.into(), text: text.into(), argument: None }
    }

    /// Attaches the given [`Argument`] to this [`Step`].
    #[must_use]
    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.argument = Some(argument);
        self
    }
}

impl From<&gherkin::Step> for Step {
    fn from(step: &gherkin::Step) -> Self {
        let argument = step
            .docstring
            .clone()
            .map(|content| Argument::DocString { content })
            .or_else(|| {
                step.table
                    .as_ref()
                    .map(|t| Argument::DataTable { rows: t.rows.clone() })
            });

        Self {
            keyword: step.keyword.clone(),
            text: step.value.clone(),
            argument,
        }
    }
}

/// Data argument attached to a [`Step`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Argument {
    /// [Doc string][1].
    ///
    /// [1]: https://cucumber.io/docs/gherkin/reference#doc-strings
    DocString {
        /// Content of the doc string.
        content: String,
    },

    /// [Data table][1].
    ///
    /// [1]: https://cucumber.io/docs/gherkin/reference#data-tables
    DataTable {
        /// Rows of the data table.
        rows: Vec<Vec<String>>,
    },
}

/// Result of executing a [`Case`] or a [`TestStep`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Outcome {
    /// Runner-native [`Status`], if reported.
    ///
    /// Unrecognized statuses are read as [`None`].
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<Status>,

    /// [`Failure`] happened during execution, if any.
    #[serde(default)]
    pub error: Option<Failure>,

    /// Time the execution took, if measured.
    #[serde(default, rename = "duration_ms", with = "millis")]
    pub duration: Option<Duration>,
}

impl Outcome {
    /// Creates a new [`Outcome`] of the given [`Status`].
    #[must_use]
    pub const fn new(status: Status) -> Self {
        Self { status: Some(status), error: None, duration: None }
    }

    /// Creates a new [`Status::Passed`] [`Outcome`].
    #[must_use]
    pub const fn passed() -> Self {
        Self::new(Status::Passed)
    }

    /// Creates a new [`Status::Failed`] [`Outcome`] with the given
    /// [`Failure`].
    #[must_use]
    pub const fn failed(error: Failure) -> Self {
        Self {
            status: Some(Status::Failed),
            error: Some(error),
            duration: None,
        }
    }

    /// Attaches the given execution time to this [`Outcome`].
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Error raised during execution.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Failure {
    /// Message of this [`Failure`].
    #[serde(default)]
    pub message: Option<String>,

    /// Backtrace or any other trace of this [`Failure`].
    #[serde(default)]
    pub trace: Option<String>,
}

impl Failure {
    /// Creates a new [`Failure`] with the given message and no trace.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: Some(message.into()), trace: None }
    }

    /// Attaches the given trace to this [`Failure`].
    #[must_use]
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }
}

/// Deserializes an optional [`Status`], reading unknown ones as [`None`].
fn lenient_status<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Status>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let status = Status::ALL
        .into_iter()
        .find(|s| s.to_string().eq_ignore_ascii_case(raw.trim()));
    if status.is_none() {
        tracing::warn!("unknown status `{raw}` is reported as absent");
    }
    Ok(status)
}

/// (De)serialization of an optional [`Duration`] as whole milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize as _, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        duration: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match duration {
            Some(d) => {
                let millis = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
                serializer.serialize_u64(millis)
            }
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEATURE: &str = "\
@smoke
Feature: Login Flow

  @fast
  Scenario: valid credentials
    Given a user \"alice\"
    When she logs in with:
      | login | password |
      | alice | secret   |
    Then she sees:
      \"\"\"
      Welcome
      \"\"\"
";

    fn parsed() -> gherkin::Feature {
        let mut feature =
            gherkin::Feature::parse(FEATURE, gherkin::GherkinEnv::default())
                .unwrap();
        feature.path = Some("features/login.feature".into());
        feature
    }

    #[test]
    fn event_derefs_to_value() {
        let ev = Event::new(Lifecycle::RunStarted);

        assert_eq!(ev.kind(), "run-started");
        assert!(ev.is_run_level());
        assert_eq!(ev.into_inner(), Lifecycle::RunStarted);
    }

    #[test]
    fn case_from_gherkin_uses_file_locator() {
        let feature = parsed();
        let case = Case::from_gherkin(&feature, &feature.scenarios[0]);

        assert_eq!(case.locator, "file:features/login.feature");
        assert_eq!(case.name, "valid credentials");
        assert_eq!(case.tags.len(), 2);
    }

    #[test]
    fn case_from_gherkin_escapes_locator() {
        let mut feature = parsed();
        feature.path = Some("/suite/a%20b/my login.feature".into());

        let case = Case::from_gherkin(&feature, &feature.scenarios[0]);

        assert_eq!(case.locator, "file:/suite/a%2520b/my%20login.feature");
        assert_eq!(
            crate::resolver::Source::parse(&case.locator),
            Some(crate::resolver::Source::File(
                "/suite/a%20b/my login.feature".into(),
            )),
        );
    }

    #[test]
    fn step_from_gherkin_keeps_arguments() {
        let feature = parsed();
        let steps = &feature.scenarios[0].steps;

        let given = Step::from(&steps[0]);
        assert_eq!(given.text, "a user \"alice\"");
        assert_eq!(given.argument, None);

        let when = Step::from(&steps[1]);
        assert!(matches!(
            when.argument,
            Some(Argument::DataTable { ref rows }) if rows.len() == 2,
        ));

        let then = Step::from(&steps[2]);
        assert!(matches!(
            then.argument,
            Some(Argument::DocString { ref content })
                if content.contains("Welcome"),
        ));
    }

    #[test]
    fn lifecycle_deserializes_from_tagged_json() {
        let json = r#"{
            "event": "step_finished",
            "step": {"type": "step", "keyword": "Given ", "text": "a user"},
            "result": {"status": "FAILED", "duration_ms": 12,
                       "error": {"message": "boom"}}
        }"#;

        let ev: Lifecycle = serde_json::from_str(json).unwrap();

        assert_eq!(
            ev,
            Lifecycle::step_finished(
                Step::new("Given ", "a user"),
                Outcome::failed(Failure::new("boom"))
                    .with_duration(Duration::from_millis(12)),
            ),
        );
    }

    #[test]
    fn unknown_status_reads_as_absent() {
        let outcome: Outcome =
            serde_json::from_str(r#"{"status": "UNUSED"}"#).unwrap();
        assert_eq!(outcome.status, None);

        let outcome: Outcome =
            serde_json::from_str(r#"{"status": "skipped"}"#).unwrap();
        assert_eq!(outcome.status, Some(Status::Skipped));

        let outcome: Outcome =
            serde_json::from_str(r#"{"status": null}"#).unwrap();
        assert_eq!(outcome.status, None);
    }

    #[test]
    fn hook_steps_are_not_steps() {
        let hook = TestStep::Hook { hook: HookType::Before };

        assert_eq!(hook.as_step(), None);
        assert!(TestStep::from(Step::new("Given", "x")).as_step().is_some());
    }
}
