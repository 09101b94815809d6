// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration of a report.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    time::SystemTime,
};

use derive_more::with_trait::Display;
use linked_hash_map::LinkedHashMap;
use smart_default::SmartDefault;

use crate::{
    resolver::probe,
    sink::{self, Format},
    Aggregator, Error, FeatureNameResolver, Result,
};

/// Artifact [`Format`] of a report.
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, PartialEq, clap::ValueEnum,
)]
pub enum ReportFormat {
    /// Standalone HTML document.
    #[default]
    #[display("html")]
    Html,

    /// JSON snapshot of the report tree.
    #[display("json")]
    Json,
}

impl ReportFormat {
    /// Extension of the artifact file in this [`ReportFormat`].
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

/// File sink built out of a [`Config`].
pub type ConfiguredSink = sink::File<Box<dyn Format>>;

/// Configuration of a report.
///
/// # Example
///
/// ```rust
/// # use cucumber_report::{config::ReportFormat, Config};
/// #
/// let config = Config::default()
///     .with_base_dir("target/reports")
///     .with_format(ReportFormat::Json)
///     .with_timestamp(false)
///     .with_metadata("Environment", "QA");
///
/// assert_eq!(
///     config.report_path(std::time::SystemTime::now()),
///     std::path::Path::new("target/reports/report.json"),
/// );
/// ```
#[derive(Clone, Debug, SmartDefault)]
pub struct Config {
    /// Directory to put report folders into.
    #[default(PathBuf::from("Reports"))]
    pub base_dir: PathBuf,

    /// `<title>` of an HTML report.
    #[default("Automation Test Report".into())]
    pub document_title: String,

    /// Heading of an HTML report.
    #[default("Cucumber Test Report".into())]
    pub report_name: String,

    /// Name of the artifact file.
    ///
    /// Defaults to `report.<ext>` of the [`Config::format`].
    pub file_name: Option<String>,

    /// Artifact [`ReportFormat`].
    pub format: ReportFormat,

    /// Run metadata in insertion order.
    pub metadata: LinkedHashMap<String, String>,

    /// Directories to look `classpath:` locators up in, in order.
    #[default(
        probe::DEFAULT_RESOURCE_ROOTS.into_iter().map(PathBuf::from).collect()
    )]
    pub resource_roots: Vec<PathBuf>,

    /// Whether every run gets its own `Test-Reports-<timestamp>` folder.
    #[default(true)]
    pub timestamped: bool,
}

impl Config {
    /// Sets the [`Config::base_dir`].
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Sets the [`Config::document_title`].
    #[must_use]
    pub fn with_document_title(mut self, title: impl Into<String>) -> Self {
        self.document_title = title.into();
        self
    }

    /// Sets the [`Config::report_name`].
    #[must_use]
    pub fn with_report_name(mut self, name: impl Into<String>) -> Self {
        self.report_name = name.into();
        self
    }

    /// Sets the [`Config::file_name`].
    #[must_use]
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Sets the [`Config::format`].
    #[must_use]
    pub const fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    /// Adds a run metadata `key`/`value` pair.
    #[must_use]
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        _ = self.metadata.insert(key.into(), value.into());
        self
    }

    /// Replaces the [`Config::resource_roots`].
    #[must_use]
    pub fn with_resource_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.resource_roots = roots.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the [`Config::timestamped`].
    #[must_use]
    pub const fn with_timestamp(mut self, timestamped: bool) -> Self {
        self.timestamped = timestamped;
        self
    }

    /// Checks this [`Config`] for consistency.
    ///
    /// # Errors
    ///
    /// If the [`Config::file_name`] is empty or is not a plain file name.
    pub fn validate(&self) -> Result<()> {
        match self.file_name.as_deref() {
            Some(name) if name.trim().is_empty() => {
                Err(Error::config("report file name is empty"))
            }
            Some(name)
                if Path::new(name).file_name() != Some(OsStr::new(name)) =>
            {
                Err(Error::config(format!(
                    "report file name `{name}` must not contain directories",
                )))
            }
            _ => Ok(()),
        }
    }

    /// Name of the artifact file.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| format!("report.{}", self.format.extension()))
    }

    /// Folder of the report of a run started `at` the given time.
    #[must_use]
    pub fn report_dir(&self, at: SystemTime) -> PathBuf {
        if self.timestamped {
            self.base_dir.join(format!("Test-Reports-{}", timestamp(at)))
        } else {
            self.base_dir.clone()
        }
    }

    /// Path of the artifact of a run started `at` the given time.
    #[must_use]
    pub fn report_path(&self, at: SystemTime) -> PathBuf {
        self.report_dir(at).join(self.file_name())
    }

    /// Creates the [`FeatureNameResolver`] looking sources up in the
    /// [`Config::resource_roots`].
    #[must_use]
    pub fn resolver(&self) -> FeatureNameResolver {
        FeatureNameResolver::new(probe::Fs::new(self.resource_roots.clone()))
    }

    /// Creates the file sink writing the artifact of a run started `at` the
    /// given time.
    #[must_use]
    pub fn sink(&self, at: SystemTime) -> ConfiguredSink {
        let format: Box<dyn Format> = match self.format {
            ReportFormat::Html => Box::new(sink::Html::new(
                self.document_title.clone(),
                self.report_name.clone(),
            )),
            ReportFormat::Json => Box::new(sink::Json),
        };
        sink::File::new(self.report_path(at), format)
    }

    /// Creates a fully configured [`Aggregator`] of a run started `at` the
    /// given time.
    ///
    /// # Errors
    ///
    /// If this [`Config`] is [invalid](Config::validate).
    pub fn aggregator(
        &self,
        at: SystemTime,
    ) -> Result<Aggregator<ConfiguredSink>> {
        self.validate()?;
        Ok(Aggregator::with_resolver(self.sink(at), self.resolver())
            .with_metadata_pairs(self.metadata.clone()))
    }
}

/// Formats the given time as `yyyyMMddHHmmss` in UTC.
fn timestamp(at: SystemTime) -> String {
    humantime::format_rfc3339_seconds(at)
        .to_string()
        .chars()
        .filter(char::is_ascii_digit)
        .collect()
}
