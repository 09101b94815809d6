// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CLI (command line interface) of the `cucumber-report` binary.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};

use crate::{config::ReportFormat, Config, Result};

/// Path denoting the standard input.
const STDIN: &str = "-";

/// Builds an execution report out of a recorded event log.
#[derive(Clone, Debug, Parser)]
#[command(
    name = "cucumber-report",
    about = "Builds a hierarchical execution report out of a Cucumber event \
             log",
    long_about = None
)]
pub struct Opts {
    /// NDJSON event log to replay, `-` for the standard input.
    #[arg(value_name = "LOG", default_value = STDIN)]
    pub log: PathBuf,

    /// Directory to put report folders into.
    #[arg(long = "report-dir", value_name = "dir")]
    pub report_dir: Option<PathBuf>,

    /// Heading of the report.
    #[arg(long = "report-name", value_name = "name")]
    pub report_name: Option<String>,

    /// Document title of the report.
    #[arg(long, value_name = "title")]
    pub title: Option<String>,

    /// Format of the report artifact.
    #[arg(long, value_enum, default_value_t, value_name = "html|json")]
    pub format: ReportFormat,

    /// Name of the report artifact file.
    #[arg(long = "file-name", value_name = "name")]
    pub file_name: Option<String>,

    /// Run metadata shown in the report.
    #[arg(
        long = "meta",
        value_name = "KEY=VALUE",
        value_parser = parse_key_value
    )]
    pub metadata: Vec<(String, String)>,

    /// Directory to look `classpath:` locators up in. May be repeated,
    /// directories are searched in order.
    #[arg(long = "resources", value_name = "dir")]
    pub resource_roots: Vec<PathBuf>,

    /// Writes the report directly into the report directory instead of a
    /// timestamped folder.
    #[arg(long = "no-timestamp")]
    pub no_timestamp: bool,

    /// Verbosity of diagnostics.
    ///
    /// Only warnings are shown by default, `-v` adds informational messages,
    /// `-vv` debug ones and `-vvv` traces.
    #[arg(short, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Opts {
    /// Shortcut for [`clap::Parser::parse()`], which doesn't require the trait
    /// being imported.
    #[must_use]
    pub fn parsed() -> Self {
        <Self as Parser>::parse()
    }

    /// Path of the event log to replay, or [`None`] for the standard input.
    #[must_use]
    pub fn log_path(&self) -> Option<&Path> {
        (self.log.as_os_str() != STDIN).then_some(self.log.as_path())
    }

    /// Maximum [`tracing::Level`] of diagnostics to show.
    #[must_use]
    pub const fn max_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    /// Converts these [`Opts`] into a validated [`Config`].
    ///
    /// # Errors
    ///
    /// If the resulting [`Config`] is [invalid](Config::validate).
    pub fn into_config(self) -> Result<Config> {
        let mut config = Config::default()
            .with_format(self.format)
            .with_timestamp(!self.no_timestamp);
        if let Some(dir) = self.report_dir {
            config = config.with_base_dir(dir);
        }
        if let Some(name) = self.report_name {
            config = config.with_report_name(name);
        }
        if let Some(title) = self.title {
            config = config.with_document_title(title);
        }
        if let Some(name) = self.file_name {
            config = config.with_file_name(name);
        }
        if !self.resource_roots.is_empty() {
            config = config.with_resource_roots(self.resource_roots);
        }
        config = self
            .metadata
            .into_iter()
            .fold(config, |c, (k, v)| c.with_metadata(k, v));

        config.validate()?;
        Ok(config)
    }
}

/// Parses a `KEY=VALUE` pair.
fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected `KEY=VALUE`, found `{s}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_owned(), value.trim().to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Opts {
        Opts::try_parse_from(
            std::iter::once("cucumber-report").chain(args.iter().copied()),
        )
        .unwrap()
    }

    #[test]
    fn defaults_to_stdin_and_html() {
        let opts = parse(&[]);

        assert_eq!(opts.log_path(), None);
        assert_eq!(opts.format, ReportFormat::Html);
        assert_eq!(opts.max_level(), tracing::Level::WARN);

        let config = opts.into_config().unwrap();
        assert!(config.timestamped);
        assert_eq!(config.file_name(), "report.html");
    }

    #[test]
    fn maps_options_into_config() {
        let opts = parse(&[
            "run.ndjson",
            "--report-dir",
            "out",
            "--report-name",
            "Nightly",
            "--title",
            "QA",
            "--format",
            "json",
            "--meta",
            "Platform=Android",
            "--meta",
            "Framework = Cucumber + Appium",
            "--resources",
            "features",
            "--no-timestamp",
            "-vv",
        ]);

        assert_eq!(opts.log_path(), Some(Path::new("run.ndjson")));
        assert_eq!(opts.max_level(), tracing::Level::DEBUG);

        let config = opts.into_config().unwrap();
        assert_eq!(config.base_dir, Path::new("out"));
        assert_eq!(config.report_name, "Nightly");
        assert_eq!(config.document_title, "QA");
        assert_eq!(config.format, ReportFormat::Json);
        assert!(!config.timestamped);
        assert_eq!(config.resource_roots, [PathBuf::from("features")]);
        assert_eq!(
            config.metadata.iter().collect::<Vec<_>>(),
            [
                (&"Platform".to_owned(), &"Android".to_owned()),
                (&"Framework".to_owned(), &"Cucumber + Appium".to_owned()),
            ],
        );
    }

    #[test]
    fn rejects_malformed_metadata() {
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
        assert_eq!(
            parse_key_value("Env=QA=1"),
            Ok(("Env".to_owned(), "QA=1".to_owned())),
        );
        assert!(
            Opts::try_parse_from(["cucumber-report", "--meta", "x"]).is_err(),
        );
    }

    #[test]
    fn rejects_nested_file_name() {
        let opts = parse(&["--file-name", "a/b.html"]);

        assert!(opts.into_config().is_err());
    }
}
