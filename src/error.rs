// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Top-level error type of this crate.
//!
//! Errors of a [`ReportSink`] are [`sink::Error`]s, while this [`Error`]
//! covers everything around the aggregation itself: reading event logs,
//! configuration and setting up the sink.
//!
//! [`ReportSink`]: crate::ReportSink

use std::io;

use derive_more::with_trait::{Display, Error as StdError};

use crate::sink;

/// Top-level error of this crate.
#[derive(Debug, Display, StdError)]
pub enum Error {
    /// [`ReportSink`] failed.
    ///
    /// [`ReportSink`]: crate::ReportSink
    #[display("Report sink failed: {_0}")]
    Sink(sink::Error),

    /// I/O error while reading an event log.
    #[display("I/O operation failed: {_0}")]
    Io(io::Error),

    /// Line of an event log cannot be parsed.
    #[display("Malformed event log line {line}: {source}")]
    EventLog {
        /// 1-based number of the malformed line.
        line: usize,

        /// Parsing error.
        source: serde_json::Error,
    },

    /// Invalid configuration.
    #[display("Invalid configuration: {reason}")]
    Config {
        /// Reason of the configuration being invalid.
        #[error(not(source))]
        reason: String,
    },
}

impl Error {
    /// Creates a new [`Error::Config`].
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config { reason: reason.into() }
    }

    /// Returns the 1-based number of the malformed event log line, if this
    /// is an [`Error::EventLog`].
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::EventLog { line, .. } => Some(*line),
            Self::Sink(_) | Self::Io(_) | Self::Config { .. } => None,
        }
    }
}

impl From<sink::Error> for Error {
    fn from(err: sink::Error) -> Self {
        Self::Sink(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Result of this crate's operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn event_log_error_keeps_line_and_source() {
        let source =
            serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::EventLog { line: 3, source };

        assert_eq!(err.line(), Some(3));
        assert!(err.to_string().starts_with("Malformed event log line 3: "));
        assert!(err.source().is_some());
    }

    #[test]
    fn converts_sink_errors() {
        let err: Error = sink::Error::rejected("disk full").into();

        assert!(matches!(err, Error::Sink(sink::Error::Rejected { .. })));
        assert_eq!(
            err.to_string(),
            "Report sink failed: Report operation rejected: disk full",
        );
        assert_eq!(err.line(), None);
    }

    #[test]
    fn config_error_has_no_source() {
        let err = Error::config("unknown format");

        assert_eq!(err.to_string(), "Invalid configuration: unknown format");
        assert!(err.source().is_none());
    }
}
