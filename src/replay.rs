// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Replaying of recorded event logs.
//!
//! An event log is [NDJSON]: one [`Record`] per line, for example:
//! ```json
//! {"worker":0,"event":"run_started"}
//! {"worker":1,"event":"case_started","case":{"locator":"classpath:features/login.feature","name":"Valid login","tags":["smoke"]}}
//! {"worker":1,"event":"step_started","step":{"type":"step","keyword":"Given ","text":"a user"}}
//! {"worker":1,"event":"step_finished","step":{"type":"step","keyword":"Given ","text":"a user"},"result":{"status":"PASSED","duration_ms":12}}
//! {"worker":1,"event":"case_finished","case":{"locator":"classpath:features/login.feature","name":"Valid login"},"result":{"status":"PASSED","duration_ms":15}}
//! {"worker":0,"event":"run_finished"}
//! ```
//!
//! [NDJSON]: https://github.com/ndjson/ndjson-spec

use std::{io::BufRead, thread, time::SystemTime};

use linked_hash_map::LinkedHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    event::{Lifecycle, WorkerId},
    resolver::probe::SourceProbe,
    Aggregator, Error, Event, ExecutionContext, ReportSink, Result,
};

/// Single line of an event log.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Record {
    /// Worker the [`Lifecycle`] event was emitted by.
    #[serde(default)]
    pub worker: WorkerId,

    /// Time the [`Lifecycle`] event has happened at, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "rfc3339")]
    pub at: Option<SystemTime>,

    /// Recorded [`Lifecycle`] event.
    #[serde(flatten)]
    pub event: Lifecycle,
}

impl Record {
    /// Creates a new [`Record`] without a recorded time.
    #[must_use]
    pub const fn new(worker: WorkerId, event: Lifecycle) -> Self {
        Self { worker, at: None, event }
    }

    /// Converts this [`Record`] into an [`Event`], happening now unless the
    /// time was recorded.
    #[must_use]
    pub fn into_event(self) -> Event<Lifecycle> {
        Event::at(self.event, self.at.unwrap_or_else(SystemTime::now))
    }
}

/// Statistics of a finished [`replay()`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Replayed {
    /// Number of workers driven concurrently.
    pub workers: usize,

    /// Number of dispatched events.
    pub events: usize,
}

/// Reads all the [`Record`]s of an event log, skipping blank lines.
///
/// # Errors
///
/// - [`Error::Io`] if reading fails;
/// - [`Error::EventLog`] on the first malformed line.
pub fn read_records(reader: impl BufRead) -> Result<Vec<Record>> {
    let mut records = vec![];
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .map_err(|source| Error::EventLog { line: n + 1, source })?;
        records.push(record);
    }
    Ok(records)
}

/// Replays the given [`Record`]s into the [`Aggregator`].
///
/// `run-started` events are dispatched first. Then every worker's events are
/// dispatched in their recorded order on a separate thread with its own
/// [`ExecutionContext`]. Once all the workers are joined, `run-finished`
/// events are dispatched.
pub fn replay<S, P, I>(aggregator: &Aggregator<S, P>, records: I) -> Replayed
where
    S: ReportSink,
    P: SourceProbe,
    I: IntoIterator<Item = Record>,
{
    let mut started = vec![];
    let mut finished = vec![];
    let mut workers = LinkedHashMap::<WorkerId, Vec<_>>::new();
    for record in records {
        match record.event {
            Lifecycle::RunStarted => started.push(record.into_event()),
            Lifecycle::RunFinished => finished.push(record.into_event()),
            _ => workers
                .entry(record.worker)
                .or_insert_with(Vec::new)
                .push(record.into_event()),
        }
    }

    let mut stats = Replayed {
        workers: workers.len(),
        events: started.len() + finished.len(),
    };
    stats.events += workers.values().map(Vec::len).sum::<usize>();

    let mut run_ctx = ExecutionContext::new();
    for ev in started {
        aggregator.handle_event(&mut run_ctx, ev);
    }

    thread::scope(|s| {
        let handles = workers
            .into_iter()
            .map(|(id, events)| {
                let handle = s.spawn(move || {
                    let _span =
                        tracing::info_span!("worker", id = id.0).entered();
                    let mut worker = aggregator.worker();
                    for ev in events {
                        worker.handle(ev);
                    }
                    if !worker.context().is_idle() {
                        tracing::warn!("event log ended inside a scenario");
                    }
                });
                (id, handle)
            })
            .collect::<Vec<_>>();
        for (id, handle) in handles {
            if handle.join().is_err() {
                tracing::error!("worker {id} panicked");
            }
        }
    });

    for ev in finished {
        aggregator.handle_event(&mut run_ctx, ev);
    }
    stats
}

/// Reads an event log and [`replay()`]s it into the [`Aggregator`].
///
/// # Errors
///
/// See [`read_records()`]. Nothing is dispatched if the log is malformed.
pub fn replay_reader<S, P>(
    aggregator: &Aggregator<S, P>,
    reader: impl BufRead,
) -> Result<Replayed>
where
    S: ReportSink,
    P: SourceProbe,
{
    Ok(replay(aggregator, read_records(reader)?))
}

/// (De)serialization of an optional [`SystemTime`] as an [RFC 3339]
/// timestamp.
///
/// [RFC 3339]: https://www.rfc-editor.org/rfc/rfc3339
mod rfc3339 {
    use std::time::SystemTime;

    use serde::{de::Error as _, Deserialize as _, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        at: &Option<SystemTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match at {
            Some(at) => {
                serializer.collect_str(&humantime::format_rfc3339_millis(*at))
            }
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<SystemTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| {
                humantime::parse_rfc3339_weak(&s).map_err(D::Error::custom)
            })
            .transpose()
    }
}
