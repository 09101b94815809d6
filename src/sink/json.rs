// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! JSON [`Format`] of a [`Report`].

use std::io;

use super::{Format, Report, Result};

/// [`Format`] serializing the whole [`Report`] as pretty-printed JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct Json;

impl Format for Json {
    fn render(&self, report: &Report, out: &mut dyn io::Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, report)?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use crate::{
        sink::{Memory, Message, ReportSink as _},
        ReportStatus,
    };

    use super::*;

    #[test]
    fn renders_tree_with_statuses_and_messages() {
        let sink = Memory::new();
        sink.set_run_metadata("Environment", "QA").unwrap();
        let feature = sink.create_root_node("Feature: A").unwrap();
        let scenario = sink.create_child_node(feature, "Scenario: B").unwrap();
        sink.log_on_node(
            scenario,
            ReportStatus::Fail,
            Message::Details {
                summary: "Stack Trace".into(),
                body: "at x".into(),
            },
        )
        .unwrap();

        let mut out = Vec::new();
        Json.render(&sink.snapshot(), &mut out).unwrap();
        let json: Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(json["metadata"]["Environment"], "QA");
        assert_eq!(json["roots"], serde_json::json!([0]));
        assert_eq!(json["nodes"][1]["parent"], 0);
        assert_eq!(json["nodes"][1]["entries"][0]["status"], "fail");
        assert_eq!(
            json["nodes"][1]["entries"][0]["message"]["type"],
            "details",
        );
        assert!(json["nodes"][0].get("parent").is_none());
    }
}
