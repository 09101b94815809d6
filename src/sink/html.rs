// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Standalone HTML [`Format`] of a [`Report`].

use std::{fmt, io};

use itertools::Itertools as _;
use smart_default::SmartDefault;

use crate::ReportStatus;

use super::{Format, Message, Node, Report, Result};

/// Inline stylesheet of the rendered document.
const STYLE: &str = "\
body{font-family:sans-serif;margin:2em;color:#222}\
table.meta td{padding:2px 12px 2px 0}\
details{margin:4px 0 4px 16px}\
summary{cursor:pointer}\
ul{list-style:none;margin:2px 0 2px 16px;padding:0}\
li{white-space:pre-wrap}\
pre{background:#f4f4f4;padding:8px;overflow-x:auto}\
.status{display:inline-block;min-width:5em;font-weight:bold}\
.pass{color:#2e7d32}.fail{color:#c62828}.skip{color:#6d4c41}\
.warning{color:#ef6c00}.info{color:#1565c0}\
.category{background:#eee;border-radius:3px;padding:0 4px;margin-left:4px;\
font-size:smaller}";

/// [`Format`] rendering the [`Report`] as a single self-contained HTML
/// document with collapsible nodes.
#[derive(Clone, Debug, SmartDefault)]
pub struct Html {
    /// `<title>` of the document.
    #[default("Automation Test Report".into())]
    pub document_title: String,

    /// Heading shown on top of the report.
    #[default("Cucumber Test Report".into())]
    pub report_name: String,
}

impl Html {
    /// Creates a new [`Html`] [`Format`] with the given titles.
    #[must_use]
    pub fn new(
        document_title: impl Into<String>,
        report_name: impl Into<String>,
    ) -> Self {
        Self {
            document_title: document_title.into(),
            report_name: report_name.into(),
        }
    }

    fn write_node(
        &self,
        report: &Report,
        node: &Node,
        out: &mut dyn io::Write,
    ) -> io::Result<()> {
        let status = report.status(node.id);
        writeln!(
            out,
            "<details open><summary>{} {}{}</summary>",
            Badge(status),
            Escaped(&node.title),
            node.categories
                .iter()
                .map(|c| format!(
                    "<span class=\"category\">{}</span>",
                    Escaped(c),
                ))
                .join(""),
        )?;

        if !node.entries.is_empty() {
            writeln!(out, "<ul>")?;
            for entry in &node.entries {
                write!(out, "<li>{} ", Badge(entry.status))?;
                match &entry.message {
                    Message::Text(text) => {
                        write!(out, "{}", Escaped(text))?;
                    }
                    Message::Details { summary, body } => write!(
                        out,
                        "<details><summary>{}</summary><pre>{}</pre>\
                         </details>",
                        Escaped(summary),
                        Escaped(body),
                    )?,
                }
                writeln!(out, "</li>")?;
            }
            writeln!(out, "</ul>")?;
        }

        for child in report.children(node) {
            self.write_node(report, child, out)?;
        }

        writeln!(out, "</details>")
    }
}

impl Format for Html {
    fn render(&self, report: &Report, out: &mut dyn io::Write) -> Result<()> {
        writeln!(out, "<!DOCTYPE html>")?;
        writeln!(out, "<html><head><meta charset=\"utf-8\">")?;
        writeln!(out, "<title>{}</title>", Escaped(&self.document_title))?;
        writeln!(out, "<style>{STYLE}</style></head><body>")?;
        writeln!(out, "<h1>{}</h1>", Escaped(&self.report_name))?;

        if !report.metadata.is_empty() {
            writeln!(out, "<table class=\"meta\">")?;
            for (key, value) in &report.metadata {
                writeln!(
                    out,
                    "<tr><td>{}</td><td>{}</td></tr>",
                    Escaped(key),
                    Escaped(value),
                )?;
            }
            writeln!(out, "</table>")?;
        }

        for root in report.roots() {
            self.write_node(report, root, out)?;
        }

        writeln!(out, "</body></html>")?;
        Ok(())
    }
}

/// Text escaped for embedding into HTML.
struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&#39;")?,
                c => write!(f, "{c}")?,
            }
        }
        Ok(())
    }
}

/// Colored label of a [`ReportStatus`].
struct Badge(ReportStatus);

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<span class=\"status {0}\">{0}</span>", self.0)
    }
}

#[cfg(test)]
mod tests {
    use crate::sink::{Memory, ReportSink as _};

    use super::*;

    fn render(sink: &Memory) -> String {
        let mut out = Vec::new();
        Html::new("Doc", "Run").render(&sink.snapshot(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn renders_titles_and_metadata() {
        let sink = Memory::new();
        sink.set_run_metadata("Platform", "Linux").unwrap();

        let html = render(&sink);

        assert!(html.contains("<title>Doc</title>"));
        assert!(html.contains("<h1>Run</h1>"));
        assert!(html.contains("<td>Platform</td><td>Linux</td>"));
    }

    #[test]
    fn escapes_node_titles_and_messages() {
        let sink = Memory::new();
        let node = sink.create_root_node("Feature: <A & B>").unwrap();
        sink.log_on_node(node, ReportStatus::Fail, "x < y".into()).unwrap();

        let html = render(&sink);

        assert!(html.contains("Feature: &lt;A &amp; B&gt;"));
        assert!(html.contains("x &lt; y"));
        assert!(!html.contains("<A & B>"));
    }

    #[test]
    fn renders_details_collapsed_and_nested_nodes() {
        let sink = Memory::new();
        let feature = sink.create_root_node("Feature: A").unwrap();
        sink.set_node_category(feature, "Feature").unwrap();
        let scenario = sink.create_child_node(feature, "Scenario: B").unwrap();
        sink.log_on_node(
            scenario,
            ReportStatus::Fail,
            Message::Details {
                summary: "Stack Trace".into(),
                body: "at <init>".into(),
            },
        )
        .unwrap();

        let html = render(&sink);

        assert!(html.contains(
            "<details><summary>Stack Trace</summary><pre>at &lt;init&gt;</pre>",
        ));
        assert!(html.contains("<span class=\"category\">Feature</span>"));
        let feature_at = html.find("Feature: A").unwrap();
        let scenario_at = html.find("Scenario: B").unwrap();
        assert!(feature_at < scenario_at);
        assert!(html
            .contains("<span class=\"status fail\">fail</span> Feature: A"));
    }
}
