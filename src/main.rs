// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `cucumber-report` binary: replays an event log into a report artifact.

use std::{
    fs,
    io::{self, BufRead},
    process::ExitCode,
    time::SystemTime,
};

use console::style;
use cucumber_report::{cli::Opts, replay, ReportSink as _};

fn main() -> ExitCode {
    let opts = Opts::parsed();

    tracing_subscriber::fmt()
        .with_max_level(opts.max_level())
        .with_writer(io::stderr)
        .init();

    match run(opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", style("error:").red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(opts: Opts) -> cucumber_report::Result<()> {
    let reader: Box<dyn BufRead> = match opts.log_path() {
        Some(path) => Box::new(io::BufReader::new(fs::File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };
    let config = opts.into_config()?;
    let aggregator = config.aggregator(SystemTime::now())?;

    let stats = replay::replay_reader(&aggregator, reader)?;

    let rule = style("=".repeat(42)).dim();
    println!("{rule}");
    println!(
        "Replayed {} events of {} workers",
        style(stats.events).bold(),
        style(stats.workers).bold(),
    );
    match aggregator.sink().artifact().filter(|p| p.exists()) {
        Some(path) => {
            println!("Report: {}", style(path.display()).green());
        }
        None => println!("{}", style("No report written").yellow()),
    }
    println!("{rule}");
    Ok(())
}
