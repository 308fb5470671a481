//! File logging for long arena runs.
//!
//! Installed by [`Arena::with_configuration`](crate::arena::Arena::with_configuration) when
//! logging is enabled. Every event of the run, down to `TRACE`, lands in
//! `arena_<local timestamp>_log.txt` in the working directory.

use std::fs::File;

use anyhow::Context;
use time::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing::{subscriber::set_global_default, Level};
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::{fmt::writer::BoxMakeWriter, FmtSubscriber};

const FILE_NAME_FORMAT: &str = "arena_[year]-[month]-[day]_[hour]:[minute]:[second]_log.txt";
const LINE_TIMESTAMP_FORMAT: &str = "[year]-[month]-[day] [hour]:[minute]:[second]";

/// Routes all `tracing` events of the process to a new timestamped log file.
///
/// # Errors
/// The file cannot be created, or another global subscriber is already installed (a process
/// gets one).
pub fn init_logger() -> anyhow::Result<()> {
    let path = log_file_name(local_now())?;
    let file = File::create(&path).with_context(|| format!("cannot create log file '{path}'"))?;

    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = OffsetTime::new(offset, format_description::parse(LINE_TIMESTAMP_FORMAT)?);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(BoxMakeWriter::new(file))
        .finish();

    set_global_default(subscriber)
        .context("a global tracing subscriber is already set, leave file logging disabled")
}

fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn log_file_name(at: OffsetDateTime) -> anyhow::Result<String> {
    let format = format_description::parse(FILE_NAME_FORMAT)?;
    Ok(at.format(&format)?)
}
