//! Result messages.
//!
//! Separate from tracing diagnostics (stderr): these are the lines a user
//! or cron job asked for, e.g. "rule added" or the daily statistics line.
//! Console lines are stamped `YYYY-MM-DD HH:MM`; file lines are appended
//! verbatim with the configured newline.

use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use tracing::warn;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use fritzbox_config::{LogSink, Newline};

pub enum Reporter {
    Console,
    Silent,
    File {
        appender: RollingFileAppender,
        newline: &'static str,
    },
}

impl Reporter {
    /// Open the configured sink. A file that cannot be opened falls back
    /// to the console so messages are not lost.
    pub fn open(sink: &LogSink, newline: Newline) -> Self {
        match sink {
            LogSink::Console => Self::Console,
            LogSink::Silent => Self::Silent,
            LogSink::File(path) => match file_appender(path) {
                Ok(appender) => Self::File {
                    appender,
                    newline: newline.as_str(),
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot open log file, using console");
                    Self::Console
                }
            },
        }
    }

    /// A failed run. The console already gets the full report on
    /// stderr, so only a file sink records it.
    pub fn failure(&mut self, message: &str) {
        if matches!(self, Self::File { .. }) {
            self.message(&format!("Error: {message}"));
        }
    }

    pub fn message(&mut self, message: &str) {
        let result = match self {
            Self::Console => {
                let stamp = Local::now().format("%Y-%m-%d %H:%M");
                writeln!(io::stdout().lock(), "{stamp} {message}")
            }
            Self::Silent => Ok(()),
            Self::File { appender, newline } => appender
                .write_all(format!("{message}{newline}").as_bytes())
                .and_then(|()| appender.flush()),
        };
        if let Err(e) = result {
            warn!(error = %e, "failed to write result message");
        }
    }
}

fn file_appender(path: &Path) -> Result<RollingFileAppender, String> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("not a file path: {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn file_sink_appends_without_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.log");
        std::fs::write(&path, "earlier\n").unwrap();

        let mut reporter = Reporter::open(&LogSink::File(path.clone()), Newline::Crlf);
        reporter.message("2026-10-18;24:00;4445;4295;150;7");
        reporter.message("second");
        drop(reporter);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "earlier\n2026-10-18;24:00;4445;4295;150;7\r\nsecond\r\n"
        );
    }

    #[test]
    fn failure_lands_in_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fritz.log");

        let mut reporter = Reporter::open(&LogSink::File(path.clone()), Newline::Lf);
        reporter.failure("Could not reach the router");
        drop(reporter);

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Error: Could not reach the router\n"
        );
    }

    #[test]
    fn unopenable_file_falls_back_to_console() {
        let reporter = Reporter::open(&LogSink::File("/".into()), Newline::Lf);
        assert!(matches!(reporter, Reporter::Console));
    }
}
