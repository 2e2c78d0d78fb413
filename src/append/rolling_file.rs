//! The size-based rolling file appender.
//!
//! Logging to a single file is a dangerous proposition for long running
//! processes, so this appender rotates the file through a numbered window of
//! backups once it grows past a size limit: `app.log` becomes `app.log.1`,
//! the previous `app.log.1` becomes `app.log.2`, and so on up to the
//! configured backup count.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::append::file::{FileAppender, FileAppenderBuilder};
use crate::append::{Append, ErrorHandler};
use crate::config::properties::Properties;
use crate::event::LoggingEvent;
use crate::layout::Layout;
use crate::loglog::loglog;

const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
const MINIMUM_MAX_FILE_SIZE: u64 = 200 * 1024;

/// Renames `<path>` to `<path>.<index>`.
fn numbered(path: &Path, index: u32) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

fn report_rename(src: &Path, dst: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => loglog().debug(format!(
            "renamed file {} to {}",
            src.display(),
            dst.display()
        )),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => loglog().error(format!(
            "failed to rename file from {} to {}: {}",
            src.display(),
            dst.display(),
            err
        )),
    }
}

pub(crate) fn rename_over(src: &Path, dst: &Path) {
    // Windows refuses to rename over an existing file.
    #[cfg(windows)]
    let _ = fs::remove_file(dst);

    report_rename(src, dst, fs::rename(src, dst));
}

/// Shifts the numbered backups of `path` up by one, dropping the oldest.
///
/// `<path>.<max>` is removed, then `<path>.<i>` is renamed to
/// `<path>.<i+1>` for `i` from `max - 1` down to 1.
pub(crate) fn rollover_files(path: &Path, max_backup_index: u32) {
    let _ = fs::remove_file(numbered(path, max_backup_index));

    for index in (1..max_backup_index).rev() {
        rename_over(&numbered(path, index), &numbered(path, index + 1));
    }
}

/// An appender which rotates its log file through a fixed window of numbered
/// backups once it exceeds a maximum size.
#[derive(Debug)]
pub struct RollingFileAppender {
    file: FileAppender,
    max_file_size: u64,
    max_backup_index: u32,
}

impl RollingFileAppender {
    /// Creates a new `RollingFileAppenderBuilder`.
    pub fn builder() -> RollingFileAppenderBuilder {
        RollingFileAppenderBuilder {
            file: FileAppender::builder(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_backup_index: 1,
        }
    }

    /// Builds a rolling sink from its property subset; in addition to the
    /// plain file keys it reads `MaxFileSize` (with optional `KB`/`MB`
    /// suffix) and `MaxBackupIndex`.
    pub fn from_properties(properties: &Properties) -> anyhow::Result<RollingFileAppender> {
        let mut builder = RollingFileAppender::builder();

        if let Some(raw) = properties.get("MaxFileSize") {
            if let Some(size) = parse_file_size(raw) {
                builder = builder.max_file_size(size);
            } else {
                loglog().error(format!("invalid MaxFileSize value `{}`", raw));
            }
        }
        if let Some(index) = properties.get_parsed("MaxBackupIndex") {
            builder = builder.max_backup_index(index);
        }

        let file = FileAppender::from_properties(properties)?;
        Ok(assemble(file, builder.max_file_size, builder.max_backup_index))
    }

    fn rollover(&mut self) {
        self.file.close_stream();

        rollover_files(self.file.path(), self.max_backup_index);
        let backup = numbered(self.file.path(), 1);
        loglog().debug(format!(
            "renaming file {} to {}",
            self.file.path().display(),
            backup.display()
        ));
        rename_over(self.file.path(), &backup);

        if let Err(err) = self.file.open(true) {
            loglog().error(format!(
                "failed to open file {}: {}",
                self.file.path().display(),
                err
            ));
        }
    }
}

impl Append for RollingFileAppender {
    fn append(
        &mut self,
        event: &LoggingEvent,
        layout: &dyn Layout,
        errors: &mut dyn ErrorHandler,
    ) -> anyhow::Result<()> {
        // A pre-existing oversize file rolls before the event is written.
        if self.file.len() > self.max_file_size {
            self.rollover();
        }

        self.file.write_event(event, layout, errors)?;

        if self.file.len() > self.max_file_size {
            self.rollover();
        }
        Ok(())
    }

    fn close(&mut self) {
        self.file.close_stream();
    }
}

/// Parses a byte count with an optional `KB` or `MB` suffix.
fn parse_file_size(raw: &str) -> Option<u64> {
    let raw = raw.trim().to_uppercase();
    if let Some(digits) = raw.strip_suffix("MB") {
        digits.trim().parse::<u64>().ok().map(|n| n * 1024 * 1024)
    } else if let Some(digits) = raw.strip_suffix("KB") {
        digits.trim().parse::<u64>().ok().map(|n| n * 1024)
    } else {
        raw.parse().ok()
    }
}

/// A builder for `RollingFileAppender`s.
pub struct RollingFileAppenderBuilder {
    file: FileAppenderBuilder,
    max_file_size: u64,
    max_backup_index: u32,
}

impl RollingFileAppenderBuilder {
    /// Maximum size in bytes before the file rolls.
    ///
    /// Values below 200 KiB are clamped up with a warning. Defaults to
    /// 10 MiB.
    pub fn max_file_size(mut self, max_file_size: u64) -> RollingFileAppenderBuilder {
        self.max_file_size = max_file_size;
        self
    }

    /// Number of numbered backups to retain, at least 1.
    ///
    /// Defaults to 1.
    pub fn max_backup_index(mut self, max_backup_index: u32) -> RollingFileAppenderBuilder {
        self.max_backup_index = max_backup_index;
        self
    }

    /// Flushes the stream after each event.
    pub fn immediate_flush(mut self, immediate_flush: bool) -> RollingFileAppenderBuilder {
        self.file = self.file.immediate_flush(immediate_flush);
        self
    }

    /// Creates missing parent directories before opening.
    pub fn create_dirs(mut self, create_dirs: bool) -> RollingFileAppenderBuilder {
        self.file = self.file.create_dirs(create_dirs);
        self
    }

    /// Consumes the builder, opening the file in append mode.
    pub fn build<P: AsRef<Path>>(self, path: P) -> io::Result<RollingFileAppender> {
        let RollingFileAppenderBuilder {
            file,
            max_file_size,
            max_backup_index,
        } = self;
        Ok(assemble(file.build(path)?, max_file_size, max_backup_index))
    }
}

fn assemble(file: FileAppender, max_file_size: u64, max_backup_index: u32) -> RollingFileAppender {
    let max_file_size = if max_file_size < MINIMUM_MAX_FILE_SIZE {
        loglog().warn(format!(
            "MaxFileSize value is too small, resetting to {}",
            MINIMUM_MAX_FILE_SIZE
        ));
        MINIMUM_MAX_FILE_SIZE
    } else {
        max_file_size
    };

    RollingFileAppender {
        file,
        max_file_size,
        max_backup_index: max_backup_index.max(1),
    }
}
