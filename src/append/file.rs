//! The file appender.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::append::{Append, ErrorHandler};
use crate::config::properties::Properties;
use crate::event::LoggingEvent;
use crate::layout::Layout;
use crate::loglog::loglog;
use crate::time::Timestamp;

const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// A writer that tracks how many bytes it has passed through.
///
/// The rolling appenders consult this count instead of probing the stream
/// position, which is unreliable for buffered writers.
#[derive(Debug)]
pub(crate) struct CountingWriter<W> {
    inner: W,
    len: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W, len: u64) -> CountingWriter<W> {
        CountingWriter { inner, len }
    }

    pub(crate) fn len(&self) -> u64 {
        self.len
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.len += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// An appender that writes to a single file.
///
/// When the stream fails, the appender reports through its error handler and
/// retries the open after a configurable delay instead of hammering the
/// filesystem on every event.
#[derive(Debug)]
pub struct FileAppender {
    path: PathBuf,
    immediate_flush: bool,
    create_dirs: bool,
    reopen_delay: u64,
    buffer_size: usize,
    reopen_at: Option<Timestamp>,
    writer: Option<CountingWriter<BufWriter<File>>>,
}

impl FileAppender {
    /// Creates a new `FileAppenderBuilder`.
    pub fn builder() -> FileAppenderBuilder {
        FileAppenderBuilder {
            append: true,
            immediate_flush: true,
            create_dirs: false,
            reopen_delay: 1,
            buffer_size: 0,
        }
    }

    /// Builds a file sink from its property subset: `File` (required),
    /// `Append`, `ImmediateFlush`, `CreateDirs`, `ReopenDelay` and
    /// `BufferSize`.
    pub fn from_properties(properties: &Properties) -> anyhow::Result<FileAppender> {
        let path = properties
            .get("File")
            .filter(|path| !path.is_empty())
            .ok_or_else(|| anyhow::anyhow!("file appender requires a non-empty File property"))?;

        let mut builder = FileAppender::builder();
        if let Some(append) = properties.get_bool("Append") {
            builder = builder.append(append);
        }
        if let Some(flush) = properties.get_bool("ImmediateFlush") {
            builder = builder.immediate_flush(flush);
        }
        if let Some(create_dirs) = properties.get_bool("CreateDirs") {
            builder = builder.create_dirs(create_dirs);
        }
        if let Some(delay) = properties.get_parsed("ReopenDelay") {
            builder = builder.reopen_delay(delay);
        }
        if let Some(size) = properties.get_parsed("BufferSize") {
            builder = builder.buffer_size(size);
        }
        Ok(builder.build(path)?)
    }

    /// The path this appender writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written to the currently open file, counting its prior size
    /// when opened in append mode.
    pub(crate) fn len(&self) -> u64 {
        self.writer.as_ref().map_or(0, CountingWriter::len)
    }

    pub(crate) fn open(&mut self, truncate: bool) -> io::Result<()> {
        if self.create_dirs {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .append(!truncate)
            .truncate(truncate)
            .create(true)
            .open(&self.path)?;
        let len = if truncate { 0 } else { file.metadata()?.len() };

        let capacity = if self.buffer_size == 0 {
            DEFAULT_BUFFER_CAPACITY
        } else {
            self.buffer_size
        };
        self.writer = Some(CountingWriter::new(
            BufWriter::with_capacity(capacity, file),
            len,
        ));
        loglog().debug(format!("just opened file: {}", self.path.display()));
        Ok(())
    }

    /// Attempts to bring an unhealthy stream back.
    ///
    /// The first unhealthy observation only arms the retry deadline; while
    /// the deadline has not passed the file is left untouched. Once it
    /// passes (or with no delay configured) the handle is dropped and the
    /// file reopened in append mode.
    pub(crate) fn reopen(&mut self, now: Timestamp) -> bool {
        if self.reopen_at.is_none() && self.reopen_delay != 0 {
            self.reopen_at = Some(now + Duration::from_secs(self.reopen_delay));
            return false;
        }

        if self.reopen_delay == 0 || self.reopen_at.map_or(true, |at| now >= at) {
            self.writer = None;
            self.reopen_at = None;
            return self.open(false).is_ok();
        }

        false
    }

    /// The shared write path, also used by the rolling variants.
    pub(crate) fn write_event(
        &mut self,
        event: &LoggingEvent,
        layout: &dyn Layout,
        errors: &mut dyn ErrorHandler,
    ) -> anyhow::Result<()> {
        if self.writer.is_none() {
            if !self.reopen(Timestamp::now()) {
                errors.error(&format!("file is not open: {}", self.path.display()));
                return Ok(());
            }
            // Ready to report the next failure again.
            errors.reset();
        }

        let immediate_flush = self.immediate_flush;
        let result = match &mut self.writer {
            Some(writer) => layout.format_and_append(writer, event).and_then(|()| {
                if immediate_flush {
                    writer.flush()
                } else {
                    Ok(())
                }
            }),
            None => return Ok(()),
        };

        if let Err(err) = result {
            // Drop the handle; the reopen machinery takes over.
            self.writer = None;
            return Err(err.into());
        }
        Ok(())
    }

    pub(crate) fn close_stream(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
        self.reopen_at = None;
    }
}

impl Append for FileAppender {
    fn append(
        &mut self,
        event: &LoggingEvent,
        layout: &dyn Layout,
        errors: &mut dyn ErrorHandler,
    ) -> anyhow::Result<()> {
        self.write_event(event, layout, errors)
    }

    fn close(&mut self) {
        self.close_stream();
    }
}

/// A builder for `FileAppender`s.
pub struct FileAppenderBuilder {
    append: bool,
    immediate_flush: bool,
    create_dirs: bool,
    reopen_delay: u64,
    buffer_size: usize,
}

impl FileAppenderBuilder {
    /// Determines if the appender will append to or truncate the log file on
    /// the initial open.
    ///
    /// Defaults to `true`.
    pub fn append(mut self, append: bool) -> FileAppenderBuilder {
        self.append = append;
        self
    }

    /// Flushes the stream after each event.
    ///
    /// Defaults to `true`.
    pub fn immediate_flush(mut self, immediate_flush: bool) -> FileAppenderBuilder {
        self.immediate_flush = immediate_flush;
        self
    }

    /// Creates missing parent directories before opening.
    ///
    /// Defaults to `false`.
    pub fn create_dirs(mut self, create_dirs: bool) -> FileAppenderBuilder {
        self.create_dirs = create_dirs;
        self
    }

    /// Seconds to wait before retrying a failed open; `0` retries
    /// immediately.
    ///
    /// Defaults to 1.
    pub fn reopen_delay(mut self, reopen_delay: u64) -> FileAppenderBuilder {
        self.reopen_delay = reopen_delay;
        self
    }

    /// Stream buffer size in bytes; `0` keeps the default.
    pub fn buffer_size(mut self, buffer_size: usize) -> FileAppenderBuilder {
        self.buffer_size = buffer_size;
        self
    }

    /// Consumes the builder, opening the file.
    pub fn build<P: AsRef<Path>>(self, path: P) -> io::Result<FileAppender> {
        let mut appender = FileAppender {
            path: path.as_ref().to_owned(),
            immediate_flush: self.immediate_flush,
            create_dirs: self.create_dirs,
            reopen_delay: self.reopen_delay,
            buffer_size: self.buffer_size,
            reopen_at: None,
            writer: None,
        };
        appender.open(!self.append)?;
        Ok(appender)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::append::OnlyOnceErrorHandler;
    use crate::layout::PatternLayout;
    use crate::level::LogLevel;

    fn write(appender: &mut FileAppender, message: &str) {
        let layout = PatternLayout::new("%m%n");
        let mut errors = OnlyOnceErrorHandler::new();
        let event = LoggingEvent::new("f", LogLevel::INFO, message);
        appender.write_event(&event, &layout, &mut errors).unwrap();
    }

    #[test]
    fn create_directories() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("foo").join("bar").join("baz.log");

        FileAppender::builder()
            .create_dirs(true)
            .build(&path)
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn missing_directories_without_create_dirs() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("foo").join("baz.log");
        assert!(FileAppender::builder().build(&path).is_err());
    }

    #[test]
    fn append_preserves_content() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("app.log");

        let mut appender = FileAppender::builder().build(&path).unwrap();
        write(&mut appender, "one");
        appender.close_stream();

        let mut appender = FileAppender::builder().build(&path).unwrap();
        write(&mut appender, "two");
        appender.close_stream();

        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn truncate_discards_content() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("app.log");
        fs::write(&path, "old content\n").unwrap();

        let mut appender = FileAppender::builder().append(false).build(&path).unwrap();
        write(&mut appender, "fresh");
        appender.close_stream();

        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
    }

    #[test]
    fn len_counts_existing_bytes_in_append_mode() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("app.log");
        fs::write(&path, "12345").unwrap();

        let mut appender = FileAppender::builder().build(&path).unwrap();
        assert_eq!(appender.len(), 5);
        write(&mut appender, "abc");
        assert_eq!(appender.len(), 9);
    }

    #[test]
    fn reopen_delay_state_machine() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("app.log");
        let mut appender = FileAppender::builder()
            .reopen_delay(2)
            .build(&path)
            .unwrap();

        // Simulate a failed stream.
        appender.writer = None;
        let t0 = Timestamp::from_secs(1_000);

        // First observation arms the deadline without touching the file.
        assert!(!appender.reopen(t0));
        assert_eq!(appender.reopen_at, Some(Timestamp::from_secs(1_002)));
        assert!(appender.writer.is_none());

        // Within the window nothing happens.
        assert!(!appender.reopen(Timestamp::from_secs(1_001)));
        assert!(appender.writer.is_none());

        // Past the deadline the file is reopened and the deadline cleared.
        assert!(appender.reopen(Timestamp::from_secs(1_002)));
        assert!(appender.writer.is_some());
        assert_eq!(appender.reopen_at, None);
    }

    #[test]
    fn zero_reopen_delay_retries_immediately() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("app.log");
        let mut appender = FileAppender::builder()
            .reopen_delay(0)
            .build(&path)
            .unwrap();

        appender.writer = None;
        assert!(appender.reopen(Timestamp::from_secs(5)));
        assert!(appender.writer.is_some());
    }

    #[test]
    fn failed_reopen_rearms_the_delay() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("gone").join("app.log");

        let mut appender = FileAppender {
            path,
            immediate_flush: true,
            create_dirs: false,
            reopen_delay: 2,
            buffer_size: 0,
            reopen_at: None,
            writer: None,
        };

        let t0 = Timestamp::from_secs(100);
        assert!(!appender.reopen(t0));
        // Deadline passed but the parent directory is still missing.
        assert!(!appender.reopen(Timestamp::from_secs(103)));
        assert_eq!(appender.reopen_at, None);
        // The next observation arms a fresh deadline.
        assert!(!appender.reopen(Timestamp::from_secs(104)));
        assert_eq!(appender.reopen_at, Some(Timestamp::from_secs(106)));
    }

    #[test]
    fn unhealthy_stream_reports_through_error_handler() {
        #[derive(Debug, Default)]
        struct Recording(Vec<String>, usize);

        impl ErrorHandler for Recording {
            fn error(&mut self, message: &str) {
                self.0.push(message.to_owned());
            }
            fn reset(&mut self) {
                self.1 += 1;
            }
        }

        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("app.log");
        let mut appender = FileAppender::builder()
            .reopen_delay(60)
            .build(&path)
            .unwrap();
        appender.writer = None;

        let layout = PatternLayout::new("%m%n");
        let mut errors = Recording::default();
        let event = LoggingEvent::new("f", LogLevel::INFO, "lost");

        // Arms the delay; the event is reported, not written.
        appender.write_event(&event, &layout, &mut errors).unwrap();
        assert_eq!(errors.0.len(), 1);
        assert_eq!(errors.1, 0);
    }
}
