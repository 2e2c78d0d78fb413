//! The time-scheduled rolling file appender.
//!
//! At each period boundary the active file is renamed to a dated backup
//! (`app.log` becomes e.g. `app.log.2025-01-01-10` under an hourly
//! schedule) and reopened empty. Backups already present for the period are
//! shifted through a numbered window first, so repeated rollovers within one
//! period never overwrite older data.

use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, Months, Timelike};
use thiserror::Error;

use crate::append::file::{FileAppender, FileAppenderBuilder};
use crate::append::rolling_file::{rename_over, rollover_files};
use crate::append::{Append, ErrorHandler};
use crate::config::properties::Properties;
use crate::event::LoggingEvent;
use crate::layout::Layout;
use crate::loglog::loglog;
use crate::time::Timestamp;

const DEFAULT_MAX_BACKUP_INDEX: u32 = 10;

/// How often the daily appender rolls its file.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RolloverSchedule {
    /// Roll on the first of each calendar month.
    Monthly,
    /// Roll every seven days, anchored at the start of the week.
    Weekly,
    /// Roll at each midnight.
    Daily,
    /// Roll at midnight and noon.
    TwiceDaily,
    /// Roll at the top of each hour.
    Hourly,
    /// Roll at the top of each minute.
    Minutely,
}

/// The error returned when parsing a [`RolloverSchedule`] fails.
#[derive(Debug, Error, PartialEq)]
#[error("unrecognized rollover schedule `{0}`")]
pub struct ParseScheduleError(String);

impl FromStr for RolloverSchedule {
    type Err = ParseScheduleError;

    fn from_str(s: &str) -> Result<RolloverSchedule, ParseScheduleError> {
        match s {
            "MONTHLY" => Ok(RolloverSchedule::Monthly),
            "WEEKLY" => Ok(RolloverSchedule::Weekly),
            "DAILY" => Ok(RolloverSchedule::Daily),
            "TWICE_DAILY" => Ok(RolloverSchedule::TwiceDaily),
            "HOURLY" => Ok(RolloverSchedule::Hourly),
            "MINUTELY" => Ok(RolloverSchedule::Minutely),
            _ => Err(ParseScheduleError(s.to_owned())),
        }
    }
}

impl RolloverSchedule {
    /// The `strftime` format naming one period's backup file.
    fn period_format(self) -> &'static str {
        match self {
            RolloverSchedule::Monthly => "%Y-%m",
            RolloverSchedule::Weekly => "%Y-%W",
            RolloverSchedule::Daily => "%Y-%m-%d",
            RolloverSchedule::TwiceDaily => "%Y-%m-%d-%p",
            RolloverSchedule::Hourly => "%Y-%m-%d-%H",
            RolloverSchedule::Minutely => "%Y-%m-%d-%H-%M",
        }
    }

    /// Truncates a local time down to the start of its period.
    fn truncate(self, t: DateTime<Local>) -> DateTime<Local> {
        let zeroed = t.with_nanosecond(0).and_then(|t| t.with_second(0));
        let truncated = zeroed.and_then(|t| match self {
            RolloverSchedule::Monthly => t.with_minute(0)?.with_hour(0)?.with_day(1),
            RolloverSchedule::Weekly => {
                let days_back = t.weekday().num_days_from_sunday() as i64;
                (t.with_minute(0)?.with_hour(0)? - chrono::Duration::days(days_back)).into()
            }
            RolloverSchedule::Daily => t.with_minute(0)?.with_hour(0),
            RolloverSchedule::TwiceDaily => {
                let hour = if t.hour() >= 12 { 12 } else { 0 };
                t.with_minute(0)?.with_hour(hour)
            }
            RolloverSchedule::Hourly => t.with_minute(0),
            RolloverSchedule::Minutely => Some(t),
        });
        truncated.unwrap_or(t)
    }

    /// Advances a period start to the next boundary.
    fn advance(self, period_start: DateTime<Local>) -> DateTime<Local> {
        match self {
            RolloverSchedule::Monthly => period_start
                .checked_add_months(Months::new(1))
                .unwrap_or_else(|| period_start + chrono::Duration::days(31)),
            RolloverSchedule::Weekly => period_start + chrono::Duration::days(7),
            RolloverSchedule::Daily => period_start + chrono::Duration::hours(24),
            RolloverSchedule::TwiceDaily => period_start + chrono::Duration::hours(12),
            RolloverSchedule::Hourly => period_start + chrono::Duration::hours(1),
            RolloverSchedule::Minutely => period_start + chrono::Duration::minutes(1),
        }
    }
}

/// An appender which rolls its file on a calendar schedule, keeping one
/// dated backup per period plus a numbered window within the period.
#[derive(Debug)]
pub struct DailyRollingFileAppender {
    file: FileAppender,
    schedule: RolloverSchedule,
    max_backup_index: u32,
    scheduled_filename: PathBuf,
    next_rollover: Timestamp,
}

impl DailyRollingFileAppender {
    /// Creates a new `DailyRollingFileAppenderBuilder`.
    pub fn builder() -> DailyRollingFileAppenderBuilder {
        DailyRollingFileAppenderBuilder {
            file: FileAppender::builder(),
            schedule: RolloverSchedule::Daily,
            max_backup_index: DEFAULT_MAX_BACKUP_INDEX,
        }
    }

    /// Builds a daily sink from its property subset; in addition to the
    /// plain file keys it reads `Schedule` and `MaxBackupIndex`.
    pub fn from_properties(properties: &Properties) -> anyhow::Result<DailyRollingFileAppender> {
        let mut builder = DailyRollingFileAppender::builder();

        if let Some(raw) = properties.get("Schedule") {
            match raw.to_uppercase().parse() {
                Ok(schedule) => builder = builder.schedule(schedule),
                Err(err) => loglog().warn(format!("{}; falling back to DAILY", err)),
            }
        }
        if let Some(index) = properties.get_parsed("MaxBackupIndex") {
            builder = builder.max_backup_index(index);
        }

        let file = FileAppender::from_properties(properties)?;
        Ok(assemble(
            file,
            builder.schedule,
            builder.max_backup_index,
            Timestamp::now(),
        ))
    }

    fn scheduled_filename_for(&self, period_start: DateTime<Local>) -> PathBuf {
        scheduled_filename(&self.file, self.schedule, period_start)
    }

    /// Rotates the current file into its period backup.
    ///
    /// `now` is the instant that triggered the rollover — the offending
    /// event's timestamp on the append path — so the next period is computed
    /// on the caller's timeline rather than the wall clock.
    fn rollover(&mut self, now: Timestamp) {
        self.file.close_stream();

        // Shift any backups this period already produced, then slot the
        // current period file in as `.1`.
        rollover_files(&self.scheduled_filename, self.max_backup_index);
        let mut backup = self.scheduled_filename.as_os_str().to_owned();
        backup.push(".1");
        rename_over(&self.scheduled_filename, &PathBuf::from(backup));

        loglog().debug(format!(
            "renaming file {} to {}",
            self.file.path().display(),
            self.scheduled_filename.display()
        ));
        rename_over(self.file.path(), &self.scheduled_filename);

        if let Err(err) = self.file.open(true) {
            loglog().error(format!(
                "failed to open file {}: {}",
                self.file.path().display(),
                err
            ));
        }

        if now >= self.next_rollover {
            let period_start = self.schedule.truncate(now.to_local());
            self.scheduled_filename = self.scheduled_filename_for(period_start);
            self.next_rollover = self.schedule.advance(period_start).into();
        }
    }
}

fn scheduled_filename(
    file: &FileAppender,
    schedule: RolloverSchedule,
    period_start: DateTime<Local>,
) -> PathBuf {
    let mut name = file.path().as_os_str().to_owned();
    name.push(format!(
        ".{}",
        period_start.format(schedule.period_format())
    ));
    PathBuf::from(name)
}

impl Append for DailyRollingFileAppender {
    fn append(
        &mut self,
        event: &LoggingEvent,
        layout: &dyn Layout,
        errors: &mut dyn ErrorHandler,
    ) -> anyhow::Result<()> {
        if event.timestamp() >= self.next_rollover {
            self.rollover(event.timestamp());
        }

        self.file.write_event(event, layout, errors)
    }

    fn close(&mut self) {
        // The current period's data still belongs in a dated backup.
        self.rollover(Timestamp::now());
        self.file.close_stream();
    }
}

/// A builder for `DailyRollingFileAppender`s.
pub struct DailyRollingFileAppenderBuilder {
    file: FileAppenderBuilder,
    schedule: RolloverSchedule,
    max_backup_index: u32,
}

impl DailyRollingFileAppenderBuilder {
    /// Sets the rollover schedule.
    ///
    /// Defaults to [`RolloverSchedule::Daily`].
    pub fn schedule(mut self, schedule: RolloverSchedule) -> DailyRollingFileAppenderBuilder {
        self.schedule = schedule;
        self
    }

    /// Number of numbered backups to retain per period.
    ///
    /// Defaults to 10.
    pub fn max_backup_index(mut self, max_backup_index: u32) -> DailyRollingFileAppenderBuilder {
        self.max_backup_index = max_backup_index;
        self
    }

    /// Flushes the stream after each event.
    pub fn immediate_flush(mut self, immediate_flush: bool) -> DailyRollingFileAppenderBuilder {
        self.file = self.file.immediate_flush(immediate_flush);
        self
    }

    /// Creates missing parent directories before opening.
    pub fn create_dirs(mut self, create_dirs: bool) -> DailyRollingFileAppenderBuilder {
        self.file = self.file.create_dirs(create_dirs);
        self
    }

    /// Consumes the builder, opening the file in append mode.
    pub fn build<P: AsRef<std::path::Path>>(
        self,
        path: P,
    ) -> io::Result<DailyRollingFileAppender> {
        let DailyRollingFileAppenderBuilder {
            file,
            schedule,
            max_backup_index,
        } = self;
        Ok(assemble(
            file.build(path)?,
            schedule,
            max_backup_index,
            Timestamp::now(),
        ))
    }
}

fn assemble(
    file: FileAppender,
    schedule: RolloverSchedule,
    max_backup_index: u32,
    now: Timestamp,
) -> DailyRollingFileAppender {
    let period_start = schedule.truncate(now.to_local());
    let scheduled = scheduled_filename(&file, schedule, period_start);
    DailyRollingFileAppender {
        file,
        schedule,
        max_backup_index: max_backup_index.max(1),
        scheduled_filename: scheduled,
        next_rollover: schedule.advance(period_start).into(),
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use chrono::TimeZone;

    use super::*;
    use crate::append::OnlyOnceErrorHandler;
    use crate::layout::PatternLayout;
    use crate::level::LogLevel;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn schedule_parsing() {
        assert_eq!(
            "MONTHLY".parse::<RolloverSchedule>(),
            Ok(RolloverSchedule::Monthly)
        );
        assert_eq!(
            "TWICE_DAILY".parse::<RolloverSchedule>(),
            Ok(RolloverSchedule::TwiceDaily)
        );
        assert!("daily".parse::<RolloverSchedule>().is_err());
        assert!("NEVER".parse::<RolloverSchedule>().is_err());
    }

    #[test]
    fn truncation() {
        let t = local(2025, 6, 15, 14, 42, 37);
        assert_eq!(
            RolloverSchedule::Monthly.truncate(t),
            local(2025, 6, 1, 0, 0, 0)
        );
        assert_eq!(
            RolloverSchedule::Daily.truncate(t),
            local(2025, 6, 15, 0, 0, 0)
        );
        assert_eq!(
            RolloverSchedule::TwiceDaily.truncate(t),
            local(2025, 6, 15, 12, 0, 0)
        );
        assert_eq!(
            RolloverSchedule::TwiceDaily.truncate(local(2025, 6, 15, 9, 3, 0)),
            local(2025, 6, 15, 0, 0, 0)
        );
        assert_eq!(
            RolloverSchedule::Hourly.truncate(t),
            local(2025, 6, 15, 14, 0, 0)
        );
        assert_eq!(
            RolloverSchedule::Minutely.truncate(t),
            local(2025, 6, 15, 14, 42, 0)
        );
        // 2025-06-15 is a Sunday, the week anchor.
        assert_eq!(
            RolloverSchedule::Weekly.truncate(t),
            local(2025, 6, 15, 0, 0, 0)
        );
        assert_eq!(
            RolloverSchedule::Weekly.truncate(local(2025, 6, 18, 8, 0, 0)),
            local(2025, 6, 15, 0, 0, 0)
        );
    }

    #[test]
    fn advancement() {
        let start = local(2025, 6, 1, 0, 0, 0);
        assert_eq!(
            RolloverSchedule::Monthly.advance(start),
            local(2025, 7, 1, 0, 0, 0)
        );
        assert_eq!(
            RolloverSchedule::Weekly.advance(start),
            local(2025, 6, 8, 0, 0, 0)
        );
        assert_eq!(
            RolloverSchedule::Daily.advance(start),
            local(2025, 6, 2, 0, 0, 0)
        );
        assert_eq!(
            RolloverSchedule::TwiceDaily.advance(start),
            local(2025, 6, 1, 12, 0, 0)
        );
        assert_eq!(
            RolloverSchedule::Hourly.advance(start),
            local(2025, 6, 1, 1, 0, 0)
        );
        assert_eq!(
            RolloverSchedule::Minutely.advance(start),
            local(2025, 6, 1, 0, 1, 0)
        );

        // December wraps the year.
        assert_eq!(
            RolloverSchedule::Monthly.advance(local(2025, 12, 1, 0, 0, 0)),
            local(2026, 1, 1, 0, 0, 0)
        );
    }

    #[test]
    fn hourly_rollover_files_the_previous_period() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("app.log");

        let t0: Timestamp = local(2025, 1, 1, 10, 59, 59).into();
        let t1: Timestamp = local(2025, 1, 1, 11, 0, 0).into();

        let file = FileAppender::builder().build(&path).unwrap();
        let mut appender = assemble(file, RolloverSchedule::Hourly, 10, t0);

        let expected_backup = tempdir.path().join("app.log.2025-01-01-10");
        assert_eq!(appender.scheduled_filename, expected_backup);
        assert_eq!(appender.next_rollover, local(2025, 1, 1, 11, 0, 0).into());

        let layout = PatternLayout::new("%m%n");
        let mut errors = OnlyOnceErrorHandler::new();

        let before = LoggingEvent::new("d", LogLevel::INFO, "at 10:59:59").with_timestamp(t0);
        appender.append(&before, &layout, &mut errors).unwrap();

        let after = LoggingEvent::new("d", LogLevel::INFO, "at 11:00:00").with_timestamp(t1);
        appender.append(&after, &layout, &mut errors).unwrap();

        assert_eq!(
            fs::read_to_string(&expected_backup).unwrap(),
            "at 10:59:59\n"
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "at 11:00:00\n");
        // The recompute follows the triggering event's timeline, not the
        // wall clock.
        assert_eq!(
            appender.scheduled_filename,
            tempdir.path().join("app.log.2025-01-01-11")
        );
        assert_eq!(appender.next_rollover, local(2025, 1, 1, 12, 0, 0).into());

        // The next period boundary keeps rolling on the same timeline.
        let t2: Timestamp = local(2025, 1, 1, 12, 0, 0).into();
        let noon = LoggingEvent::new("d", LogLevel::INFO, "at 12:00:00").with_timestamp(t2);
        appender.append(&noon, &layout, &mut errors).unwrap();
        appender.file.close_stream();

        assert_eq!(
            fs::read_to_string(tempdir.path().join("app.log.2025-01-01-11")).unwrap(),
            "at 11:00:00\n"
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "at 12:00:00\n");
        assert_eq!(appender.next_rollover, local(2025, 1, 1, 13, 0, 0).into());
    }

    #[test]
    fn repeated_rollovers_number_period_backups() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("app.log");

        let t0: Timestamp = local(2025, 1, 1, 10, 15, 0).into();
        let file = FileAppender::builder().build(&path).unwrap();
        let mut appender = assemble(file, RolloverSchedule::Hourly, 10, t0);
        let scheduled = appender.scheduled_filename.clone();

        let layout = PatternLayout::new("%m%n");
        let mut errors = OnlyOnceErrorHandler::new();
        let event = LoggingEvent::new("d", LogLevel::INFO, "first").with_timestamp(t0);
        appender.append(&event, &layout, &mut errors).unwrap();

        // Two rollovers within one period: the older backup shifts into the
        // numbered window, and the scheduled filename stays put.
        appender.rollover(t0);
        let event = LoggingEvent::new("d", LogLevel::INFO, "second").with_timestamp(t0);
        appender.append(&event, &layout, &mut errors).unwrap();
        appender.rollover(t0);
        appender.file.close_stream();

        assert_eq!(appender.scheduled_filename, scheduled);
        assert_eq!(fs::read_to_string(&scheduled).unwrap(), "second\n");
        let mut numbered = scheduled.as_os_str().to_owned();
        numbered.push(".1");
        assert_eq!(
            fs::read_to_string(PathBuf::from(numbered)).unwrap(),
            "first\n"
        );
    }

    #[test]
    fn close_performs_a_final_rollover() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("app.log");

        let t0: Timestamp = local(2025, 3, 10, 8, 30, 0).into();
        let file = FileAppender::builder().build(&path).unwrap();
        let mut appender = assemble(file, RolloverSchedule::Daily, 10, t0);
        let scheduled = appender.scheduled_filename.clone();

        let layout = PatternLayout::new("%m%n");
        let mut errors = OnlyOnceErrorHandler::new();
        let event = LoggingEvent::new("d", LogLevel::INFO, "payload").with_timestamp(t0);
        appender.append(&event, &layout, &mut errors).unwrap();
        appender.close();

        assert_eq!(fs::read_to_string(&scheduled).unwrap(), "payload\n");
    }
}
