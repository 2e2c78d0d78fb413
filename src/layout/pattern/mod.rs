//! A pattern-based layout.
//!
//! The pattern syntax follows the printf-style conversion tradition: `%`
//! starts a conversion, `%%` is a literal `%`, and each conversion may carry
//! a format modifier of the form `-` (left align), a minimum width, and a
//! `.`-separated maximum width.
//!
//! # Conversions
//!
//! * `%b` - basename of the event's source file
//! * `%c` - logger name; `%c{n}` keeps only the last `n` dotted segments
//! * `%d` - timestamp rendered via a `strftime`-style format (UTC). An
//!   explicit format may be given as `%d{%H:%M:%S}`; the default is
//!   `%Y-%m-%d %H:%M:%S`. The extensions `%q` (3-digit milliseconds) and
//!   `%Q` (`.millis.micros` fraction) are supported inside the format.
//! * `%D` - as `%d` but in local time
//! * `%E` - value of the environment variable named in `%E{VAR}`
//! * `%F` - source file path
//! * `%i` - process id
//! * `%l` - `file:line`
//! * `%L` - source line number
//! * `%m` - the message
//! * `%M` - function name
//! * `%n` - a newline
//! * `%p` - the severity name
//!
//! # Width and precision
//!
//! Output longer than the maximum width keeps its *suffix*; output shorter
//! than the minimum width is padded with spaces, on the right when
//! left-aligned and on the left otherwise. `%-5.5p` renders `WARN` as
//! `WARN ` and `%20.20c` pads a 16-character logger name with four leading
//! spaces.

use std::io;
use std::path::Path;

use crate::config::properties::Properties;
use crate::context;
use crate::event::LoggingEvent;
use crate::layout::Layout;
use crate::loglog::loglog;

mod parser;

/// Width and alignment attached to a single converter.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct FormattingInfo {
    min_width: usize,
    max_width: usize,
    left_align: bool,
}

impl Default for FormattingInfo {
    fn default() -> FormattingInfo {
        FormattingInfo {
            min_width: 0,
            max_width: usize::MAX,
            left_align: false,
        }
    }
}

/// One compiled element of a pattern.
#[derive(Clone, Debug)]
pub(crate) struct Converter {
    kind: ConverterKind,
    info: FormattingInfo,
}

#[derive(Clone, Debug)]
pub(crate) enum ConverterKind {
    Literal(String),
    Basename,
    File,
    Line,
    FullLocation,
    Function,
    Level,
    Message,
    Newline,
    ProcessId,
    LoggerName { precision: usize },
    Date { format: String, use_gmtime: bool },
    Env { var: String },
}

impl Converter {
    fn literal(text: String) -> Converter {
        Converter {
            kind: ConverterKind::Literal(text),
            info: FormattingInfo::default(),
        }
    }

    fn format_and_append(&self, w: &mut dyn io::Write, event: &LoggingEvent) -> io::Result<()> {
        context::with_scratch_buf(|buf| {
            self.kind.convert(buf, event);
            write_adjusted(w, buf, self.info)
        })
    }
}

impl ConverterKind {
    fn convert(&self, out: &mut String, event: &LoggingEvent) {
        use std::fmt::Write;

        match self {
            ConverterKind::Literal(text) => out.push_str(text),
            ConverterKind::Basename => {
                let name = Path::new(event.file())
                    .file_name()
                    .map(|name| name.to_string_lossy())
                    .unwrap_or_default();
                out.push_str(&name);
            }
            ConverterKind::File => out.push_str(event.file()),
            ConverterKind::Line => {
                if let Some(line) = event.line() {
                    let _ = write!(out, "{}", line);
                }
            }
            ConverterKind::FullLocation => {
                out.push_str(event.file());
                out.push(':');
                if let Some(line) = event.line() {
                    let _ = write!(out, "{}", line);
                }
            }
            ConverterKind::Function => out.push_str(event.function()),
            ConverterKind::Level => out.push_str(event.level().as_str()),
            ConverterKind::Message => out.push_str(event.message()),
            ConverterKind::Newline => out.push('\n'),
            ConverterKind::ProcessId => {
                let _ = write!(out, "{}", std::process::id());
            }
            ConverterKind::LoggerName { precision } => {
                out.push_str(trailing_segments(event.logger_name(), *precision));
            }
            ConverterKind::Date { format, use_gmtime } => {
                out.push_str(&event.timestamp().format(format, *use_gmtime));
            }
            ConverterKind::Env { var } => {
                out.push_str(&std::env::var(var).unwrap_or_default());
            }
        }
    }
}

/// Keeps only the last `precision` dot-separated segments of a logger name;
/// zero means the full name.
fn trailing_segments(name: &str, precision: usize) -> &str {
    if precision == 0 {
        return name;
    }
    match name.rmatch_indices('.').nth(precision - 1) {
        Some((idx, _)) => &name[idx + 1..],
        None => name,
    }
}

fn write_adjusted(w: &mut dyn io::Write, s: &str, info: FormattingInfo) -> io::Result<()> {
    let len = s.chars().count();
    if len > info.max_width {
        // Too long: keep the suffix.
        let skip = len - info.max_width;
        let start = s
            .char_indices()
            .nth(skip)
            .map(|(idx, _)| idx)
            .unwrap_or(s.len());
        w.write_all(s[start..].as_bytes())
    } else if len < info.min_width {
        let padding = info.min_width - len;
        if info.left_align {
            w.write_all(s.as_bytes())?;
            write_spaces(w, padding)
        } else {
            write_spaces(w, padding)?;
            w.write_all(s.as_bytes())
        }
    } else {
        w.write_all(s.as_bytes())
    }
}

fn write_spaces(w: &mut dyn io::Write, count: usize) -> io::Result<()> {
    const SPACES: &str = "                ";
    let mut remaining = count;
    while remaining > 0 {
        let n = remaining.min(SPACES.len());
        w.write_all(SPACES[..n].as_bytes())?;
        remaining -= n;
    }
    Ok(())
}

/// A layout driven by a compiled format specification.
#[derive(Clone, Debug)]
pub struct PatternLayout {
    pattern: String,
    converters: Vec<Converter>,
}

impl PatternLayout {
    /// Compiles `pattern` into a converter sequence.
    ///
    /// Malformed conversions are reported through the diagnostic logger and
    /// degrade to literal text; an empty result falls back to rendering the
    /// bare message.
    pub fn new(pattern: impl Into<String>) -> PatternLayout {
        let pattern = pattern.into();
        let mut converters = parser::Parser::new(&pattern).parse();
        if converters.is_empty() {
            loglog().warn("pattern layout compiled to nothing, using the bare message");
            converters.push(Converter {
                kind: ConverterKind::Message,
                info: FormattingInfo::default(),
            });
        }
        PatternLayout {
            pattern,
            converters,
        }
    }

    /// Builds a layout from the `ConversionPattern` property, honoring the
    /// deprecated `Pattern` spelling as a fallback.
    pub fn from_properties(properties: &Properties) -> anyhow::Result<PatternLayout> {
        if properties.exists("Pattern") {
            loglog().warn("the Pattern property is deprecated, use ConversionPattern instead");
        }

        match properties
            .get("ConversionPattern")
            .or_else(|| properties.get("Pattern"))
        {
            Some(pattern) => Ok(PatternLayout::new(pattern)),
            None => anyhow::bail!("ConversionPattern not specified in properties"),
        }
    }

    /// The source pattern this layout was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Layout for PatternLayout {
    fn format_and_append(&self, w: &mut dyn io::Write, event: &LoggingEvent) -> io::Result<()> {
        for converter in &self.converters {
            converter.format_and_append(w, event)?;
        }
        Ok(())
    }
}
