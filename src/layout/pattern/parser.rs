//! The format-specification compiler.
//!
//! A pattern is compiled once, at configuration time, into a sequence of
//! converters that are then applied per event without re-parsing. The
//! grammar: `%` starts a conversion, `%%` is a literal percent, and between
//! the `%` and the conversion letter an optional `-` (left align), minimum
//! width and `.maximum` width are accepted.

use crate::loglog::loglog;

use super::{Converter, ConverterKind, FormattingInfo};

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Literal,
    Conversion,
    MinWidth,
    Dot,
    MaxWidth,
}

pub(super) struct Parser {
    chars: Vec<char>,
    pos: usize,
    state: State,
    current_literal: String,
    info: FormattingInfo,
    converters: Vec<Converter>,
}

impl Parser {
    pub(super) fn new(pattern: &str) -> Parser {
        Parser {
            chars: pattern.chars().collect(),
            pos: 0,
            state: State::Literal,
            current_literal: String::new(),
            info: FormattingInfo::default(),
            converters: Vec::new(),
        }
    }

    pub(super) fn parse(mut self) -> Vec<Converter> {
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            self.pos += 1;
            match self.state {
                State::Literal => self.literal_char(c),
                State::Conversion => {
                    self.current_literal.push(c);
                    match c {
                        '-' => self.info.left_align = true,
                        '.' => self.state = State::Dot,
                        '0'..='9' => {
                            self.info.min_width = c as usize - '0' as usize;
                            self.state = State::MinWidth;
                        }
                        _ => self.finalize_converter(c),
                    }
                }
                State::MinWidth => {
                    self.current_literal.push(c);
                    match c {
                        '0'..='9' => {
                            self.info.min_width =
                                self.info.min_width * 10 + (c as usize - '0' as usize);
                        }
                        '.' => self.state = State::Dot,
                        _ => self.finalize_converter(c),
                    }
                }
                State::Dot => {
                    self.current_literal.push(c);
                    match c {
                        '0'..='9' => {
                            self.info.max_width = c as usize - '0' as usize;
                            self.state = State::MaxWidth;
                        }
                        _ => {
                            loglog().error(format!(
                                "error at position {} in conversion pattern: expected digit, got `{}`",
                                self.pos, c
                            ));
                            self.state = State::Literal;
                        }
                    }
                }
                State::MaxWidth => {
                    self.current_literal.push(c);
                    match c {
                        '0'..='9' => {
                            self.info.max_width =
                                self.info.max_width * 10 + (c as usize - '0' as usize);
                        }
                        _ => self.finalize_converter(c),
                    }
                }
            }
        }

        if !self.current_literal.is_empty() {
            let literal = std::mem::take(&mut self.current_literal);
            self.converters.push(Converter::literal(literal));
        }

        self.converters
    }

    fn literal_char(&mut self, c: char) {
        // A trailing character is always a literal, even `%`.
        if self.pos == self.chars.len() {
            self.current_literal.push(c);
            return;
        }

        if c == '%' {
            if self.chars[self.pos] == '%' {
                self.current_literal.push('%');
                self.pos += 1;
            } else {
                if !self.current_literal.is_empty() {
                    let literal = std::mem::take(&mut self.current_literal);
                    self.converters.push(Converter::literal(literal));
                }
                // The captured `%...` spelling is kept so a malformed
                // conversion can be emitted verbatim.
                self.current_literal.push('%');
                self.state = State::Conversion;
                self.info = FormattingInfo::default();
            }
        } else {
            self.current_literal.push(c);
        }
    }

    /// Consumes a `{...}` option following the conversion letter, if present.
    ///
    /// An unmatched `{` is an error; the remainder of the pattern is
    /// consumed.
    fn extract_option(&mut self) -> String {
        if self.chars.get(self.pos) != Some(&'{') {
            return String::new();
        }

        match self.chars[self.pos + 1..].iter().position(|&c| c == '}') {
            Some(offset) => {
                let option: String = self.chars[self.pos + 1..self.pos + 1 + offset]
                    .iter()
                    .collect();
                self.pos += offset + 2;
                option
            }
            None => {
                loglog().error("no matching `}` found in conversion pattern string");
                self.pos = self.chars.len();
                String::new()
            }
        }
    }

    fn extract_precision_option(&mut self) -> usize {
        let option = self.extract_option();
        let digits: String = option.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().unwrap_or(0)
    }

    fn finalize_converter(&mut self, c: char) {
        let kind = match c {
            'b' => ConverterKind::Basename,
            'c' => ConverterKind::LoggerName {
                precision: self.extract_precision_option(),
            },
            'd' | 'D' => {
                let option = self.extract_option();
                ConverterKind::Date {
                    format: if option.is_empty() {
                        DEFAULT_DATE_FORMAT.to_owned()
                    } else {
                        option
                    },
                    use_gmtime: c == 'd',
                }
            }
            'E' => ConverterKind::Env {
                var: self.extract_option(),
            },
            'F' => ConverterKind::File,
            'i' => ConverterKind::ProcessId,
            'l' => ConverterKind::FullLocation,
            'L' => ConverterKind::Line,
            'm' => ConverterKind::Message,
            'M' => ConverterKind::Function,
            'n' => ConverterKind::Newline,
            'p' => ConverterKind::Level,
            _ => {
                loglog().error(format!(
                    "unexpected char [{}] at position {} in conversion pattern",
                    c, self.pos
                ));
                ConverterKind::Literal(self.current_literal.clone())
            }
        };

        self.converters.push(Converter {
            kind,
            info: self.info,
        });
        self.current_literal.clear();
        self.state = State::Literal;
        self.info = FormattingInfo::default();
    }
}
