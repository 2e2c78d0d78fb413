//! The line-oriented `key=value` property store backing file-driven
//! configuration.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::loglog::loglog;

const COMMENT_CHAR: char = '#';

/// An ordered map of string properties with prefix-subset and typed
/// accessors.
///
/// Parsing is line oriented: leading whitespace is ignored, `#` starts a
/// comment line, a trailing `\r` is stripped, and an `include <path>`
/// directive splices another file in at that point. The first `=` splits key
/// from value; later entries overwrite earlier ones.
#[derive(Clone, Default, Debug)]
pub struct Properties {
    map: BTreeMap<String, String>,
}

impl Properties {
    /// Creates an empty store.
    pub fn new() -> Properties {
        Properties::default()
    }

    /// Loads properties from a file, reporting an unreadable path through the
    /// diagnostic logger and returning an empty store.
    pub fn from_file(path: impl AsRef<Path>) -> Properties {
        let mut props = Properties::new();
        props.load_file(path.as_ref());
        props
    }

    /// Parses properties from any buffered reader.
    pub fn from_reader(reader: impl BufRead) -> Properties {
        let mut props = Properties::new();
        props.load(reader);
        props
    }

    /// Parses properties from in-memory text.
    pub fn from_str_input(input: &str) -> Properties {
        Properties::from_reader(input.as_bytes())
    }

    fn load_file(&mut self, path: &Path) {
        match File::open(path) {
            Ok(file) => self.load(BufReader::new(file)),
            Err(err) => loglog().error(format!("could not open file {}: {}", path.display(), err)),
        }
    }

    fn load(&mut self, reader: impl BufRead) {
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    loglog().error(format!("error reading properties: {}", err));
                    return;
                }
            };

            let line = line.trim_start();
            if line.is_empty() || line.starts_with(COMMENT_CHAR) {
                continue;
            }
            let line = line.strip_suffix('\r').unwrap_or(line);

            if let Some((key, value)) = line.split_once('=') {
                self.set(key.trim_end(), value.trim());
            } else if let Some(rest) = line.strip_prefix("include") {
                // `include` must be followed by whitespace and a path.
                if rest.starts_with(char::is_whitespace) && !rest.trim().is_empty() {
                    self.load_file(Path::new(rest.trim()));
                }
            }
        }
    }

    /// Whether the key is present.
    pub fn exists(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Returns the raw value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    /// Returns the value for a key or a default.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Inserts or overwrites an entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.map.insert(key.into(), value.into());
    }

    /// Removes an entry, returning whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.map.remove(key).is_some()
    }

    /// All keys, in sorted order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// Whether the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns a new store holding every entry whose key starts with
    /// `prefix`, with the prefix stripped from the keys.
    pub fn subset(&self, prefix: &str) -> Properties {
        let mut subset = Properties::new();
        for (key, value) in &self.map {
            if let Some(stripped) = key.strip_prefix(prefix) {
                subset.set(stripped, value.clone());
            }
        }
        subset
    }

    /// Parses the value under `key` as a `T`, requiring the whole value to be
    /// consumed.
    ///
    /// Missing keys and malformed values both yield `None`; the caller's
    /// default stands in either case.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|value| value.parse().ok())
    }

    /// Parses the value under `key` as a boolean: `true`/`false` in any case,
    /// or an integer where nonzero means true.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        let value = self.get(key)?;
        if value.eq_ignore_ascii_case("true") {
            Some(true)
        } else if value.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            value.parse::<i64>().ok().map(|n| n != 0)
        }
    }

    /// Loads properties from an arbitrary `io::Read`, buffering it first.
    pub fn from_unbuffered(reader: impl io::Read) -> Properties {
        Properties::from_reader(BufReader::new(reader))
    }
}
