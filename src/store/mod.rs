//! Order-preserving `KEY=VALUE` configuration store
//!
//! [`ConfigStore`] reads a line-oriented file into key/value pairs, keeps
//! them in the order they were first seen, answers lookups through a hash
//! index and writes the pairs back as `key=value\n` lines.
//!
//! ```text
//! # comment line (full line discarded)
//! KEY1=value with internal spaces preserved
//! KEY2=
//!    KEY3=leading spaces before key are trimmed, trailing spaces before '=' are not
//! ```
//!
//! Comments and blank lines are dropped on parse and never written back.
//! Keys and values are raw bytes stored verbatim: nothing is quoted, escaped
//! or transcoded, so files in any ASCII-compatible encoding survive a
//! parse/save cycle unchanged.

pub mod line;


use crate::{
    error::{AppError, Result},
    logging::Logger,
};
use line::{classify, display_line, is_space, ParsedLine, COMMENT_MARKER, DELIMITER};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// One key/value entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPair {
    key: Vec<u8>,
    value: Vec<u8>,
}

impl ConfigPair {
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Key as text, invalid UTF-8 replaced with U+FFFD
    pub fn key_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.key)
    }

    /// Value as text, invalid UTF-8 replaced with U+FFFD
    pub fn value_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }
}

impl Serialize for ConfigPair {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ConfigPair", 2)?;
        state.serialize_field("key", &self.key_lossy())?;
        state.serialize_field("value", &self.value_lossy())?;
        state.end()
    }
}

/// What happens when a key shows up more than once while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateKeys {
    /// Keep the first occurrence and warn about the rest
    #[default]
    First,
    /// Later occurrences overwrite the value; the pair keeps its first position
    Last,
    /// Store every occurrence; lookups and `set` act on the first one
    All,
}

impl std::str::FromStr for DuplicateKeys {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "first" => Ok(DuplicateKeys::First),
            "last" => Ok(DuplicateKeys::Last),
            "all" => Ok(DuplicateKeys::All),
            _ => Err(AppError::config(format!(
                "Invalid duplicate key policy '{}': expected first, last or all",
                s
            ))),
        }
    }
}

impl fmt::Display for DuplicateKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DuplicateKeys::First => "first",
            DuplicateKeys::Last => "last",
            DuplicateKeys::All => "all",
        };
        f.write_str(name)
    }
}

/// Knobs for [`ConfigStore::parse`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Longest accepted line in bytes, terminator excluded. `None` means unbounded.
    pub max_line_len: Option<usize>,
    /// Strip whitespace between the key and `=`
    pub trim_keys: bool,
    pub duplicates: DuplicateKeys,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_line_len: Some(crate::defaults::DEFAULT_MAX_LINE_LEN),
            trim_keys: crate::defaults::DEFAULT_TRIM_KEYS,
            duplicates: DuplicateKeys::default(),
        }
    }
}

/// Line counts from one parse
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseReport {
    /// Physical lines read
    pub lines: usize,
    /// Well-formed `key=value` lines, duplicates included
    pub pairs: usize,
    pub comments: usize,
    pub blank: usize,
    /// Lines skipped with a warning
    pub malformed: usize,
    /// Pair lines whose key was already present
    pub duplicates: usize,
    /// Line number and text of each skipped line
    pub malformed_lines: Vec<(usize, String)>,
}

impl ParseReport {
    /// True when no line had to be skipped
    pub fn is_clean(&self) -> bool {
        self.malformed == 0
    }

    fn record_malformed(&mut self, line_number: usize, content: &str) {
        self.malformed += 1;
        self.malformed_lines.push((line_number, content.to_string()));
    }
}

/// Lifecycle of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreState {
    Unconfigured,
    Configured,
    Parsed,
    Modified,
}

/// Ordered key/value store backed by a `KEY=VALUE` file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    /// Pairs in insertion order
    pairs: Vec<ConfigPair>,
    /// Key to position of its first occurrence in `pairs`
    index: HashMap<Vec<u8>, usize>,
    options: ParseOptions,
    state: StoreState,
    logger: Logger,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Create an empty, unconfigured store
    pub fn new() -> Self {
        Self {
            path: None,
            pairs: Vec::new(),
            index: HashMap::new(),
            options: ParseOptions::default(),
            state: StoreState::Unconfigured,
            logger: Logger::new("store".to_string()),
        }
    }

    /// Create a store already configured with a backing path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        let mut store = Self::new();
        store.configure(path);
        store
    }

    /// Replace the parse options
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the diagnostics logger
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Record the backing file for later `parse`/`save` calls. No I/O.
    pub fn configure<P: Into<PathBuf>>(&mut self, path: P) {
        self.path = Some(path.into());
        if self.state == StoreState::Unconfigured {
            self.state = StoreState::Configured;
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    /// Number of stored pairs, duplicates included
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn contains_key<K: AsRef<[u8]>>(&self, key: K) -> bool {
        self.index.contains_key(key.as_ref())
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.pairs.iter().map(ConfigPair::key)
    }

    /// Pairs in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, ConfigPair> {
        self.pairs.iter()
    }

    /// Read the configured file and add its pairs to the store.
    ///
    /// Malformed lines are reported through the logger and skipped. Any
    /// returned error leaves the store's pairs untouched.
    pub fn parse(&mut self) -> Result<ParseReport> {
        let path = self.path.clone().ok_or(AppError::NotConfigured)?;
        let file = File::open(&path).map_err(|e| AppError::io(&path, e))?;

        self.read_from(BufReader::new(file))
    }

    /// Parse pairs from any buffered reader, as `parse` does for the file
    pub fn read_from<R: BufRead>(&mut self, reader: R) -> Result<ParseReport> {
        self.logger.start_operation("parse");
        let result = self.load(reader);
        self.logger.end_operation("parse", result.is_ok());

        let report = result?;
        self.state = StoreState::Parsed;

        self.logger.debug("Parsed configuration")
            .field("source", self.source_name())
            .field("pairs", report.pairs)
            .field("comments", report.comments)
            .field("blank", report.blank)
            .field("malformed", report.malformed)
            .field("duplicates", report.duplicates)
            .log();

        Ok(report)
    }

    fn load<R: BufRead>(&mut self, mut reader: R) -> Result<ParseReport> {
        let mut report = ParseReport::default();
        let mut parsed = Vec::new();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = read_line_bounded(&mut reader, &mut buf, self.options.max_line_len)
                .map_err(|e| AppError::io(self.source_name(), e))?;
            if read == 0 {
                break;
            }
            report.lines += 1;
            let line_number = report.lines;

            if let Some(limit) = self.options.max_line_len {
                if content_len(&buf) > limit {
                    return Err(AppError::LineTooLong { line_number, limit });
                }
            }

            match classify(&buf, self.options.trim_keys) {
                ParsedLine::Blank => report.blank += 1,
                ParsedLine::Comment => report.comments += 1,
                ParsedLine::Malformed => {
                    let content = display_line(&buf);
                    self.warn_malformed(line_number, &content);
                    report.record_malformed(line_number, &content);
                }
                ParsedLine::Pair { key, value } => {
                    report.pairs += 1;
                    let pair = ConfigPair {
                        key: owned_copy(key)?,
                        value: owned_copy(value)?,
                    };
                    parsed.push((line_number, pair));
                }
            }
        }

        self.pairs.try_reserve(parsed.len())?;
        self.index.try_reserve(parsed.len())?;
        for (line_number, pair) in parsed {
            if self.merge(line_number, pair) {
                report.duplicates += 1;
            }
        }

        Ok(report)
    }

    /// Add one parsed pair under the duplicate policy. Returns true for a duplicate.
    fn merge(&mut self, line_number: usize, pair: ConfigPair) -> bool {
        let Some(&position) = self.index.get(&pair.key) else {
            self.index.insert(pair.key.clone(), self.pairs.len());
            self.pairs.push(pair);
            return false;
        };

        match self.options.duplicates {
            DuplicateKeys::First => {
                self.logger.warn("Duplicate key ignored, keeping first occurrence")
                    .field("line", line_number)
                    .field("key", pair.key_lossy())
                    .log();
            }
            DuplicateKeys::Last => {
                self.logger.debug("Duplicate key overrides earlier value")
                    .field("line", line_number)
                    .field("key", pair.key_lossy())
                    .log();
                self.pairs[position].value = pair.value;
            }
            DuplicateKeys::All => self.pairs.push(pair),
        }
        true
    }

    fn warn_malformed(&self, line_number: usize, content: &str) {
        self.logger.warn("Malformed configuration line skipped")
            .field("source", self.source_name())
            .field("line", line_number)
            .field("content", content)
            .error_info(&AppError::malformed_line(line_number, content))
            .log();
    }

    fn source_name(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<reader>".to_string())
    }

    /// Raw value of the first pair with exactly this key
    pub fn get_bytes<K: AsRef<[u8]>>(&self, key: K) -> Result<&[u8]> {
        let key = key.as_ref();
        self.index
            .get(key)
            .map(|&position| self.pairs[position].value.as_slice())
            .ok_or_else(|| AppError::not_found(String::from_utf8_lossy(key)))
    }

    /// Value of the first pair with exactly this key, as UTF-8 text
    pub fn get<K: AsRef<[u8]>>(&self, key: K) -> Result<&str> {
        let key = key.as_ref();
        let value = self.get_bytes(key)?;
        std::str::from_utf8(value)
            .map_err(|_| AppError::NotUtf8(String::from_utf8_lossy(key).into_owned()))
    }

    /// Copy a value into `buf` followed by a NUL terminator.
    ///
    /// Returns the value length. Fails with `BufferTooSmall` when
    /// `value.len() >= buf.len()`; `buf` is left untouched on failure.
    pub fn read_value<K: AsRef<[u8]>>(&self, key: K, buf: &mut [u8]) -> Result<usize> {
        let value = self.get_bytes(key)?;
        if value.len() >= buf.len() {
            return Err(AppError::BufferTooSmall {
                needed: value.len(),
                capacity: buf.len(),
            });
        }

        buf[..value.len()].copy_from_slice(value);
        buf[value.len()] = 0;
        Ok(value.len())
    }

    /// Replace the value of an existing key or append a new pair.
    ///
    /// Keys that would not read back as the same key are rejected, as are
    /// values containing a newline.
    pub fn set<K: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, key: K, value: V) -> Result<()> {
        let (key, value) = (key.as_ref(), value.as_ref());
        validate_key(key)?;
        if value.contains(&b'\n') {
            return Err(AppError::InvalidValue(format!(
                "value for '{}' contains a newline",
                String::from_utf8_lossy(key)
            )));
        }

        let value = owned_copy(value)?;
        match self.index.get(key) {
            Some(&position) => self.pairs[position].value = value,
            None => {
                let pair = ConfigPair {
                    key: owned_copy(key)?,
                    value,
                };
                self.pairs.try_reserve(1)?;
                self.index.try_reserve(1)?;
                self.index.insert(pair.key.clone(), self.pairs.len());
                self.pairs.push(pair);
            }
        }

        self.state = StoreState::Modified;
        Ok(())
    }

    /// Truncate the configured file and write every pair as `key=value\n`.
    ///
    /// An empty store is an error and the file is not touched.
    pub fn save(&self) -> Result<()> {
        if self.pairs.is_empty() {
            return Err(AppError::EmptyStore);
        }
        let path = self.path.as_ref().ok_or(AppError::NotConfigured)?;

        let file = File::create(path).map_err(|e| AppError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| AppError::io(path, e))?;

        self.logger.debug("Saved configuration")
            .field("source", path.display().to_string())
            .field("pairs", self.pairs.len())
            .log();

        Ok(())
    }

    /// Write every pair in insertion order, bytes verbatim
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for pair in &self.pairs {
            writer.write_all(&pair.key)?;
            writer.write_all(&[DELIMITER])?;
            writer.write_all(&pair.value)?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }

    /// The exact bytes `save` would write
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut out);
        out
    }
}

/// Lossy text form of [`ConfigStore::render`]
impl fmt::Display for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pair in &self.pairs {
            writeln!(f, "{}={}", pair.key_lossy(), pair.value_lossy())?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ConfigStore {
    type Item = &'a ConfigPair;
    type IntoIter = std::slice::Iter<'a, ConfigPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

/// Reject keys that would be written as a line parsing back differently
fn validate_key(key: &[u8]) -> Result<()> {
    let reason = match key {
        [] => "key must not be empty",
        [first, ..] if is_space(*first) => "key must not start with whitespace",
        [COMMENT_MARKER, ..] => "key must not start with '#'",
        _ if key.contains(&DELIMITER) => "key must not contain '='",
        _ if key.contains(&b'\n') => "key must not contain a newline",
        _ => return Ok(()),
    };

    Err(AppError::InvalidKey(format!(
        "{} ({:?})",
        reason,
        String::from_utf8_lossy(key)
    )))
}

/// Copy a slice into a new buffer, reporting allocation failure instead of aborting
fn owned_copy(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut owned = Vec::new();
    owned.try_reserve_exact(bytes.len())?;
    owned.extend_from_slice(bytes);
    Ok(owned)
}

/// Read one line into `buf`, stopping early once it is known to exceed `limit`
fn read_line_bounded<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>, limit: Option<usize>) -> io::Result<usize> {
    match limit {
        None => reader.read_until(b'\n', buf),
        // Room for the content plus "\r\n"; anything longer trips the limit check.
        Some(limit) => reader
            .by_ref()
            .take(limit.saturating_add(2) as u64)
            .read_until(b'\n', buf),
    }
}

/// Line length without its `\n` or `\r\n` terminator
fn content_len(buf: &[u8]) -> usize {
    let mut len = buf.len();
    if len > 0 && buf[len - 1] == b'\n' {
        len -= 1;
        if len > 0 && buf[len - 1] == b'\r' {
            len -= 1;
        }
    }
    len
}
