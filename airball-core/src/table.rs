//! Danger Table
//!
//! Maps a [`DangerKey`] to a danger level and a pilot message. The table is
//! CSV: a header naming the classifier columns followed by a danger column
//! and a message column, then one row per key.
//!
//! ```text
//! # slip, height, speed, alpha, bank
//! slip_skid,hat,ias,aoa,roll,danger,message
//! L,H,H,L,L,0,
//! H,L,L,H,H,10,"Stall/spin, low altitude"
//! ```
//!
//! ## Sparse tables
//!
//! A table does not need a row for every key the classifier can produce.
//! For a missing key containing `M`, the first `M` is replaced by `H` and
//! by `L` and the two neighbours are looked up (recursively, so they may be
//! interpolated themselves). The result is the average of their danger
//! levels with the `H` neighbour's message. If only one neighbour resolves,
//! it is used unchanged.
//!
//! Every reachable key is resolved once at load time, so a table that cannot
//! cover the classifier's output is rejected before the first update rather
//! than in flight.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::classify::{Category, DangerKey, Level};
use crate::constants::{DANGER_MAX, DANGER_MIN};
use crate::errors::{EngineError, EngineResult};

/// Danger level and message for one key
#[derive(Debug, Clone, PartialEq)]
pub struct DangerEntry {
    /// Danger level in [0, 10]
    pub danger: f64,
    /// Pilot message, possibly empty
    pub message: String,
}

impl DangerEntry {
    /// Create an entry
    pub fn new(danger: f64, message: impl Into<String>) -> Self {
        Self {
            danger,
            message: message.into(),
        }
    }
}

/// Immutable key → (danger, message) table
#[derive(Debug, Clone)]
pub struct DangerTable {
    columns: Vec<Category>,
    entries: BTreeMap<DangerKey, DangerEntry>,
}

/// How a key was resolved
enum Resolution {
    Exact(DangerEntry),
    Interpolated(DangerEntry),
    /// Only one neighbour existed somewhere in the chain
    Partial(DangerEntry),
}

impl Resolution {
    fn into_entry(self) -> DangerEntry {
        match self {
            Resolution::Exact(e) | Resolution::Interpolated(e) | Resolution::Partial(e) => e,
        }
    }

    fn is_partial(&self) -> bool {
        matches!(self, Resolution::Partial(_))
    }
}

impl DangerTable {
    /// Parse CSV text and validate coverage
    pub fn parse(text: &str) -> EngineResult<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

        let (header_line, header) = lines
            .next()
            .ok_or_else(|| EngineError::table(1, "missing header"))?;
        let columns = parse_header(header_line, header)?;

        let mut entries = BTreeMap::new();
        for (line_no, line) in lines {
            let (key, entry) = parse_row(line_no, line, columns.len())?;
            if entries.insert(key.clone(), entry).is_some() {
                log_warn!("Danger table line {}: duplicate key {}, keeping the last row", line_no, key);
            }
        }

        Self::from_entries(columns, entries)
    }

    /// Build from already-parsed rows and validate coverage
    pub fn from_entries(
        columns: Vec<Category>,
        entries: BTreeMap<DangerKey, DangerEntry>,
    ) -> EngineResult<Self> {
        for (key, entry) in &entries {
            if key.len() != columns.len() {
                return Err(EngineError::InvalidConfig {
                    field: "table_path",
                    reason: format!("key {} does not have {} codes", key, columns.len()),
                });
            }
            if !(DANGER_MIN..=DANGER_MAX).contains(&entry.danger) {
                return Err(EngineError::InvalidConfig {
                    field: "table_path",
                    reason: format!("danger {} for key {} outside [0, 10]", entry.danger, key),
                });
            }
        }

        let table = Self { columns, entries };
        table.validate_coverage()?;
        log_debug!(
            "Danger table loaded: {} rows over columns {:?}",
            table.entries.len(),
            table.columns
        );
        Ok(table)
    }

    /// Read and parse a table from any reader
    #[cfg(feature = "std")]
    pub fn from_reader<R: std::io::Read>(mut reader: R) -> EngineResult<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::parse(&text)
    }

    /// Load a table file
    #[cfg(feature = "std")]
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            EngineError::Io(format!("{}: {}", path.display(), e))
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Columns in key order
    pub fn columns(&self) -> &[Category] {
        &self.columns
    }

    /// Number of literal rows
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Literal row for a key, without interpolation
    pub fn get(&self, key: &DangerKey) -> Option<&DangerEntry> {
        self.entries.get(key)
    }

    /// Literal rows in key order
    pub fn iter(&self) -> impl Iterator<Item = (&DangerKey, &DangerEntry)> {
        self.entries.iter()
    }

    /// Resolve a key, interpolating when it is absent
    pub fn lookup(&self, key: &DangerKey) -> EngineResult<DangerEntry> {
        if key.len() != self.columns.len() {
            return Err(EngineError::LookupInconsistency { key: key.to_string() });
        }
        self.resolve(key)
            .map(Resolution::into_entry)
            .ok_or_else(|| EngineError::LookupInconsistency { key: key.to_string() })
    }

    fn resolve(&self, key: &DangerKey) -> Option<Resolution> {
        if let Some(entry) = self.entries.get(key) {
            return Some(Resolution::Exact(entry.clone()));
        }

        let idx = key.first_medium()?;
        let high = self.resolve(&key.with_level(idx, Level::High));
        let low = self.resolve(&key.with_level(idx, Level::Low));

        match (high, low) {
            (Some(h), Some(l)) => {
                let partial = h.is_partial() || l.is_partial();
                let (h, l) = (h.into_entry(), l.into_entry());
                let entry = DangerEntry {
                    danger: (h.danger + l.danger) / 2.0,
                    message: h.message,
                };
                Some(if partial {
                    Resolution::Partial(entry)
                } else {
                    Resolution::Interpolated(entry)
                })
            }
            (Some(one), None) | (None, Some(one)) => Some(Resolution::Partial(one.into_entry())),
            (None, None) => None,
        }
    }

    /// Resolve every key the classifier can produce for these columns
    fn validate_coverage(&self) -> EngineResult<()> {
        let alphabets: Vec<&[Level]> = self.columns.iter().map(|c| c.possible_levels()).collect();
        let mut counters: Vec<usize> = alphabets.iter().map(|_| 0).collect();

        loop {
            let mut key = DangerKey::new();
            for (alphabet, &i) in alphabets.iter().zip(&counters) {
                key.push(alphabet[i])?;
            }

            match self.resolve(&key) {
                None => {
                    log_error!("Danger table cannot resolve key {}", key);
                    return Err(EngineError::LookupInconsistency { key: key.to_string() });
                }
                Some(r) if r.is_partial() => {
                    log_warn!("Danger table resolves key {} from a single neighbour", key);
                }
                Some(_) => {}
            }

            // Odometer increment, rightmost column fastest
            let mut pos = counters.len();
            loop {
                if pos == 0 {
                    return Ok(());
                }
                pos -= 1;
                counters[pos] += 1;
                if counters[pos] < alphabets[pos].len() {
                    break;
                }
                counters[pos] = 0;
            }
        }
    }
}

fn parse_header(line_no: usize, header: &str) -> EngineResult<Vec<Category>> {
    let fields: Vec<&str> = header.split(',').map(str::trim).collect();
    if fields.len() < 3 {
        return Err(EngineError::table(
            line_no,
            "header needs at least one channel column plus danger and message",
        ));
    }

    let mut columns = Vec::with_capacity(fields.len() - 2);
    for name in &fields[..fields.len() - 2] {
        let category = Category::from_header(name)
            .ok_or_else(|| EngineError::table(line_no, format!("unknown channel column '{}'", name)))?;
        if columns.contains(&category) {
            return Err(EngineError::table(
                line_no,
                format!("channel column '{}' appears twice", name),
            ));
        }
        columns.push(category);
    }
    Ok(columns)
}

fn parse_row(line_no: usize, line: &str, n_columns: usize) -> EngineResult<(DangerKey, DangerEntry)> {
    let fields: Vec<&str> = line.splitn(n_columns + 2, ',').collect();
    if fields.len() < n_columns + 1 {
        return Err(EngineError::table(
            line_no,
            format!("expected {} codes and a danger level", n_columns),
        ));
    }

    let mut key = DangerKey::new();
    for field in &fields[..n_columns] {
        let level = field
            .trim()
            .chars()
            .next()
            .and_then(Level::from_code)
            .ok_or_else(|| EngineError::table(line_no, format!("bad code '{}'", field.trim())))?;
        key.push(level)?;
    }

    let danger_text = fields[n_columns].trim();
    let danger: f64 = danger_text
        .parse()
        .map_err(|_| EngineError::table(line_no, format!("danger '{}' is not a number", danger_text)))?;
    if !(DANGER_MIN..=DANGER_MAX).contains(&danger) {
        return Err(EngineError::table(line_no, format!("danger {} outside [0, 10]", danger)));
    }

    let message = fields.get(n_columns + 1).map(|m| unquote(m.trim())).unwrap_or("");

    Ok((key, DangerEntry::new(danger, message)))
}

fn unquote(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
