use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::CalcError;

/// Slot 0 always holds the previous result under the name `ans`.
pub const ANS_SLOT: usize = 0;

/// The operand slot table: a value per slot, with named slots forming a
/// session-persistent prefix and anonymous literal slots appended while a
/// line is being tokenized and discarded before the next one.
pub struct VarStore {
    values: Vec<f64>,
    names: Vec<Option<String>>,
    named_len: usize,
    max_slots: usize,
}

impl VarStore {
    pub fn new(max_slots: usize) -> Self {
        Self {
            values: vec![0.0],
            names: vec![Some("ans".to_string())],
            named_len: 1,
            max_slots,
        }
    }

    /// Defines or updates a named session variable, returning its slot.
    pub fn define(&mut self, name: &str, value: f64) -> Result<usize, CalcError> {
        if let Some(slot) = self.lookup(name) {
            self.values[slot] = value;
            return Ok(slot);
        }
        self.clear_transients();
        if self.values.len() >= self.max_slots {
            return Err(CalcError::Overflow);
        }
        let slot = self.values.len();
        self.values.push(value);
        self.names.push(Some(name.to_string()));
        self.named_len = self.values.len();
        Ok(slot)
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.names[..self.named_len]
            .iter()
            .position(|n| n.as_deref() == Some(name))
    }

    /// Allocates a fresh anonymous slot for a numeric literal.
    pub fn alloc_literal(&mut self, value: f64) -> Result<usize, CalcError> {
        if self.values.len() >= self.max_slots {
            return Err(CalcError::Overflow);
        }
        let slot = self.values.len();
        self.values.push(value);
        self.names.push(None);
        Ok(slot)
    }

    pub fn get(&self, slot: usize) -> f64 {
        self.values.get(slot).copied().unwrap_or(0.0)
    }

    pub fn set_ans(&mut self, value: f64) {
        self.values[ANS_SLOT] = value;
    }

    /// Drops the anonymous slots of the previous line. Named variables keep
    /// their slots, so tokens resolved against them stay valid for the
    /// whole session.
    pub fn clear_transients(&mut self) {
        self.values.truncate(self.named_len);
        self.names.truncate(self.named_len);
    }

    /// Named variables and their current values, `ans` included.
    pub fn iter_named(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names[..self.named_len]
            .iter()
            .zip(&self.values)
            .filter_map(|(name, value)| name.as_deref().map(|n| (n, *value)))
    }

    /// Loads `name value` lines from a file. Lines that do not parse are
    /// reported by number and skipped; the rest of the file still loads.
    pub fn load_file(&mut self, path: &Path) -> io::Result<LoadReport> {
        let file = File::open(path)?;
        let mut report = LoadReport {
            loaded: 0,
            bad_lines: Vec::new(),
        };
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_var_line(&line) {
                Some((name, value)) if self.define(name, value).is_ok() => {
                    report.loaded += 1;
                }
                _ => report.bad_lines.push(index + 1),
            }
        }
        Ok(report)
    }

    /// Writes the named variables back in the same `name value` format,
    /// except `ans`.
    pub fn save_file(&self, path: &Path) -> io::Result<()> {
        let mut file = File::create(path)?;
        for (name, value) in self.iter_named() {
            if name == "ans" {
                continue;
            }
            writeln!(file, "{} {}", name, value)?;
        }
        Ok(())
    }
}

/// Outcome of a variable-file load: entries taken, and the 1-based numbers
/// of lines that failed to parse.
#[derive(Debug)]
pub struct LoadReport {
    pub loaded: usize,
    pub bad_lines: Vec<usize>,
}

fn parse_var_line(line: &str) -> Option<(&str, f64)> {
    let bytes = line.as_bytes();
    if !(bytes[0].is_ascii_alphabetic() || bytes[0] == b'_') {
        return None;
    }
    let end = bytes
        .iter()
        .position(|&c| !(c.is_ascii_alphanumeric() || c == b'_'))
        .unwrap_or(bytes.len());
    if !line[end..].starts_with([' ', '\t']) {
        return None;
    }
    let value: f64 = line[end..].trim().parse().ok()?;
    Some((&line[..end], value))
}
