//! Staged relations and the tab-separated parser that produces them.
//!
//! Pipeline:
//!   raw bytes
//!     └─ decode()     → String (UTF-8, or UTF-16 when a BOM says so)
//!          └─ parse_tsv() → StagedRelation + ParseReport
//!
//! A staged relation is a raw, natural-keyed snapshot of one resource. Every
//! value is kept as optional text; typing happens in the builders that read
//! it.

use serde::Serialize;

use crate::{Error, Result, resource::ResourceSpec};

// ─── StagedRelation ──────────────────────────────────────────────────────────

/// A named, immutable-for-the-run collection of rows with a fixed lower-cased
/// column schema.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRelation {
  name:    String,
  columns: Vec<String>,
  rows:    Vec<Vec<Option<String>>>,
}

impl StagedRelation {
  /// Build a relation. Column names are lower-cased; rows whose width does not
  /// match the schema are discarded.
  pub fn new(
    name: impl Into<String>,
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
  ) -> Self {
    let columns: Vec<String> =
      columns.into_iter().map(|c| c.to_lowercase()).collect();
    let width = columns.len();
    let rows = rows.into_iter().filter(|r| r.len() == width).collect();
    Self { name: name.into(), columns, rows }
  }

  pub fn name(&self) -> &str { &self.name }

  pub fn columns(&self) -> &[String] { &self.columns }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// Position of `column` in the schema, if present.
  pub fn column_index(&self, column: &str) -> Option<usize> {
    self.columns.iter().position(|c| c == column)
  }

  /// Like [`Self::column_index`] but a missing column is an error.
  pub fn require_column(&self, column: &str) -> Result<usize> {
    self.column_index(column).ok_or_else(|| Error::MissingColumn {
      relation: self.name.clone(),
      column:   column.to_owned(),
    })
  }

  /// Raw rows, in schema order.
  pub fn raw_rows(&self) -> &[Vec<Option<String>>] { &self.rows }

  pub fn rows(&self) -> impl Iterator<Item = StagedRow<'_>> + '_ {
    self.rows.iter().map(|values| StagedRow { values })
  }
}

/// A borrowed view over one staged row.
#[derive(Debug, Clone, Copy)]
pub struct StagedRow<'a> {
  values: &'a [Option<String>],
}

impl<'a> StagedRow<'a> {
  /// Text value at `idx`; `None` when the column is absent from the schema or
  /// the value is null.
  pub fn text(&self, idx: Option<usize>) -> Option<&'a str> {
    idx
      .and_then(|i| self.values.get(i))
      .and_then(|v| v.as_deref())
  }

  /// Like [`Self::text`] but trimmed and `None` when blank.
  pub fn non_blank(&self, idx: Option<usize>) -> Option<&'a str> {
    self.text(idx).map(str::trim).filter(|s| !s.is_empty())
  }

  pub fn integer(&self, idx: Option<usize>) -> Option<i64> {
    self.text(idx).and_then(parse_integer)
  }

  pub fn decimal(&self, idx: Option<usize>) -> Option<f64> {
    self.text(idx).and_then(parse_decimal)
  }
}

// ─── Scalar parsing ──────────────────────────────────────────────────────────

/// Parse an integer key. Integral decimals such as `"680.0"` are accepted.
pub fn parse_integer(s: &str) -> Option<i64> {
  let s = s.trim();
  if let Ok(n) = s.parse::<i64>() {
    return Some(n);
  }
  let f = s.parse::<f64>().ok()?;
  if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
    Some(f as i64)
  } else {
    None
  }
}

pub fn parse_decimal(s: &str) -> Option<f64> {
  s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

// ─── Decoding ────────────────────────────────────────────────────────────────

/// Decode a raw payload into text.
///
/// Payloads starting with a UTF-16 byte-order mark (either endianness) are
/// decoded as UTF-16; everything else must be UTF-8 (a UTF-8 BOM is stripped).
pub fn decode(resource: &str, bytes: &[u8]) -> Result<String> {
  let decode_err = |reason: String| Error::Decode {
    resource: resource.to_owned(),
    reason,
  };

  let utf16 = match bytes {
    [0xFF, 0xFE, rest @ ..] => Some((rest, false)),
    [0xFE, 0xFF, rest @ ..] => Some((rest, true)),
    _ => None,
  };

  if let Some((rest, big_endian)) = utf16 {
    if rest.len() % 2 != 0 {
      return Err(decode_err("odd byte count for UTF-16".into()));
    }
    let units: Vec<u16> = rest
      .chunks_exact(2)
      .map(|pair| {
        let pair = [pair[0], pair[1]];
        if big_endian { u16::from_be_bytes(pair) } else { u16::from_le_bytes(pair) }
      })
      .collect();
    return String::from_utf16(&units).map_err(|e| decode_err(e.to_string()));
  }

  let rest = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
  String::from_utf8(rest.to_vec()).map_err(|e| decode_err(e.to_string()))
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Record counts from one [`parse_tsv`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
  pub accepted: usize,
  /// Records wider than the resource schema, or that could not be read.
  pub dropped:  usize,
}

/// Parse a header-less tab-separated payload using the resource's column list.
///
/// Fields may be double-quoted, in which case they can contain tabs and
/// newlines. Short records are padded with nulls; over-long or unreadable
/// records are dropped and counted rather than failing the parse. Empty
/// lines are skipped.
pub fn parse_tsv(
  spec: &ResourceSpec,
  input: &str,
) -> (StagedRelation, ParseReport) {
  let width = spec.columns.len();
  let mut report = ParseReport::default();
  let mut rows = Vec::new();

  let mut reader = csv::ReaderBuilder::new()
    .delimiter(b'\t')
    .has_headers(false)
    .flexible(true)
    .from_reader(input.as_bytes());

  for record in reader.records() {
    match record {
      Ok(record) if record.len() <= width => {
        let mut fields: Vec<Option<String>> = record
          .iter()
          .map(|f| (!f.is_empty()).then(|| f.to_owned()))
          .collect();
        fields.resize(width, None);
        rows.push(fields);
        report.accepted += 1;
      }
      Ok(record) => {
        tracing::debug!(
          resource = spec.name,
          expected = width,
          found = record.len(),
          line = record.position().map(|p| p.line()),
          "dropping over-long record"
        );
        report.dropped += 1;
      }
      Err(err) => {
        tracing::debug!(resource = spec.name, error = %err, "dropping unreadable record");
        report.dropped += 1;
      }
    }
  }

  let relation = StagedRelation::new(spec.name, spec.staged_columns(), rows);
  (relation, report)
}
