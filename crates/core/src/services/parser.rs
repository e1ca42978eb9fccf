//! Record parser for code cache diagnostic output.
//!
//! Two reports are understood. The segment layout report emits a header per segment
//! followed by a bounds line:
//!
//! ```text
//! CodeHeap 'non-profiled nmethods': size=120028Kb used=373Kb max_used=373Kb free=119654Kb
//!  bounds [0x00007f764cac9000, 0x00007f764cd39000, 0x00007f7654000000]
//! ```
//!
//! With segmentation disabled the header reads `CodeCache: size=...` instead. The
//! compiled-method list emits one line per method:
//!
//! ```text
//! 11 4 0 java.lang.Enum.ordinal()I [0x00007f91e0ac9610, 0x00007f91e0ac97a0 - 0x00007f91e0ac9870]
//! ```
//!
//! The count-including mode adds an invocation count, printed right after the
//! qualified name; a count trailing the address list is accepted as well.

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{CompiledEntry, SegmentCategory, SegmentDeclaration, TOP_TIER};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: segment header '{label}' is not followed by a bounds line")]
    MissingBounds { line: usize, label: String },
    #[error("line {line}: malformed bounds: {text}")]
    MalformedBounds { line: usize, text: String },
    #[error("line {line}: compiled entry is missing its {field}: {text}")]
    MissingField { line: usize, field: &'static str, text: String },
    #[error("line {line}: invalid hex address '{value}'")]
    InvalidAddress { line: usize, value: String },
    #[error("line {line}: invalid {field} '{value}'")]
    InvalidNumber { line: usize, field: &'static str, value: String },
}

/// Which two of the three bounds values become the segment start and end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundsColumns {
    /// Second and third values; the first is a low-water mark.
    #[default]
    CommittedToReserved,
    /// First and third values. HotSpot prints `[low_boundary, high, high_boundary]`,
    /// so pick this against a live `jcmd` when methods can sit below the committed
    /// mark; the default would report them as unclassified.
    LowToReserved,
}

impl BoundsColumns {
    fn select(self, values: [u64; 3]) -> (u64, u64) {
        match self {
            BoundsColumns::CommittedToReserved => (values[1], values[2]),
            BoundsColumns::LowToReserved => (values[0], values[2]),
        }
    }
}

/// Which compiled entries are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryFilter {
    /// Only entries compiled at the top tier; what placement checks consume.
    #[default]
    TopTier,
    /// Every entry, for tier/state/count checks.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOptions {
    pub top_tier: u8,
    pub bounds: BoundsColumns,
    pub entries: EntryFilter,
    /// Expect a trailing invocation count on every compiled entry.
    pub invocation_counts: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            top_tier: TOP_TIER,
            bounds: BoundsColumns::default(),
            entries: EntryFilter::default(),
            invocation_counts: false,
        }
    }
}

impl ParserOptions {
    pub fn unfiltered(mut self) -> Self {
        self.entries = EntryFilter::All;
        self
    }

    pub fn with_invocation_counts(mut self, enabled: bool) -> Self {
        self.invocation_counts = enabled;
        self
    }
}

/// Non-fatal condition noticed while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    UnrecognizedSegmentLabel { line: usize, label: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnrecognizedSegmentLabel { line, label } => {
                write!(f, "line {line}: unexpected segment '{label}'")
            }
        }
    }
}

/// Typed records read from one blob of report text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedReport {
    pub segments: Vec<SegmentDeclaration>,
    pub entries: Vec<CompiledEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Shape of a single input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    SegmentHeader { label: &'a str },
    CompiledEntry,
    Ignorable,
}

/// Decide what a line is without extracting its fields.
pub fn classify_line(line: &str) -> LineKind<'_> {
    let line = line.trim();
    if line.starts_with("CodeHeap '") || line.contains("Cache: size=") {
        return LineKind::SegmentHeader { label: header_label(line) };
    }
    if looks_like_entry(line) {
        return LineKind::CompiledEntry;
    }
    LineKind::Ignorable
}

fn header_label(line: &str) -> &str {
    let mut quoted = line.split('\'');
    match (quoted.next(), quoted.next()) {
        (Some(_), Some(label)) => label,
        _ => line.find(": ").map(|idx| &line[..idx]).unwrap_or(line),
    }
}

fn looks_like_entry(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    let leading_numbers =
        (0..3).all(|_| tokens.next().is_some_and(|t| t.bytes().all(|b| b.is_ascii_digit())));
    leading_numbers && line.contains('[')
}

/// Parse a hexadecimal address, with or without its `0x` prefix.
pub fn parse_hex(value: &str) -> Option<u64> {
    let value = value.trim();
    let digits = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")).unwrap_or(value);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Read the three addresses of a `bounds [a, b, c]` line.
pub fn parse_bounds(line: &str, line_no: usize) -> Result<[u64; 3], ParseError> {
    let malformed = || ParseError::MalformedBounds { line: line_no, text: line.trim().to_string() };
    let open = line.find('[').ok_or_else(malformed)?;
    let inner = &line[open + 1..];
    let close = inner.find(']').ok_or_else(malformed)?;
    let values: Vec<&str> = inner[..close].split(", ").collect();
    if values.len() != 3 {
        return Err(malformed());
    }
    let mut out = [0u64; 3];
    for (slot, value) in out.iter_mut().zip(&values) {
        *slot = parse_hex(value).ok_or_else(|| ParseError::InvalidAddress {
            line: line_no,
            value: value.trim().to_string(),
        })?;
    }
    Ok(out)
}

/// Extract the fields of a compiled-entry line.
pub fn parse_entry(
    line: &str,
    line_no: usize,
    invocation_counts: bool,
) -> Result<CompiledEntry, ParseError> {
    let text = line.trim();
    let missing =
        |field: &'static str| ParseError::MissingField { line: line_no, field, text: text.into() };
    let tokens: Vec<&str> = text.split_whitespace().collect();

    let tier = parse_small(tokens.get(1).copied().ok_or_else(|| missing("tier"))?, "tier", line_no)?;
    let state =
        parse_small(tokens.get(2).copied().ok_or_else(|| missing("state"))?, "state", line_no)?;
    let qualified = tokens.get(3).copied().ok_or_else(|| missing("qualified name"))?;
    let paren = qualified.find('(').ok_or_else(|| missing("signature"))?;
    let name = &qualified[..paren];
    if name.is_empty() {
        return Err(missing("qualified name"));
    }

    // The qualified name is one token and may itself contain `[` for array
    // descriptors, so the address list is looked up after it.
    let name_end = text.find(qualified).map(|idx| idx + qualified.len()).unwrap_or(text.len());
    let rest = &text[name_end..];
    let open = rest.find('[').ok_or_else(|| missing("address"))?;
    let after = &rest[open + 1..];
    let comma = after.find(',').ok_or_else(|| missing("address"))?;
    let raw_address = after[..comma].trim();
    let address = parse_hex(raw_address).ok_or_else(|| ParseError::InvalidAddress {
        line: line_no,
        value: raw_address.to_string(),
    })?;

    let invocation_count = if invocation_counts {
        let leading = tokens.get(4).copied().filter(|t| t.bytes().all(|b| b.is_ascii_digit()));
        let raw = match leading {
            Some(raw) => raw,
            None => {
                let close = after.find(']').ok_or_else(|| missing("address list"))?;
                after[close + 1..]
                    .split_whitespace()
                    .last()
                    .ok_or_else(|| missing("invocation count"))?
            }
        };
        let count = raw.parse::<u64>().map_err(|_| ParseError::InvalidNumber {
            line: line_no,
            field: "invocation count",
            value: raw.to_string(),
        })?;
        Some(count)
    } else {
        None
    };

    Ok(CompiledEntry::new(address, tier, state, name).with_invocation_count(invocation_count))
}

fn parse_small(value: &str, field: &'static str, line_no: usize) -> Result<u8, ParseError> {
    value.parse::<u8>().map_err(|_| ParseError::InvalidNumber {
        line: line_no,
        field,
        value: value.to_string(),
    })
}

/// Parse a whole report blob into segment declarations and compiled entries.
///
/// Unknown segment labels are recorded as diagnostics and parsing continues; any
/// line that has the shape of a known record but cannot be read aborts the parse.
pub fn parse_report(text: &str, options: &ParserOptions) -> Result<ParsedReport, ParseError> {
    let mut report = ParsedReport::default();
    let mut lines = text.lines().enumerate().map(|(idx, line)| (idx + 1, line));

    while let Some((line_no, line)) = lines.next() {
        match classify_line(line) {
            LineKind::SegmentHeader { label } => {
                let bounds_line = lines.next();
                let Some(category) = SegmentCategory::from_label(label) else {
                    warn!("UNEXPECTED SEGMENT: >{label}< (line {line_no})");
                    report.diagnostics.push(Diagnostic::UnrecognizedSegmentLabel {
                        line: line_no,
                        label: label.to_string(),
                    });
                    continue;
                };
                let (bounds_no, bounds) = bounds_line.ok_or_else(|| ParseError::MissingBounds {
                    line: line_no,
                    label: label.to_string(),
                })?;
                debug!("bounds for '{label}': {}", bounds.trim());
                let (start, end) = options.bounds.select(parse_bounds(bounds, bounds_no)?);
                report.segments.push(SegmentDeclaration::new(category, start, end));
            }
            LineKind::CompiledEntry => {
                let entry = parse_entry(line, line_no, options.invocation_counts)?;
                if options.entries == EntryFilter::All || entry.tier == options.top_tier {
                    report.entries.push(entry);
                }
            }
            LineKind::Ignorable => {}
        }
    }

    Ok(report)
}

/// Number of lines in a directives listing that start a directive block.
pub fn count_directives(text: &str) -> usize {
    text.lines().filter(|line| line.starts_with("Directive:")).count()
}
