//! Core data model for code cache layouts.
//!
//! This module contains:
//! - `AddressRange`: closed address interval used for segment bounds
//! - `SegmentCategory`: the category named by a report label, before alias resolution
//! - `Segment`: the canonical bucket a compiled method is classified into
//! - `SegmentDeclaration` / `CompiledEntry`: the two record kinds read from report text

use std::fmt;

use serde::{Deserialize, Serialize};

/// Compilation tier of the most aggressively optimizing compiler.
pub const TOP_TIER: u8 = 4;

/// Closed address interval `[start, end]`.
///
/// `[0, 0]` and any range whose start is above its end are empty and contain nothing.
/// Absent segments are represented by the default `[0, 0]`. A non-zero point range
/// `[a, a]` is not empty and contains `a`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressRange {
    pub start: u64,
    pub end: u64,
}

impl AddressRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Range that never matches any address.
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        (self.start == 0 && self.end == 0) || self.start > self.end
    }

    /// Both bounds are inclusive: an address sitting exactly on a segment edge belongs
    /// to that segment.
    #[must_use]
    pub fn contains(&self, address: u64) -> bool {
        !self.is_empty() && address >= self.start && address <= self.end
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:016x}, 0x{:016x}]", self.start, self.end)
    }
}

/// Category named by a segment header label.
///
/// The two undifferentiated variants are what a runtime reports with segmentation
/// disabled; they resolve to `NonProfiled` and `Hot` respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentCategory {
    Hot,
    NonProfiled,
    Profiled,
    NonMethod,
    UndifferentiatedCache,
    UndifferentiatedHot,
}

/// Report labels and the category each one names.
const LABEL_ALIASES: &[(&str, SegmentCategory)] = &[
    ("extra-hot", SegmentCategory::Hot),
    ("non-profiled nmethods", SegmentCategory::NonProfiled),
    ("profiled nmethods", SegmentCategory::Profiled),
    ("non-nmethods", SegmentCategory::NonMethod),
    ("CodeCache", SegmentCategory::UndifferentiatedCache),
    ("ExtraHotCache", SegmentCategory::UndifferentiatedHot),
];

impl SegmentCategory {
    /// Look up the category for a header label. Matching is exact after trimming.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        LABEL_ALIASES.iter().find(|(known, _)| *known == label).map(|(_, category)| *category)
    }

    /// Canonical bucket this category feeds.
    pub fn resolve(self) -> Segment {
        match self {
            SegmentCategory::Hot | SegmentCategory::UndifferentiatedHot => Segment::Hot,
            SegmentCategory::NonProfiled | SegmentCategory::UndifferentiatedCache => {
                Segment::NonProfiled
            }
            SegmentCategory::Profiled => Segment::Profiled,
            SegmentCategory::NonMethod => Segment::NonMethod,
        }
    }
}

/// Canonical code cache bucket.
///
/// Variant order is the classification precedence: an address inside more than one
/// declared range goes to the first variant listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Segment {
    Hot,
    Profiled,
    NonProfiled,
    NonMethod,
}

impl Segment {
    /// All buckets in precedence order.
    pub const PRECEDENCE: [Segment; 4] =
        [Segment::Hot, Segment::Profiled, Segment::NonProfiled, Segment::NonMethod];

    /// Label the runtime uses for this bucket in a segmented report.
    pub fn label(self) -> &'static str {
        match self {
            Segment::Hot => "extra-hot",
            Segment::Profiled => "profiled nmethods",
            Segment::NonProfiled => "non-profiled nmethods",
            Segment::NonMethod => "non-nmethods",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Hot => "hot",
            Segment::Profiled => "profiled",
            Segment::NonProfiled => "non-profiled",
            Segment::NonMethod => "non-method",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hot" => Some(Segment::Hot),
            "profiled" => Some(Segment::Profiled),
            "non-profiled" => Some(Segment::NonProfiled),
            "non-method" => Some(Segment::NonMethod),
            _ => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One segment header plus its bounds, in report order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDeclaration {
    pub category: SegmentCategory,
    pub range: AddressRange,
}

impl SegmentDeclaration {
    pub fn new(category: SegmentCategory, start: u64, end: u64) -> Self {
        Self { category, range: AddressRange::new(start, end) }
    }
}

/// One line of the compiled-method list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledEntry {
    pub address: u64,
    pub tier: u8,
    pub state: u8,
    /// Qualified method name with the signature stripped.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_count: Option<u64>,
}

impl CompiledEntry {
    pub fn new(address: u64, tier: u8, state: u8, name: impl Into<String>) -> Self {
        Self { address, tier, state, name: name.into(), invocation_count: None }
    }

    pub fn with_invocation_count(mut self, count: Option<u64>) -> Self {
        self.invocation_count = count;
        self
    }
}
