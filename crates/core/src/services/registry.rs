use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{AddressRange, CompiledEntry, Segment, SegmentDeclaration};

/// Name reported for an address outside every declared segment.
pub const UNKNOWN_SEGMENT: &str = "UNKNOWN";

/// Address ranges of the canonical segments of one report.
///
/// Built once per report from its declarations; undeclared segments keep an empty
/// range and never match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRegistry {
    ranges: BTreeMap<Segment, AddressRange>,
}

impl SegmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_declarations<'a, I>(declarations: I) -> Self
    where
        I: IntoIterator<Item = &'a SegmentDeclaration>,
    {
        let mut registry = Self::new();
        for declaration in declarations {
            registry.declare(declaration);
        }
        registry
    }

    /// Record the range for the declaration's resolved segment. A later declaration
    /// for the same segment replaces the earlier one.
    pub fn declare(&mut self, declaration: &SegmentDeclaration) -> &mut Self {
        self.ranges.insert(declaration.category.resolve(), declaration.range);
        self
    }

    pub fn range(&self, segment: Segment) -> AddressRange {
        self.ranges.get(&segment).copied().unwrap_or_default()
    }

    /// Declared segments in precedence order, with their ranges.
    pub fn declared(&self) -> Vec<(Segment, AddressRange)> {
        Segment::PRECEDENCE
            .iter()
            .filter_map(|segment| self.ranges.get(segment).map(|range| (*segment, *range)))
            .collect()
    }

    /// First segment in precedence order whose range contains `address`.
    pub fn classify(&self, address: u64) -> Option<Segment> {
        Segment::PRECEDENCE.into_iter().find(|segment| self.range(*segment).contains(address))
    }

    pub fn segment_name(&self, address: u64) -> &'static str {
        self.classify(address).map(Segment::label).unwrap_or(UNKNOWN_SEGMENT)
    }

    /// Sort entries into per-segment buckets.
    pub fn place(&self, entries: &[CompiledEntry]) -> Placement {
        let mut placement = Placement::default();
        for entry in entries {
            match self.classify(entry.address) {
                Some(segment) => placement.buckets.entry(segment).or_default().push(entry.clone()),
                None => placement.unclassified.push(entry.clone()),
            }
        }
        placement
    }
}

/// Entries grouped by the segment their address falls in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub buckets: BTreeMap<Segment, Vec<CompiledEntry>>,
    pub unclassified: Vec<CompiledEntry>,
}

impl Placement {
    pub fn bucket(&self, segment: Segment) -> &[CompiledEntry] {
        self.buckets.get(&segment).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every classified entry outside `segment`, in precedence order.
    pub fn outside(&self, segment: Segment) -> impl Iterator<Item = &CompiledEntry> {
        self.buckets
            .iter()
            .filter(move |(bucket, _)| **bucket != segment)
            .flat_map(|(_, entries)| entries.iter())
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum::<usize>() + self.unclassified.len()
    }
}
