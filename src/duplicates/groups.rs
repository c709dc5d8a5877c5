//! Duplicate groups as reported to callers.
//!
//! # Overview
//!
//! A [`DuplicateGroup`] is a maximal set of segments connected by accepted
//! similarity edges. Its score is the weakest edge inside it, so a group
//! is never reported as more similar than its weakest confirmed link.
//!
//! Members are ordered by path, then start offset, then depth; the first
//! member is the group's representative.

use std::cmp::Ordering;
use std::ops::Range;
use std::path::PathBuf;

use crate::index::SegmentId;

/// One segment inside a duplicate group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateMember {
    /// Segment identifier in the corpus index
    pub segment: SegmentId,
    /// Owning file
    pub path: PathBuf,
    /// Byte range in the file
    pub range: Range<usize>,
    /// Nesting depth
    pub depth: usize,
    /// Character count of the normalized text
    pub length: usize,
}

impl DuplicateMember {
    fn display_order(&self, other: &Self) -> Ordering {
        self.path
            .cmp(&other.path)
            .then(self.range.start.cmp(&other.range.start))
            .then(self.depth.cmp(&other.depth))
            .then(self.segment.cmp(&other.segment))
    }
}

/// A group of near-duplicate segments.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    /// Lowest pairwise similarity among the accepted edges of the group
    pub similarity: f64,
    /// Members in display order
    pub members: Vec<DuplicateMember>,
}

impl DuplicateGroup {
    /// Create a group, putting members into display order.
    #[must_use]
    pub fn new(similarity: f64, mut members: Vec<DuplicateMember>) -> Self {
        members.sort_by(DuplicateMember::display_order);
        Self {
            similarity,
            members,
        }
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if this group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The first member in display order.
    #[must_use]
    pub fn representative(&self) -> Option<&DuplicateMember> {
        self.members.first()
    }

    /// Combined character count of all members.
    #[must_use]
    pub fn total_length(&self) -> usize {
        self.members.iter().map(|m| m.length).sum()
    }

    /// Characters that could be removed by keeping a single copy.
    #[must_use]
    pub fn redundant_length(&self) -> usize {
        let longest = self.members.iter().map(|m| m.length).max().unwrap_or(0);
        self.total_length().saturating_sub(longest)
    }

    /// Number of distinct files the group spans.
    #[must_use]
    pub fn file_count(&self) -> usize {
        // members are sorted by path
        let mut count = 0;
        let mut last: Option<&PathBuf> = None;
        for member in &self.members {
            if last != Some(&member.path) {
                count += 1;
                last = Some(&member.path);
            }
        }
        count
    }

    /// Report ordering: higher similarity first, then the representative's
    /// path and offset.
    #[must_use]
    pub fn report_order(&self, other: &Self) -> Ordering {
        other
            .similarity
            .total_cmp(&self.similarity)
            .then_with(|| match (self.representative(), other.representative()) {
                (Some(a), Some(b)) => a.display_order(b),
                (a, b) => a.is_some().cmp(&b.is_some()),
            })
    }
}

/// Sort groups into report order.
pub fn sort_groups(groups: &mut [DuplicateGroup]) {
    groups.sort_by(DuplicateGroup::report_order);
}
