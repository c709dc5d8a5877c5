//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Candidate generation from the shingle index
//! - Jaccard scoring of candidate pairs
//! - Union-find clustering into duplicate groups

pub mod finder;
pub mod groups;
pub mod union_find;

pub use finder::{jaccard, DetectionStats, DuplicateDetector, FinderError};
pub use groups::{sort_groups, DuplicateGroup, DuplicateMember};
pub use union_find::UnionFind;
