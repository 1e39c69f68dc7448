//! Quorum Calculator
//!
//! Maps a process's position in the membership view to its quorum: the
//! members sharing its row plus the members sharing its column of a square
//! grid laid over the view. Any two quorums intersect, which is what makes
//! vote collection a mutual-exclusion guarantee.
//!
//! # Grid shape
//!
//! The grid side is M = floor(sqrt(N)) by default (or the ceiling, if
//! configured) and the grid has ceil(N / M) rows. When N is not a perfect
//! square the last row is short. Rows and columns are clamped to indices
//! below N and every column spans all rows, so each index has a cell and the
//! pairwise intersection holds for every N.
//!
//! Pure and deterministic; recomputed whenever the view changes.

mod errors;
mod grid;

pub use errors::{QuorumError, QuorumResult};
pub use grid::{quorum_of, GridRounding, IntersectionGap, QuorumAssignment, QuorumGrid};
