//! Grid quorums

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{QuorumError, QuorumResult};
use crate::membership::{MembershipView, ProcessId};

/// How the grid side is derived from the group size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridRounding {
    /// M = floor(sqrt(N))
    #[default]
    Floor,
    /// M = ceil(sqrt(N))
    Ceil,
}

impl GridRounding {
    /// Grid side for a group of `size` members (`size` >= 1).
    pub fn side(&self, size: usize) -> usize {
        let floor = integer_sqrt(size);
        match self {
            GridRounding::Floor => floor.max(1),
            GridRounding::Ceil if floor * floor < size => floor + 1,
            GridRounding::Ceil => floor.max(1),
        }
    }

    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            GridRounding::Floor => "floor",
            GridRounding::Ceil => "ceil",
        }
    }
}

impl fmt::Display for GridRounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn integer_sqrt(n: usize) -> usize {
    let mut root = (n as f64).sqrt() as usize;
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}

/// Two indices whose quorums do not intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionGap {
    pub first: usize,
    pub second: usize,
}

/// Grid overlay of a group of `size` members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuorumGrid {
    size: usize,
    side: usize,
    rows: usize,
}

impl QuorumGrid {
    /// Lay a grid over a group of `size` members.
    pub fn new(size: usize, rounding: GridRounding) -> QuorumResult<Self> {
        if size == 0 {
            return Err(QuorumError::EmptyGroup);
        }

        let side = rounding.side(size);
        let rows = size.div_ceil(side);

        Ok(Self { size, side, rows })
    }

    /// Group size N
    pub fn size(&self) -> usize {
        self.size
    }

    /// Grid side M
    pub fn side(&self) -> usize {
        self.side
    }

    /// Number of (possibly short) rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// (row, column) of an index
    pub fn position(&self, index: usize) -> QuorumResult<(usize, usize)> {
        if index >= self.size {
            return Err(QuorumError::IndexOutOfRange {
                index,
                size: self.size,
            });
        }
        Ok((index / self.side, index % self.side))
    }

    /// Indices in a row, clamped to the group
    pub fn row_members(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.side)
            .map(move |column| row * self.side + column)
            .filter(move |index| *index < self.size)
    }

    /// Indices in a column across every row, clamped to the group
    pub fn column_members(&self, column: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.rows)
            .map(move |row| row * self.side + column)
            .filter(move |index| *index < self.size)
    }

    /// Quorum of an index: its row united with its column, self included once.
    pub fn quorum_of(&self, index: usize) -> QuorumResult<BTreeSet<usize>> {
        self.position(index)?;
        Ok(self.members(index))
    }

    /// Row and column union for an index already known to be in range
    fn members(&self, index: usize) -> BTreeSet<usize> {
        self.row_members(index / self.side)
            .chain(self.column_members(index % self.side))
            .collect()
    }

    /// Check every pair of quorums for a common member.
    ///
    /// Returns the first non-intersecting pair found.
    pub fn verify_intersection(&self) -> Result<(), IntersectionGap> {
        let quorums: Vec<BTreeSet<usize>> = (0..self.size)
            .map(|index| self.members(index))
            .collect();

        for first in 0..self.size {
            for second in (first + 1)..self.size {
                if quorums[first].is_disjoint(&quorums[second]) {
                    return Err(IntersectionGap { first, second });
                }
            }
        }

        Ok(())
    }
}

/// Quorum of `index` in a group of `size`, with the default (floor) rounding.
pub fn quorum_of(index: usize, size: usize) -> QuorumResult<BTreeSet<usize>> {
    QuorumGrid::new(size, GridRounding::Floor)?.quorum_of(index)
}

/// A process's quorum resolved against a concrete view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumAssignment {
    /// Position of the process in the view
    pub index: usize,

    /// Grid side M used for this view
    pub side: usize,

    /// Quorum members, the process itself included
    pub members: BTreeSet<ProcessId>,
}

impl QuorumAssignment {
    /// Resolve the quorum of `id` in `view`.
    pub fn resolve(
        view: &MembershipView,
        id: &ProcessId,
        rounding: GridRounding,
    ) -> QuorumResult<Self> {
        let index = view.index_of(id).ok_or(QuorumError::NotAMember(*id))?;
        let grid = QuorumGrid::new(view.len(), rounding)?;

        let members = grid
            .quorum_of(index)?
            .into_iter()
            .filter_map(|i| view.member(i))
            .collect();

        Ok(Self {
            index,
            side: grid.side(),
            members,
        })
    }

    /// Quorum members other than the process itself
    pub fn peers<'a>(&'a self, local: &'a ProcessId) -> impl Iterator<Item = ProcessId> + 'a {
        self.members.iter().filter(move |m| *m != local).copied()
    }

    /// Number of quorum members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the quorum is empty (never true for a resolved assignment)
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether a process belongs to this quorum
    pub fn contains(&self, id: &ProcessId) -> bool {
        self.members.contains(id)
    }
}
