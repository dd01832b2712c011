//! First-match assignment of observation points to areas, and per-area counts.

use hashbrown::HashMap;
use tracing::debug;

use super::geometry::Point;
use super::index::AreaIndex;

/// Observation counts keyed by area name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountTable {
    counts: HashMap<String, u64>,
}

/// Result of [`assign`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pub counts: CountTable,
    /// Points attributed to some area
    pub assigned: u64,
    /// Points offered for assignment
    pub total: u64,
}

impl Assignment {
    /// Points that fell outside every area
    pub fn unassigned(&self) -> u64 {
        self.total - self.assigned
    }
}

/// Leader of a count table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopArea {
    /// No area has a positive count
    Empty,
    Unique { name: String, count: u64 },
    /// Several areas share the highest count; names are sorted
    Tied { names: Vec<String>, count: u64 },
}

impl CountTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, name: &str) {
        *self.counts.entry_ref(name).or_insert(0) += 1;
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Rows sorted by count (highest first), then by name
    pub fn rows(&self) -> Vec<(&str, u64)> {
        let mut rows: Vec<(&str, u64)> = self.iter().collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }

    /// The area with the strictly greatest count, or the set tied for it
    pub fn top_area(&self) -> TopArea {
        let best = self.counts.values().copied().max().unwrap_or(0);
        if best == 0 {
            return TopArea::Empty;
        }

        let mut names: Vec<String> = self
            .counts
            .iter()
            .filter(|(_, count)| **count == best)
            .map(|(name, _)| name.clone())
            .collect();

        if names.len() == 1 {
            TopArea::Unique {
                name: names.remove(0),
                count: best,
            }
        } else {
            names.sort();
            TopArea::Tied { names, count: best }
        }
    }
}

/// Attribute each point to the first area (in stored order) that contains it.
///
/// Points outside every area are dropped and only show up in [`Assignment::unassigned`].
pub fn assign<I>(points: I, index: &AreaIndex) -> Assignment
where
    I: IntoIterator<Item = Point>,
{
    let mut result = Assignment::default();

    for point in points {
        result.total += 1;
        match index.first_containing(&point) {
            Some(area) => {
                result.counts.increment(area.name());
                result.assigned += 1;
            }
            None => debug!("Observation at ({}, {}) is outside every suburb", point.lon, point.lat),
        }
    }

    result
}
