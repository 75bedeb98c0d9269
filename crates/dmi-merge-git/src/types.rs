//! Value types shared between the [`ConflictStore`](crate::ConflictStore)
//! trait and its callers. They contain no gix types.

use std::fmt;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One of the three index stages git keeps for an unmerged path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Stage 1: the common ancestor.
    Base,
    /// Stage 2: the local side (`HEAD`).
    Ours,
    /// Stage 3: the side being merged in.
    Incoming,
}

impl Stage {
    /// All conflict stages in index order.
    pub const ALL: [Self; 3] = [Self::Base, Self::Ours, Self::Incoming];

    /// The numeric index stage (1, 2 or 3).
    #[must_use]
    pub const fn number(self) -> u32 {
        match self {
            Self::Base => 1,
            Self::Ours => 2,
            Self::Incoming => 3,
        }
    }

    /// Map a numeric index stage back to a [`Stage`]. Stage 0 (merged) and
    /// anything out of range yield `None`.
    #[must_use]
    pub const fn from_number(n: u32) -> Option<Self> {
        match n {
            1 => Some(Self::Base),
            2 => Some(Self::Ours),
            3 => Some(Self::Incoming),
            _ => None,
        }
    }

    /// Short role name (`base`, `ours`, `incoming`).
    #[must_use]
    pub const fn role(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Ours => "ours",
            Self::Incoming => "incoming",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} ({})", self.number(), self.role())
    }
}

// ---------------------------------------------------------------------------
// ConflictEntry
// ---------------------------------------------------------------------------

/// An unmerged path and the stages the index holds for it.
///
/// Produced by [`ConflictStore::conflicts`](crate::ConflictStore::conflicts).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictEntry {
    /// Path relative to the repository root, `/`-separated.
    pub path: String,
    /// Stages present, sorted and deduplicated.
    pub stages: Vec<Stage>,
}

impl ConflictEntry {
    /// `true` when all three stages are present.
    #[must_use]
    pub fn is_three_way(&self) -> bool {
        Stage::ALL.iter().all(|s| self.stages.contains(s))
    }

    /// The stages this entry lacks.
    #[must_use]
    pub fn missing(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|s| !self.stages.contains(s))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_numbers_round_trip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_number(stage.number()), Some(stage));
        }
        assert_eq!(Stage::from_number(0), None);
        assert_eq!(Stage::from_number(4), None);
    }

    #[test]
    fn stage_display_names_number_and_role() {
        assert_eq!(Stage::Incoming.to_string(), "stage 3 (incoming)");
    }

    #[test]
    fn entry_reports_missing_stages() {
        let entry = ConflictEntry {
            path: "icons/door.dmi".to_owned(),
            stages: vec![Stage::Base, Stage::Ours],
        };
        assert!(!entry.is_three_way());
        assert_eq!(entry.missing(), vec![Stage::Incoming]);
    }
}
