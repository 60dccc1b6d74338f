// Combination group sizes tracked by the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cardinality of a co-occurrence group. Only 2, 3 and 4 players are
/// tracked; larger groups are too rare to be worth the combinatorial cost.
///
/// Serialized as the snapshot group key (`group_2`, `group_3`, `group_4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GroupSize {
    #[serde(rename = "group_2")]
    Pairs,
    #[serde(rename = "group_3")]
    Trios,
    #[serde(rename = "group_4")]
    Quads,
}

impl GroupSize {
    /// All group sizes in processing order (smallest first).
    pub const ALL: [GroupSize; 3] = [GroupSize::Pairs, GroupSize::Trios, GroupSize::Quads];

    /// Number of players in a group of this size.
    pub fn k(self) -> usize {
        match self {
            GroupSize::Pairs => 2,
            GroupSize::Trios => 3,
            GroupSize::Quads => 4,
        }
    }

    /// Map a player count back to a group size.
    pub fn from_k(k: usize) -> Option<Self> {
        match k {
            2 => Some(GroupSize::Pairs),
            3 => Some(GroupSize::Trios),
            4 => Some(GroupSize::Quads),
            _ => None,
        }
    }
}

impl fmt::Display for GroupSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-player", self.k())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn k_round_trips_through_from_k() {
        for size in GroupSize::ALL {
            assert_eq!(GroupSize::from_k(size.k()), Some(size));
        }
        assert_eq!(GroupSize::from_k(1), None);
        assert_eq!(GroupSize::from_k(5), None);
    }

    #[test]
    fn serializes_as_snapshot_key() {
        let json = serde_json::to_string(&GroupSize::Trios).unwrap();
        assert_eq!(json, "\"group_3\"");
        let back: GroupSize = serde_json::from_str("\"group_4\"").unwrap();
        assert_eq!(back, GroupSize::Quads);
    }

    #[test]
    fn display_uses_player_count() {
        assert_eq!(GroupSize::Pairs.to_string(), "2-player");
    }
}
