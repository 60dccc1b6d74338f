// Team filter for report views over a snapshot.

use std::collections::BTreeSet;

use crate::rank::CombinationRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TeamFilter {
    #[default]
    All,
    Teams(BTreeSet<String>),
}

impl TeamFilter {
    /// Codes are trimmed and uppercased; blanks are ignored. No usable code
    /// means no filtering.
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let teams: BTreeSet<String> = codes
            .into_iter()
            .map(|c| c.as_ref().trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect();
        if teams.is_empty() {
            TeamFilter::All
        } else {
            TeamFilter::Teams(teams)
        }
    }

    pub fn matches_team(&self, team: &str) -> bool {
        match self {
            TeamFilter::All => true,
            TeamFilter::Teams(teams) => teams.contains(&team.trim().to_uppercase()),
        }
    }

    /// A record matches when any of its players is on a selected team.
    pub fn matches(&self, record: &CombinationRecord) -> bool {
        match self {
            TeamFilter::All => true,
            TeamFilter::Teams(_) => record.players.iter().any(|p| self.matches_team(&p.team)),
        }
    }

    pub fn apply<'a>(&self, records: &'a [CombinationRecord]) -> Vec<&'a CombinationRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}
