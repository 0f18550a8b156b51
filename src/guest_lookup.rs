//! Guest directory matcher.
//!
//! Resolves a free-text name to at most [`MAX_MATCHES`] candidates, each
//! carrying the full member list of its party so the RSVP form can ask for
//! every member at once. Matching is diacritic- and case-insensitive substring
//! containment; candidates keep roster order, parties first and guests without
//! a party after them.

use crate::roster::{normalize_name, Guest};
use serde::Serialize;
use std::collections::HashMap;

pub const MAX_MATCHES: usize = 5;

/// A guest joined with the names of everyone in their party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub name: String,
    pub party: Option<String>,
    pub party_members: Vec<String>,
}

/// Guests grouped by party, in first-encounter order.
#[derive(Debug, Default)]
pub struct PartyIndex {
    parties: Vec<(String, Vec<String>)>,
    singles: Vec<String>,
}

impl PartyIndex {
    pub fn build(guests: &[Guest]) -> Self {
        let mut index = PartyIndex::default();
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for guest in guests {
            match guest.party.as_deref() {
                Some(party) => {
                    let pos = *positions.entry(party).or_insert_with(|| {
                        index.parties.push((party.to_string(), Vec::new()));
                        index.parties.len() - 1
                    });
                    index.parties[pos].1.push(guest.name.clone());
                }
                None => index.singles.push(guest.name.clone()),
            }
        }

        index
    }

    /// One candidate per guest: party members first, then singles.
    pub fn candidates(&self) -> Vec<MatchCandidate> {
        let grouped = self.parties.iter().flat_map(|(party, members)| {
            members.iter().map(move |name| MatchCandidate {
                name: name.clone(),
                party: Some(party.clone()),
                party_members: members.clone(),
            })
        });
        let singles = self.singles.iter().map(|name| MatchCandidate {
            name: name.clone(),
            party: None,
            party_members: vec![name.clone()],
        });

        grouped.chain(singles).collect()
    }
}

/// Find candidates whose normalized name contains the normalized query.
///
/// An empty query after normalization matches nothing.
pub fn lookup(guests: &[Guest], query: &str) -> Vec<MatchCandidate> {
    let query = normalize_name(query);
    if query.is_empty() {
        return Vec::new();
    }

    PartyIndex::build(guests)
        .candidates()
        .into_iter()
        .filter(|candidate| normalize_name(&candidate.name).contains(&query))
        .take(MAX_MATCHES)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn guest(name: &str, party: Option<&str>) -> Guest {
        Guest::new(name, party.map(str::to_string))
    }

    #[test]
    fn test_smith_party_lookup() {
        let roster = vec![guest("Alice Smith", Some("P1")), guest("Bob Smith", Some("P1"))];
        let matches = lookup(&roster, "smith");
        assert_eq!(matches.len(), 2);
        for candidate in &matches {
            assert_eq!(candidate.party_members, vec!["Alice Smith", "Bob Smith"]);
            assert_eq!(candidate.party.as_deref(), Some("P1"));
        }
    }

    #[test]
    fn test_diacritic_and_case_insensitive() {
        let roster = vec![guest("Émile Dupont", None), guest("Someone Else", None)];
        for query in ["émile", "EMILE", "  Emile   Dup "] {
            let matches = lookup(&roster, query);
            assert_eq!(matches.len(), 1, "query {query:?}");
            assert_eq!(matches[0].name, "Émile Dupont");
            assert_eq!(matches[0].party_members, vec!["Émile Dupont"]);
        }
    }

    #[test]
    fn test_party_members_are_symmetric() {
        let roster = vec![guest("Ana", Some("7")), guest("Ben", None), guest("Caro", Some("7"))];
        let a = lookup(&roster, "ana");
        let c = lookup(&roster, "caro");
        assert_eq!(a[0].party_members, c[0].party_members);
        assert_eq!(a[0].party_members, vec!["Ana", "Caro"]);
    }

    #[test]
    fn test_parties_come_before_singles_and_truncate() {
        let roster = vec![
            guest("Lee One", None),
            guest("Lee Two", Some("A")),
            guest("Lee Three", Some("B")),
            guest("Lee Four", Some("A")),
            guest("Lee Five", None),
            guest("Lee Six", Some("C")),
        ];
        let names: Vec<String> = lookup(&roster, "lee").into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Lee Two", "Lee Four", "Lee Three", "Lee Six", "Lee One"]);
    }

    #[test]
    fn test_duplicate_names_surface_separately() {
        let roster = vec![guest("Sam Lee", Some("1")), guest("Sam Lee", Some("2"))];
        assert_eq!(lookup(&roster, "sam").len(), 2);
    }

    #[test]
    fn test_blank_query_and_empty_roster() {
        let roster = vec![guest("Alice", None)];
        assert!(lookup(&roster, "   ").is_empty());
        assert!(lookup(&[], "alice").is_empty());
    }

    #[test]
    fn test_substring_not_prefix() {
        let roster = vec![guest("Maria Lopez", None)];
        assert_eq!(lookup(&roster, "lop").len(), 1);
        assert!(lookup(&roster, "mraia").is_empty());
    }
}
