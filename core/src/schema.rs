//! Triplet schema grammar.
//!
//! A triplet is a rule of the form `Source-RELATION->Target` constraining
//! which entity and relation types an extraction may produce. Segments are
//! ASCII letters, digits, and underscores. Anything that does not parse
//! contributes nothing to the derived sets; malformed input is never an
//! error.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static SOURCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z0-9_]+)-").unwrap());
static RELATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-([A-Za-z0-9_]+)->").unwrap());
static TARGET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"->([A-Za-z0-9_]+)").unwrap());

/// Parsed segments of one triplet; any segment may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripletParts {
    pub source: Option<String>,
    pub relation: Option<String>,
    pub target: Option<String>,
}

/// Parse one triplet string into its segments.
///
/// `"Person-HAS_PHONE->Phone"` yields source `Person`, relation
/// `HAS_PHONE`, target `Phone`.
pub fn parse_triplet(triplet: &str) -> TripletParts {
    TripletParts {
        source: SOURCE_RE
            .captures(triplet)
            .map(|caps| caps[1].to_string()),
        relation: RELATION_RE
            .captures(triplet)
            .map(|caps| caps[1].to_string()),
        target: TARGET_RE
            .captures(triplet)
            .map(|caps| caps[1].to_string()),
    }
}

/// Union of all source and target types across the given triplets,
/// sorted and deduplicated. Order and duplicates in the input never
/// affect the output.
pub fn allowed_node_types<S: AsRef<str>>(triplets: &[S]) -> Vec<String> {
    let mut types = BTreeSet::new();
    for triplet in triplets {
        let parts = parse_triplet(triplet.as_ref());
        if let Some(source) = parts.source {
            types.insert(source);
        }
        if let Some(target) = parts.target {
            types.insert(target);
        }
    }
    types.into_iter().collect()
}

/// Union of all relation types across the given triplets, sorted and
/// deduplicated.
pub fn allowed_relation_types<S: AsRef<str>>(triplets: &[S]) -> Vec<String> {
    let mut types = BTreeSet::new();
    for triplet in triplets {
        if let Some(relation) = parse_triplet(triplet.as_ref()).relation {
            types.insert(relation);
        }
    }
    types.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_triplet() {
        let parts = parse_triplet("Person-HAS_PHONE->Phone");
        assert_eq!(parts.source.as_deref(), Some("Person"));
        assert_eq!(parts.relation.as_deref(), Some("HAS_PHONE"));
        assert_eq!(parts.target.as_deref(), Some("Phone"));
    }

    #[test]
    fn missing_segments_yield_none() {
        let parts = parse_triplet("Person->Phone");
        assert_eq!(parts.source.as_deref(), Some("Person"));
        assert_eq!(parts.relation, None);
        assert_eq!(parts.target.as_deref(), Some("Phone"));

        assert_eq!(parse_triplet("no arrows here"), TripletParts::default());
        assert_eq!(parse_triplet(""), TripletParts::default());
    }

    #[test]
    fn derived_sets_are_sorted_and_deduplicated() {
        let triplets = [
            "Person-WORKS_AT->Organization",
            "Organization-LOCATED_IN->City",
        ];
        assert_eq!(
            allowed_node_types(&triplets),
            vec!["City", "Organization", "Person"]
        );
        assert_eq!(
            allowed_relation_types(&triplets),
            vec!["LOCATED_IN", "WORKS_AT"]
        );
    }

    #[test]
    fn derived_sets_invariant_under_reordering_and_duplication() {
        let a = [
            "Person-WORKS_AT->Organization",
            "Organization-LOCATED_IN->City",
        ];
        let b = [
            "Organization-LOCATED_IN->City",
            "Person-WORKS_AT->Organization",
            "Person-WORKS_AT->Organization",
            "Organization-LOCATED_IN->City",
        ];
        assert_eq!(allowed_node_types(&a), allowed_node_types(&b));
        assert_eq!(allowed_relation_types(&a), allowed_relation_types(&b));
    }

    #[test]
    fn malformed_triplets_contribute_nothing() {
        let triplets = ["Person-KNOWS->Person", "garbage", "-->", "A-"];
        // "A-" still has a parseable source segment; the rest contribute nothing
        assert_eq!(allowed_node_types(&triplets), vec!["A", "Person"]);
        assert_eq!(allowed_relation_types(&triplets), vec!["KNOWS"]);
    }

    #[test]
    fn type_names_are_case_sensitive() {
        let triplets = ["person-KNOWS->Person"];
        assert_eq!(allowed_node_types(&triplets), vec!["Person", "person"]);
    }
}
