//! Command-name completion.
//!
//! Completion works against a set of known command names: builtins plus the
//! executables discovered on the search path. The line editor asks a
//! [`CandidateSource`] for that set each time TAB is pressed.

use std::collections::BTreeSet;

/// Something that can list every command name the shell currently knows about.
pub trait CandidateSource {
    /// Returns the known command names. Duplicates are impossible by construction.
    fn known_names(&self) -> BTreeSet<String>;
}

impl CandidateSource for BTreeSet<String> {
    fn known_names(&self) -> BTreeSet<String> {
        self.clone()
    }
}

/// Returns every name in `known_names` equal to or prefixed by `partial`.
///
/// The result is deduplicated and sorted ascending. Nothing is offered when
/// `partial` is empty.
pub fn complete<'a, I>(partial: &str, known_names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    if partial.is_empty() {
        return Vec::new();
    }
    let matches: BTreeSet<&String> = known_names
        .into_iter()
        .filter(|name| name.starts_with(partial))
        .collect();
    matches.into_iter().cloned().collect()
}

/// Reports whether all `candidates` are the same name once sorted.
///
/// An empty candidate list has nothing to expand to and yields `false`.
pub fn has_common_prefix(candidates: &[String]) -> bool {
    let mut sorted: Vec<&String> = candidates.iter().collect();
    sorted.sort();
    match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) => first == last,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_complete_returns_sorted_matches() {
        let known = names(&["cat", "car", "cart", "echo"]);
        assert_eq!(complete("ca", &known), vec!["car", "cart", "cat"]);
    }

    #[test]
    fn test_complete_includes_exact_match() {
        let known = names(&["car", "echo"]);
        assert_eq!(complete("car", &known), vec!["car"]);
    }

    #[test]
    fn test_complete_deduplicates() {
        let known = vec!["ls".to_string(), "ls".to_string(), "lsof".to_string()];
        assert_eq!(complete("ls", &known), vec!["ls", "lsof"]);
    }

    #[test]
    fn test_complete_empty_partial_offers_nothing() {
        let known = names(&["cat", "car"]);
        assert!(complete("", &known).is_empty());
    }

    #[test]
    fn test_complete_no_match() {
        let known = names(&["cat"]);
        assert!(complete("dog", &known).is_empty());
        assert!(complete("cat ", &known).is_empty());
    }

    #[test]
    fn test_has_common_prefix() {
        assert!(has_common_prefix(&["echo".to_string()]));
        assert!(has_common_prefix(&["echo".to_string(), "echo".to_string()]));
        assert!(!has_common_prefix(&["car".to_string(), "cat".to_string()]));
        assert!(!has_common_prefix(&[]));
    }
}
