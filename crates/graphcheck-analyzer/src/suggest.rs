/// Edit distance between two symbol names, two-row dynamic programming.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Candidates within `max_distance` edits of `target`, closest first,
/// ties broken alphabetically, capped at `limit`. Exact matches are
/// excluded since the caller already knows the name is absent.
pub fn closest_matches(
    target: &str,
    candidates: &[String],
    max_distance: usize,
    limit: usize,
) -> Vec<String> {
    let mut scored: Vec<(usize, &String)> = candidates
        .iter()
        .filter(|c| c.as_str() != target)
        .map(|c| (levenshtein(target, c), c))
        .filter(|(d, _)| *d <= max_distance)
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    scored.truncate(limit);
    scored.into_iter().map(|(_, c)| c.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("search", "search"), 0);
        assert_eq!(levenshtein("serach", "search"), 2);
        assert_eq!(levenshtein("searh", "search"), 1);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn matches_are_ranked_by_distance_then_name() {
        let candidates = vec!["bar".to_string(), "bag".to_string(), "qux".to_string()];
        let matches = closest_matches("barr", &candidates, 2, 3);
        assert_eq!(matches, vec!["bar", "bag"]);

        let matches = closest_matches("barr", &candidates, 1, 3);
        assert_eq!(matches, vec!["bar"]);
    }

    #[test]
    fn ties_break_alphabetically_and_limit_caps() {
        let candidates = vec![
            "baz".to_string(),
            "bat".to_string(),
            "bar".to_string(),
            "qux".to_string(),
        ];
        let matches = closest_matches("bas", &candidates, 2, 3);
        assert_eq!(matches, vec!["bar", "bat", "baz"]);

        let matches = closest_matches("bas", &candidates, 2, 2);
        assert_eq!(matches, vec!["bar", "bat"]);
    }

    #[test]
    fn far_names_are_dropped() {
        let candidates = vec!["completely_different".to_string()];
        assert!(closest_matches("bar", &candidates, 2, 3).is_empty());
    }

    #[test]
    fn exact_match_is_excluded() {
        let candidates = vec!["bar".to_string(), "baz".to_string()];
        let matches = closest_matches("bar", &candidates, 2, 3);
        assert_eq!(matches, vec!["baz"]);
    }
}
