//! Cheap, dependency-free fuzzy matching for did-you-mean suggestions.

/// Maximum edit distance for a candidate to be suggested.
pub const MAX_DISTANCE: usize = 3;

/// Maximum number of suggestions returned.
pub const MAX_SUGGESTIONS: usize = 3;

/// Rank `candidates` by case-insensitive edit distance to `target`. Keeps
/// candidates with `0 < distance <= max_distance`, sorted ascending by
/// distance with ties in original order, truncated to three. Distance zero
/// is excluded: an exact match means the name already exists and the error
/// path would not have triggered.
pub fn rank_candidates<'a, I>(target: &str, candidates: I, max_distance: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let target = target.to_lowercase();
    let mut ranked: Vec<(usize, &str)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let distance = levenshtein(&target, &candidate.to_lowercase());
            (distance > 0 && distance <= max_distance).then_some((distance, candidate))
        })
        .collect();
    ranked.sort_by_key(|(distance, _)| *distance);
    ranked
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

/// Standard two-row Levenshtein distance.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, a_char) in a.iter().enumerate() {
        if let Some(slot) = current.first_mut() {
            *slot = i + 1;
        }
        for (j, b_char) in b.iter().enumerate() {
            let substitution_cost = usize::from(a_char != b_char);
            let substitution = previous.get(j).copied().unwrap_or_default() + substitution_cost;
            let deletion = previous.get(j + 1).copied().unwrap_or_default() + 1;
            let insertion = current.get(j).copied().unwrap_or_default() + 1;
            if let Some(slot) = current.get_mut(j + 1) {
                *slot = substitution.min(deletion).min(insertion);
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous.last().copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("summary", "summary", 0)]
    #[case("summry", "summary", 1)]
    #[case("emial", "email", 2)]
    #[case("", "abc", 3)]
    #[case("kitten", "sitting", 3)]
    fn distance(#[case] a: &str, #[case] b: &str, #[case] expected: usize) {
        assert_eq!(levenshtein(a, b), expected);
    }

    #[test]
    fn distance_is_case_insensitive_through_ranking() {
        let suggestions = rank_candidates("SUMMRY", ["summary"].into_iter(), MAX_DISTANCE);
        assert_eq!(suggestions, vec!["summary"]);
    }

    #[test]
    fn exact_match_is_excluded() {
        let suggestions = rank_candidates("summary", ["summary", "summaries"].into_iter(), 3);
        assert_eq!(suggestions, vec!["summaries"]);
    }

    #[test]
    fn ranked_ascending_with_stable_ties_capped_at_three() {
        let candidates = ["created_by", "summery", "sumary", "summarize", "text"];
        let suggestions = rank_candidates("summary", candidates.into_iter(), MAX_DISTANCE);
        // distance 1: summery, sumary (original order); distance 3: summarize
        assert_eq!(suggestions, vec!["summery", "sumary", "summarize"]);
    }

    #[test]
    fn far_candidates_yield_nothing() {
        let suggestions = rank_candidates("persona", ["id", "transcript"].into_iter(), 3);
        assert!(suggestions.is_empty());
    }
}
