//! String similarity for fuzzy keyword matching
//!
//! The ratio is `2 * LCS / (len(a) + len(b))`, i.e. one minus the normalized
//! insertion/deletion edit distance. It is 1.0 for identical strings and 0.0
//! when nothing is shared.

/// Length of the longest common subsequence, case-insensitive
pub fn lcs_length(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().flat_map(char::to_lowercase).collect();
    let s2_chars: Vec<char> = s2.chars().flat_map(char::to_lowercase).collect();

    if s1_chars.is_empty() || s2_chars.is_empty() {
        return 0;
    }

    // Two rows instead of the full table
    let mut prev_row = vec![0usize; s2_chars.len() + 1];
    let mut curr_row = vec![0usize; s2_chars.len() + 1];

    for c1 in &s1_chars {
        for (j, c2) in s2_chars.iter().enumerate() {
            curr_row[j + 1] = if c1 == c2 {
                prev_row[j] + 1
            } else {
                prev_row[j + 1].max(curr_row[j])
            };
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[s2_chars.len()]
}

/// Insertions plus deletions needed to turn `s1` into `s2`
pub fn indel_distance(s1: &str, s2: &str) -> usize {
    let total = s1.chars().flat_map(char::to_lowercase).count()
        + s2.chars().flat_map(char::to_lowercase).count();
    total - 2 * lcs_length(s1, s2)
}

/// Similarity ratio in [0, 1]
pub fn similarity_ratio(s1: &str, s2: &str) -> f32 {
    let total = s1.chars().flat_map(char::to_lowercase).count()
        + s2.chars().flat_map(char::to_lowercase).count();
    if total == 0 {
        return 1.0;
    }
    (2 * lcs_length(s1, s2)) as f32 / total as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_and_disjoint() {
        assert_eq!(similarity_ratio("client", "client"), 1.0);
        assert_eq!(similarity_ratio("Client", "client"), 1.0);
        assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
        assert_eq!(similarity_ratio("", ""), 1.0);
        assert_eq!(similarity_ratio("", "abc"), 0.0);
    }

    #[test]
    fn test_lcs_and_indel() {
        assert_eq!(lcs_length("clint", "client"), 5);
        assert_eq!(indel_distance("clint", "client"), 1);
        assert_eq!(indel_distance("kitten", "sitting"), 5);
    }

    #[test]
    fn test_misspelling_scores_high() {
        let ratio = similarity_ratio("creat a clint", "creat client");
        assert!(ratio > 0.85 && ratio < 0.9, "ratio was {}", ratio);
        assert!(similarity_ratio("clint", "client") > 0.9);
        assert!(similarity_ratio("wether", "weather") > 0.9);
    }
}
