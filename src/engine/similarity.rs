// src/engine/similarity.rs - Edit-distance and token-overlap primitives

use std::collections::HashSet;

/// Classic Levenshtein distance; substitution, insertion and deletion all
/// cost 1. Operates on chars, not bytes.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let chars_a: Vec<char> = a.chars().collect();
    let chars_b: Vec<char> = b.chars().collect();
    let len_a = chars_a.len();
    let len_b = chars_b.len();

    if len_a == 0 {
        return len_b;
    }
    if len_b == 0 {
        return len_a;
    }

    let mut matrix = vec![vec![0usize; len_b + 1]; len_a + 1];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=len_b {
        matrix[0][j] = j;
    }

    for i in 1..=len_a {
        for j in 1..=len_b {
            let cost = if chars_a[i - 1] == chars_b[j - 1] { 0 } else { 1 };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[len_a][len_b]
}

/// Similarity in [0, 1]: `(max_len - edit_distance) / max_len`, with two
/// empty strings defined as identical.
pub fn similarity(a: &str, b: &str) -> f32 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let max_len = len_a.max(len_b);
    if max_len == 0 {
        return 1.0;
    }
    (max_len - edit_distance(a, b)) as f32 / max_len as f32
}

/// Jaccard similarity over lowercase whitespace-split token sets. Two empty
/// token sets count as identical.
pub fn token_overlap(a: &str, b: &str) -> f32 {
    let set_a: HashSet<String> = a.split_whitespace().map(|w| w.to_lowercase()).collect();
    let set_b: HashSet<String> = b.split_whitespace().map(|w| w.to_lowercase()).collect();

    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 1.0;
    }
    set_a.intersection(&set_b).count() as f32 / union as f32
}

/// Keys physically adjacent to `c` on a QWERTY layout.
fn keyboard_neighbors(c: char) -> &'static [char] {
    match c {
        'q' => &['w', 'a', 's'],
        'w' => &['q', 'e', 'a', 's', 'd'],
        'e' => &['w', 'r', 's', 'd', 'f'],
        'r' => &['e', 't', 'd', 'f', 'g'],
        't' => &['r', 'y', 'f', 'g', 'h'],
        'y' => &['t', 'u', 'g', 'h', 'j'],
        'u' => &['y', 'i', 'h', 'j', 'k'],
        'i' => &['u', 'o', 'j', 'k', 'l'],
        'o' => &['i', 'p', 'k', 'l'],
        'p' => &['o', 'l'],
        'a' => &['q', 'w', 's', 'z', 'x'],
        's' => &['q', 'w', 'e', 'a', 'd', 'z', 'x', 'c'],
        'd' => &['w', 'e', 'r', 's', 'f', 'x', 'c', 'v'],
        'f' => &['e', 'r', 't', 'd', 'g', 'c', 'v', 'b'],
        'g' => &['r', 't', 'y', 'f', 'h', 'v', 'b', 'n'],
        'h' => &['t', 'y', 'u', 'g', 'j', 'b', 'n', 'm'],
        'j' => &['y', 'u', 'i', 'h', 'k', 'n', 'm'],
        'k' => &['u', 'i', 'o', 'j', 'l', 'm'],
        'l' => &['i', 'o', 'p', 'k'],
        'z' => &['a', 's', 'x'],
        'x' => &['a', 's', 'd', 'z', 'c'],
        'c' => &['s', 'd', 'f', 'x', 'v'],
        'v' => &['d', 'f', 'g', 'c', 'b'],
        'b' => &['f', 'g', 'h', 'v', 'n'],
        'n' => &['g', 'h', 'j', 'b', 'm'],
        'm' => &['h', 'j', 'k', 'n'],
        _ => &[],
    }
}

/// True when `b` looks like a fat-finger rendering of `a`: lengths differ by
/// at most one, at most two compared positions differ, and every differing
/// pair sits on adjacent QWERTY keys.
pub fn is_keyboard_adjacent_typo(a: &str, b: &str) -> bool {
    let chars_a: Vec<char> = a.chars().collect();
    let chars_b: Vec<char> = b.chars().collect();

    if chars_a.len().abs_diff(chars_b.len()) > 1 {
        return false;
    }

    let mut differences = 0;
    for i in 0..chars_a.len().min(chars_b.len()) {
        let ca = chars_a[i].to_ascii_lowercase();
        let cb = chars_b[i].to_ascii_lowercase();
        if ca != cb {
            differences += 1;
            if differences > 2 {
                return false;
            }
            if !keyboard_neighbors(ca).contains(&cb) {
                return false;
            }
        }
    }

    differences <= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("kitten", "kitten"), 0);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
    }

    #[test]
    fn similarity_identity_and_symmetry() {
        assert_eq!(similarity("badword", "badword"), 1.0);
        assert_eq!(similarity("", ""), 1.0);

        let ab = similarity("badword", "badwrd");
        let ba = similarity("badwrd", "badword");
        assert_eq!(ab, ba);
        assert!(ab > 0.7);
    }

    #[test]
    fn similarity_distinguishes_unrelated_words() {
        assert!(similarity("fuck", "milk") < 0.7);
    }

    #[test]
    fn token_overlap_jaccard() {
        assert_eq!(token_overlap("you are bad", "you are bad"), 1.0);
        assert_eq!(token_overlap("", ""), 1.0);
        assert_eq!(token_overlap("a b", "c d"), 0.0);

        // {spam, now} vs {spam, later}: 1 shared of 3 total
        let overlap = token_overlap("spam now", "spam later");
        assert!((overlap - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn keyboard_typo_detection() {
        // 'u' and 'i' are adjacent
        assert!(is_keyboard_adjacent_typo("fuck", "fick"));
        // identical words trivially pass
        assert!(is_keyboard_adjacent_typo("word", "word"));
        // 'a' and 'k' are nowhere near each other
        assert!(!is_keyboard_adjacent_typo("bad", "bkd"));
        // length gap of 2 disqualifies
        assert!(!is_keyboard_adjacent_typo("abcd", "ab"));
    }
}
