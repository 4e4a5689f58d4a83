use crate::vector::DuplicatePair;

/// Edit distance over Unicode scalar values, using two rolling rows.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    edit_distance(&a, &b)
}

fn edit_distance(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1) // deletion
                .min(curr[j] + 1) // insertion
                .min(prev[j] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Normalized similarity in [0, 1]: `1 - distance / max_len`. Two empty strings are identical.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    similarity(&a, &b)
}

fn similarity(a: &[char], b: &[char]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f64 / max_len as f64
}

/// All pairs `i < j` with `string_similarity >= threshold`, in loop order.
///
/// A pair is skipped without computing its distance when `min_len / max_len`
/// (the best similarity it could reach) is already below the threshold.
pub fn find_string_duplicates<S: AsRef<str>>(strings: &[S], threshold: f64) -> Vec<DuplicatePair> {
    let decoded: Vec<Vec<char>> = strings.iter().map(|s| s.as_ref().chars().collect()).collect();
    let mut duplicates = Vec::new();
    let mut pruned = 0usize;

    for (i, a) in decoded.iter().enumerate() {
        for (j, b) in decoded.iter().enumerate().skip(i + 1) {
            let max_len = a.len().max(b.len());
            let min_len = a.len().min(b.len());
            if max_len > 0 && (min_len as f64 / max_len as f64) < threshold {
                pruned += 1;
                continue;
            }

            let sim = similarity(a, b);
            if sim >= threshold {
                duplicates.push(DuplicatePair {
                    i,
                    j,
                    similarity: sim,
                });
            }
        }
    }

    tracing::debug!(
        strings = decoded.len(),
        pruned,
        pairs = duplicates.len(),
        "string duplicate scan"
    );
    duplicates
}

/// Similarity of `query` against each target, in target order.
pub fn string_similarity_batch<S: AsRef<str>>(query: &str, targets: &[S]) -> Vec<f64> {
    let query: Vec<char> = query.chars().collect();
    targets
        .iter()
        .map(|target| {
            let target: Vec<char> = target.as_ref().chars().collect();
            similarity(&query, &target)
        })
        .collect()
}
