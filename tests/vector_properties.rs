use mnemo_accel::vector::cosine_similarity_scalar;
use mnemo_accel::{
    cosine_similarity, cosine_similarity_batch, find_duplicates_by_embedding, DuplicatePair, Matrix,
};
use proptest::prelude::*;

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn arb_vector(dim: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-10.0f64..10.0, dim)
}

fn arb_nonzero_vector() -> impl Strategy<Value = Vec<f64>> {
    (1usize..96)
        .prop_flat_map(arb_vector)
        .prop_filter("non-degenerate", |v| norm(v) > 1e-3)
}

fn arb_corpus() -> impl Strategy<Value = (Vec<f64>, Vec<Vec<f64>>)> {
    (1usize..40).prop_flat_map(|dim| {
        (
            arb_vector(dim),
            prop::collection::vec(arb_vector(dim), 0..30),
        )
    })
}

// ── Pairwise cosine ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn self_similarity_is_one(v in arb_nonzero_vector()) {
        prop_assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn opposite_similarity_is_minus_one(v in arb_nonzero_vector()) {
        let negated: Vec<f64> = v.iter().map(|x| -x).collect();
        prop_assert!((cosine_similarity(&v, &negated) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn mismatched_lengths_score_zero(a in arb_nonzero_vector(), extra in -1.0f64..1.0) {
        let mut b = a.clone();
        b.push(extra);
        prop_assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn zero_vector_scores_zero(v in arb_nonzero_vector()) {
        let zero = vec![0.0; v.len()];
        prop_assert_eq!(cosine_similarity(&v, &zero), 0.0);
        prop_assert_eq!(cosine_similarity(&zero, &v), 0.0);
    }

    #[test]
    fn dispatched_matches_scalar_reference(
        (a, b) in (1usize..300).prop_flat_map(|dim| (arb_vector(dim), arb_vector(dim)))
    ) {
        let fast = cosine_similarity(&a, &b);
        let reference = cosine_similarity_scalar(&a, &b);
        prop_assert!((fast - reference).abs() < 1e-12);
        prop_assert!(fast.abs() <= 1.0 + 1e-12);
    }
}

// ── Query vs corpus ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn batch_matches_pairwise((query, rows) in arb_corpus()) {
        let corpus = Matrix::from_rows(&rows).unwrap();
        let scores = cosine_similarity_batch(&query, &corpus.view());
        prop_assert_eq!(scores.len(), rows.len());
        for (row, score) in rows.iter().zip(&scores) {
            prop_assert!((score - cosine_similarity(&query, row)).abs() < 1e-12);
        }
    }

    #[test]
    fn wrong_dimension_query_is_zero_filled((query, rows) in arb_corpus()) {
        let corpus = Matrix::from_rows(&rows).unwrap();
        let mut longer = query.clone();
        longer.push(1.0);
        let scores = cosine_similarity_batch(&longer, &corpus.view());
        prop_assert_eq!(scores, vec![0.0; rows.len()]);
    }
}

// ── All-pairs duplicates ────────────────────────────────────────────────

proptest! {
    #[test]
    fn duplicates_match_brute_force(
        (_, rows) in arb_corpus(),
        threshold in 0.5f64..1.0,
    ) {
        let embeddings = Matrix::from_rows(&rows).unwrap();
        let found = find_duplicates_by_embedding(&embeddings.view(), threshold);

        let mut expected = Vec::new();
        for i in 0..rows.len() {
            for j in (i + 1)..rows.len() {
                if norm(&rows[i]) < 1e-10 || norm(&rows[j]) < 1e-10 {
                    continue;
                }
                let similarity = cosine_similarity(&rows[i], &rows[j]);
                if similarity >= threshold {
                    expected.push(DuplicatePair { i, j, similarity });
                }
            }
        }
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn exact_threshold_finds_copied_rows((_, mut rows) in arb_corpus()) {
        prop_assume!(!rows.is_empty() && norm(&rows[0]) > 1e-3);
        rows.push(rows[0].clone());
        let copy = rows.len() - 1;

        let embeddings = Matrix::from_rows(&rows).unwrap();
        let found = find_duplicates_by_embedding(&embeddings.view(), 1.0);

        prop_assert!(found.iter().all(|p| p.similarity >= 1.0 && p.i < p.j));
        prop_assert!(found.iter().any(|p| p.i == 0 && p.j == copy));
        prop_assert!(found.windows(2).all(|w| (w[0].i, w[0].j) < (w[1].i, w[1].j)));
    }
}

// ── Concrete scenarios ──────────────────────────────────────────────────

#[test]
fn orthogonal_and_parallel_pairs() {
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    assert_eq!(cosine_similarity(&[1.0, 1.0], &[1.0, 1.0]), 1.0);
}

#[test]
fn duplicate_scan_on_tiny_matrix() {
    let embeddings = Matrix::from_rows(&[[1.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap();
    let pairs: Vec<(usize, usize, f64)> = find_duplicates_by_embedding(&embeddings.view(), 0.99)
        .into_iter()
        .map(Into::into)
        .collect();
    assert_eq!(pairs, vec![(0, 1, 1.0)]);
}

#[test]
fn large_duplicate_scan_matches_brute_force() {
    // Enough rows to take the rayon path when `parallel` is enabled.
    let rows: Vec<Vec<f64>> = (0..300)
        .map(|r| {
            let group = r % 23;
            (0..12)
                .map(|d| ((group * 13 + d * 5) % 29) as f64 - 14.0 + if r % 7 == 0 { 0.25 } else { 0.0 })
                .collect()
        })
        .collect();
    let embeddings = Matrix::from_rows(&rows).unwrap();
    let found = find_duplicates_by_embedding(&embeddings.view(), 0.95);

    let mut expected = Vec::new();
    for i in 0..rows.len() {
        for j in (i + 1)..rows.len() {
            let similarity = cosine_similarity(&rows[i], &rows[j]);
            if similarity >= 0.95 {
                expected.push(DuplicatePair { i, j, similarity });
            }
        }
    }
    assert!(expected.len() > 1_000);
    assert_eq!(found, expected);
}

#[test]
fn large_corpus_scores_every_row() {
    let dim = 384;
    let rows: Vec<Vec<f64>> = (0..2_000)
        .map(|r| (0..dim).map(|d| ((r * 31 + d * 7) % 97) as f64 - 48.0).collect())
        .collect();
    let corpus = Matrix::from_rows(&rows).unwrap();
    let scores = cosine_similarity_batch(&rows[17], &corpus.view());
    assert_eq!(scores.len(), rows.len());
    assert!((scores[17] - 1.0).abs() < 1e-12);
    assert!((scores[500] - cosine_similarity(&rows[17], &rows[500])).abs() < 1e-12);
}
