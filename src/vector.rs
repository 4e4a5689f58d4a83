use serde::Serialize;

use crate::capability;
use crate::matrix::MatrixView;

/// Norms below this are treated as a zero vector.
pub const ZERO_NORM_EPSILON: f64 = 1e-10;

/// Use rayon only for larger corpora.
#[cfg(feature = "parallel")]
const PARALLEL_MIN_ROWS: usize = 256;

/// A pair of near-duplicate rows, `i < j`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DuplicatePair {
    pub i: usize,
    pub j: usize,
    pub similarity: f64,
}

impl From<DuplicatePair> for (usize, usize, f64) {
    fn from(pair: DuplicatePair) -> Self {
        (pair.i, pair.j, pair.similarity)
    }
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when the lengths differ, either vector is empty, or either norm
/// is numerically zero.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let (dot, norm_a_sq, norm_b_sq) = kernel::dot_and_norms(a, b);
    cosine_from_parts(dot, norm_a_sq, norm_b_sq)
}

/// Plain-loop reference for [`cosine_similarity`].
pub fn cosine_similarity_scalar(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let (dot, norm_a_sq, norm_b_sq) = kernel::dot_and_norms_scalar(a, b);
    cosine_from_parts(dot, norm_a_sq, norm_b_sq)
}

/// Takes squared norms; `sqrt(x * x) == x` keeps `cos(v, v)` at exactly 1.0.
#[inline]
fn cosine_from_parts(dot: f64, norm_a_sq: f64, norm_b_sq: f64) -> f64 {
    if norm_a_sq.sqrt() < ZERO_NORM_EPSILON || norm_b_sq.sqrt() < ZERO_NORM_EPSILON {
        return 0.0;
    }
    let result = dot / norm_product(norm_a_sq, norm_b_sq);
    if result.is_finite() {
        result
    } else {
        0.0
    }
}

/// Cosine similarity of one query vector against every corpus row.
///
/// The query norm is computed once. A query of the wrong dimension or with a
/// zero norm scores 0.0 against every row.
pub fn cosine_similarity_batch(query: &[f64], corpus: &MatrixView<'_>) -> Vec<f64> {
    let rows = corpus.nrows();
    tracing::debug!(
        rows,
        dim = corpus.dim(),
        vectorized = capability::vectorized_path_active(),
        "cosine batch"
    );

    if query.is_empty() || query.len() != corpus.dim() {
        return vec![0.0; rows];
    }

    // Pre-compute query norm once
    let query_norm_sq = kernel::squared_norm(query);
    if query_norm_sq.sqrt() < ZERO_NORM_EPSILON {
        return vec![0.0; rows];
    }

    let score = |row: &[f64]| {
        let (dot, row_norm_sq) = kernel::dot_and_norm(query, row);
        cosine_from_parts(dot, query_norm_sq, row_norm_sq)
    };

    #[cfg(feature = "parallel")]
    if rows >= PARALLEL_MIN_ROWS {
        use rayon::prelude::*;
        return (0..rows)
            .into_par_iter()
            .map(|i| score(corpus.row(i)))
            .collect();
    }

    corpus.rows().map(score).collect()
}

/// All pairs `i < j` whose cosine similarity reaches `threshold` (inclusive).
///
/// Output is ordered by `i`, then `j`. Rows with a numerically zero norm never
/// pair with anything.
pub fn find_duplicates_by_embedding(embeddings: &MatrixView<'_>, threshold: f64) -> Vec<DuplicatePair> {
    let rows = embeddings.nrows();
    let norms_sq: Vec<f64> = embeddings.rows().map(kernel::squared_norm).collect();

    #[cfg(feature = "parallel")]
    let duplicates: Vec<DuplicatePair> = if rows >= PARALLEL_MIN_ROWS {
        use rayon::prelude::*;
        (0..rows)
            .into_par_iter()
            .flat_map_iter(|i| row_duplicates(*embeddings, &norms_sq, i, threshold))
            .collect()
    } else {
        (0..rows)
            .flat_map(|i| row_duplicates(*embeddings, &norms_sq, i, threshold))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let duplicates: Vec<DuplicatePair> = (0..rows)
        .flat_map(|i| row_duplicates(*embeddings, &norms_sq, i, threshold))
        .collect();

    tracing::debug!(
        rows,
        dim = embeddings.dim(),
        pairs = duplicates.len(),
        threshold,
        "embedding duplicate scan"
    );
    duplicates
}

fn row_duplicates<'a>(
    embeddings: MatrixView<'a>,
    norms_sq: &'a [f64],
    i: usize,
    threshold: f64,
) -> impl Iterator<Item = DuplicatePair> + 'a {
    let rows = norms_sq.len();
    let start = if is_zero_norm(norms_sq[i]) { rows } else { i + 1 };
    let vec_i = embeddings.row(i);

    (start..rows).filter_map(move |j| {
        if is_zero_norm(norms_sq[j]) {
            return None;
        }
        let dot = kernel::dot(vec_i, embeddings.row(j));
        let similarity = dot / norm_product(norms_sq[i], norms_sq[j]);
        (similarity >= threshold).then_some(DuplicatePair { i, j, similarity })
    })
}

/// `‖a‖ · ‖b‖` from squared norms. Falls back to separate roots when the
/// squared product overflows.
#[inline]
fn norm_product(norm_a_sq: f64, norm_b_sq: f64) -> f64 {
    let product = norm_a_sq * norm_b_sq;
    if product.is_finite() {
        product.sqrt()
    } else {
        norm_a_sq.sqrt() * norm_b_sq.sqrt()
    }
}

#[inline]
fn is_zero_norm(norm_sq: f64) -> bool {
    norm_sq.sqrt() < ZERO_NORM_EPSILON
}

/// Dot products and squared norms, dispatched to AVX2 when available.
mod kernel {
    #[cfg(target_arch = "x86_64")]
    use crate::capability;

    pub(super) fn dot(a: &[f64], b: &[f64]) -> f64 {
        #[cfg(target_arch = "x86_64")]
        if capability::has_avx2() {
            // SAFETY: AVX2 support was detected at runtime just above.
            return unsafe { avx2::dot(a, b) };
        }
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    pub(super) fn squared_norm(v: &[f64]) -> f64 {
        dot(v, v)
    }

    /// `(a·b, b·b)`
    pub(super) fn dot_and_norm(a: &[f64], b: &[f64]) -> (f64, f64) {
        #[cfg(target_arch = "x86_64")]
        if capability::has_avx2() {
            // SAFETY: AVX2 support was detected at runtime just above.
            return unsafe { avx2::dot_and_norm(a, b) };
        }
        let mut dot = 0.0_f64;
        let mut norm_b = 0.0_f64;
        for (x, y) in a.iter().zip(b) {
            dot += x * y;
            norm_b += y * y;
        }
        (dot, norm_b)
    }

    /// `(a·b, a·a, b·b)`
    pub(super) fn dot_and_norms(a: &[f64], b: &[f64]) -> (f64, f64, f64) {
        #[cfg(target_arch = "x86_64")]
        if capability::has_avx2() {
            // SAFETY: AVX2 support was detected at runtime just above.
            return unsafe { avx2::dot_and_norms(a, b) };
        }
        dot_and_norms_scalar(a, b)
    }

    pub(super) fn dot_and_norms_scalar(a: &[f64], b: &[f64]) -> (f64, f64, f64) {
        let mut dot = 0.0_f64;
        let mut norm_a = 0.0_f64;
        let mut norm_b = 0.0_f64;
        for (x, y) in a.iter().zip(b) {
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
        }
        (dot, norm_a, norm_b)
    }

    #[cfg(target_arch = "x86_64")]
    mod avx2 {
        use std::arch::x86_64::*;

        const LANES: usize = 4;

        /// # Safety
        /// Caller must ensure AVX2 is available.
        #[inline]
        #[target_feature(enable = "avx2")]
        unsafe fn hsum(v: __m256d) -> f64 {
            let mut tmp = [0.0; LANES];
            _mm256_storeu_pd(tmp.as_mut_ptr(), v);
            tmp[0] + tmp[1] + tmp[2] + tmp[3]
        }

        /// # Safety
        /// Caller must ensure AVX2 is available.
        #[target_feature(enable = "avx2")]
        pub(super) unsafe fn dot(a: &[f64], b: &[f64]) -> f64 {
            let n = a.len().min(b.len());
            let mut sum = _mm256_setzero_pd();
            let mut i = 0;
            while i + LANES <= n {
                let va = _mm256_loadu_pd(a.as_ptr().add(i));
                let vb = _mm256_loadu_pd(b.as_ptr().add(i));
                sum = _mm256_add_pd(sum, _mm256_mul_pd(va, vb));
                i += LANES;
            }
            let mut dot = hsum(sum);
            for k in i..n {
                dot += a[k] * b[k];
            }
            dot
        }

        /// # Safety
        /// Caller must ensure AVX2 is available.
        #[target_feature(enable = "avx2")]
        pub(super) unsafe fn dot_and_norm(a: &[f64], b: &[f64]) -> (f64, f64) {
            let n = a.len().min(b.len());
            let mut sum_dot = _mm256_setzero_pd();
            let mut sum_norm = _mm256_setzero_pd();
            let mut i = 0;
            while i + LANES <= n {
                let va = _mm256_loadu_pd(a.as_ptr().add(i));
                let vb = _mm256_loadu_pd(b.as_ptr().add(i));
                sum_dot = _mm256_add_pd(sum_dot, _mm256_mul_pd(va, vb));
                sum_norm = _mm256_add_pd(sum_norm, _mm256_mul_pd(vb, vb));
                i += LANES;
            }
            let mut dot = hsum(sum_dot);
            let mut norm = hsum(sum_norm);
            for k in i..n {
                dot += a[k] * b[k];
                norm += b[k] * b[k];
            }
            (dot, norm)
        }

        /// # Safety
        /// Caller must ensure AVX2 is available.
        #[target_feature(enable = "avx2")]
        pub(super) unsafe fn dot_and_norms(a: &[f64], b: &[f64]) -> (f64, f64, f64) {
            let n = a.len().min(b.len());
            let mut sum_dot = _mm256_setzero_pd();
            let mut sum_a = _mm256_setzero_pd();
            let mut sum_b = _mm256_setzero_pd();
            let mut i = 0;
            while i + LANES <= n {
                let va = _mm256_loadu_pd(a.as_ptr().add(i));
                let vb = _mm256_loadu_pd(b.as_ptr().add(i));
                sum_dot = _mm256_add_pd(sum_dot, _mm256_mul_pd(va, vb));
                sum_a = _mm256_add_pd(sum_a, _mm256_mul_pd(va, va));
                sum_b = _mm256_add_pd(sum_b, _mm256_mul_pd(vb, vb));
                i += LANES;
            }
            let mut dot = hsum(sum_dot);
            let mut norm_a = hsum(sum_a);
            let mut norm_b = hsum(sum_b);
            for k in i..n {
                dot += a[k] * b[k];
                norm_a += a[k] * a[k];
                norm_b += b[k] * b[k];
            }
            (dot, norm_a, norm_b)
        }
    }
}
