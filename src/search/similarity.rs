//! Dense pairwise cosine similarity
//!
//! The matrix is computed eagerly over the whole catalog: O(n^2 * d) time and
//! O(n^2) memory for n items and d vocabulary tokens. That is fine up to a few
//! thousand items. There is no incremental update; new items mean a rebuild.

use super::vectorizer::TagVector;

/// Score used whenever either vector is all-zero (cosine is 0/0 there)
pub const ZERO_VECTOR_SIMILARITY: f32 = 0.0;

/// Cosine similarity between two count vectors
pub fn cosine_similarity(a: &[u32], b: &[u32]) -> f32 {
    // Vectors from one vocabulary always share a length
    debug_assert_eq!(a.len(), b.len(), "vectors from different vocabularies");

    let dot: f64 = a.iter().zip(b).map(|(&x, &y)| x as f64 * y as f64).sum();
    let norm_a = norm(a);
    let norm_b = norm(b);

    if norm_a > 0.0 && norm_b > 0.0 {
        (dot / (norm_a * norm_b)) as f32
    } else {
        ZERO_VECTOR_SIMILARITY
    }
}

fn norm(v: &[u32]) -> f64 {
    v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt()
}

/// Square, symmetric similarity matrix. Row `i` belongs to item `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    scores: Vec<f32>,
}

impl SimilarityMatrix {
    /// Compute all pairwise similarities.
    ///
    /// Only the upper triangle is computed; the lower one is mirrored so the
    /// matrix is exactly symmetric. The diagonal is 1.0 for non-zero vectors.
    pub fn compute(vectors: &[TagVector]) -> Self {
        let size = vectors.len();
        let mut scores = vec![ZERO_VECTOR_SIMILARITY; size * size];

        for i in 0..size {
            let non_zero = vectors[i].iter().any(|&c| c > 0);
            scores[i * size + i] = if non_zero { 1.0 } else { ZERO_VECTOR_SIMILARITY };

            for j in (i + 1)..size {
                let score = cosine_similarity(&vectors[i], &vectors[j]);
                scores[i * size + j] = score;
                scores[j * size + i] = score;
            }
        }

        Self { size, scores }
    }

    /// Rebuild from stored rows. Returns None if the rows are not square.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|r| r.len() != size) {
            return None;
        }
        Some(Self {
            size,
            scores: rows.into_iter().flatten().collect(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.scores[i * self.size + j]
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.scores[i * self.size..(i + 1) * self.size]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectors() -> Vec<TagVector> {
        vec![
            vec![1, 0, 1, 0],
            vec![1, 0, 1, 0],
            vec![0, 1, 0, 1],
            vec![0, 0, 0, 0],
            vec![2, 1, 0, 0],
        ]
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1, 0, 0], &[1, 0, 0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1, 0, 0], &[0, 1, 0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1, 1], &[1, 0]) - 0.70710677).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_fallback() {
        assert_eq!(cosine_similarity(&[0, 0], &[0, 0]), ZERO_VECTOR_SIMILARITY);
        assert_eq!(cosine_similarity(&[0, 0], &[3, 1]), ZERO_VECTOR_SIMILARITY);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "different vocabularies")]
    fn test_length_mismatch_panics_in_debug() {
        cosine_similarity(&[1], &[1, 0]);
    }

    #[test]
    fn test_diagonal() {
        let m = SimilarityMatrix::compute(&vectors());
        for i in 0..m.size() {
            let expected = if i == 3 { 0.0 } else { 1.0 };
            assert_eq!(m.get(i, i), expected);
        }
    }

    #[test]
    fn test_symmetric() {
        let m = SimilarityMatrix::compute(&vectors());
        for i in 0..m.size() {
            for j in 0..m.size() {
                assert_eq!(m.get(i, j), m.get(j, i));
                assert!(!m.get(i, j).is_nan());
            }
        }
    }

    #[test]
    fn test_zero_row_is_all_fallback() {
        let m = SimilarityMatrix::compute(&vectors());
        assert!(m.row(3).iter().all(|&s| s == ZERO_VECTOR_SIMILARITY));
    }

    #[test]
    fn test_from_rows() {
        let m = SimilarityMatrix::compute(&vectors());
        let rows: Vec<Vec<f32>> = (0..m.size()).map(|i| m.row(i).to_vec()).collect();
        assert_eq!(SimilarityMatrix::from_rows(rows), Some(m));
        assert_eq!(SimilarityMatrix::from_rows(vec![vec![1.0, 0.0]]), None);
    }
}
