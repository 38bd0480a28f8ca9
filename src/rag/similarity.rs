pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

/// Returns `(candidate index, score)` for the `top_k` best candidates,
/// highest score first. Equal scores keep candidate order; a non-finite
/// score (overflowed or NaN components) ranks last as negative infinity.
pub fn top_k_by_cosine<'a, I>(query: &[f32], candidates: I, top_k: usize) -> Vec<(usize, f32)>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut scores: Vec<(usize, f32)> = candidates
        .into_iter()
        .enumerate()
        .map(|(idx, candidate)| {
            let score = cosine_similarity(query, candidate);
            (idx, if score.is_finite() { score } else { f32::NEG_INFINITY })
        })
        .collect();

    // sort_by is stable
    scores.sort_by(|left, right| right.1.total_cmp(&left.1));
    scores.truncate(top_k);
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(left: f32, right: f32) -> bool {
        (left - right).abs() < 1e-5
    }

    #[test]
    fn cosine_is_one_for_identical_vectors() {
        let vec = vec![1.0, 2.0, 3.0, 4.0];
        assert!(approx_eq(cosine_similarity(&vec, &vec), 1.0));
    }

    #[test]
    fn cosine_is_zero_for_orthogonal_or_degenerate_vectors() {
        assert!(approx_eq(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0));
        assert!(approx_eq(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0));
        assert!(approx_eq(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0));
    }

    #[test]
    fn ranking_returns_highest_similarity_first() {
        let query = vec![1.0, 0.0];
        let candidates = [vec![0.8, 0.2], vec![0.1, 0.9], vec![0.9, 0.0]];
        let ranked = top_k_by_cosine(&query, candidates.iter().map(Vec::as_slice), 2);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0, 2);
        assert_eq!(ranked[1].0, 0);
    }

    #[test]
    fn ties_keep_candidate_order() {
        let query = vec![1.0, 0.0];
        let candidates = [vec![2.0, 0.0], vec![1.0, 0.0], vec![3.0, 0.0]];
        let ranked = top_k_by_cosine(&query, candidates.iter().map(Vec::as_slice), 3);
        let order: Vec<usize> = ranked.into_iter().map(|(idx, _)| idx).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn non_finite_scores_rank_last() {
        let query = vec![1.0, 1.0];
        let candidates = [
            vec![f32::MAX, f32::MAX],
            vec![1.0, 0.0],
            vec![f32::NAN, 1.0],
            vec![1.0, 1.0],
        ];
        let ranked = top_k_by_cosine(&query, candidates.iter().map(Vec::as_slice), 4);

        let order: Vec<usize> = ranked.iter().map(|(idx, _)| *idx).collect();
        assert_eq!(order, vec![3, 1, 0, 2]);
        assert!(ranked.iter().all(|(_, score)| !score.is_nan()));
        assert_eq!(ranked[2].1, f32::NEG_INFINITY);
    }
}
