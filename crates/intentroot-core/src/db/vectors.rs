//! Vector encoding and similarity
//!
//! Facet vectors are stored as little-endian f32 BLOBs; similarity is
//! computed in Rust after loading.

/// Encode a vector for the `point_vectors.embedding` column
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for x in embedding {
        bytes.extend_from_slice(&x.to_le_bytes());
    }
    bytes
}

/// Decode a stored BLOB; trailing bytes that do not form an f32 are ignored
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .filter_map(|chunk| chunk.try_into().ok().map(f32::from_le_bytes))
        .collect()
}

/// Cosine similarity in [-1, 1]; 0 for mismatched widths, zero vectors or
/// non-finite components
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    // f64 accumulation keeps large-magnitude vectors from overflowing
    let (dot, aa, bb) = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| (x as f64, y as f64))
        .fold((0.0f64, 0.0f64, 0.0f64), |(dot, aa, bb), (x, y)| {
            (dot + x * y, aa + x * x, bb + y * y)
        });

    let similarity = dot / (aa.sqrt() * bb.sqrt());
    if similarity.is_finite() {
        similarity.clamp(-1.0, 1.0) as f32
    } else {
        0.0
    }
}

/// Element-wise mean; `None` for an empty set or ragged widths
pub fn mean_vector(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let dims = vectors.first()?.len();
    if vectors.iter().any(|v| v.len() != dims) {
        return None;
    }

    let n = vectors.len() as f32;
    Some(
        (0..dims)
            .map(|i| vectors.iter().map(|v| v[i]).sum::<f32>() / n)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_encoding() {
        let original = vec![0.25f32, -3.5, f32::MIN_POSITIVE];
        let bytes = embedding_to_bytes(&original);
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[..4], &0.25f32.to_le_bytes());
        assert_eq!(bytes_to_embedding(&bytes), original);
        assert_eq!(bytes_to_embedding(&bytes[..7]), vec![0.25]);
    }

    #[test]
    fn test_cosine_bounds() {
        assert!((cosine_similarity(&[2.0, 0.0], &[5.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 1.0], &[-1.0, -1.0]) + 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[0.0, 3.0], &[4.0, 0.0]).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::INFINITY, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_large_magnitudes() {
        let big = [1e20f32, 0.0, 0.0];
        assert!((cosine_similarity(&big, &big) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[f32::MAX, f32::MAX], &[1.0, 1.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_mean_vector() {
        let mean = mean_vector(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![2.0, 2.0]]).unwrap();
        assert_eq!(mean, vec![1.0, 1.0]);
        assert!(mean_vector(&[]).is_none());
        assert!(mean_vector(&[vec![1.0], vec![1.0, 2.0]]).is_none());
    }
}
