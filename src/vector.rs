// ABOUTME: Vector codec and cosine similarity for stored embeddings
// ABOUTME: Embeddings persist as canonical comma-delimited text

use crate::{Error, Result};

/// Serializes a vector to its canonical text form. `f32` Display produces
/// the shortest representation that parses back to the same value, so
/// `decode(encode(v)) == v`.
pub fn encode(vector: &[f32]) -> String {
    let mut out = String::with_capacity(vector.len() * 10);
    for (i, v) in vector.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out
}

/// Parses the canonical text form back into a vector. An empty string is an
/// empty vector, never an error.
pub fn decode(encoded: &str) -> Result<Vec<f32>> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Ok(Vec::new());
    }

    encoded
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|e| Error::Embedding(format!("invalid vector component {:?}: {}", part, e)))
        })
        .collect()
}

/// Cosine similarity between two equal-length vectors. A zero-magnitude
/// vector is treated as maximally dissimilar (0.0) rather than producing NaN.
pub fn cosine(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a * norm_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let v = vec![0.1, -2.5, 3.14159, 0.0, 1e-7];
        let decoded = decode(&encode(&v)).unwrap();
        assert_eq!(decoded, v);
    }

    #[test]
    fn test_decode_empty_is_empty_vector() {
        assert_eq!(decode("").unwrap(), Vec::<f32>::new());
        assert_eq!(decode("   ").unwrap(), Vec::<f32>::new());
    }

    #[test]
    fn test_decode_tolerates_spaces() {
        assert_eq!(decode("1.0, 2.0, 3.0").unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("1.0,abc,3.0").is_err());
    }

    #[test]
    fn test_cosine_identical() {
        let a = vec![1.0, 2.0, 3.0];
        let sim = cosine(&a, &a).unwrap();
        assert!((sim - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!((cosine(&a, &b).unwrap() - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_symmetric() {
        let a = vec![0.3, 0.7, 0.1];
        let b = vec![0.9, 0.2, 0.5];
        assert_eq!(cosine(&a, &b).unwrap(), cosine(&b, &a).unwrap());
    }

    #[test]
    fn test_cosine_zero_magnitude() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        match cosine(&a, &b) {
            Err(Error::DimensionMismatch { expected, actual }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("expected DimensionMismatch, got {:?}", other.map(|_| ())),
        }
    }
}
