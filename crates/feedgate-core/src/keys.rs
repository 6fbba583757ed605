//! Cache key derivation.
//!
//! Keys are `prefix:hash`, where the hash is a truncated SHA-256 digest
//! of the canonical request signature. Hashing bounds key length and
//! avoids the collision hazards of naive string concatenation.

use crate::dataset::DatasetRequest;
use sha2::{Digest, Sha256};

/// Hex characters kept from the digest.
const KEY_HASH_LEN: usize = 24;

/// Derive the ephemeral-cache key for a request.
///
/// Logically identical requests hash identically regardless of call-site
/// parameter ordering, because [`DatasetRequest::canonical`] serializes
/// parameters in sorted order.
pub fn derive_key(prefix: &str, request: &DatasetRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.canonical().as_bytes());
    let digest = hasher.finalize();
    let hash = hex::encode(&digest[..KEY_HASH_LEN / 2]);
    format!("{prefix}:{hash}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetId;

    #[test]
    fn test_derive_key_shape() {
        let request = DatasetRequest::new(DatasetId::KpxNow)
            .with("page", 1)
            .with("per_page", 10);
        let key = derive_key("energy", &request);
        assert!(key.starts_with("energy:"));
        assert_eq!(key.len(), "energy:".len() + KEY_HASH_LEN);
    }

    #[test]
    fn test_derive_key_order_independent() {
        let a = DatasetRequest::new(DatasetId::Dust)
            .with("date", "2025-03-10")
            .with("station", "Jongno");
        let b = DatasetRequest::new(DatasetId::Dust)
            .with("station", "Jongno")
            .with("date", "2025-03-10");
        assert_eq!(derive_key("dust", &a), derive_key("dust", &b));
    }

    #[test]
    fn test_derive_key_distinguishes_values() {
        let a = DatasetRequest::new(DatasetId::UltraNowcast).with("nx", 60);
        let b = DatasetRequest::new(DatasetId::UltraNowcast).with("nx", 61);
        assert_ne!(derive_key("weather", &a), derive_key("weather", &b));
    }
}
