//! Stable per-profile device identity.
//!
//! A version-4 UUID generated once and persisted under `device_id`; every
//! later call returns the stored value unchanged. Identity generation never
//! fails: if the OS secure-random source is unavailable the id comes from a
//! time-seeded PRNG instead (weaker randomness, same format).

use once_cell::sync::Lazy;
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::flags::{FlagStore, KEY_DEVICE_ID};

/// Whether the OS secure-random source works, probed once at startup.
static SECURE_RANDOM_AVAILABLE: Lazy<bool> = Lazy::new(|| {
    let mut buf = [0u8; 16];
    OsRng.try_fill_bytes(&mut buf).is_ok()
});

/// Returns the device id for this profile, generating and persisting one on
/// first call. Always succeeds; see [`generate_device_id`] for the
/// degraded-randomness path.
pub fn device_id(store: &mut FlagStore) -> String {
    if let Some(id) = store.get(KEY_DEVICE_ID) {
        return id.to_string();
    }
    let id = generate_device_id();
    tracing::info!(device_id = %id, "generated new device id");
    store.set(KEY_DEVICE_ID, &id);
    id
}

/// Generates a fresh v4 UUID string, falling back to a manually constructed
/// v4 from a time-seeded PRNG when secure randomness is unavailable.
pub fn generate_device_id() -> String {
    if *SECURE_RANDOM_AVAILABLE {
        Uuid::new_v4().to_string()
    } else {
        tracing::warn!("secure random unavailable, using time-seeded fallback uuid");
        fallback_v4().to_string()
    }
}

fn fallback_v4() -> Uuid {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x9e37_79b9_7f4a_7c15);
    let mut rng = StdRng::seed_from_u64(nanos ^ u64::from(std::process::id()));
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_device_id_is_stable_across_calls() {
        let mut store = FlagStore::new_in_memory();
        let first = device_id(&mut store);
        let second = device_id(&mut store);
        assert_eq!(first, second);
    }

    #[test]
    fn test_device_id_survives_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");

        let first = device_id(&mut FlagStore::load(&path));
        let second = device_id(&mut FlagStore::load(&path));
        assert_eq!(first, second);
    }

    #[test]
    fn test_generated_id_is_valid_v4_uuid() {
        let id = generate_device_id();
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_fallback_is_valid_v4_uuid() {
        let parsed = fallback_v4();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_distinct_profiles_get_distinct_ids() {
        let a = device_id(&mut FlagStore::new_in_memory());
        let b = device_id(&mut FlagStore::new_in_memory());
        assert_ne!(a, b);
    }
}
