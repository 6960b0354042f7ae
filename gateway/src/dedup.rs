//! Structural fingerprints for update deduplication.
//!
//! Relaying an update twice wastes every connected client's bandwidth, but
//! a full deep hash of an arbitrarily large payload would stall the relay.
//! The fingerprint therefore covers only the key set: key count, first
//! key, and an FNV-1a checksum over the sorted keys — O(total key bytes),
//! never O(payload). Two consecutive updates touching the same key set
//! with different values fingerprint identically and the second is
//! suppressed; repeated diffs for the same keys in immediate succession
//! are overwhelmingly resends, so this is an accepted approximation.
//! Updates touching different key sets can never be suppressed.

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Cheap structural fingerprint of an update payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateFingerprint {
    key_count: usize,
    first_key: Option<String>,
    key_checksum: u64,
}

impl UpdateFingerprint {
    /// Fingerprint a payload. Non-object payloads (which the deduplicated
    /// topics never carry) collapse to the empty fingerprint.
    pub fn of(payload: &serde_json::Value) -> Self {
        let Some(map) = payload.as_object() else {
            return Self {
                key_count: 0,
                first_key: None,
                key_checksum: FNV_OFFSET,
            };
        };

        let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
        keys.sort_unstable();

        let mut checksum = FNV_OFFSET;
        for key in &keys {
            for byte in key.bytes() {
                checksum ^= u64::from(byte);
                checksum = checksum.wrapping_mul(FNV_PRIME);
            }
            // Separator so ["ab","c"] and ["a","bc"] differ.
            checksum ^= 0xff;
            checksum = checksum.wrapping_mul(FNV_PRIME);
        }

        Self {
            key_count: keys.len(),
            first_key: keys.first().map(|key| key.to_string()),
            key_checksum: checksum,
        }
    }
}
