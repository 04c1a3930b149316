//! Deterministic fingerprints for evaluation snapshots.

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a hasher. Not cryptographic; only identifies a snapshot in logs.
#[derive(Copy, Clone, Debug)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Create a new hash state with the FNV offset basis.
    pub fn new() -> Self {
        Self(FNV_OFFSET)
    }

    /// Feed bytes into the hash function.
    pub fn update(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = (self.0 ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
        }
    }

    /// Feed a float by its bit pattern, so `0.1` and `0.10000001` differ.
    pub fn update_f64(&mut self, value: f64) {
        self.update(&value.to_bits().to_le_bytes());
    }

    pub fn finish(&self) -> u64 {
        self.0
    }

    /// Finalise the hash and return a 16-character lowercase hex string.
    pub fn finish_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reference_vectors() {
        assert_eq!(Fingerprint::new().finish(), 0xcbf2_9ce4_8422_2325);
        let mut h = Fingerprint::new();
        h.update(b"a");
        assert_eq!(h.finish(), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn floats_hash_by_bits() {
        let mut a = Fingerprint::new();
        a.update_f64(0.5);
        let mut b = Fingerprint::new();
        b.update_f64(0.5000001);
        assert_ne!(a.finish_hex(), b.finish_hex());
        assert_eq!(a.finish_hex().len(), 16);
    }
}
