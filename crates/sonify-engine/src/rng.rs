//! Deterministic RNG using PCG32 with BLAKE3 seed derivation.
//!
//! Every randomized choice in the pipeline (tie-breaks, synthetic motif
//! generation) flows through a job-local generator seeded from the job's
//! fingerprint; no global RNG is ever consulted.

use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Creates a PCG32 RNG from a 64-bit seed.
pub fn create_rng(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

/// Derives the job-local base seed from its fingerprint hex string and an
/// optional caller-supplied override.
pub fn job_seed(fingerprint: &str, override_seed: Option<u64>) -> u64 {
    if let Some(s) = override_seed {
        return s;
    }
    let hash = blake3::hash(fingerprint.as_bytes());
    let bytes: [u8; 8] = hash.as_bytes()[0..8].try_into().unwrap();
    u64::from_le_bytes(bytes)
}

/// Derives an independent sub-seed for a named component (e.g. a specific
/// section index or selector stage) from the job seed.
pub fn derive_seed(base_seed: u64, key: &str) -> u64 {
    let mut input = Vec::with_capacity(8 + key.len());
    input.extend_from_slice(&base_seed.to_le_bytes());
    input.extend_from_slice(key.as_bytes());
    let hash = blake3::hash(&input);
    let bytes: [u8; 8] = hash.as_bytes()[0..8].try_into().unwrap();
    u64::from_le_bytes(bytes)
}

/// A stable hash used for tie-breaking, combining a motif id with the job
/// fingerprint so ties resolve deterministically but differently per job.
pub fn stable_tiebreak(motif_id: &str, fingerprint: &str) -> u64 {
    let mut input = Vec::with_capacity(motif_id.len() + fingerprint.len() + 1);
    input.extend_from_slice(motif_id.as_bytes());
    input.push(0);
    input.extend_from_slice(fingerprint.as_bytes());
    let hash = blake3::hash(&input);
    let bytes: [u8; 8] = hash.as_bytes()[0..8].try_into().unwrap();
    u64::from_le_bytes(bytes)
}
