//! Address-keyed seed derivation and seed expansion.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha12Rng;

use crate::address::TreeAddress;
use crate::crypto::hash::HashFunction;
use crate::error::XmssError;

pub const SEED_BYTES: usize = 32;

/// Derive the seed of the one-time key at `address`.
///
/// Hashes `master_seed || LE64(address.seed_word(tree_height))`.
pub fn derive_seed(
    hasher: &dyn HashFunction,
    master_seed: &[u8],
    address: &TreeAddress,
    tree_height: u32,
) -> Result<[u8; SEED_BYTES], XmssError> {
    let word = address.seed_word(tree_height)?;
    let digest = hasher.hash_parts(&[master_seed, &word.to_le_bytes()]);
    digest.as_slice().try_into().map_err(|_| {
        XmssError::InvalidParameters(format!(
            "hash output of {} bytes cannot key the stream generator",
            digest.len()
        ))
    })
}

/// Expand `seed` into `length` pseudorandom bytes.
///
/// ChaCha12 keystream under `seed` with an all-zero nonce. A seed must only
/// ever be expanded for a single purpose.
pub fn expand(seed: &[u8; SEED_BYTES], length: usize) -> Vec<u8> {
    let mut rng = ChaCha12Rng::from_seed(*seed);
    let mut out = vec![0u8; length];
    rng.fill_bytes(&mut out);
    out
}
