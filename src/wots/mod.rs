// Winternitz One-Time Signature (WOTS+) implementation
//
// Private chain elements are expanded from an address-derived seed, so a key
// pair is never stored: it is regenerated from (master seed, address) on demand.

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::address::TreeAddress;
use crate::crypto::hash::{domain, HashAlgorithm, HashFunction};
use crate::crypto::prg;
use crate::error::XmssError;

/// WOTS+ parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WotsParams {
    w: u32,
    log_w: u32,
    n: usize,
    len1: usize,
    len2: usize,
    hash: HashAlgorithm,
}

impl WotsParams {
    /// `w` is the Winternitz parameter (chain length) and must be 4, 16 or 256.
    pub fn new(w: u32, hash: HashAlgorithm) -> Result<Self, XmssError> {
        let log_w = match w {
            4 => 2,
            16 => 4,
            256 => 8,
            _ => {
                return Err(XmssError::InvalidParameters(format!(
                    "Winternitz parameter {} not in {{4, 16, 256}}",
                    w
                )))
            }
        };
        Ok(Self::with_log_w(log_w, hash))
    }

    pub(crate) fn with_log_w(log_w: u32, hash: HashAlgorithm) -> Self {
        let w = 1u32 << log_w;
        let n = hash.hasher().output_size();
        let len1 = (8 * n).div_ceil(log_w as usize);
        let max_checksum = (len1 as u64) * (w as u64 - 1);
        let len2 = (63 - max_checksum.leading_zeros()) as usize / log_w as usize + 1;

        WotsParams { w, log_w, n, len1, len2, hash }
    }

    pub fn w(&self) -> u32 {
        self.w
    }

    /// Total number of chains (message digits plus checksum digits).
    pub fn chains(&self) -> usize {
        self.len1 + self.len2
    }

    pub fn len1(&self) -> usize {
        self.len1
    }

    pub fn len2(&self) -> usize {
        self.len2
    }

    /// Digest and chain element size in bytes.
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    pub fn max_hash_iterations(&self) -> u32 {
        self.w - 1
    }

    /// Split an n-byte digest into base-w digits and append the checksum digits.
    pub fn message_digits(&self, digest: &[u8]) -> Result<Vec<u32>, XmssError> {
        if digest.len() != self.n {
            return Err(XmssError::MalformedInput(format!(
                "digest length {} != {}",
                digest.len(),
                self.n
            )));
        }

        let mut digits = base_w(digest, self.log_w, self.len1);
        let checksum: u64 = digits.iter().map(|&d| (self.w - 1 - d) as u64).sum();

        let checksum_bits = self.len2 * self.log_w as usize;
        let shifted = checksum << ((8 - checksum_bits % 8) % 8);
        let checksum_bytes = checksum_bits.div_ceil(8);
        let encoded = &shifted.to_be_bytes()[8 - checksum_bytes..];
        digits.extend(base_w(encoded, self.log_w, self.len2));

        Ok(digits)
    }

    /// Regenerate the one-time key pair at `address` (an `OneTimeKey` address).
    pub fn generate_keypair(
        &self,
        master_seed: &[u8],
        public_seed: &[u8],
        address: &TreeAddress,
        tree_height: u32,
    ) -> Result<WotsKeypair, XmssError> {
        let hasher = self.hash.hasher();
        let leaf_seed = Zeroizing::new(prg::derive_seed(
            hasher.as_ref(),
            master_seed,
            address,
            tree_height,
        )?);
        let expanded = Zeroizing::new(prg::expand(&leaf_seed, self.chains() * self.n));

        let sk_chains: Vec<Vec<u8>> = expanded.chunks(self.n).map(|c| c.to_vec()).collect();
        let pk_chains = sk_chains
            .iter()
            .enumerate()
            .map(|(i, sk_i)| {
                chain(
                    hasher.as_ref(),
                    sk_i,
                    0,
                    self.w - 1,
                    public_seed,
                    &address.chain(i as u32),
                )
            })
            .collect();

        Ok(WotsKeypair {
            public_key: WotsPublicKey { chains: pk_chains, params: *self },
            secret_key: WotsSecretKey { chains: sk_chains },
            params: *self,
            public_seed: public_seed.to_vec(),
            address: *address,
        })
    }

    /// Recompute the public key a signature commits to.
    pub fn public_key_from_signature(
        &self,
        digest: &[u8],
        signature: &WotsSignature,
        public_seed: &[u8],
        address: &TreeAddress,
    ) -> Result<WotsPublicKey, XmssError> {
        if signature.chains.len() != self.chains()
            || signature.chains.iter().any(|c| c.len() != self.n)
        {
            return Err(XmssError::MalformedInput(format!(
                "WOTS+ signature must hold {} chains of {} bytes",
                self.chains(),
                self.n
            )));
        }

        let hasher = self.hash.hasher();
        let digits = self.message_digits(digest)?;
        let chains = signature
            .chains
            .iter()
            .zip(&digits)
            .enumerate()
            .map(|(i, (sig_i, &d))| {
                chain(
                    hasher.as_ref(),
                    sig_i,
                    d,
                    self.w - 1 - d,
                    public_seed,
                    &address.chain(i as u32),
                )
            })
            .collect();

        Ok(WotsPublicKey { chains, params: *self })
    }

    /// True iff `signature` on `digest` recomputes to `expected`.
    pub fn verify(
        &self,
        digest: &[u8],
        signature: &WotsSignature,
        public_seed: &[u8],
        address: &TreeAddress,
        expected: &WotsPublicKey,
    ) -> bool {
        match self.public_key_from_signature(digest, signature, public_seed, address) {
            Ok(pk) => pk == *expected,
            Err(_) => false,
        }
    }
}

/// WOTS+ public key (the chain tips)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WotsPublicKey {
    chains: Vec<Vec<u8>>,
    params: WotsParams,
}

impl WotsPublicKey {
    pub fn chains(&self) -> &[Vec<u8>] {
        &self.chains
    }

    pub fn params(&self) -> &WotsParams {
        &self.params
    }

    /// Compress the chain tips into the Merkle leaf for `address`.
    pub fn leaf_hash(&self, public_seed: &[u8], address: &TreeAddress) -> Vec<u8> {
        let leaf_address =
            TreeAddress::leaf_compression(address.layer, address.subtree, address.leaf_index);
        let address_bytes = leaf_address.to_bytes();

        let mut parts: Vec<&[u8]> = Vec::with_capacity(self.chains.len() + 3);
        parts.push(&[domain::LEAF]);
        parts.push(public_seed);
        parts.push(&address_bytes);
        parts.extend(self.chains.iter().map(|c| c.as_slice()));

        self.params.hash.hasher().hash_parts(&parts)
    }
}

/// WOTS+ secret key
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct WotsSecretKey {
    chains: Vec<Vec<u8>>,
}

impl WotsSecretKey {
    pub fn chains(&self) -> &[Vec<u8>] {
        &self.chains
    }
}

/// WOTS+ key pair bound to the address it was derived for
pub struct WotsKeypair {
    public_key: WotsPublicKey,
    secret_key: WotsSecretKey,
    params: WotsParams,
    public_seed: Vec<u8>,
    address: TreeAddress,
}

impl WotsKeypair {
    pub fn public_key(&self) -> &WotsPublicKey {
        &self.public_key
    }

    pub fn secret_key(&self) -> &WotsSecretKey {
        &self.secret_key
    }

    pub fn address(&self) -> &TreeAddress {
        &self.address
    }

    /// Sign an n-byte digest
    pub fn sign(&self, digest: &[u8]) -> Result<WotsSignature, XmssError> {
        let hasher = self.params.hash.hasher();
        let digits = self.params.message_digits(digest)?;

        let chains = self
            .secret_key
            .chains
            .iter()
            .zip(&digits)
            .enumerate()
            .map(|(i, (sk_i, &d))| {
                chain(
                    hasher.as_ref(),
                    sk_i,
                    0,
                    d,
                    &self.public_seed,
                    &self.address.chain(i as u32),
                )
            })
            .collect();

        Ok(WotsSignature { chains })
    }

    /// Leaf value of this key in its Merkle tree.
    pub fn leaf_hash(&self) -> Vec<u8> {
        self.public_key.leaf_hash(&self.public_seed, &self.address)
    }
}

/// WOTS+ signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WotsSignature {
    chains: Vec<Vec<u8>>,
}

impl WotsSignature {
    pub fn from_chains(chains: Vec<Vec<u8>>) -> Self {
        WotsSignature { chains }
    }

    pub fn chains(&self) -> &[Vec<u8>] {
        &self.chains
    }
}

/// Apply `steps` chain hashes to `input`, starting at chain position `start`.
///
/// Each step is keyed by the public seed and its own hash-index address.
pub fn chain(
    hasher: &dyn HashFunction,
    input: &[u8],
    start: u32,
    steps: u32,
    public_seed: &[u8],
    chain_address: &TreeAddress,
) -> Vec<u8> {
    let mut result = input.to_vec();
    for j in start..start + steps {
        let address = chain_address.with_hash_index(j).to_bytes();
        result = hasher.hash_parts(&[&[domain::CHAIN], public_seed, &address, &result]);
    }
    result
}

/// Read `out_len` base-2^`log_w` digits from `bytes`, most significant first.
fn base_w(bytes: &[u8], log_w: u32, out_len: usize) -> Vec<u32> {
    let mut result = Vec::with_capacity(out_len);
    let mut total = 0u32;
    let mut bits = 0u32;
    let mut consumed = 0;
    let mask = (1u32 << log_w) - 1;

    while result.len() < out_len {
        if bits == 0 {
            total = bytes.get(consumed).copied().unwrap_or(0) as u32;
            consumed += 1;
            bits = 8;
        }
        bits -= log_w;
        result.push((total >> bits) & mask);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params() -> WotsParams {
        WotsParams::new(16, HashAlgorithm::Sha256).unwrap()
    }

    #[test]
    fn test_chain_counts() {
        let p = params();
        assert_eq!((p.len1(), p.len2(), p.chains()), (64, 3, 67));

        let p4 = WotsParams::new(4, HashAlgorithm::Sha256).unwrap();
        assert_eq!((p4.len1(), p4.len2()), (128, 5));

        let p256 = WotsParams::new(256, HashAlgorithm::Sha3_256).unwrap();
        assert_eq!((p256.len1(), p256.len2()), (32, 2));

        assert!(WotsParams::new(8, HashAlgorithm::Sha256).is_err());
    }

    #[test]
    fn test_base_w_msb_first() {
        assert_eq!(base_w(&[0x12, 0x34], 4, 4), vec![1, 2, 3, 4]);
        assert_eq!(base_w(&[0b1110_0100], 2, 4), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_checksum_of_zero_digest_is_maximal() {
        let p = params();
        let digits = p.message_digits(&[0u8; 32]).unwrap();
        // checksum = 64 * 15 = 960 = 0x3c0, encoded in three base-16 digits
        assert_eq!(&digits[64..], &[3, 12, 0]);
    }

    #[test]
    fn test_message_digits_rejects_wrong_length() {
        assert!(matches!(
            params().message_digits(&[0u8; 31]),
            Err(XmssError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_keygen_is_deterministic() {
        let p = params();
        let addr = TreeAddress::one_time_key(0, 0, 3);
        let a = p.generate_keypair(&[5u8; 32], &[6u8; 32], &addr, 4).unwrap();
        let b = p.generate_keypair(&[5u8; 32], &[6u8; 32], &addr, 4).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.secret_key().chains(), b.secret_key().chains());

        let other = p
            .generate_keypair(&[5u8; 32], &[6u8; 32], &TreeAddress::one_time_key(0, 0, 4), 4)
            .unwrap();
        assert_ne!(a.public_key(), other.public_key());
    }

    #[test]
    fn test_wrong_digest_does_not_verify() {
        let p = params();
        let addr = TreeAddress::one_time_key(1, 2, 0);
        let kp = p.generate_keypair(&[1u8; 32], &[2u8; 32], &addr, 2).unwrap();
        let sig = kp.sign(&[0xaa; 32]).unwrap();
        assert!(!p.verify(&[0xab; 32], &sig, &[2u8; 32], &addr, kp.public_key()));
    }

    #[test]
    fn test_wrong_address_does_not_verify() {
        let p = params();
        let addr = TreeAddress::one_time_key(0, 0, 1);
        let kp = p.generate_keypair(&[1u8; 32], &[2u8; 32], &addr, 2).unwrap();
        let sig = kp.sign(&[0x55; 32]).unwrap();
        let moved = TreeAddress::one_time_key(0, 0, 2);
        assert!(!p.verify(&[0x55; 32], &sig, &[2u8; 32], &moved, kp.public_key()));
    }

    #[test]
    fn test_truncated_signature_is_malformed() {
        let p = params();
        let addr = TreeAddress::one_time_key(0, 0, 0);
        let kp = p.generate_keypair(&[1u8; 32], &[2u8; 32], &addr, 1).unwrap();
        let mut chains = kp.sign(&[0u8; 32]).unwrap().chains().to_vec();
        chains.pop();
        let result =
            p.public_key_from_signature(&[0u8; 32], &WotsSignature::from_chains(chains), &[2u8; 32], &addr);
        assert!(matches!(result, Err(XmssError::MalformedInput(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_signature_recovers_public_key(
            seed in proptest::array::uniform32(any::<u8>()),
            digest in proptest::array::uniform32(any::<u8>()),
            leaf in 0u32..16,
        ) {
            let p = params();
            let addr = TreeAddress::one_time_key(0, 7, leaf);
            let kp = p.generate_keypair(&seed, &[9u8; 32], &addr, 4).unwrap();
            let sig = kp.sign(&digest).unwrap();
            let recovered = p.public_key_from_signature(&digest, &sig, &[9u8; 32], &addr).unwrap();
            prop_assert_eq!(&recovered, kp.public_key());
        }
    }
}
