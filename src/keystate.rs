//! Private and public key state and its byte encoding.
//!
//! Private state layout: `index (u64 BE) || master_seed || public_seed || root`.
//! Public state layout: `root || public_seed`.
//!
//! Byte-exact round trip is guaranteed here. Keeping the stored index
//! monotonic across restarts is the host's job: persist through a
//! [`StateStore`] before releasing signatures and pass the last index seen to
//! [`import_private_guarded`] when reloading.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::prg::{self, SEED_BYTES};
use crate::error::XmssError;
use crate::xmss::core::ParameterSet;

const INDEX_BYTES: usize = 8;

/// Signer-owned state. Only signing mutates it, by advancing `index`.
///
/// Not `Clone`: a second signer over the same key can only come from the
/// exported bytes, never from a live key pair.
///
/// ```compile_fail
/// use xmss_state::crypto::hash::HashAlgorithm;
/// use xmss_state::xmss::{XMSSKeypair, XMSSParams};
///
/// let params = XMSSParams::new(2, 16, HashAlgorithm::Sha256).unwrap();
/// let keypair = XMSSKeypair::generate_from_seed(&params, &[0u8; 32]).unwrap();
/// let twin = XMSSKeypair::restore(&params, keypair.private_key().clone(), None);
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKeyState {
    index: u64,
    master_seed: Vec<u8>,
    prf_seed: Vec<u8>,
    public_seed: Vec<u8>,
    root: Vec<u8>,
}

impl PrivateKeyState {
    /// State for a key whose tree over `master_seed` has root `root`.
    ///
    /// The message PRF key and the public seed are expanded from the master seed.
    pub fn new(master_seed: &[u8], root: Vec<u8>, index: u64) -> Result<Self, XmssError> {
        let (prf_seed, public_seed) = derive_seeds(master_seed)?;
        Ok(PrivateKeyState {
            index,
            master_seed: master_seed.to_vec(),
            prf_seed: prf_seed.to_vec(),
            public_seed,
            root,
        })
    }

    /// Public half of this key.
    pub fn public_state(&self) -> PublicKeyState {
        PublicKeyState::new(self.root.clone(), self.public_seed.clone())
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn master_seed(&self) -> &[u8] {
        &self.master_seed
    }

    pub fn prf_seed(&self) -> &[u8] {
        &self.prf_seed
    }

    pub fn public_seed(&self) -> &[u8] {
        &self.public_seed
    }

    pub fn root(&self) -> &[u8] {
        &self.root
    }

    /// Consume the current index, returning it.
    pub(crate) fn advance_index(&mut self) -> u64 {
        let used = self.index;
        self.index += 1;
        used
    }
}

impl PartialEq for PrivateKeyState {
    fn eq(&self, other: &Self) -> bool {
        let secrets_match = self.master_seed.ct_eq(&other.master_seed)
            & self.prf_seed.ct_eq(&other.prf_seed);
        self.index == other.index
            && bool::from(secrets_match)
            && self.public_seed == other.public_seed
            && self.root == other.root
    }
}

impl Eq for PrivateKeyState {}

impl fmt::Debug for PrivateKeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyState")
            .field("index", &self.index)
            .field("master_seed", &"<redacted>")
            .field("public_seed", &self.public_seed)
            .field("root", &self.root)
            .finish()
    }
}

/// Derive `(prf_seed, public_seed)` from the master seed.
pub fn derive_seeds(master_seed: &[u8]) -> Result<(Zeroizing<Vec<u8>>, Vec<u8>), XmssError> {
    let key: &[u8; SEED_BYTES] = master_seed.try_into().map_err(|_| {
        XmssError::MalformedInput(format!(
            "master seed must be {} bytes, got {}",
            SEED_BYTES,
            master_seed.len()
        ))
    })?;
    let mut stream = Zeroizing::new(prg::expand(key, 2 * SEED_BYTES));
    let public_seed = stream.split_off(SEED_BYTES);
    Ok((stream, public_seed))
}

/// Public key for `state`, checked against a separately stored copy if given.
pub fn matching_public(
    state: &PrivateKeyState,
    stored: Option<&PublicKeyState>,
) -> Result<PublicKeyState, XmssError> {
    let derived = state.public_state();
    match stored {
        Some(public) if *public != derived => Err(XmssError::InvalidState(
            "public key does not belong to the private key".to_string(),
        )),
        _ => Ok(derived),
    }
}

/// Verifier-side state. Immutable after key generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyState {
    root: Vec<u8>,
    public_seed: Vec<u8>,
}

impl PublicKeyState {
    pub fn new(root: Vec<u8>, public_seed: Vec<u8>) -> Self {
        PublicKeyState { root, public_seed }
    }

    pub fn root(&self) -> &[u8] {
        &self.root
    }

    pub fn public_seed(&self) -> &[u8] {
        &self.public_seed
    }
}

pub fn export_private(state: &PrivateKeyState) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(
        INDEX_BYTES + state.master_seed.len() + state.public_seed.len() + state.root.len(),
    );
    bytes.extend_from_slice(&state.index.to_be_bytes());
    bytes.extend_from_slice(&state.master_seed);
    bytes.extend_from_slice(&state.public_seed);
    bytes.extend_from_slice(&state.root);
    bytes
}

pub fn import_private<P: ParameterSet>(
    bytes: &[u8],
    params: &P,
) -> Result<PrivateKeyState, XmssError> {
    let n = params.n();
    let expected = INDEX_BYTES + 3 * n;
    if bytes.len() != expected {
        return Err(XmssError::InvalidState(format!(
            "private key state is {} bytes, expected {}",
            bytes.len(),
            expected
        )));
    }

    let (index_bytes, rest) = bytes.split_at(INDEX_BYTES);
    let mut raw_index = [0u8; INDEX_BYTES];
    raw_index.copy_from_slice(index_bytes);
    let index = u64::from_be_bytes(raw_index);
    if index > params.capacity() {
        return Err(XmssError::InvalidState(format!(
            "index {} beyond key capacity {}",
            index,
            params.capacity()
        )));
    }

    let (master_seed, rest) = rest.split_at(n);
    let (public_seed, root) = rest.split_at(n);

    let state = PrivateKeyState::new(master_seed, root.to_vec(), index)
        .map_err(|err| XmssError::InvalidState(err.to_string()))?;
    if state.public_seed != public_seed {
        return Err(XmssError::InvalidState(
            "public seed does not belong to the master seed".to_string(),
        ));
    }

    Ok(state)
}

/// Like [`import_private`], but refuses state older than `last_known_index`.
pub fn import_private_guarded<P: ParameterSet>(
    bytes: &[u8],
    params: &P,
    last_known_index: u64,
) -> Result<PrivateKeyState, XmssError> {
    let state = import_private(bytes, params)?;
    if state.index < last_known_index {
        tracing::warn!(
            imported = state.index,
            last_known = last_known_index,
            "rejecting private key state with rolled-back index"
        );
        return Err(XmssError::InvalidState(format!(
            "index rollback: imported {} < last known {}",
            state.index, last_known_index
        )));
    }
    Ok(state)
}

pub fn export_public(state: &PublicKeyState) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(state.root.len() + state.public_seed.len());
    bytes.extend_from_slice(&state.root);
    bytes.extend_from_slice(&state.public_seed);
    bytes
}

pub fn import_public<P: ParameterSet>(
    bytes: &[u8],
    params: &P,
) -> Result<PublicKeyState, XmssError> {
    let n = params.n();
    if bytes.len() != 2 * n {
        return Err(XmssError::InvalidState(format!(
            "public key state is {} bytes, expected {}",
            bytes.len(),
            2 * n
        )));
    }
    let (root, public_seed) = bytes.split_at(n);
    Ok(PublicKeyState::new(root.to_vec(), public_seed.to_vec()))
}

/// Durable storage for exported private state.
///
/// `persist` must not return `Ok` until the bytes would survive a crash.
pub trait StateStore {
    fn persist(&mut self, private_state: &[u8]) -> Result<(), XmssError>;
}

/// In-memory store, for tests and for hosts that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    latest: Option<Vec<u8>>,
    writes: usize,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<&[u8]> {
        self.latest.as_deref()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl StateStore for MemoryStateStore {
    fn persist(&mut self, private_state: &[u8]) -> Result<(), XmssError> {
        if let Some(old) = self.latest.as_mut() {
            old.zeroize();
        }
        self.latest = Some(private_state.to_vec());
        self.writes += 1;
        Ok(())
    }
}
