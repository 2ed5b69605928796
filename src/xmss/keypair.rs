use crate::crypto::prg::SEED_BYTES;
use crate::crypto::random::{OsSecureRandom, SecureRandom};
use crate::error::XmssError;
use crate::keystate::{self, PrivateKeyState, PublicKeyState, StateStore};
use crate::xmss::core::{
    message_digest, message_randomness, sign_with_tree, ParameterSet, XMSSParams, XMSSPublicKey,
};
use crate::xmss::signature::XMSSSignature;
use crate::xmss::tree::{MerkleTree, TreeLocation};

/// Single-tree signer.
///
/// Signing takes `&mut self`, so one key pair can never have two signing
/// operations in flight. The whole tree is kept as the traversal cache.
pub struct XMSSKeypair {
    public_key: XMSSPublicKey,
    private_key: PrivateKeyState,
    params: XMSSParams,
    tree: MerkleTree,
}

impl XMSSKeypair {
    pub fn generate(params: &XMSSParams) -> Result<Self, XmssError> {
        Self::generate_with_rng(params, &mut OsSecureRandom::new())
    }

    pub fn generate_with_rng<R: SecureRandom>(
        params: &XMSSParams,
        rng: &mut R,
    ) -> Result<Self, XmssError> {
        let seed = zeroize::Zeroizing::new(rng.random_bytes(SEED_BYTES));
        Self::generate_from_seed(params, &seed)
    }

    /// Deterministic key generation from a 32-byte master seed.
    pub fn generate_from_seed(params: &XMSSParams, master_seed: &[u8]) -> Result<Self, XmssError> {
        let (_, public_seed) = keystate::derive_seeds(master_seed)?;
        let tree = MerkleTree::build_layer(
            params.wots(),
            master_seed,
            &public_seed,
            TreeLocation::default(),
            params.tree_height(),
        )?;
        let root = tree.root().to_vec();

        let private_key = PrivateKeyState::new(master_seed, root.clone(), 0)?;
        let public_key =
            XMSSPublicKey::new(PublicKeyState::new(root, public_seed), *params);

        tracing::info!(
            tree_height = params.tree_height(),
            capacity = params.capacity(),
            "generated XMSS key pair"
        );

        Ok(XMSSKeypair {
            public_key,
            private_key,
            params: *params,
            tree,
        })
    }

    /// Rebuild a signer from imported private state, optionally checking it
    /// against a separately stored public key.
    ///
    /// Fails with `InvalidState` if the rebuilt tree does not reproduce the
    /// stored root or the public key belongs to another key.
    pub fn restore(
        params: &XMSSParams,
        state: PrivateKeyState,
        public: Option<&PublicKeyState>,
    ) -> Result<Self, XmssError> {
        let tree = MerkleTree::build_layer(
            params.wots(),
            state.master_seed(),
            state.public_seed(),
            TreeLocation::default(),
            params.tree_height(),
        )?;
        if tree.root() != state.root() {
            return Err(XmssError::InvalidState(
                "stored root does not match the tree of the master seed".to_string(),
            ));
        }
        let public_key = XMSSPublicKey::new(keystate::matching_public(&state, public)?, *params);

        Ok(XMSSKeypair {
            public_key,
            private_key: state,
            params: *params,
            tree,
        })
    }

    pub fn public_key(&self) -> &XMSSPublicKey {
        &self.public_key
    }

    pub fn params(&self) -> &XMSSParams {
        &self.params
    }

    pub fn private_key(&self) -> &PrivateKeyState {
        &self.private_key
    }

    pub fn remaining_signatures(&self) -> u64 {
        self.params.capacity().saturating_sub(self.private_key.index())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_signatures() == 0
    }

    /// Sign with the next unused leaf and advance the index.
    pub fn sign(&mut self, message: &[u8]) -> Result<XMSSSignature, XmssError> {
        let leaf_idx = self.private_key.index();
        let capacity = self.params.capacity();
        if leaf_idx >= capacity {
            tracing::warn!(index = leaf_idx, "XMSS key exhausted");
            return Err(XmssError::KeyExhausted { index: leaf_idx, capacity });
        }

        let hasher = self.params.hash().hasher();
        let randomness =
            message_randomness(hasher.as_ref(), self.private_key.prf_seed(), leaf_idx, message);
        let digest = message_digest(
            hasher.as_ref(),
            &randomness,
            self.private_key.root(),
            leaf_idx,
            message,
        );

        let (wots_signature, auth_path) = sign_with_tree(
            self.params.wots(),
            self.private_key.master_seed(),
            self.private_key.public_seed(),
            &self.tree,
            leaf_idx as u32,
            &digest,
        )?;

        self.private_key.advance_index();
        if self.is_exhausted() {
            tracing::warn!("XMSS key used its last one-time key");
        }

        Ok(XMSSSignature::new(leaf_idx as u32, randomness, wots_signature, auth_path))
    }

    /// Sign, then persist the advanced state; the signature is only returned
    /// once `store` has accepted it.
    ///
    /// If persisting fails the leaf stays consumed in memory and is never reused.
    pub fn sign_with_store<S: StateStore>(
        &mut self,
        message: &[u8],
        store: &mut S,
    ) -> Result<XMSSSignature, XmssError> {
        let signature = self.sign(message)?;
        let exported = zeroize::Zeroizing::new(keystate::export_private(&self.private_key));
        store.persist(&exported).map_err(|err| match err {
            XmssError::Persistence(_) => err,
            other => XmssError::Persistence(other.to_string()),
        })?;
        Ok(signature)
    }
}
