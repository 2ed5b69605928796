use zeroize::Zeroizing;

use crate::crypto::prg::SEED_BYTES;
use crate::crypto::random::{OsSecureRandom, SecureRandom};
use crate::error::XmssError;
use crate::keystate::{self, PrivateKeyState, PublicKeyState, StateStore};
use crate::xmss::core::{message_digest, message_randomness, sign_with_tree, ParameterSet};
use crate::xmss::tree::MerkleTree;
use crate::xmssmt::core::{XMSSMTParams, XMSSMTPublicKey};
use crate::xmssmt::signature::{LayerSignature, XMSSMTSignature};

/// Multi-tree signer.
///
/// Holds one cached tree per layer: the tree the current index signs with.
/// When the index leaves a tree's range, that layer's tree is rebuilt from
/// the master seed at its new location on the next signature.
pub struct XMSSMTKeypair {
    public_key: XMSSMTPublicKey,
    private_key: PrivateKeyState,
    params: XMSSMTParams,
    trees: Vec<MerkleTree>,
}

impl XMSSMTKeypair {
    pub fn generate(params: &XMSSMTParams) -> Result<Self, XmssError> {
        Self::generate_with_rng(params, &mut OsSecureRandom::new())
    }

    pub fn generate_with_rng<R: SecureRandom>(
        params: &XMSSMTParams,
        rng: &mut R,
    ) -> Result<Self, XmssError> {
        let seed = Zeroizing::new(rng.random_bytes(SEED_BYTES));
        Self::generate_from_seed(params, &seed)
    }

    pub fn generate_from_seed(
        params: &XMSSMTParams,
        master_seed: &[u8],
    ) -> Result<Self, XmssError> {
        let (_, public_seed) = keystate::derive_seeds(master_seed)?;
        let trees = build_trees(params, master_seed, &public_seed, 0)?;
        let root = top_root(&trees)?;

        let private_key = PrivateKeyState::new(master_seed, root.clone(), 0)?;
        let public_key = XMSSMTPublicKey::new(PublicKeyState::new(root, public_seed), *params);

        tracing::info!(
            total_height = params.total_height(),
            layers = params.layers(),
            "generated XMSS-MT key pair"
        );

        Ok(XMSSMTKeypair { public_key, private_key, params: *params, trees })
    }

    /// Rebuild a signer from imported private state, optionally checking it
    /// against a separately stored public key.
    pub fn restore(
        params: &XMSSMTParams,
        state: PrivateKeyState,
        public: Option<&PublicKeyState>,
    ) -> Result<Self, XmssError> {
        let cursor = state.index().min(params.capacity() - 1);
        let trees = build_trees(params, state.master_seed(), state.public_seed(), cursor)?;
        if top_root(&trees)? != state.root() {
            return Err(XmssError::InvalidState(
                "stored root does not match the tree of the master seed".to_string(),
            ));
        }
        let public_state = keystate::matching_public(&state, public)?;

        Ok(XMSSMTKeypair {
            public_key: XMSSMTPublicKey::new(public_state, *params),
            private_key: state,
            params: *params,
            trees,
        })
    }

    pub fn public_key(&self) -> &XMSSMTPublicKey {
        &self.public_key
    }

    pub fn private_key(&self) -> &PrivateKeyState {
        &self.private_key
    }

    pub fn params(&self) -> &XMSSMTParams {
        &self.params
    }

    /// Tree currently cached for `layer` (0 = bottom).
    pub fn layer_tree(&self, layer: u32) -> Option<&MerkleTree> {
        self.trees.get(layer as usize)
    }

    pub fn remaining_signatures(&self) -> u64 {
        self.params.capacity().saturating_sub(self.private_key.index())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_signatures() == 0
    }

    /// Sign with the next global index and advance it.
    ///
    /// Layer 0 signs the message digest; every layer above signs the root of
    /// the tree below it.
    pub fn sign(&mut self, message: &[u8]) -> Result<XMSSMTSignature, XmssError> {
        let index = self.private_key.index();
        let capacity = self.params.capacity();
        if index >= capacity {
            tracing::warn!(index, "XMSS-MT key exhausted");
            return Err(XmssError::KeyExhausted { index, capacity });
        }

        self.rekey_for(index)?;

        let hasher = self.params.hash().hasher();
        let randomness =
            message_randomness(hasher.as_ref(), self.private_key.prf_seed(), index, message);
        let mut node =
            message_digest(hasher.as_ref(), &randomness, self.private_key.root(), index, message);

        let mut layers = Vec::with_capacity(self.trees.len());
        for (layer, tree) in (0..self.params.layers()).zip(&self.trees) {
            let (wots_signature, auth_path) = sign_with_tree(
                self.params.wots(),
                self.private_key.master_seed(),
                self.private_key.public_seed(),
                tree,
                self.params.leaf_index(index, layer),
                &node,
            )?;
            layers.push(LayerSignature::new(wots_signature, auth_path));
            node = tree.root().to_vec();
        }

        self.private_key.advance_index();
        if self.is_exhausted() {
            tracing::warn!("XMSS-MT key used its last one-time key");
        }

        Ok(XMSSMTSignature::new(index, randomness, layers))
    }

    /// Sign, then persist the advanced state before releasing the signature.
    pub fn sign_with_store<S: StateStore>(
        &mut self,
        message: &[u8],
        store: &mut S,
    ) -> Result<XMSSMTSignature, XmssError> {
        let signature = self.sign(message)?;
        let exported = Zeroizing::new(keystate::export_private(&self.private_key));
        store.persist(&exported).map_err(|err| match err {
            XmssError::Persistence(_) => err,
            other => XmssError::Persistence(other.to_string()),
        })?;
        Ok(signature)
    }

    /// Replace every cached tree whose range no longer covers `index`.
    ///
    /// New trees are built before any cached tree is replaced.
    fn rekey_for(&mut self, index: u64) -> Result<(), XmssError> {
        let mut rebuilt = Vec::new();
        for (layer, tree) in (0..self.params.layers()).zip(&self.trees) {
            let location = self.params.tree_location(index, layer);
            if tree.location() != location {
                tracing::debug!(layer, subtree = location.subtree, "re-keying subtree");
                let fresh = MerkleTree::build_layer(
                    self.params.wots(),
                    self.private_key.master_seed(),
                    self.private_key.public_seed(),
                    location,
                    self.params.layer_height(),
                )?;
                rebuilt.push((layer as usize, fresh));
            }
        }
        for (layer, tree) in rebuilt {
            self.trees[layer] = tree;
        }
        Ok(())
    }
}

/// Trees of every layer for global index `index`, bottom layer first.
fn build_trees(
    params: &XMSSMTParams,
    master_seed: &[u8],
    public_seed: &[u8],
    index: u64,
) -> Result<Vec<MerkleTree>, XmssError> {
    (0..params.layers())
        .map(|layer| {
            MerkleTree::build_layer(
                params.wots(),
                master_seed,
                public_seed,
                params.tree_location(index, layer),
                params.layer_height(),
            )
        })
        .collect()
}

fn top_root(trees: &[MerkleTree]) -> Result<Vec<u8>, XmssError> {
    trees
        .last()
        .map(|tree| tree.root().to_vec())
        .ok_or_else(|| XmssError::InvalidParameters("multi-tree without layers".to_string()))
}
