use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::address::TreeAddress;
use crate::crypto::hash::{domain, HashAlgorithm, HashFunction};
use crate::error::XmssError;
use crate::keystate::PublicKeyState;
use crate::wots::{WotsParams, WotsSignature};
use crate::xmss::signature::XMSSSignature;
use crate::xmss::tree::{AuthPath, MerkleTree, TreeLocation};

/// Largest supported height of a single tree.
pub const MAX_TREE_HEIGHT: u32 = 20;

/// Shape shared by single- and multi-tree parameter sets.
pub trait ParameterSet {
    /// Number of one-time keys, i.e. the exclusive upper bound of the index.
    fn capacity(&self) -> u64;

    fn wots(&self) -> &WotsParams;

    /// Seed, root and digest size in bytes.
    fn n(&self) -> usize {
        self.wots().n()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XMSSParamsConfig {
    pub tree_height: u32,
    pub winternitz_parameter: u32,
    pub hash: HashAlgorithm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "XMSSParamsConfig", into = "XMSSParamsConfig")]
pub struct XMSSParams {
    tree_height: u32,
    wots: WotsParams,
}

impl XMSSParams {
    pub fn new(
        tree_height: u32,
        winternitz_parameter: u32,
        hash: HashAlgorithm,
    ) -> Result<Self, XmssError> {
        if tree_height > MAX_TREE_HEIGHT {
            return Err(XmssError::InvalidParameters(format!(
                "tree height {} exceeds {}",
                tree_height, MAX_TREE_HEIGHT
            )));
        }
        let wots = WotsParams::new(winternitz_parameter, hash)?;
        Ok(XMSSParams { tree_height, wots })
    }

    /// XMSS-SHA2_10_256
    pub fn sha2_10_256() -> Self {
        Self::preset(10)
    }

    /// XMSS-SHA2_16_256
    pub fn sha2_16_256() -> Self {
        Self::preset(16)
    }

    fn preset(tree_height: u32) -> Self {
        XMSSParams {
            tree_height,
            wots: WotsParams::with_log_w(4, HashAlgorithm::Sha256),
        }
    }

    pub fn tree_height(&self) -> u32 {
        self.tree_height
    }

    pub fn winternitz_parameter(&self) -> u32 {
        self.wots.w()
    }

    pub fn hash(&self) -> HashAlgorithm {
        self.wots.hash()
    }

    /// Bytes of an encoded signature: index, randomness, WOTS+ chains, path.
    pub fn signature_size(&self) -> usize {
        4 + self.n() * (1 + self.wots.chains() + self.tree_height as usize)
    }
}

impl ParameterSet for XMSSParams {
    fn capacity(&self) -> u64 {
        1 << self.tree_height
    }

    fn wots(&self) -> &WotsParams {
        &self.wots
    }
}

impl TryFrom<XMSSParamsConfig> for XMSSParams {
    type Error = XmssError;

    fn try_from(config: XMSSParamsConfig) -> Result<Self, Self::Error> {
        XMSSParams::new(config.tree_height, config.winternitz_parameter, config.hash)
    }
}

impl From<XMSSParams> for XMSSParamsConfig {
    fn from(params: XMSSParams) -> Self {
        XMSSParamsConfig {
            tree_height: params.tree_height,
            winternitz_parameter: params.winternitz_parameter(),
            hash: params.hash(),
        }
    }
}

/// XMSS public key: the root commitment plus the public seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XMSSPublicKey {
    state: PublicKeyState,
    params: XMSSParams,
}

impl XMSSPublicKey {
    pub fn new(state: PublicKeyState, params: XMSSParams) -> Self {
        XMSSPublicKey { state, params }
    }

    pub fn root(&self) -> &[u8] {
        self.state.root()
    }

    pub fn public_seed(&self) -> &[u8] {
        self.state.public_seed()
    }

    pub fn state(&self) -> &PublicKeyState {
        &self.state
    }

    pub fn params(&self) -> &XMSSParams {
        &self.params
    }

    pub fn verify(&self, message: &[u8], signature: &XMSSSignature) -> bool {
        match self.recompute_root(message, signature) {
            Ok(root) => bool::from(root.as_slice().ct_eq(self.root())),
            Err(err) => {
                tracing::debug!(%err, index = signature.leaf_index(), "XMSS verification aborted");
                false
            }
        }
    }

    /// Root implied by `signature` on `message`, without comparing it.
    ///
    /// Structurally malformed signatures fail with `MalformedInput`.
    pub fn recompute_root(
        &self,
        message: &[u8],
        signature: &XMSSSignature,
    ) -> Result<Vec<u8>, XmssError> {
        let params = &self.params;
        let leaf = signature.leaf_index();
        if u64::from(leaf) >= params.capacity() {
            return Err(XmssError::MalformedInput(format!("leaf index {} beyond capacity", leaf)));
        }
        if signature.randomness().len() != params.n() {
            return Err(XmssError::MalformedInput("randomness size".to_string()));
        }

        let hasher = params.hash().hasher();
        let digest =
            message_digest(hasher.as_ref(), signature.randomness(), self.root(), leaf.into(), message);

        compute_root_from_signature(
            params.wots(),
            params.tree_height(),
            TreeLocation::default(),
            &digest,
            leaf,
            signature.wots_signature(),
            signature.auth_path(),
            self.public_seed(),
        )
    }
}

/// `r = PRF(prf_seed, index, M)`, the per-signature message randomiser.
pub fn message_randomness(
    hasher: &dyn HashFunction,
    prf_seed: &[u8],
    index: u64,
    message: &[u8],
) -> Vec<u8> {
    hasher.hash_parts(&[&[domain::MESSAGE_PRF], prf_seed, &index.to_be_bytes(), message])
}

/// `H(r || root || index || M)`, the digest actually signed by the bottom layer.
pub fn message_digest(
    hasher: &dyn HashFunction,
    randomness: &[u8],
    root: &[u8],
    index: u64,
    message: &[u8],
) -> Vec<u8> {
    hasher.hash_parts(&[
        &[domain::MESSAGE_DIGEST],
        randomness,
        root,
        &index.to_be_bytes(),
        message,
    ])
}

/// Sign `digest` with leaf `leaf` of `tree` and read out its authentication path.
pub fn sign_with_tree(
    wots: &WotsParams,
    master_seed: &[u8],
    public_seed: &[u8],
    tree: &MerkleTree,
    leaf: u32,
    digest: &[u8],
) -> Result<(WotsSignature, AuthPath), XmssError> {
    let location = tree.location();
    let address = TreeAddress::one_time_key(location.layer, location.subtree, leaf);
    let keypair =
        wots.generate_keypair(master_seed, public_seed, &address, tree.height() as u32)?;
    let wots_signature = keypair.sign(digest)?;
    let auth_path = tree.authentication_path(leaf as usize)?;
    Ok((wots_signature, auth_path))
}

/// Root of the tree at `location` implied by a one-layer signature on `digest`.
#[allow(clippy::too_many_arguments)]
pub fn compute_root_from_signature(
    wots: &WotsParams,
    tree_height: u32,
    location: TreeLocation,
    digest: &[u8],
    leaf: u32,
    wots_signature: &WotsSignature,
    auth_path: &AuthPath,
    public_seed: &[u8],
) -> Result<Vec<u8>, XmssError> {
    if auth_path.len() != tree_height as usize {
        return Err(XmssError::MalformedInput(format!(
            "authentication path length {} != tree height {}",
            auth_path.len(),
            tree_height
        )));
    }
    if auth_path.nodes().iter().any(|node| node.len() != wots.n()) {
        return Err(XmssError::MalformedInput("authentication path node size".to_string()));
    }

    let address = TreeAddress::one_time_key(location.layer, location.subtree, leaf);
    let wots_pk = wots.public_key_from_signature(digest, wots_signature, public_seed, &address)?;
    let leaf_hash = wots_pk.leaf_hash(public_seed, &address);

    Ok(auth_path.compute_root(
        &leaf_hash,
        leaf as usize,
        public_seed,
        wots.hash().hasher().as_ref(),
        location,
    ))
}
