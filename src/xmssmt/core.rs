use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::address::POSITION_BITS;
use crate::crypto::hash::HashAlgorithm;
use crate::error::XmssError;
use crate::keystate::PublicKeyState;
use crate::wots::WotsParams;
use crate::xmss::core::{compute_root_from_signature, message_digest, ParameterSet, MAX_TREE_HEIGHT};
use crate::xmss::tree::TreeLocation;
use crate::xmssmt::signature::XMSSMTSignature;

/// Most layers the 4-bit layer tag of a seed address can name.
pub const MAX_LAYERS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XMSSMTParamsConfig {
    pub total_height: u32,
    pub layers: u32,
    pub winternitz_parameter: u32,
    pub hash: HashAlgorithm,
}

/// Multi-tree parameters: `layers` trees of height `total_height / layers` stacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "XMSSMTParamsConfig", into = "XMSSMTParamsConfig")]
pub struct XMSSMTParams {
    total_height: u32,
    layers: u32,
    wots: WotsParams,
}

impl XMSSMTParams {
    pub fn new(
        total_height: u32,
        layers: u32,
        winternitz_parameter: u32,
        hash: HashAlgorithm,
    ) -> Result<Self, XmssError> {
        if layers == 0 || layers > MAX_LAYERS {
            return Err(XmssError::InvalidParameters(format!(
                "layer count {} not in 1..={}",
                layers, MAX_LAYERS
            )));
        }
        if total_height % layers != 0 {
            return Err(XmssError::InvalidParameters(format!(
                "total height {} not divisible by {} layers",
                total_height, layers
            )));
        }
        if total_height / layers > MAX_TREE_HEIGHT || total_height > POSITION_BITS {
            return Err(XmssError::InvalidParameters(format!(
                "heights too large: total {}, per layer {}",
                total_height,
                total_height / layers
            )));
        }
        let wots = WotsParams::new(winternitz_parameter, hash)?;
        Ok(XMSSMTParams { total_height, layers, wots })
    }

    /// XMSSMT-SHA2_20/2_256
    pub fn sha2_20_2_256() -> Self {
        Self::preset(20, 2)
    }

    /// XMSSMT-SHA2_20/4_256
    pub fn sha2_20_4_256() -> Self {
        Self::preset(20, 4)
    }

    fn preset(total_height: u32, layers: u32) -> Self {
        XMSSMTParams {
            total_height,
            layers,
            wots: WotsParams::with_log_w(4, HashAlgorithm::Sha256),
        }
    }

    pub fn total_height(&self) -> u32 {
        self.total_height
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }

    pub fn layer_height(&self) -> u32 {
        self.total_height / self.layers
    }

    pub fn winternitz_parameter(&self) -> u32 {
        self.wots.w()
    }

    pub fn hash(&self) -> HashAlgorithm {
        self.wots.hash()
    }

    /// Bytes used to encode the global index in a signature.
    pub fn index_bytes(&self) -> usize {
        (self.total_height as usize).div_ceil(8).max(1)
    }

    pub fn signature_size(&self) -> usize {
        let per_layer = self.wots.n() * (self.wots.chains() + self.layer_height() as usize);
        self.index_bytes() + self.wots.n() + self.layers as usize * per_layer
    }

    /// Leaf used at `layer` when signing with global index `index`.
    pub fn leaf_index(&self, index: u64, layer: u32) -> u32 {
        let h = self.layer_height();
        ((index >> (layer * h)) & ((1u64 << h) - 1)) as u32
    }

    /// Tree used at `layer` when signing with global index `index`.
    pub fn tree_location(&self, index: u64, layer: u32) -> TreeLocation {
        TreeLocation {
            layer,
            subtree: index.checked_shr((layer + 1) * self.layer_height()).unwrap_or(0),
        }
    }
}

impl ParameterSet for XMSSMTParams {
    fn capacity(&self) -> u64 {
        1 << self.total_height
    }

    fn wots(&self) -> &WotsParams {
        &self.wots
    }
}

impl TryFrom<XMSSMTParamsConfig> for XMSSMTParams {
    type Error = XmssError;

    fn try_from(config: XMSSMTParamsConfig) -> Result<Self, Self::Error> {
        XMSSMTParams::new(
            config.total_height,
            config.layers,
            config.winternitz_parameter,
            config.hash,
        )
    }
}

impl From<XMSSMTParams> for XMSSMTParamsConfig {
    fn from(params: XMSSMTParams) -> Self {
        XMSSMTParamsConfig {
            total_height: params.total_height,
            layers: params.layers,
            winternitz_parameter: params.winternitz_parameter(),
            hash: params.hash(),
        }
    }
}

/// Multi-tree public key: the root of the single top-layer tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XMSSMTPublicKey {
    state: PublicKeyState,
    params: XMSSMTParams,
}

impl XMSSMTPublicKey {
    pub fn new(state: PublicKeyState, params: XMSSMTParams) -> Self {
        XMSSMTPublicKey { state, params }
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

    pub fn params(&self) -> &XMSSMTParams {
        &self.params
    }

    /// Walk the layers bottom-up and compare the recomputed top root.
    pub fn verify(&self, message: &[u8], signature: &XMSSMTSignature) -> bool {
        match self.recompute_root(message, signature) {
            Ok(root) => bool::from(root.as_slice().ct_eq(self.root())),
            Err(err) => {
                tracing::debug!(%err, index = signature.index(), "XMSS-MT verification aborted");
                false
            }
        }
    }

    /// Root implied by `signature` on `message`, without comparing it.
    pub fn recompute_root(
        &self,
        message: &[u8],
        signature: &XMSSMTSignature,
    ) -> Result<Vec<u8>, XmssError> {
        let params = &self.params;
        let index = signature.index();
        if index >= params.capacity() {
            return Err(XmssError::MalformedInput(format!("index {} beyond capacity", index)));
        }
        if signature.layers().len() != params.layers() as usize
            || signature.randomness().len() != params.n()
        {
            return Err(XmssError::MalformedInput("layer count or randomness size".to_string()));
        }

        let hasher = params.hash().hasher();
        let mut node =
            message_digest(hasher.as_ref(), signature.randomness(), self.root(), index, message);

        for (layer, layer_signature) in (0..params.layers()).zip(signature.layers()) {
            node = compute_root_from_signature(
                params.wots(),
                params.layer_height(),
                params.tree_location(index, layer),
                &node,
                params.leaf_index(index, layer),
                layer_signature.wots_signature(),
                layer_signature.auth_path(),
                self.public_seed(),
            )?;
        }

        Ok(node)
    }
}
