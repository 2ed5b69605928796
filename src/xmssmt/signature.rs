use crate::error::XmssError;
use crate::wots::WotsSignature;
use crate::xmss::core::ParameterSet;
use crate::xmss::tree::AuthPath;
use crate::xmssmt::core::XMSSMTParams;

/// One layer's share of a multi-tree signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSignature {
    wots_signature: WotsSignature,
    auth_path: AuthPath,
}

impl LayerSignature {
    pub fn new(wots_signature: WotsSignature, auth_path: AuthPath) -> Self {
        LayerSignature { wots_signature, auth_path }
    }

    pub fn wots_signature(&self) -> &WotsSignature {
        &self.wots_signature
    }

    pub fn auth_path(&self) -> &AuthPath {
        &self.auth_path
    }
}

/// `index || r || layer_0 || ... || layer_{L-1}`, bottom layer first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XMSSMTSignature {
    index: u64,
    randomness: Vec<u8>,
    layers: Vec<LayerSignature>,
}

impl XMSSMTSignature {
    pub fn new(index: u64, randomness: Vec<u8>, layers: Vec<LayerSignature>) -> Self {
        XMSSMTSignature { index, randomness, layers }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn randomness(&self) -> &[u8] {
        &self.randomness
    }

    pub fn layers(&self) -> &[LayerSignature] {
        &self.layers
    }

    pub fn to_bytes(&self, params: &XMSSMTParams) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(params.signature_size());
        bytes.extend_from_slice(&self.index.to_be_bytes()[8 - params.index_bytes()..]);
        bytes.extend_from_slice(&self.randomness);
        for layer in &self.layers {
            for chain in layer.wots_signature.chains() {
                bytes.extend_from_slice(chain);
            }
            for node in layer.auth_path.nodes() {
                bytes.extend_from_slice(node);
            }
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8], params: &XMSSMTParams) -> Result<Self, XmssError> {
        if bytes.len() != params.signature_size() {
            return Err(XmssError::MalformedInput(format!(
                "Invalid signature length: expected {}, got {}",
                params.signature_size(),
                bytes.len()
            )));
        }

        let n = params.n();
        let (index_bytes, rest) = bytes.split_at(params.index_bytes());
        let index = index_bytes.iter().fold(0u64, |acc, &b| acc << 8 | b as u64);
        if index >= params.capacity() {
            return Err(XmssError::MalformedInput(format!(
                "index {} beyond capacity {}",
                index,
                params.capacity()
            )));
        }

        let (randomness, rest) = rest.split_at(n);
        let chain_bytes = params.wots().chains() * n;
        let per_layer = chain_bytes + params.layer_height() as usize * n;

        let layers = rest
            .chunks(per_layer)
            .map(|layer| {
                let (chains, path) = layer.split_at(chain_bytes);
                LayerSignature::new(
                    WotsSignature::from_chains(chains.chunks(n).map(|c| c.to_vec()).collect()),
                    AuthPath::new(path.chunks(n).map(|c| c.to_vec()).collect()),
                )
            })
            .collect();

        Ok(XMSSMTSignature { index, randomness: randomness.to_vec(), layers })
    }
}
