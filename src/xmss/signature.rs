use crate::error::XmssError;
use crate::wots::WotsSignature;
use crate::xmss::core::{ParameterSet, XMSSParams};
use crate::xmss::tree::AuthPath;

/// Single-tree signature: `index || r || WOTS+ chains || authentication path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XMSSSignature {
    leaf_index: u32,
    randomness: Vec<u8>,
    wots_signature: WotsSignature,
    auth_path: AuthPath,
}

impl XMSSSignature {
    pub fn new(
        leaf_index: u32,
        randomness: Vec<u8>,
        wots_signature: WotsSignature,
        auth_path: AuthPath,
    ) -> Self {
        XMSSSignature {
            leaf_index,
            randomness,
            wots_signature,
            auth_path,
        }
    }

    pub fn leaf_index(&self) -> u32 {
        self.leaf_index
    }

    pub fn randomness(&self) -> &[u8] {
        &self.randomness
    }

    pub fn wots_signature(&self) -> &WotsSignature {
        &self.wots_signature
    }

    pub fn auth_path(&self) -> &AuthPath {
        &self.auth_path
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();

        bytes.extend_from_slice(&self.leaf_index.to_be_bytes());
        bytes.extend_from_slice(&self.randomness);

        for chain in self.wots_signature.chains() {
            bytes.extend_from_slice(chain);
        }

        for node in self.auth_path.nodes() {
            bytes.extend_from_slice(node);
        }

        bytes
    }

    pub fn from_bytes(bytes: &[u8], params: &XMSSParams) -> Result<Self, XmssError> {
        let hash_size = params.n();
        let wots_chains = params.wots().chains();
        let tree_height = params.tree_height() as usize;

        let expected_size = params.signature_size();
        if bytes.len() != expected_size {
            return Err(XmssError::MalformedInput(format!(
                "Invalid signature length: expected {}, got {}",
                expected_size,
                bytes.len()
            )));
        }

        let (index_bytes, rest) = bytes.split_at(4);
        let leaf_index =
            u32::from_be_bytes([index_bytes[0], index_bytes[1], index_bytes[2], index_bytes[3]]);
        if u64::from(leaf_index) >= params.capacity() {
            return Err(XmssError::MalformedInput(format!(
                "leaf index {} outside tree of height {}",
                leaf_index, tree_height
            )));
        }

        let (randomness, rest) = rest.split_at(hash_size);
        let (chains, path) = rest.split_at(wots_chains * hash_size);

        let wots_signature =
            WotsSignature::from_chains(chains.chunks(hash_size).map(|c| c.to_vec()).collect());
        let auth_path = AuthPath::new(path.chunks(hash_size).map(|c| c.to_vec()).collect());

        Ok(XMSSSignature {
            leaf_index,
            randomness: randomness.to_vec(),
            wots_signature,
            auth_path,
        })
    }
}
