//! Structured tree addresses.
//!
//! Every pseudorandom derivation and every keyed hash call is bound to a
//! `TreeAddress` naming the exact position it is computed for. Two encodings
//! exist:
//!
//! - `to_bytes` gives the 32-byte form mixed into chain, leaf and node hashes.
//! - `seed_word` gives the packed 64-bit word appended to the master seed
//!   when deriving a one-time key seed: 4 bits layer, 55 bits high part and
//!   5 bits low part of the leaf position within the layer.

use crate::error::XmssError;

pub const ADDRESS_BYTES: usize = 32;

const LAYER_BITS: u32 = 4;
const LOW_LEAF_BITS: u32 = 5;
/// Bits available for the leaf position inside one layer of the packed word.
pub const POSITION_BITS: u32 = 64 - LAYER_BITS;

/// What a hash or PRF call is being computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressKind {
    #[default]
    OneTimeKey,
    Chain,
    LeafCompression,
    TreeNode,
}

impl AddressKind {
    fn tag(&self) -> u32 {
        match self {
            AddressKind::OneTimeKey => 0,
            AddressKind::Chain => 1,
            AddressKind::LeafCompression => 2,
            AddressKind::TreeNode => 3,
        }
    }
}

/// Position of a node, chain step or one-time key in the multi-tree.
///
/// `layer` 0 is the bottom layer. `subtree` indexes the tree within its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TreeAddress {
    pub layer: u32,
    pub subtree: u64,
    pub leaf_index: u32,
    pub chain_index: u32,
    pub hash_index: u32,
    pub tree_height: u32,
    pub tree_index: u32,
    pub kind: AddressKind,
}

impl TreeAddress {
    /// Address of the one-time key at `leaf_index` of the given tree.
    pub fn one_time_key(layer: u32, subtree: u64, leaf_index: u32) -> Self {
        TreeAddress { layer, subtree, leaf_index, ..Default::default() }
    }

    /// Address of the compression hash turning a WOTS+ public key into a leaf.
    pub fn leaf_compression(layer: u32, subtree: u64, leaf_index: u32) -> Self {
        TreeAddress {
            layer,
            subtree,
            leaf_index,
            kind: AddressKind::LeafCompression,
            ..Default::default()
        }
    }

    /// Address of the internal node at `tree_height` (1 = parents of leaves)
    /// and horizontal position `tree_index`.
    pub fn tree_node(layer: u32, subtree: u64, tree_height: u32, tree_index: u32) -> Self {
        TreeAddress {
            layer,
            subtree,
            tree_height,
            tree_index,
            kind: AddressKind::TreeNode,
            ..Default::default()
        }
    }

    /// Chain `chain_index` of this one-time key, positioned before its first step.
    pub fn chain(&self, chain_index: u32) -> Self {
        TreeAddress {
            layer: self.layer,
            subtree: self.subtree,
            leaf_index: self.leaf_index,
            chain_index,
            kind: AddressKind::Chain,
            ..Default::default()
        }
    }

    pub fn with_hash_index(&self, hash_index: u32) -> Self {
        TreeAddress { hash_index, ..*self }
    }

    /// Canonical 32-byte encoding.
    ///
    /// Bytes 0..4 layer, 4..12 subtree, 12..16 kind, 16..20 leaf index. The
    /// last 12 bytes carry (chain, hash) for chain steps, (height, index) for
    /// tree nodes and zero otherwise. All integers are big-endian.
    pub fn to_bytes(&self) -> [u8; ADDRESS_BYTES] {
        let mut out = [0u8; ADDRESS_BYTES];
        out[0..4].copy_from_slice(&self.layer.to_be_bytes());
        out[4..12].copy_from_slice(&self.subtree.to_be_bytes());
        out[12..16].copy_from_slice(&self.kind.tag().to_be_bytes());
        match self.kind {
            AddressKind::OneTimeKey | AddressKind::LeafCompression => {
                out[16..20].copy_from_slice(&self.leaf_index.to_be_bytes());
            }
            AddressKind::Chain => {
                out[16..20].copy_from_slice(&self.leaf_index.to_be_bytes());
                out[20..24].copy_from_slice(&self.chain_index.to_be_bytes());
                out[24..28].copy_from_slice(&self.hash_index.to_be_bytes());
            }
            AddressKind::TreeNode => {
                out[20..24].copy_from_slice(&self.tree_height.to_be_bytes());
                out[24..28].copy_from_slice(&self.tree_index.to_be_bytes());
            }
        }
        out
    }

    /// Packed seed-derivation word for a layer whose trees have `tree_height` levels.
    ///
    /// The leaf position `subtree << tree_height | leaf_index` is split into a
    /// 55-bit high part and a 5-bit low part, so for `tree_height == 5` the
    /// word is exactly `layer | subtree << 4 | leaf << 59`.
    pub fn seed_word(&self, tree_height: u32) -> Result<u64, XmssError> {
        if self.layer >= 1 << LAYER_BITS {
            return Err(XmssError::MalformedInput(format!(
                "layer {} does not fit in {} bits",
                self.layer, LAYER_BITS
            )));
        }
        if tree_height > POSITION_BITS {
            return Err(XmssError::MalformedInput(format!(
                "tree height {} exceeds {} position bits",
                tree_height, POSITION_BITS
            )));
        }
        if (self.leaf_index as u64).checked_shr(tree_height).unwrap_or(0) != 0 {
            return Err(XmssError::MalformedInput(format!(
                "leaf index {} outside tree of height {}",
                self.leaf_index, tree_height
            )));
        }
        let subtree_bits = POSITION_BITS - tree_height;
        if self.subtree.checked_shr(subtree_bits).unwrap_or(0) != 0 {
            return Err(XmssError::MalformedInput(format!(
                "subtree {} does not fit in {} bits",
                self.subtree, subtree_bits
            )));
        }

        let position = self.subtree.checked_shl(tree_height).unwrap_or(0) | self.leaf_index as u64;
        let low = position & ((1 << LOW_LEAF_BITS) - 1);
        let high = position >> LOW_LEAF_BITS;

        Ok(self.layer as u64 | high << LAYER_BITS | low << (LAYER_BITS + 55))
    }
}
