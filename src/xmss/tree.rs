use crate::address::TreeAddress;
use crate::crypto::hash::{domain, HashFunction};
use crate::error::XmssError;
use crate::wots::WotsParams;

/// Position of one XMSS tree inside the multi-tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TreeLocation {
    pub layer: u32,
    pub subtree: u64,
}

/// Fully materialised Merkle tree of one layer.
///
/// Keeping every level doubles as the traversal cache: authentication paths
/// are read out of `nodes` instead of being recomputed.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    nodes: Vec<Vec<Vec<u8>>>,
    height: usize,
    location: TreeLocation,
}

impl MerkleTree {
    /// Build over precomputed leaves. `leaves.len()` must be a power of two.
    pub fn build(
        leaves: &[Vec<u8>],
        public_seed: &[u8],
        hasher: &dyn HashFunction,
        location: TreeLocation,
    ) -> Result<Self, XmssError> {
        if leaves.is_empty() || !leaves.len().is_power_of_two() {
            return Err(XmssError::MalformedInput(format!(
                "number of leaves {} is not a power of two",
                leaves.len()
            )));
        }
        let height = leaves.len().trailing_zeros() as usize;

        let mut nodes: Vec<Vec<Vec<u8>>> = Vec::with_capacity(height + 1);
        nodes.push(leaves.to_vec());

        for h in 0..height {
            let level = &nodes[h];
            let parents = (0..level.len() / 2)
                .map(|i| {
                    let address = TreeAddress::tree_node(
                        location.layer,
                        location.subtree,
                        h as u32 + 1,
                        i as u32,
                    );
                    hash_tree_node(hasher, public_seed, &address, &level[2 * i], &level[2 * i + 1])
                })
                .collect();
            nodes.push(parents);
        }

        Ok(MerkleTree { nodes, height, location })
    }

    /// Build the tree at `location` from WOTS+ keys regenerated out of the master seed.
    pub fn build_layer(
        wots: &WotsParams,
        master_seed: &[u8],
        public_seed: &[u8],
        location: TreeLocation,
        height: u32,
    ) -> Result<Self, XmssError> {
        tracing::debug!(layer = location.layer, subtree = location.subtree, height, "building merkle tree");

        let leaves = (0..1u32 << height)
            .map(|leaf| leaf_value(wots, master_seed, public_seed, location, leaf, height))
            .collect::<Result<Vec<_>, _>>()?;

        Self::build(&leaves, public_seed, wots.hash().hasher().as_ref(), location)
    }

    pub fn root(&self) -> &[u8] {
        &self.nodes[self.height][0]
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn location(&self) -> TreeLocation {
        self.location
    }

    pub fn leaves(&self) -> &[Vec<u8>] {
        &self.nodes[0]
    }

    pub fn authentication_path(&self, leaf_index: usize) -> Result<AuthPath, XmssError> {
        if leaf_index >= self.nodes[0].len() {
            return Err(XmssError::MalformedInput(format!(
                "leaf index {} outside tree of height {}",
                leaf_index, self.height
            )));
        }

        let mut auth_nodes = Vec::with_capacity(self.height);
        let mut index = leaf_index;
        for h in 0..self.height {
            auth_nodes.push(self.nodes[h][index ^ 1].clone());
            index >>= 1;
        }

        Ok(AuthPath::new(auth_nodes))
    }
}

/// Merkle leaf for the one-time key at `leaf` of the tree at `location`.
pub fn leaf_value(
    wots: &WotsParams,
    master_seed: &[u8],
    public_seed: &[u8],
    location: TreeLocation,
    leaf: u32,
    tree_height: u32,
) -> Result<Vec<u8>, XmssError> {
    let address = TreeAddress::one_time_key(location.layer, location.subtree, leaf);
    let keypair = wots.generate_keypair(master_seed, public_seed, &address, tree_height)?;
    Ok(keypair.leaf_hash())
}

/// Recompute the node at (`node_height`, `node_index`) from scratch.
pub fn treehash(
    wots: &WotsParams,
    master_seed: &[u8],
    public_seed: &[u8],
    location: TreeLocation,
    tree_height: u32,
    node_height: u32,
    node_index: u32,
) -> Result<Vec<u8>, XmssError> {
    if node_height == 0 {
        return leaf_value(wots, master_seed, public_seed, location, node_index, tree_height);
    }
    let child = |index| {
        treehash(wots, master_seed, public_seed, location, tree_height, node_height - 1, index)
    };
    let left = child(2 * node_index)?;
    let right = child(2 * node_index + 1)?;
    let address = TreeAddress::tree_node(location.layer, location.subtree, node_height, node_index);
    Ok(hash_tree_node(wots.hash().hasher().as_ref(), public_seed, &address, &left, &right))
}

/// Authentication path computed without any cached tree state.
pub fn authentication_path_uncached(
    wots: &WotsParams,
    master_seed: &[u8],
    public_seed: &[u8],
    location: TreeLocation,
    tree_height: u32,
    leaf_index: u32,
) -> Result<AuthPath, XmssError> {
    if (leaf_index as u64) >> tree_height != 0 {
        return Err(XmssError::MalformedInput(format!(
            "leaf index {} outside tree of height {}",
            leaf_index, tree_height
        )));
    }

    let nodes = (0..tree_height)
        .map(|h| {
            let sibling = (leaf_index >> h) ^ 1;
            treehash(wots, master_seed, public_seed, location, tree_height, h, sibling)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AuthPath::new(nodes))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPath {
    nodes: Vec<Vec<u8>>,
}

impl AuthPath {
    pub fn new(nodes: Vec<Vec<u8>>) -> Self {
        AuthPath { nodes }
    }

    pub fn nodes(&self) -> &[Vec<u8>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk from `leaf` at `leaf_index` up to the root of the tree at `location`.
    pub fn compute_root(
        &self,
        leaf: &[u8],
        leaf_index: usize,
        public_seed: &[u8],
        hasher: &dyn HashFunction,
        location: TreeLocation,
    ) -> Vec<u8> {
        let mut node = leaf.to_vec();
        let mut index = leaf_index;

        for (h, auth_node) in self.nodes.iter().enumerate() {
            let (left, right) =
                if index & 1 == 0 { (&node, auth_node) } else { (auth_node, &node) };

            let address = TreeAddress::tree_node(
                location.layer,
                location.subtree,
                h as u32 + 1,
                (index >> 1) as u32,
            );
            node = hash_tree_node(hasher, public_seed, &address, left, right);
            index >>= 1;
        }

        node
    }
}

fn hash_tree_node(
    hasher: &dyn HashFunction,
    public_seed: &[u8],
    address: &TreeAddress,
    left: &[u8],
    right: &[u8],
) -> Vec<u8> {
    hasher.hash_parts(&[&[domain::TREE_NODE], public_seed, &address.to_bytes(), left, right])
}
