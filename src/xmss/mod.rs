pub mod core;
pub mod keypair;
pub mod signature;
pub mod tree;

pub use self::core::{ParameterSet, XMSSParams, XMSSPublicKey};
pub use self::keypair::XMSSKeypair;
pub use self::signature::XMSSSignature;
pub use self::tree::{AuthPath, MerkleTree, TreeLocation};
