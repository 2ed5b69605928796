pub mod core;
pub mod keypair;
pub mod signature;

pub use self::core::{XMSSMTParams, XMSSMTPublicKey};
pub use self::keypair::XMSSMTKeypair;
pub use self::signature::{LayerSignature, XMSSMTSignature};
