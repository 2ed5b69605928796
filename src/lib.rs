//! Stateful hash-based signatures: XMSS and XMSS-MT over WOTS+ one-time keys.
//!
//! Every one-time key is regenerated on demand from a single master seed and
//! a [`address::TreeAddress`]. A private key's index only ever moves forward;
//! signing takes `&mut` access and [`keystate`] provides the byte encoding
//! hosts persist between signatures.

pub mod address;
pub mod crypto;
pub mod error;
pub mod keystate;
pub mod wots;
pub mod xmss;
pub mod xmssmt;

pub use error::XmssError;
pub use keystate::{PrivateKeyState, PublicKeyState, StateStore};
pub use xmss::{XMSSKeypair, XMSSParams, XMSSPublicKey, XMSSSignature};
pub use xmssmt::{XMSSMTKeypair, XMSSMTParams, XMSSMTPublicKey, XMSSMTSignature};
