//! Peer Identity
//!
//! Peers are named by their public key (`<base32>.k`). The routable IPv6
//! address of a peer is the first 16 bytes of a double SHA-512 over the
//! decoded key; valid mesh addresses fall in `fc00::/8`.

mod address;
mod encoding;

use sha2::{Digest, Sha512};
use thiserror::Error;

pub use address::MeshAddress;
pub use encoding::{decode_base32, encode_base32};

/// Mesh address prefix.
pub const MESH_ADDRESS_PREFIX: u8 = 0xfc;

/// Suffix every public key string carries.
pub const PUBLIC_KEY_SUFFIX: &str = ".k";

/// Errors that can occur in identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("public key does not end with '.k': {0}")]
    MissingKeySuffix(String),

    #[error("invalid base32 character '{0}'")]
    InvalidBase32Char(char),

    #[error("base32 input has non-zero trailing bits")]
    TrailingBits,

    #[error("invalid public key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),
}

/// Compute SHA-512 hash of data.
fn sha512(data: &[u8]) -> [u8; 64] {
    let mut hasher = Sha512::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 64];
    hash.copy_from_slice(&result);
    hash
}

/// Convert a `<base32>.k` public key to its mesh address.
pub fn public_key_to_address(public_key: &str) -> Result<MeshAddress, IdentityError> {
    MeshAddress::from_public_key(public_key)
}
