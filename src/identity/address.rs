//! 128-bit mesh address derived from a public key.

use std::fmt;
use std::net::Ipv6Addr;

use super::{decode_base32, sha512, IdentityError, MESH_ADDRESS_PREFIX, PUBLIC_KEY_SUFFIX};

/// 128-bit mesh address with IPv6 format.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshAddress([u8; 16]);

impl MeshAddress {
    /// Create an address from a 16-byte array.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Derive the address of a `<base32>.k` public key.
    ///
    /// The prefix is not checked: a key that hashes outside `fc00::/8`
    /// still yields an address, as the daemon would report it.
    pub fn from_public_key(public_key: &str) -> Result<Self, IdentityError> {
        let encoded = public_key
            .strip_suffix(PUBLIC_KEY_SUFFIX)
            .ok_or_else(|| IdentityError::MissingKeySuffix(public_key.to_string()))?;

        let key = decode_base32(encoded)?;
        if key.len() != 32 {
            return Err(IdentityError::InvalidKeyLength(key.len()));
        }

        let hash = sha512(&sha512(&key));
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);
        Ok(Self(bytes))
    }

    /// Return the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Whether the address falls in the mesh range.
    pub fn is_mesh(&self) -> bool {
        self.0[0] == MESH_ADDRESS_PREFIX
    }

    /// Convert to std::net::Ipv6Addr.
    pub fn to_ipv6(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.0)
    }
}

impl From<MeshAddress> for Ipv6Addr {
    fn from(addr: MeshAddress) -> Self {
        Ipv6Addr::from(addr.0)
    }
}

impl fmt::Debug for MeshAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MeshAddress({})", self)
    }
}

/// Full, uncompressed form (`fc50:d238:...`), which is how the daemon
/// keys its routing table.
impl fmt::Display for MeshAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pair) in self.0.chunks(2).enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}{:02x}", pair[0], pair[1])?;
        }
        Ok(())
    }
}
