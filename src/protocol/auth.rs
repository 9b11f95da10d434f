//! Signed call envelopes.
//!
//! A privileged call is signed in two passes. The first hash binds the
//! shared secret to the daemon's cookie; it is placed in the envelope, the
//! envelope is encoded, and the hash of those exact bytes replaces it. The
//! daemon recomputes the second hash over what it receives, so the
//! signature covers the final wire form of every other field.

use super::{args_value, bytes, dict, encode, Args, ProtocolError};
use crate::utils::Txid;
use serde_bencode::value::Value;
use sha2::{Digest, Sha256};

/// Result of signing a call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedCall {
    /// `hex(SHA-256(secret || cookie))`, the hash before the envelope pass.
    pub cookie_hash: String,
    /// `hex(SHA-256(envelope encoded with cookie_hash))`, sent on the wire.
    pub hash: String,
    /// Final encoded envelope.
    pub bytes: Vec<u8>,
}

/// Lowercase hex SHA-256 of the concatenated parts.
fn sha256_hex(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

/// Build the auth envelope with the given hash in place.
fn envelope(function: &str, hash: &str, cookie: &str, args: &Args, txid: &Txid) -> Value {
    dict([
        ("q", bytes("auth")),
        ("aq", bytes(function)),
        ("hash", bytes(hash)),
        ("cookie", bytes(cookie)),
        ("args", args_value(args)),
        ("txid", bytes(txid.as_str())),
    ])
}

/// Sign a call to `function` with the daemon-issued `cookie`.
pub fn sign_call(
    secret: &str,
    cookie: &str,
    function: &str,
    args: &Args,
    txid: &Txid,
) -> Result<SignedCall, ProtocolError> {
    let cookie_hash = sha256_hex(&[secret.as_bytes(), cookie.as_bytes()]);

    let first_pass = encode(&envelope(function, &cookie_hash, cookie, args, txid))?;
    let hash = sha256_hex(&[first_pass.as_slice()]);

    let bytes = encode(&envelope(function, &hash, cookie, args, txid))?;

    Ok(SignedCall {
        cookie_hash,
        hash,
        bytes,
    })
}
