//! Shared utilities.

pub mod txid;

pub use txid::{Txid, TXID_LEN};
