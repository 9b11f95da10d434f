//! Cookie handshake for authenticated calls.

use crate::protocol::{self, sign_call};
use crate::report::ReportSink;
use crate::session::Session;
use crate::utils::Txid;
use tracing::{debug, warn};

impl<S: ReportSink> Session<S> {
    /// Ask the daemon for a cookie on behalf of `txid`.
    pub(crate) fn request_cookie(&mut self, txid: &Txid) -> Txid {
        self.send(&protocol::cookie_request(txid));
        txid.clone()
    }

    /// Sign and send the pending call a cookie was issued for.
    pub(in crate::session) fn handle_cookie(&mut self, txid: Option<Txid>, cookie: &str) {
        let Some(txid) = txid else {
            warn!("Cookie reply without txid, dropping");
            return;
        };
        let Some(call) = self.pending.get(&txid) else {
            warn!(txid = %txid, "Cookie for unknown transaction, dropping");
            return;
        };

        match sign_call(&self.secret, cookie, &call.function, &call.args, &call.txid) {
            Ok(signed) => {
                debug!(
                    txid = %txid,
                    function = %call.function,
                    "Sending signed call"
                );
                self.outbox.push_back(signed.bytes);
            }
            Err(e) => {
                warn!(txid = %txid, error = %e, "Failed to sign call");
            }
        }
    }
}
