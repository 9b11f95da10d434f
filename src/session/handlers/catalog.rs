//! Function discovery and call engagement.

use crate::catalog::PageOutcome;
use crate::protocol::reply::FunctionEntries;
use crate::protocol::{self, bytes, Args, FN_LOG_SUBSCRIBE};
use crate::report::{Report, ReportSink};
use crate::session::{PendingCall, Session, SessionError, SessionState};
use crate::utils::Txid;
use tracing::{debug, info, warn};

impl<S: ReportSink> Session<S> {
    /// Request one page of the function catalog.
    pub(crate) fn request_function_page(&mut self, page: u32) {
        debug!(page, "Requesting function page");
        self.state = SessionState::Discovering;
        self.send(&protocol::available_functions_request(page));
    }

    /// Merge a catalog page; request the next or finish discovery.
    pub(in crate::session) fn on_function_page(
        &mut self,
        functions: FunctionEntries,
        more: bool,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Discovering {
            debug!(state = %self.state, more, "Function page outside discovery, merging only");
            self.catalog.merge_entries(functions);
            return Ok(());
        }

        match self.catalog.merge_page(functions, more) {
            PageOutcome::NextPage(page) => {
                self.request_function_page(page);
                Ok(())
            }
            PageOutcome::Complete { pages } => self.on_discovery_complete(pages),
        }
    }

    fn on_discovery_complete(&mut self, pages: u32) -> Result<(), SessionError> {
        let functions = self.catalog.len();
        info!(pages, functions, "Function discovery complete");
        self.sink
            .report(Report::DiscoveryComplete { pages, functions });

        self.state = SessionState::Ready;

        if let Some(level) = self.log_level.clone() {
            let mut overrides = Args::new();
            overrides.insert("level".to_string(), bytes(&level));
            if let Err(e) = self.engage(FN_LOG_SUBSCRIBE, None, None, &overrides) {
                warn!(error = %e, "Cannot subscribe to the daemon log");
            }
        }

        while let Some(call) = self.startup_calls.pop_front() {
            self.engage(&call.function, None, None, &call.overrides())?;
        }
        Ok(())
    }

    /// Engage a remote function.
    ///
    /// Resolves the arguments against the catalog, registers the pending
    /// call and requests its cookie. The call is signed and sent when the
    /// cookie arrives. Returns the transaction id the reply will carry.
    pub fn engage(
        &mut self,
        function: &str,
        txid: Option<Txid>,
        cursor: Option<i64>,
        overrides: &Args,
    ) -> Result<Txid, SessionError> {
        if !self.state.is_ready() {
            return Err(SessionError::NotReady(self.state));
        }

        let resolved = self.catalog.resolve_args(function, cursor, overrides)?;
        if !resolved.ignored.is_empty() {
            warn!(
                function,
                ignored = ?resolved.ignored,
                "Dropping arguments the function does not take"
            );
        }

        let txid = txid.unwrap_or_else(Txid::generate);
        self.register(PendingCall {
            txid: txid.clone(),
            function: function.to_string(),
            args: resolved.args,
            cursor: resolved.cursor,
        })?;

        debug!(txid = %txid, function, "Engaging remote function");
        Ok(self.request_cookie(&txid))
    }

    /// Engage a function with default cursor and a fresh txid.
    pub fn call(&mut self, function: &str, overrides: &Args) -> Result<Txid, SessionError> {
        self.engage(function, None, None, overrides)
    }

    /// Record a call awaiting its cookie.
    pub(crate) fn register(&mut self, call: PendingCall) -> Result<(), SessionError> {
        if self.pending.contains_key(&call.txid) {
            return Err(SessionError::DuplicateTxid(call.txid));
        }
        self.pending.insert(call.txid.clone(), call);
        Ok(())
    }

    /// Resolve the pending call a reply belongs to.
    ///
    /// The call is removed unless it is a log subscription, whose entries
    /// keep arriving on the same txid.
    pub(in crate::session) fn resolve_pending(&mut self, txid: Option<&Txid>) -> Option<PendingCall> {
        let txid = txid?;
        let keep = match self.pending.get(txid) {
            Some(call) => call.function == FN_LOG_SUBSCRIBE,
            None => {
                debug!(txid = %txid, "Unsolicited reply");
                return None;
            }
        };
        if keep {
            self.pending.get(txid).cloned()
        } else {
            self.pending.remove(txid)
        }
    }
}
