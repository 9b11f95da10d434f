//! Session lifecycle: liveness probing, idle countdown and shutdown.

use super::{Session, SessionError, SessionState, TimerKind};
use crate::protocol;
use crate::report::{Report, ReportSink};
use std::time::Instant;
use tracing::{debug, info};

impl<S: ReportSink> Session<S> {
    /// Start the session: send the first ping and arm the idle countdown.
    pub fn start(&mut self, now: Instant) -> Result<(), SessionError> {
        match self.state {
            SessionState::Init => {}
            SessionState::Stopped => return Err(SessionError::Stopped),
            _ => return Err(SessionError::AlreadyStarted),
        }

        info!(remote_addr = %self.remote_addr, "Connecting to admin endpoint");
        self.state = SessionState::Probing;
        self.countdown = self.timeout_ticks;
        self.ping(now);
        self.timers
            .schedule(TimerKind::Countdown, now + self.tick_interval);
        Ok(())
    }

    /// Send a ping and schedule the pong check.
    pub(crate) fn ping(&mut self, now: Instant) {
        debug!("Pinging admin endpoint");
        self.send(&protocol::ping_request());
        self.timers
            .schedule(TimerKind::PingCheck, now + self.ping_check);
    }

    /// Ping again if no pong has arrived since the last ping.
    pub(crate) fn check_ponged(&mut self, now: Instant) {
        if self.ponged {
            debug!("Admin endpoint is responding");
        } else {
            info!("No pong yet, pinging again");
            self.ping(now);
        }
    }

    /// Handle a pong: the first one starts function discovery.
    pub(crate) fn on_pong(&mut self) {
        if self.ponged {
            debug!("Duplicate pong ignored");
            return;
        }
        self.ponged = true;
        self.state = SessionState::Alive;
        self.timers.cancel(TimerKind::PingCheck);
        info!("Admin endpoint is alive, discovering functions");

        self.catalog.reset_pages();
        self.request_function_page(0);
    }

    /// Restore the idle countdown to its full value.
    pub(crate) fn reset_countdown(&mut self) {
        self.countdown = self.timeout_ticks;
    }

    /// One tick of the idle countdown; stops the session when it runs out.
    pub(crate) fn advance_countdown(&mut self, now: Instant) {
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown < 1 {
            self.stop("No activity");
            return;
        }
        info!(
            ticks = self.countdown,
            "Stopping unless there's more data"
        );
        self.timers
            .schedule(TimerKind::Countdown, now + self.tick_interval);
    }

    /// Stop the session, cancelling all scheduled work.
    ///
    /// Stopping twice is a no-op.
    pub fn stop(&mut self, reason: &str) {
        if self.state.is_stopped() {
            return;
        }
        self.timers.cancel_all();
        self.outbox.clear();
        self.state = SessionState::Stopped;
        info!(
            reason,
            pending = self.pending.len(),
            "Admin session stopped"
        );
        self.sink.report(Report::Stopping {
            reason: reason.to_string(),
        });
    }

    /// Fire every timer due at `now`.
    pub fn fire_due_timers(&mut self, now: Instant) {
        for kind in self.timers.take_due(now) {
            if self.state.is_stopped() {
                break;
            }
            match kind {
                TimerKind::PingCheck => self.check_ponged(now),
                TimerKind::Countdown => self.advance_countdown(now),
            }
        }
    }
}
