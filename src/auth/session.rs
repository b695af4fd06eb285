use thiserror::Error;

use crate::models::AuthUser;

/// What is currently known about the visitor's session.
///
/// `Unknown` is not a guess: it means a fresh check is in flight and
/// nothing may act on a previous answer until it lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSessionState {
    Unknown,
    Authenticated(AuthUser),
    Unauthenticated,
}

impl AuthSessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthSessionState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            AuthSessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Result of a completed backend check, after ambiguous failures have
/// already been collapsed to "no session".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Valid(AuthUser),
    NoSession,
}

/// Proof that a specific check cycle was started. Applying an outcome
/// requires the ticket, which is how answers from superseded cycles get
/// rejected instead of clobbering newer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckTicket {
    epoch: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("check cycle {ticket} is stale (current cycle is {current})")]
    StaleTicket { ticket: u64, current: u64 },
    #[error("check cycle {ticket} was already resolved")]
    AlreadyResolved { ticket: u64 },
}

/// The session state machine. Tracks which check cycle is current so only
/// the answer belonging to the newest cycle can change the state; anything
/// else comes back as a [`TransitionError`] and leaves the state untouched.
#[derive(Debug)]
pub struct SessionTracker {
    state: AuthSessionState,
    epoch: u64,
    pending: bool,
}

impl SessionTracker {
    pub fn new() -> Self {
        SessionTracker {
            state: AuthSessionState::Unknown,
            epoch: 0,
            pending: false,
        }
    }

    pub fn state(&self) -> &AuthSessionState {
        &self.state
    }

    pub fn check_in_flight(&self) -> bool {
        self.pending
    }

    /// Starts a new check cycle. The state drops back to `Unknown` until
    /// the matching resolve arrives; a check still in flight is orphaned.
    pub fn begin_check(&mut self) -> CheckTicket {
        self.epoch += 1;
        self.pending = true;
        self.state = AuthSessionState::Unknown;
        CheckTicket { epoch: self.epoch }
    }

    /// Applies the outcome of the cycle `ticket` belongs to, exactly once.
    pub fn resolve(
        &mut self,
        ticket: CheckTicket,
        outcome: CheckOutcome,
    ) -> Result<&AuthSessionState, TransitionError> {
        if ticket.epoch != self.epoch {
            return Err(TransitionError::StaleTicket {
                ticket: ticket.epoch,
                current: self.epoch,
            });
        }
        if !self.pending {
            return Err(TransitionError::AlreadyResolved {
                ticket: ticket.epoch,
            });
        }
        self.pending = false;
        self.state = match outcome {
            CheckOutcome::Valid(user) => AuthSessionState::Authenticated(user),
            CheckOutcome::NoSession => AuthSessionState::Unauthenticated,
        };
        Ok(&self.state)
    }

    /// Abandons whatever check is in flight, for a consumer going away
    /// mid-check. The late answer for the abandoned cycle is rejected as
    /// stale when it eventually arrives.
    pub fn detach(&mut self) {
        self.epoch += 1;
        self.pending = false;
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}
