//! The auth gate state machine: login → PIN setup/verify → authenticated.
//!
//! Orchestrates the session store and the lockout policy. The gate state
//! itself is never persisted: it is re-derived from the stored record on
//! every process start, so a configured PIN is always re-demanded after a
//! reload. Only an explicit setup or verification success advances the
//! gate to [`GateState::Authenticated`] within the running process.
//!
//! ## Side effects
//! The gate performs no I/O beyond session-store writes: one full-record
//! save per mutating event (login, setup, attempt outcome, role change,
//! credits change) and one clear on logout / forgot-PIN. Store write
//! failures are logged and swallowed; the in-memory session keeps working
//! and the next mutation retries the write.

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::config::GateConfig;
use crate::security::lockout::LockoutPolicy;
use crate::security::pin::{self, IteratedSha256, PinHasher};
use crate::session::{SessionRecord, SessionStore, UserRole};

/// Where the session sits in the two-factor flow.
///
/// Derived from the persisted record at startup, advanced only by explicit
/// events, never by persistence alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No session record; primary login required.
    Unauthenticated,
    /// Logged in, but no PIN configured yet.
    PinSetupRequired,
    /// Logged in with a PIN on file; verification pending this process.
    PinGateOpen,
    /// Both factors passed.
    Authenticated,
}

/// Failure modes of a PIN setup submission.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    /// Rejected locally; never persisted.
    #[error("PIN must be exactly 6 digits")]
    MalformedPin,
    /// The gate is not in the setup phase.
    #[error("no session awaiting PIN setup")]
    NotAwaitingSetup,
}

/// Failure modes of a PIN verification attempt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// Rejected locally before the lockout policy runs; never counted as
    /// a failed attempt.
    #[error("PIN must be exactly 6 digits")]
    MalformedPin,
    /// Wrong PIN while the gate was open. When this failure reached the
    /// lockout threshold, `locked_for_ms` carries the window just opened.
    #[error("{}", incorrect_message(.attempts_remaining, .locked_for_ms))]
    Incorrect {
        attempts_remaining: u32,
        locked_for_ms: Option<u64>,
    },
    /// Attempt refused outright; the stored hash was never consulted and
    /// the counter did not change.
    #[error("{}", locked_message(.remaining_ms))]
    LockedOut { remaining_ms: u64 },
    /// The gate is not in the verification phase.
    #[error("no session awaiting PIN verification")]
    NotAwaitingVerification,
}

/// Failure mode of operations that require a fully-authenticated session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("not authenticated")]
    NotAuthenticated,
}

fn incorrect_message(attempts_remaining: &u32, locked_for_ms: &Option<u64>) -> String {
    match locked_for_ms {
        Some(ms) => format!("incorrect PIN; locked for {}s", ms.div_ceil(1000)),
        None => format!("incorrect PIN ({attempts_remaining} attempts remaining)"),
    }
}

fn locked_message(remaining_ms: &u64) -> String {
    format!(
        "too many failed attempts; try again in {}s",
        remaining_ms.div_ceil(1000)
    )
}

/// Current Unix epoch in milliseconds.
fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// The session and PIN gate state machine.
///
/// Owns the [`SessionStore`] and the in-memory working copy of the record;
/// every mutation is written back as a full record. Generic over the
/// injected [`PinHasher`] so hosts can swap the hash primitive.
pub struct AuthGate<H: PinHasher = IteratedSha256> {
    store: SessionStore,
    hasher: H,
    policy: LockoutPolicy,
    record: Option<SessionRecord>,
    state: GateState,
}

impl AuthGate<IteratedSha256> {
    /// Open the file-backed gate with the shipped hasher and the
    /// configured lockout policy.
    pub fn open(config: &GateConfig) -> anyhow::Result<Self> {
        let store = SessionStore::open(&config.session_db_path())?;
        Ok(Self::new(store, IteratedSha256, config.lockout.policy()))
    }
}

impl<H: PinHasher> AuthGate<H> {
    /// Build a gate over an existing store, deriving the initial state
    /// from the persisted record: absent → `Unauthenticated`, no PIN →
    /// `PinSetupRequired`, PIN on file → `PinGateOpen`.
    pub fn new(store: SessionStore, hasher: H, policy: LockoutPolicy) -> Self {
        let record = store.load();
        let state = match &record {
            None => GateState::Unauthenticated,
            Some(r) if r.has_pin() => GateState::PinGateOpen,
            Some(_) => GateState::PinSetupRequired,
        };
        tracing::debug!(state = ?state, "Auth gate initialized from persisted session");
        Self {
            store,
            hasher,
            policy,
            record,
            state,
        }
    }

    /// Current gate state.
    pub fn state(&self) -> GateState {
        self.state
    }

    /// The in-memory session record, if a login has happened.
    pub fn session(&self) -> Option<&SessionRecord> {
        self.record.as_ref()
    }

    /// Milliseconds left on the active lockout window, for countdown
    /// display. Zero when not locked out.
    pub fn lockout_remaining_ms(&self) -> u64 {
        self.record
            .as_ref()
            .map_or(0, |r| self.policy.remaining_ms(r.lockout_until, epoch_ms()))
    }

    /// Accept a session record from the external login provider.
    ///
    /// Always re-engages the second factor: the new state is
    /// `PinGateOpen` when the record carries a PIN hash, otherwise
    /// `PinSetupRequired`. A prior session, if any, is replaced.
    pub fn login(&mut self, record: SessionRecord) -> GateState {
        self.state = if record.has_pin() {
            GateState::PinGateOpen
        } else {
            GateState::PinSetupRequired
        };
        tracing::info!(
            user = %record.id,
            role = ?record.role,
            state = ?self.state,
            "Login accepted"
        );
        self.record = Some(record);
        self.persist();
        self.state
    }

    /// Configure the PIN for a session that has none yet. On success the
    /// gate advances straight to `Authenticated`; setup counts as
    /// passing the second factor.
    pub fn setup_pin(&mut self, pin: &str) -> Result<(), SetupError> {
        if self.state != GateState::PinSetupRequired {
            return Err(SetupError::NotAwaitingSetup);
        }
        let Some(record) = self.record.as_mut() else {
            return Err(SetupError::NotAwaitingSetup);
        };

        let pin = pin.trim();
        if !pin::is_well_formed(pin) {
            return Err(SetupError::MalformedPin);
        }

        record.pin_hash = Some(self.hasher.hash(pin));
        let (attempts, lockout) = self.policy.record_success();
        record.failed_pin_attempts = attempts;
        record.lockout_until = lockout;
        let user = record.id.clone();
        self.persist();
        self.state = GateState::Authenticated;
        tracing::info!(user = %user, "PIN configured; session authenticated");
        Ok(())
    }

    /// Submit a PIN for verification against the stored hash.
    ///
    /// Malformed input is rejected before the lockout policy runs and
    /// never counts as a failed attempt. While a lockout window is
    /// active the attempt is refused outright, without consulting the
    /// hash or touching the counter.
    pub fn verify_pin(&mut self, pin: &str) -> Result<(), VerifyError> {
        if self.state != GateState::PinGateOpen {
            return Err(VerifyError::NotAwaitingVerification);
        }
        let Some(record) = self.record.as_mut() else {
            return Err(VerifyError::NotAwaitingVerification);
        };
        let Some(stored_hash) = record.pin_hash.clone() else {
            return Err(VerifyError::NotAwaitingVerification);
        };

        let pin = pin.trim();
        if !pin::is_well_formed(pin) {
            return Err(VerifyError::MalformedPin);
        }

        let now = epoch_ms();
        if self.policy.is_locked(record.lockout_until, now) {
            let remaining_ms = self.policy.remaining_ms(record.lockout_until, now);
            tracing::warn!(remaining_ms, "PIN attempt refused while locked out");
            return Err(VerifyError::LockedOut { remaining_ms });
        }

        if self.hasher.verify(pin, &stored_hash) {
            let (attempts, lockout) = self.policy.record_success();
            record.failed_pin_attempts = attempts;
            record.lockout_until = lockout;
            let user = record.id.clone();
            self.persist();
            self.state = GateState::Authenticated;
            tracing::info!(user = %user, "PIN verified; session authenticated");
            Ok(())
        } else {
            let (attempts, lockout) = self.policy.record_failure(record.failed_pin_attempts, now);
            record.failed_pin_attempts = attempts;
            record.lockout_until = lockout;
            self.persist();
            let locked_for_ms = lockout.map(|until| until.saturating_sub(now));
            tracing::warn!(
                attempts,
                locked = locked_for_ms.is_some(),
                "PIN verification failed"
            );
            Err(VerifyError::Incorrect {
                attempts_remaining: self.policy.attempts_remaining(attempts),
                locked_for_ms,
            })
        }
    }

    /// "Forgot PIN" escape hatch: cancels the PIN-gate path, discarding
    /// the session and all lockout state. Unconditionally succeeds and
    /// returns to primary login.
    pub fn forget_pin(&mut self) -> GateState {
        tracing::warn!("PIN forgotten; discarding session");
        self.clear_session()
    }

    /// Log out, clearing the persisted session. Unconditionally succeeds.
    pub fn logout(&mut self) -> GateState {
        tracing::info!("Logged out; session cleared");
        self.clear_session()
    }

    /// Cycle the session role Client → Professional → Admin → Client.
    /// Demo affordance: the PIN is not re-demanded.
    pub fn cycle_role(&mut self) -> Result<UserRole, GateError> {
        if self.state != GateState::Authenticated {
            return Err(GateError::NotAuthenticated);
        }
        let Some(record) = self.record.as_mut() else {
            return Err(GateError::NotAuthenticated);
        };

        record.role = record.role.next();
        let role = record.role;
        self.persist();
        tracing::info!(role = ?role, "Session role cycled");
        Ok(role)
    }

    /// Write-through update of the credit balance.
    pub fn set_credits(&mut self, credits: i64) -> Result<(), GateError> {
        if self.state != GateState::Authenticated {
            return Err(GateError::NotAuthenticated);
        }
        let Some(record) = self.record.as_mut() else {
            return Err(GateError::NotAuthenticated);
        };

        record.credits = credits;
        self.persist();
        Ok(())
    }

    /// Best-effort full-record write-back. The in-memory session stays
    /// authoritative; the next mutation retries a failed write.
    fn persist(&self) {
        if let Some(record) = &self.record {
            if let Err(e) = self.store.save(record) {
                tracing::error!("Failed to persist session record: {e:#}");
            }
        }
    }

    fn clear_session(&mut self) -> GateState {
        if let Err(e) = self.store.clear() {
            tracing::error!("Failed to clear session store: {e:#}");
        }
        self.record = None;
        self.state = GateState::Unauthenticated;
        GateState::Unauthenticated
    }
}
