//! Authentication session store.
//!
//! # Responsibility
//! - Hold the current credential and identity.
//! - Mirror them to two independent durable keys.
//!
//! # Invariants
//! - Rehydration promotes to authenticated only when both keys are present
//!   and non-empty. A torn write (one key only) reads back as logged out.
//! - The two keys are written independently; no cross-key atomicity.
//! - Credential and identity values never appear in log lines.

use super::{Outcome, StoreWarning};
use crate::kv::{KvResult, KvStore};
use crate::model::session::Session;
use log::{info, warn};

/// Durable key holding the bearer credential.
pub const SESSION_CREDENTIAL_KEY: &str = "auth_token";
/// Durable key holding the identity (email).
pub const SESSION_IDENTITY_KEY: &str = "user_email";

/// Write-through store for the authentication session.
pub struct SessionStore<S: KvStore> {
    kv: S,
    session: Session,
}

impl<S: KvStore> SessionStore<S> {
    /// Creates a logged-out store without touching durable storage.
    pub fn new(kv: S) -> Self {
        Self {
            kv,
            session: Session::default(),
        }
    }

    /// Creates a store and rehydrates it from durable storage.
    pub fn open(kv: S) -> Outcome<Self> {
        let mut store = Self::new(kv);
        let warnings = store.initialize().warnings;
        Outcome::with_warnings(store, warnings)
    }

    /// Replaces in-memory state with what durable storage holds.
    ///
    /// Returns whether the rehydrated session is authenticated. Unreadable
    /// keys count as absent.
    pub fn initialize(&mut self) -> Outcome<bool> {
        let mut warnings = Vec::new();
        let credential = read_or_warn(&self.kv, SESSION_CREDENTIAL_KEY, &mut warnings);
        let identity = read_or_warn(&self.kv, SESSION_IDENTITY_KEY, &mut warnings);

        self.session = match (credential, identity) {
            (Some(credential), Some(identity)) => Session::new(credential, identity),
            (credential, identity) => {
                if credential.is_some() != identity.is_some() {
                    warn!(
                        "event=session_init module=store status=partial credential_present={} identity_present={}",
                        credential.is_some(),
                        identity.is_some()
                    );
                }
                Session::default()
            }
        };

        let authenticated = self.session.is_authenticated();
        info!("event=session_init module=store status=ok authenticated={authenticated}");
        Outcome::with_warnings(authenticated, warnings)
    }

    /// Sets both fields in memory, then writes both durable keys.
    ///
    /// Both writes are attempted even if the first fails.
    pub fn set_session(
        &mut self,
        credential: impl Into<String>,
        identity: impl Into<String>,
    ) -> Outcome<()> {
        self.session = Session::new(credential, identity);

        let mut warnings = Vec::new();
        persist(
            self.kv.write(SESSION_CREDENTIAL_KEY, &self.session.credential),
            SESSION_CREDENTIAL_KEY,
            &mut warnings,
        );
        persist(
            self.kv.write(SESSION_IDENTITY_KEY, &self.session.identity),
            SESSION_IDENTITY_KEY,
            &mut warnings,
        );

        log_mutation("session_set", &warnings);
        Outcome::with_warnings((), warnings)
    }

    /// Clears both fields in memory, then removes both durable keys.
    pub fn clear_session(&mut self) -> Outcome<()> {
        self.session = Session::default();

        let mut warnings = Vec::new();
        persist(
            self.kv.remove(SESSION_CREDENTIAL_KEY),
            SESSION_CREDENTIAL_KEY,
            &mut warnings,
        );
        persist(
            self.kv.remove(SESSION_IDENTITY_KEY),
            SESSION_IDENTITY_KEY,
            &mut warnings,
        );

        log_mutation("session_clear", &warnings);
        Outcome::with_warnings((), warnings)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Current identity, empty when logged out.
    pub fn identity(&self) -> &str {
        &self.session.identity
    }

    /// Current bearer credential, empty when logged out.
    pub fn credential(&self) -> &str {
        &self.session.credential
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

fn read_or_warn<S: KvStore>(
    kv: &S,
    key: &'static str,
    warnings: &mut Vec<StoreWarning>,
) -> Option<String> {
    match kv.read(key) {
        Ok(value) => value.filter(|value| !value.is_empty()),
        Err(source) => {
            warn!("event=session_init module=store status=error key={key} error={source}");
            warnings.push(StoreWarning::ReadFailed { key, source });
            None
        }
    }
}

fn persist(result: KvResult<()>, key: &'static str, warnings: &mut Vec<StoreWarning>) {
    if let Err(source) = result {
        warnings.push(StoreWarning::WriteFailed { key, source });
    }
}

fn log_mutation(event: &str, warnings: &[StoreWarning]) {
    if warnings.is_empty() {
        info!("event={event} module=store status=ok");
        return;
    }
    for warning in warnings {
        warn!(
            "event={event} module=store status=degraded key={} error_code={} error={warning}",
            warning.key(),
            warning.code()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionStore, SESSION_CREDENTIAL_KEY, SESSION_IDENTITY_KEY};
    use crate::kv::{KvStore, MemoryKvStore};

    #[test]
    fn empty_values_are_treated_as_absent_on_rehydration() {
        let kv = MemoryKvStore::new();
        kv.write(SESSION_CREDENTIAL_KEY, "").unwrap();
        kv.write(SESSION_IDENTITY_KEY, "a@b.c").unwrap();

        let store = SessionStore::open(&kv).into_value();
        assert!(!store.is_authenticated());
        assert_eq!(store.identity(), "");
    }

    #[test]
    fn initialize_resets_memory_to_durable_state() {
        let kv = MemoryKvStore::new();
        let mut store = SessionStore::new(&kv);
        store.set_session("token", "a@b.c").into_result().unwrap();

        kv.remove(SESSION_IDENTITY_KEY).unwrap();
        let authenticated = store.initialize().into_value();

        assert!(!authenticated);
        assert!(!store.is_authenticated());
        assert_eq!(store.credential(), "");
    }
}
