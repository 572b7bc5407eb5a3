//! Session registry: maps allocated transfer codes to file paths.
//!
//! The code doubles as the TCP port the one-shot transfer listens on. The
//! registry is constructed once by the top-level state and shared by
//! reference; entries are never evicted, they only advance through the
//! session state machine.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use thiserror::Error;

/// Default allocation range. Low end skips privileged ports.
pub const DEFAULT_CODE_RANGE: RangeInclusive<u16> = 1024..=65535;

/// Collision retries before declaring the code space exhausted. Generous
/// relative to the range size so it only trips when the map is nearly full.
const MAX_ALLOC_ATTEMPTS: u32 = 10_000;

/// Per-session lifecycle, terminal once Completed or Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Offered,
    Serving,
    Completed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    path: PathBuf,
    state: SessionState,
}

impl Session {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: SessionState::Offered,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no code registered for {0}")]
    UnknownCode(u16),
    #[error("transfer code space exhausted")]
    CodeSpaceExhausted,
    #[error("session {code} already {state:?}, cannot transition to {requested:?}")]
    InvalidTransition {
        code: u16,
        state: SessionState,
        requested: SessionState,
    },
}

/// Concurrency-safe store of offered files, keyed by code.
pub struct SessionRegistry {
    sessions: DashMap<u16, Session>,
    code_range: RangeInclusive<u16>,
}

impl SessionRegistry {
    pub fn new(code_range: RangeInclusive<u16>) -> Self {
        Self {
            sessions: DashMap::new(),
            code_range,
        }
    }

    /// Allocate a fresh code for `path` and record the session as Offered.
    ///
    /// Candidates are drawn pseudo-randomly from the configured range; the
    /// entry API makes the check-and-insert atomic, so concurrent callers
    /// can never receive the same code.
    pub fn offer(&self, path: impl AsRef<Path>) -> Result<u16, RegistryError> {
        let path = path.as_ref().to_path_buf();
        let mut rng = rand::thread_rng();

        for _ in 0..MAX_ALLOC_ATTEMPTS {
            let candidate = rng.gen_range(self.code_range.clone());
            match self.sessions.entry(candidate) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    slot.insert(Session::new(path));
                    tracing::debug!(code = candidate, "offered file");
                    return Ok(candidate);
                }
            }
        }
        // Either the range is (nearly) full or we are extraordinarily
        // unlucky; surface it as the fatal condition it is.
        Err(RegistryError::CodeSpaceExhausted)
    }

    /// Path registered under `code`, regardless of session state.
    pub fn lookup(&self, code: u16) -> Option<PathBuf> {
        self.sessions.get(&code).map(|entry| entry.path.clone())
    }

    pub fn state(&self, code: u16) -> Option<SessionState> {
        self.sessions.get(&code).map(|entry| entry.state)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Advance a session's state. Terminal states reject all transitions, and
    /// Serving can only be entered from Offered, so a consumed code cannot be
    /// served a second time.
    pub fn transition(&self, code: u16, next: SessionState) -> Result<(), RegistryError> {
        let mut entry = self
            .sessions
            .get_mut(&code)
            .ok_or(RegistryError::UnknownCode(code))?;

        let current = entry.state;
        let allowed = match next {
            SessionState::Offered => false,
            SessionState::Serving => current == SessionState::Offered,
            SessionState::Completed | SessionState::Failed => current == SessionState::Serving,
        };
        if !allowed {
            return Err(RegistryError::InvalidTransition {
                code,
                state: current,
                requested: next,
            });
        }

        entry.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offer_and_lookup_round_trip() {
        let registry = SessionRegistry::new(DEFAULT_CODE_RANGE);
        let code = registry.offer("/tmp/example.bin").expect("offer");
        assert!(DEFAULT_CODE_RANGE.contains(&code));
        assert_eq!(registry.lookup(code), Some(PathBuf::from("/tmp/example.bin")));
        assert_eq!(registry.state(code), Some(SessionState::Offered));
    }

    #[test]
    fn lookup_unknown_code_is_none() {
        let registry = SessionRegistry::new(DEFAULT_CODE_RANGE);
        assert_eq!(registry.lookup(4242), None);
    }

    #[test]
    fn single_slot_range_exhausts() {
        let registry = SessionRegistry::new(5000..=5000);
        assert_eq!(registry.offer("/tmp/a").expect("first offer"), 5000);
        assert_eq!(
            registry.offer("/tmp/b"),
            Err(RegistryError::CodeSpaceExhausted)
        );
    }

    #[test]
    fn transitions_follow_the_state_machine() {
        let registry = SessionRegistry::new(6000..=6000);
        let code = registry.offer("/tmp/a").expect("offer");

        // Completed straight from Offered is not a legal step
        assert!(matches!(
            registry.transition(code, SessionState::Completed),
            Err(RegistryError::InvalidTransition { .. })
        ));

        registry
            .transition(code, SessionState::Serving)
            .expect("offered -> serving");
        registry
            .transition(code, SessionState::Completed)
            .expect("serving -> completed");

        // Terminal: no way back
        assert!(registry.transition(code, SessionState::Serving).is_err());
        assert!(registry.transition(code, SessionState::Failed).is_err());
        assert_eq!(registry.state(code), Some(SessionState::Completed));
    }

    #[test]
    fn entry_survives_completion() {
        let registry = SessionRegistry::new(7000..=7000);
        let code = registry.offer("/tmp/kept").expect("offer");
        registry.transition(code, SessionState::Serving).unwrap();
        registry.transition(code, SessionState::Completed).unwrap();
        assert_eq!(registry.lookup(code), Some(PathBuf::from("/tmp/kept")));
    }
}
