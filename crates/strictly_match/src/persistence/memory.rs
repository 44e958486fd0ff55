//! In-memory gateway for tests and ephemeral games.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use strictly_chess::{SessionMeta, StoredPly};
use tracing::{debug, instrument};

use crate::persistence::{PersistenceError, PersistenceGateway};

/// Keeps ply lists and settings in shared maps. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    sessions: Arc<Mutex<HashMap<String, Vec<StoredPly>>>>,
    metas: Arc<Mutex<HashMap<String, SessionMeta>>>,
}

impl InMemoryGateway {
    /// Creates an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions stored.
    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PersistenceGateway for InMemoryGateway {
    #[instrument(skip(self, plies), fields(count = plies.len()))]
    fn save(&self, session_id: &str, plies: &[StoredPly]) -> Result<(), PersistenceError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| PersistenceError::new("Session map lock poisoned"))?;
        sessions.insert(session_id.to_string(), plies.to_vec());
        debug!("Plies stored in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    fn load(&self, session_id: &str) -> Result<Option<Vec<StoredPly>>, PersistenceError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| PersistenceError::new("Session map lock poisoned"))?;
        Ok(sessions.get(session_id).cloned())
    }

    #[instrument(skip(self, meta), fields(human = %meta.human_color))]
    fn save_meta(&self, session_id: &str, meta: &SessionMeta) -> Result<(), PersistenceError> {
        let mut metas = self
            .metas
            .lock()
            .map_err(|_| PersistenceError::new("Meta map lock poisoned"))?;
        metas.insert(session_id.to_string(), meta.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    fn load_meta(&self, session_id: &str) -> Result<Option<SessionMeta>, PersistenceError> {
        let metas = self
            .metas
            .lock()
            .map_err(|_| PersistenceError::new("Meta map lock poisoned"))?;
        Ok(metas.get(session_id).cloned())
    }
}
