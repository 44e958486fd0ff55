//! Save and load of session ply lists and the settings they were played with.
//!
//! Storage is last-write-wins per session id: a save replaces whatever was
//! stored before. Failures are reported to the caller, which logs them and
//! keeps playing in memory.

mod error;
mod memory;
mod models;
mod schema; // Diesel generated schema - internal use only
mod sqlite;
mod writer;

pub use error::PersistenceError;
pub use memory::InMemoryGateway;
pub use models::{NewPlyRow, PlyRow, SessionMetaRow};
pub use sqlite::{MIGRATIONS, SqliteGateway};
pub use writer::PersistenceWriter;

use strictly_chess::{SessionMeta, StoredPly};

/// Storage for a session's ply list, keyed by session id.
pub trait PersistenceGateway: Send + Sync {
    /// Replaces the stored plies of `session_id`.
    fn save(&self, session_id: &str, plies: &[StoredPly]) -> Result<(), PersistenceError>;

    /// Loads the stored plies of `session_id`, or `None` if nothing was saved.
    fn load(&self, session_id: &str) -> Result<Option<Vec<StoredPly>>, PersistenceError>;

    /// Replaces the stored settings of `session_id`.
    fn save_meta(&self, session_id: &str, meta: &SessionMeta) -> Result<(), PersistenceError>;

    /// Loads the stored settings of `session_id`, or `None` if none were saved.
    fn load_meta(&self, session_id: &str) -> Result<Option<SessionMeta>, PersistenceError>;
}
