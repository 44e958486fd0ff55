//! SQLite gateway backed by diesel.

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use strictly_chess::{SessionMeta, StoredPly};
use tracing::{debug, info, instrument};

use crate::persistence::{
    NewPlyRow, PersistenceError, PersistenceGateway, PlyRow, SessionMetaRow, schema,
};

/// Migrations for the ply and session meta tables.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Stores ply lists and session settings in a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteGateway {
    db_path: String,
}

impl SqliteGateway {
    /// Opens the database at `db_path`, creating it and applying pending
    /// migrations as needed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the database cannot be opened or migrated.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn open(db_path: String) -> Result<Self, PersistenceError> {
        let gateway = Self { db_path };
        let mut conn = gateway.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| PersistenceError::new(format!("Migrations failed: {}", e)))?;
        info!(path = %gateway.db_path, applied = applied.len(), "SqliteGateway ready");
        Ok(gateway)
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, PersistenceError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path).map_err(|e| {
            PersistenceError::new(format!("Failed to connect to '{}': {}", self.db_path, e))
        })
    }

    /// Ids of every stored session, most recently written first.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_sessions(&self) -> Result<Vec<String>, PersistenceError> {
        use schema::session_plies::dsl;

        let mut conn = self.connection()?;
        let mut rows: Vec<(String, Option<i32>)> = dsl::session_plies
            .group_by(dsl::session_id)
            .select((dsl::session_id, diesel::dsl::max(dsl::id)))
            .load(&mut conn)?;

        rows.sort_by(|a, b| b.1.cmp(&a.1));
        let ids: Vec<String> = rows.into_iter().map(|(id, _)| id).collect();
        debug!(count = ids.len(), "Sessions listed");
        Ok(ids)
    }
}

impl PersistenceGateway for SqliteGateway {
    #[instrument(skip(self, plies), fields(count = plies.len()))]
    fn save(&self, session_id: &str, plies: &[StoredPly]) -> Result<(), PersistenceError> {
        use schema::session_plies::dsl;

        let rows = plies
            .iter()
            .map(|ply| NewPlyRow::from_stored(session_id, ply))
            .collect::<Result<Vec<_>, _>>()?;

        let mut conn = self.connection()?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(dsl::session_plies.filter(dsl::session_id.eq(session_id)))
                .execute(conn)?;
            diesel::insert_into(dsl::session_plies)
                .values(&rows)
                .execute(conn)?;
            Ok(())
        })?;

        debug!("Plies saved");
        Ok(())
    }

    #[instrument(skip(self))]
    fn load(&self, session_id: &str) -> Result<Option<Vec<StoredPly>>, PersistenceError> {
        use schema::session_plies::dsl;

        let mut conn = self.connection()?;
        let rows = dsl::session_plies
            .filter(dsl::session_id.eq(session_id))
            .order(dsl::ply_index.asc())
            .select(PlyRow::as_select())
            .load::<PlyRow>(&mut conn)?;

        if rows.is_empty() {
            debug!("No stored plies");
            return Ok(None);
        }

        let plies = rows
            .into_iter()
            .map(PlyRow::into_stored)
            .collect::<Result<Vec<_>, _>>()?;
        info!(count = plies.len(), "Plies loaded");
        Ok(Some(plies))
    }

    #[instrument(skip(self, meta), fields(human = %meta.human_color))]
    fn save_meta(&self, session_id: &str, meta: &SessionMeta) -> Result<(), PersistenceError> {
        let row = SessionMetaRow::from_meta(session_id, meta)?;
        let mut conn = self.connection()?;
        diesel::replace_into(schema::session_meta::table)
            .values(&row)
            .execute(&mut conn)?;
        debug!("Session meta saved");
        Ok(())
    }

    #[instrument(skip(self))]
    fn load_meta(&self, session_id: &str) -> Result<Option<SessionMeta>, PersistenceError> {
        use schema::session_meta::dsl;

        let mut conn = self.connection()?;
        let row = dsl::session_meta
            .filter(dsl::session_id.eq(session_id))
            .select(SessionMetaRow::as_select())
            .first::<SessionMetaRow>(&mut conn)
            .optional()?;
        row.map(SessionMetaRow::into_meta).transpose()
    }
}
