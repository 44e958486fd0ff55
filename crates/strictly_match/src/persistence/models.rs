//! Database rows for stored plies and session metadata.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use strictly_chess::{Color, Difficulty, MatchMode, SessionMeta, StoredPly};
use tracing::instrument;

use crate::persistence::{PersistenceError, schema};

/// One stored ply row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::session_plies)]
pub struct PlyRow {
    id: i32,
    session_id: String,
    ply_index: i32,
    position: String,
    move_text: Option<String>,
    mover: Option<String>,
    notation: String,
    created_at: NaiveDateTime,
}

impl PlyRow {
    /// Converts the row back into a [`StoredPly`].
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the index is negative or the mover is
    /// not a color name.
    #[instrument(skip(self), fields(session_id = %self.session_id, ply_index = self.ply_index))]
    pub fn into_stored(self) -> Result<StoredPly, PersistenceError> {
        let index = usize::try_from(self.ply_index)
            .map_err(|_| PersistenceError::new(format!("Negative ply index {}", self.ply_index)))?;
        let mover = self
            .mover
            .as_deref()
            .map(|text| {
                text.parse::<Color>()
                    .map_err(|_| PersistenceError::new(format!("Invalid mover '{}'", text)))
            })
            .transpose()?;
        Ok(StoredPly {
            index,
            position: self.position,
            mv: self.move_text,
            mover,
            notation: self.notation,
            created_at: self.created_at.and_utc(),
        })
    }
}

/// Insertable ply row.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::session_plies)]
pub struct NewPlyRow {
    session_id: String,
    ply_index: i32,
    position: String,
    move_text: Option<String>,
    mover: Option<String>,
    notation: String,
    created_at: NaiveDateTime,
}

impl NewPlyRow {
    /// Builds the row for `ply` in `session_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the index does not fit the column.
    #[instrument(skip(ply), fields(ply_index = ply.index))]
    pub fn from_stored(session_id: &str, ply: &StoredPly) -> Result<Self, PersistenceError> {
        let ply_index = i32::try_from(ply.index)
            .map_err(|_| PersistenceError::new(format!("Ply index {} too large", ply.index)))?;
        Ok(Self::new(
            session_id.to_string(),
            ply_index,
            ply.position.clone(),
            ply.mv.clone(),
            ply.mover.map(|c| c.to_string()),
            ply.notation.clone(),
            ply.created_at.naive_utc(),
        ))
    }
}

/// Stored session settings, one row per session.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Getters)]
#[diesel(table_name = schema::session_meta)]
pub struct SessionMetaRow {
    session_id: String,
    human_color: String,
    difficulty: String,
    mode: String,
    updated_at: NaiveDateTime,
}

impl SessionMetaRow {
    /// Builds the row for `meta`. The mode is kept as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the mode cannot be serialized.
    #[instrument(skip(meta), fields(human = %meta.human_color))]
    pub fn from_meta(session_id: &str, meta: &SessionMeta) -> Result<Self, PersistenceError> {
        let mode = serde_json::to_string(&meta.mode)
            .map_err(|e| PersistenceError::new(format!("Failed to encode mode: {}", e)))?;
        Ok(Self {
            session_id: session_id.to_string(),
            human_color: meta.human_color.to_string(),
            difficulty: meta.difficulty.to_string(),
            mode,
            updated_at: chrono::Utc::now().naive_utc(),
        })
    }

    /// Converts the row back into [`SessionMeta`].
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if a column does not decode.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub fn into_meta(self) -> Result<SessionMeta, PersistenceError> {
        let human_color = self.human_color.parse::<Color>().map_err(|_| {
            PersistenceError::new(format!("Invalid human color '{}'", self.human_color))
        })?;
        let difficulty = self.difficulty.parse::<Difficulty>().map_err(|_| {
            PersistenceError::new(format!("Invalid difficulty '{}'", self.difficulty))
        })?;
        let mode: MatchMode = serde_json::from_str(&self.mode)
            .map_err(|e| PersistenceError::new(format!("Invalid mode '{}': {}", self.mode, e)))?;
        Ok(SessionMeta {
            human_color,
            difficulty,
            mode,
        })
    }
}
