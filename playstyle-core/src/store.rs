//! Read-only query surface over the gameplay event store.
//!
//! Every method is a single aggregate over the full event history; there is
//! no session filtering and nothing is cached. An [`EventStore`] is meant to
//! be opened for one analysis and dropped right after, which closes the
//! underlying connection on every exit path.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::{PlaystyleError, Result};
use crate::types::ActionKind;

/// Direction statistics over the ordered MOVE actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveStats {
    /// Number of MOVE actions.
    pub moves: u64,
    /// Consecutive MOVE pairs whose direction differs.
    pub direction_changes: u64,
}

/// Averages over the resource-collection events.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollectionAverages {
    /// Mean milliseconds to collect, `None` without data.
    pub avg_time_ms: Option<f64>,
    /// Mean distance traveled, `None` without data.
    pub avg_distance: Option<f64>,
}

/// Handle to an event database opened for reading.
pub struct EventStore {
    conn: Connection,
    db_path: PathBuf,
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl EventStore {
    /// Open the SQLite database at `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns [`PlaystyleError::StoreNotFound`] if the file does not exist,
    /// or [`PlaystyleError::Database`] if SQLite cannot open it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        if !db_path.exists() {
            return Err(PlaystyleError::StoreNotFound(db_path));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;
        debug!(path = %db_path.display(), "Event store opened read-only");

        Ok(Self { conn, db_path })
    }

    /// Wrap an already open connection (in-memory stores in tests).
    #[must_use]
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            db_path: PathBuf::from(":memory:"),
        }
    }

    /// Path of the database file, or `:memory:`.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // ------------------------------------------------------------------
    // Counts
    // ------------------------------------------------------------------

    /// Number of recorded play sessions.
    ///
    /// # Errors
    ///
    /// Returns [`PlaystyleError::Database`] on SQLite failures.
    pub fn session_count(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM game_sessions")
    }

    /// Number of recorded actions of every kind.
    ///
    /// # Errors
    ///
    /// Returns [`PlaystyleError::Database`] on SQLite failures.
    pub fn action_count(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM player_actions")
    }

    /// Number of recorded combat events.
    ///
    /// # Errors
    ///
    /// Returns [`PlaystyleError::Database`] on SQLite failures.
    pub fn combat_count(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM shooting_events")
    }

    /// Distinct `x,y` head positions across all snapshots.
    ///
    /// Snapshots with a null coordinate do not count.
    ///
    /// # Errors
    ///
    /// Returns [`PlaystyleError::Database`] on SQLite failures.
    pub fn distinct_head_positions(&self) -> Result<u64> {
        self.count(
            "SELECT COUNT(DISTINCT snake_head_x || ',' || snake_head_y) FROM game_snapshots",
        )
    }

    // ------------------------------------------------------------------
    // Averages
    // ------------------------------------------------------------------

    /// Fraction of combat events that hit; a null `hit` counts as a miss.
    ///
    /// `None` when there are no combat events.
    ///
    /// # Errors
    ///
    /// Returns [`PlaystyleError::Database`] on SQLite failures.
    pub fn hit_rate(&self) -> Result<Option<f64>> {
        self.average("SELECT AVG(CASE WHEN hit THEN 1.0 ELSE 0.0 END) FROM shooting_events")
    }

    /// Mean duration of sessions with a positive duration, in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`PlaystyleError::Database`] on SQLite failures.
    pub fn avg_session_duration(&self) -> Result<Option<f64>> {
        self.average(
            "SELECT AVG(duration_seconds) FROM game_sessions WHERE duration_seconds > 0",
        )
    }

    /// Mean of positive reaction times, in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`PlaystyleError::Database`] on SQLite failures.
    pub fn avg_reaction_time(&self) -> Result<Option<f64>> {
        self.average(
            "SELECT AVG(reaction_time_ms) FROM shooting_events WHERE reaction_time_ms > 0",
        )
    }

    /// Population variance of combat reaction times, in ms².
    ///
    /// Computed in two passes (mean first) to keep precision on large
    /// histories. `None` when no event carries a reaction time.
    ///
    /// # Errors
    ///
    /// Returns [`PlaystyleError::Database`] on SQLite failures.
    pub fn reaction_time_variance(&self) -> Result<Option<f64>> {
        self.average(
            "SELECT AVG((s.reaction_time_ms - m.mean) * (s.reaction_time_ms - m.mean))
             FROM shooting_events s,
                  (SELECT AVG(reaction_time_ms) AS mean FROM shooting_events) m
             WHERE s.reaction_time_ms IS NOT NULL",
        )
    }

    /// Mean collection time and distance.
    ///
    /// # Errors
    ///
    /// Returns [`PlaystyleError::Database`] on SQLite failures.
    pub fn collection_averages(&self) -> Result<CollectionAverages> {
        let averages = self.conn.query_row(
            "SELECT AVG(time_to_collect_ms), AVG(distance_traveled) FROM food_collection",
            [],
            |row| {
                Ok(CollectionAverages {
                    avg_time_ms: row.get(0)?,
                    avg_distance: row.get(1)?,
                })
            },
        )?;
        Ok(averages)
    }

    // ------------------------------------------------------------------
    // Sequences
    // ------------------------------------------------------------------

    /// Walk MOVE actions in timestamp order and count direction changes.
    ///
    /// Rows sharing a timestamp keep insertion order. Two null directions
    /// compare equal.
    ///
    /// # Errors
    ///
    /// Returns [`PlaystyleError::Database`] on SQLite failures.
    pub fn move_stats(&self) -> Result<MoveStats> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT direction FROM player_actions
             WHERE action_type = ?1
             ORDER BY timestamp, action_id",
        )?;

        let rows = stmt.query_map([ActionKind::Move.as_str()], |row| {
            row.get::<_, Option<String>>(0)
        })?;

        let mut stats = MoveStats::default();
        let mut previous: Option<Option<String>> = None;
        for row in rows {
            let direction = row?;
            if previous.as_ref().is_some_and(|prev| *prev != direction) {
                stats.direction_changes += 1;
            }
            stats.moves += 1;
            previous = Some(direction);
        }

        Ok(stats)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn count(&self, sql: &str) -> Result<u64> {
        let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(u64::try_from(n).unwrap_or_default())
    }

    fn average(&self, sql: &str) -> Result<Option<f64>> {
        let avg: Option<f64> = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(avg)
    }
}
