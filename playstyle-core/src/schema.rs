//! Event store schema and typed row writers.
//!
//! The game client owns this schema; the analysis path only ever reads it
//! (see [`crate::store`]). The DDL and the [`EventRecorder`] live here so
//! tests, benchmarks and the `init-db` command build exactly the tables the
//! game writes:
//!
//! ```text
//! game_sessions ─┬─< player_actions
//!                ├─< shooting_events
//!                ├─< food_collection
//!                └─< game_snapshots
//! ```

use std::path::Path;

use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::error::Result;
use crate::types::ActionKind;

/// Table and index definitions, idempotent.
pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS game_sessions (
    session_id       TEXT PRIMARY KEY,
    start_time       INTEGER NOT NULL,
    end_time         INTEGER,
    final_score      INTEGER,
    snake_length     INTEGER,
    victory          BOOLEAN,
    death_reason     TEXT,
    duration_seconds INTEGER
);

CREATE TABLE IF NOT EXISTS player_actions (
    action_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id   TEXT NOT NULL,
    timestamp    INTEGER NOT NULL,
    action_type  TEXT NOT NULL,
    direction    TEXT,
    snake_length INTEGER,
    position_x   INTEGER,
    position_y   INTEGER,
    FOREIGN KEY (session_id) REFERENCES game_sessions(session_id)
);

CREATE TABLE IF NOT EXISTS shooting_events (
    shoot_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id       TEXT NOT NULL,
    timestamp        INTEGER NOT NULL,
    target_x         INTEGER NOT NULL,
    target_y         INTEGER NOT NULL,
    hit              BOOLEAN,
    reaction_time_ms INTEGER,
    FOREIGN KEY (session_id) REFERENCES game_sessions(session_id)
);

CREATE TABLE IF NOT EXISTS food_collection (
    collect_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id         TEXT NOT NULL,
    timestamp          INTEGER NOT NULL,
    food_type          TEXT,
    food_x             INTEGER,
    food_y             INTEGER,
    distance_traveled  INTEGER,
    time_to_collect_ms INTEGER,
    FOREIGN KEY (session_id) REFERENCES game_sessions(session_id)
);

CREATE TABLE IF NOT EXISTS game_snapshots (
    snapshot_id            INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id             TEXT NOT NULL,
    timestamp              INTEGER NOT NULL,
    snake_head_x           INTEGER,
    snake_head_y           INTEGER,
    snake_length           INTEGER,
    snake_direction        TEXT,
    nearby_obstacles_count INTEGER,
    distance_to_food       REAL,
    health                 INTEGER,
    attack_power           INTEGER,
    defense_power          INTEGER,
    FOREIGN KEY (session_id) REFERENCES game_sessions(session_id)
);

CREATE INDEX IF NOT EXISTS idx_actions_session   ON player_actions(session_id);
CREATE INDEX IF NOT EXISTS idx_actions_timestamp ON player_actions(timestamp);
CREATE INDEX IF NOT EXISTS idx_shooting_session  ON shooting_events(session_id);
CREATE INDEX IF NOT EXISTS idx_food_session      ON food_collection(session_id);
CREATE INDEX IF NOT EXISTS idx_snapshots_session ON game_snapshots(session_id);
";

/// Create every event table and index if missing.
///
/// # Errors
///
/// Returns [`crate::PlaystyleError::Database`] on SQLite failures.
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    debug!("Event store schema ensured");
    Ok(())
}

/// Create (or open) the database file at `path` and ensure the schema.
///
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns [`crate::PlaystyleError::Io`] if the directory cannot be created,
/// or [`crate::PlaystyleError::Database`] on SQLite failures.
pub fn init_database(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    info!(path = %path.display(), "Event store initialised");
    Ok(())
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// One play session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionRecord {
    /// Session identifier.
    pub session_id: String,
    /// Start time, epoch milliseconds.
    pub start_time: i64,
    /// End time, epoch milliseconds, if the session finished.
    pub end_time: Option<i64>,
    /// Final score.
    pub final_score: Option<i64>,
    /// Final snake length.
    pub final_length: Option<i64>,
    /// Whether the session ended in victory.
    pub victory: Option<bool>,
    /// What ended the session.
    pub death_reason: Option<String>,
    /// Total play time in seconds.
    pub duration_seconds: Option<i64>,
}

/// One discrete player action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    /// Owning session.
    pub session_id: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Action discriminant.
    pub kind: ActionKind,
    /// Steering direction, if any.
    pub direction: Option<String>,
    /// Snake length when the action was taken.
    pub length: Option<i64>,
    /// Head position X.
    pub x: Option<i64>,
    /// Head position Y.
    pub y: Option<i64>,
}

/// One shot fired.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatRecord {
    /// Owning session.
    pub session_id: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Target X.
    pub target_x: i64,
    /// Target Y.
    pub target_y: i64,
    /// Whether the shot hit.
    pub hit: Option<bool>,
    /// Reaction latency in milliseconds.
    pub reaction_time_ms: Option<i64>,
}

/// One resource pickup.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionRecord {
    /// Owning session.
    pub session_id: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Resource category.
    pub food_type: Option<String>,
    /// Resource X.
    pub x: Option<i64>,
    /// Resource Y.
    pub y: Option<i64>,
    /// Cells traveled to reach it.
    pub distance_traveled: Option<i64>,
    /// Milliseconds from spawn to pickup.
    pub time_to_collect_ms: Option<i64>,
}

/// One periodic world-state sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SnapshotRecord {
    /// Owning session.
    pub session_id: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Head X.
    pub head_x: Option<i64>,
    /// Head Y.
    pub head_y: Option<i64>,
    /// Current length.
    pub length: Option<i64>,
    /// Current heading.
    pub direction: Option<String>,
    /// Hazards within the proximity radius.
    pub nearby_obstacles: Option<i64>,
    /// Distance to the nearest resource.
    pub distance_to_food: Option<f64>,
    /// Vitality.
    pub health: Option<i64>,
    /// Attack power.
    pub attack_power: Option<i64>,
    /// Defense power.
    pub defense_power: Option<i64>,
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Inserts typed rows into an event store connection.
#[derive(Debug)]
pub struct EventRecorder<'c> {
    conn: &'c Connection,
}

impl<'c> EventRecorder<'c> {
    /// Wrap an open connection whose schema already exists.
    #[must_use]
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert a session row.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PlaystyleError::Database`] on SQLite failures.
    pub fn session(&self, s: &SessionRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO game_sessions (session_id, start_time, end_time, final_score,
                 snake_length, victory, death_reason, duration_seconds)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                s.session_id,
                s.start_time,
                s.end_time,
                s.final_score,
                s.final_length,
                s.victory,
                s.death_reason,
                s.duration_seconds
            ],
        )?;
        Ok(())
    }

    /// Insert an action row.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PlaystyleError::Database`] on SQLite failures.
    pub fn action(&self, a: &ActionRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO player_actions (session_id, timestamp, action_type, direction,
                 snake_length, position_x, position_y)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                a.session_id,
                a.timestamp,
                a.kind.as_str(),
                a.direction,
                a.length,
                a.x,
                a.y
            ],
        )?;
        Ok(())
    }

    /// Insert a combat row.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PlaystyleError::Database`] on SQLite failures.
    pub fn combat(&self, c: &CombatRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO shooting_events (session_id, timestamp, target_x, target_y,
                 hit, reaction_time_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                c.session_id,
                c.timestamp,
                c.target_x,
                c.target_y,
                c.hit,
                c.reaction_time_ms
            ],
        )?;
        Ok(())
    }

    /// Insert a collection row.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PlaystyleError::Database`] on SQLite failures.
    pub fn collection(&self, c: &CollectionRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO food_collection (session_id, timestamp, food_type, food_x, food_y,
                 distance_traveled, time_to_collect_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                c.session_id,
                c.timestamp,
                c.food_type,
                c.x,
                c.y,
                c.distance_traveled,
                c.time_to_collect_ms
            ],
        )?;
        Ok(())
    }

    /// Insert a snapshot row.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PlaystyleError::Database`] on SQLite failures.
    pub fn snapshot(&self, s: &SnapshotRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO game_snapshots (session_id, timestamp, snake_head_x, snake_head_y,
                 snake_length, snake_direction, nearby_obstacles_count, distance_to_food,
                 health, attack_power, defense_power)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                s.session_id,
                s.timestamp,
                s.head_x,
                s.head_y,
                s.length,
                s.direction,
                s.nearby_obstacles,
                s.distance_to_food,
                s.health,
                s.attack_power,
                s.defense_power
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().expect("open");
        create_schema(&conn).expect("first");
        create_schema(&conn).expect("second");

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('game_sessions', 'player_actions', 'shooting_events',
                              'food_collection', 'game_snapshots')",
                [],
                |row| row.get(0),
            )
            .expect("count tables");
        assert_eq!(tables, 5);
    }

    #[test]
    fn init_database_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data").join("snake_game.db");
        init_database(&path).expect("init");
        assert!(path.exists());
        // Re-running against an existing file is harmless.
        init_database(&path).expect("re-init");
    }

    #[test]
    fn recorder_writes_action_label() {
        let conn = Connection::open_in_memory().expect("open");
        create_schema(&conn).expect("schema");
        let rec = EventRecorder::new(&conn);
        rec.session(&SessionRecord {
            session_id: "s1".into(),
            start_time: 1,
            ..SessionRecord::default()
        })
        .expect("session");
        rec.action(&ActionRecord {
            session_id: "s1".into(),
            timestamp: 10,
            kind: ActionKind::Move,
            direction: Some("UP".into()),
            length: Some(3),
            x: Some(1),
            y: Some(2),
        })
        .expect("action");

        let label: String = conn
            .query_row("SELECT action_type FROM player_actions", [], |row| row.get(0))
            .expect("read back");
        assert_eq!(label, "MOVE");
    }
}
