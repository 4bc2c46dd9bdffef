use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

/// One finished run of a board
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub board_id: String,
    pub elapsed_ms: u64,
    pub matches: u32,
    pub mismatches: u32,
    pub timestamp: DateTime<Local>,
}

/// Best time for a board together with how often it was cleared
#[derive(Debug, Clone, PartialEq)]
pub struct BoardBest {
    pub board_id: String,
    pub best_ms: u64,
    pub runs: i64,
    pub avg_ms: f64,
}

/// Database of finished runs
#[derive(Debug)]
pub struct ScoreDb {
    conn: Connection,
}

impl ScoreDb {
    /// Open the default database under the state directory
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::scores_db_path().unwrap_or_else(|| PathBuf::from("pairflip_scores.db"));
        Self::open(&db_path)
    }

    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {e}")),
                )
            })?;
        }
        Self::with_connection(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                board_id TEXT NOT NULL,
                elapsed_ms INTEGER NOT NULL,
                matches INTEGER NOT NULL,
                mismatches INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_scores_board ON scores(board_id)",
            [],
        )?;

        Ok(ScoreDb { conn })
    }

    pub fn record(&self, score: &ScoreRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO scores (board_id, elapsed_ms, matches, mismatches, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                score.board_id,
                score.elapsed_ms as i64,
                score.matches,
                score.mismatches,
                score.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn best_for_board(&self, board_id: &str) -> Result<Option<u64>> {
        let best: Option<i64> = self.conn.query_row(
            "SELECT MIN(elapsed_ms) FROM scores WHERE board_id = ?1",
            [board_id],
            |row| row.get(0),
        )?;
        Ok(best.map(|ms| ms as u64))
    }

    /// Best, count and average per board, fastest boards first
    pub fn best_per_board(&self) -> Result<Vec<BoardBest>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT board_id, MIN(elapsed_ms), COUNT(*), AVG(elapsed_ms)
            FROM scores
            GROUP BY board_id
            ORDER BY MIN(elapsed_ms) ASC, board_id ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(BoardBest {
                board_id: row.get(0)?,
                best_ms: row.get::<_, i64>(1)? as u64,
                runs: row.get(2)?,
                avg_ms: row.get(3)?,
            })
        })?;

        rows.collect()
    }

    pub fn recent(&self, board_id: &str, limit: usize) -> Result<Vec<ScoreRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT board_id, elapsed_ms, matches, mismatches, timestamp
            FROM scores
            WHERE board_id = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![board_id, limit as i64], |row| {
            let timestamp_str: String = row.get(4)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        4,
                        "timestamp".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(ScoreRecord {
                board_id: row.get(0)?,
                elapsed_ms: row.get::<_, i64>(1)? as u64,
                matches: row.get(2)?,
                mismatches: row.get(3)?,
                timestamp,
            })
        })?;

        rows.collect()
    }

    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM scores", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn score(board_id: &str, elapsed_ms: u64) -> ScoreRecord {
        ScoreRecord {
            board_id: board_id.to_string(),
            elapsed_ms,
            matches: 6,
            mismatches: 2,
            timestamp: Local::now(),
        }
    }

    #[test]
    fn test_record_and_best() {
        let db = ScoreDb::open_in_memory().unwrap();
        assert_eq!(db.best_for_board("capitals").unwrap(), None);

        db.record(&score("capitals", 42_000)).unwrap();
        db.record(&score("capitals", 31_000)).unwrap();
        db.record(&score("capitals", 55_000)).unwrap();
        db.record(&score("rust-terms", 12_000)).unwrap();

        assert_eq!(db.best_for_board("capitals").unwrap(), Some(31_000));
        assert_eq!(db.best_for_board("rust-terms").unwrap(), Some(12_000));
    }

    #[test]
    fn test_best_per_board() {
        let db = ScoreDb::open_in_memory().unwrap();
        db.record(&score("b", 20_000)).unwrap();
        db.record(&score("a", 40_000)).unwrap();
        db.record(&score("a", 30_000)).unwrap();

        let best = db.best_per_board().unwrap();
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].board_id, "b");
        assert_eq!(best[1].board_id, "a");
        assert_eq!(best[1].best_ms, 30_000);
        assert_eq!(best[1].runs, 2);
        assert!((best[1].avg_ms - 35_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_recent_newest_first() {
        let db = ScoreDb::open_in_memory().unwrap();
        for ms in [1000, 2000, 3000] {
            db.record(&score("a", ms)).unwrap();
        }
        let recent = db.recent("a", 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].elapsed_ms, 3000);
        assert_eq!(recent[1].elapsed_ms, 2000);
        assert_eq!(recent[0].matches, 6);
    }

    #[test]
    fn test_clear() {
        let db = ScoreDb::open_in_memory().unwrap();
        db.record(&score("a", 1000)).unwrap();
        db.clear().unwrap();
        assert!(db.best_per_board().unwrap().is_empty());
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("scores.db");
        let db = ScoreDb::open(&path).unwrap();
        db.record(&score("a", 1000)).unwrap();
        assert!(path.exists());

        let reopened = ScoreDb::open(&path).unwrap();
        assert_eq!(reopened.best_for_board("a").unwrap(), Some(1000));
    }
}
