use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::deck::Pair;

static BOARD_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/boards");

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid board json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid board csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("unsupported board file {0} (expected .json or .csv)")]
    UnsupportedFormat(PathBuf),
    #[error("board {board}: {reason}")]
    Invalid { board: String, reason: String },
}

/// An ordered list of term/definition pairs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub title: String,
    pub pairs: Vec<Pair>,
}

impl Board {
    pub fn from_json(json: &str) -> Result<Self, BoardError> {
        let board: Board = serde_json::from_str(json)?;
        board.validate()?;
        Ok(board)
    }

    /// CSV with a `term,definition` header. Pair ids are prefixed with the
    /// board id so different CSV boards never share a pair identity.
    pub fn from_csv<R: std::io::Read>(id: &str, title: &str, reader: R) -> Result<Self, BoardError> {
        #[derive(Deserialize)]
        struct Row {
            term: String,
            definition: String,
        }

        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut pairs = Vec::new();
        for (i, row) in rdr.deserialize::<Row>().enumerate() {
            let row = row?;
            pairs.push(Pair::new(format!("{id}-{}", i + 1), row.term, row.definition));
        }

        let board = Board {
            id: id.to_string(),
            title: title.to_string(),
            pairs,
        };
        board.validate()?;
        Ok(board)
    }

    /// Load a `.json` or `.csv` board from disk. CSV boards take the file
    /// stem as id and title.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, BoardError> {
        let path = path.as_ref();
        let io_err = |source: std::io::Error| BoardError::Io {
            path: path.to_path_buf(),
            source,
        };

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => {
                let json = fs::read_to_string(path).map_err(io_err)?;
                Board::from_json(&json)
            }
            Some(ext) if ext.eq_ignore_ascii_case("csv") => {
                let file = fs::File::open(path).map_err(io_err)?;
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "board".to_string());
                Board::from_csv(&stem, &stem, file)
            }
            _ => Err(BoardError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        let invalid = |reason: String| BoardError::Invalid {
            board: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("empty board id".to_string()));
        }
        if self.pairs.is_empty() {
            return Err(invalid("board has no pairs".to_string()));
        }

        let mut seen = HashSet::new();
        for pair in &self.pairs {
            if !seen.insert(pair.id.as_str()) {
                return Err(invalid(format!("duplicate pair id {}", pair.id)));
            }
            if pair.term.trim().is_empty() || pair.definition.trim().is_empty() {
                return Err(invalid(format!("pair {} has an empty side", pair.id)));
            }
        }
        Ok(())
    }

    pub fn pair_ids(&self) -> Vec<&str> {
        self.pairs.iter().map(|p| p.id.as_str()).collect()
    }
}

/// Boards compiled into the binary, in file name order
pub fn builtin_boards() -> Vec<Board> {
    let mut files: Vec<_> = BOARD_DIR
        .files()
        .filter(|f| f.path().extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    files.sort_by(|a, b| a.path().cmp(b.path()));

    files
        .into_iter()
        .filter_map(|f| {
            let parsed = f
                .contents_utf8()
                .ok_or_else(|| BoardError::UnsupportedFormat(f.path().to_path_buf()))
                .and_then(Board::from_json);
            match parsed {
                Ok(board) => Some(board),
                Err(e) => {
                    warn!(file = %f.path().display(), error = %e, "skipping built-in board");
                    None
                }
            }
        })
        .collect()
}

/// Ordered boards the player can step through
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    boards: Vec<Board>,
}

impl Catalog {
    pub fn new(boards: Vec<Board>) -> Self {
        let mut catalog = Self::default();
        for board in boards {
            catalog.add(board);
        }
        catalog
    }

    pub fn builtin() -> Self {
        Self::new(builtin_boards())
    }

    /// Add a board, replacing any board with the same id. Returns its position.
    pub fn add(&mut self, board: Board) -> usize {
        match self.position(&board.id) {
            Some(idx) => {
                self.boards[idx] = board;
                idx
            }
            None => {
                self.boards.push(board);
                self.boards.len() - 1
            }
        }
    }

    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Board> {
        self.boards.get(idx)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.boards.iter().position(|b| b.id == id)
    }

    pub fn find(&self, id: &str) -> Option<&Board> {
        self.position(id).map(|idx| &self.boards[idx])
    }

    /// Id of the board after `id`, wrapping around
    pub fn next_id(&self, id: &str) -> Option<&str> {
        let idx = self.position(id)?;
        let next = (idx + 1) % self.boards.len();
        Some(self.boards[next].id.as_str())
    }

    /// Id of the board before `id`, wrapping around
    pub fn previous_id(&self, id: &str) -> Option<&str> {
        let idx = self.position(id)?;
        let prev = (idx + self.boards.len() - 1) % self.boards.len();
        Some(self.boards[prev].id.as_str())
    }
}
