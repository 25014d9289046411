//! Lookup table persistence
//!
//! Tables are stored as UTF-8 text, one entry per line, nine
//! whitespace-separated floats: `cx cy cz gx gy gz nx ny nz`. There is no
//! header. Loading rebuilds the node set and the connections implied by each
//! `(current, next)` step along with the table itself.
//!
//! [`NavigationStore`] keys files by level id inside a data directory and can
//! keep a geometry fingerprint in a sidecar file next to each table, so a
//! table baked for an old layout is not silently reused.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;

use super::graph::{Connection, NavGraph};
use super::table::{LookupEntry, LookupTable};

/// File extension for lookup tables
pub const TABLE_EXTENSION: &str = "nav";

/// Graph and table recovered from a persisted file.
#[derive(Debug, Clone, Default)]
pub struct PersistedNavigation {
    /// Nodes and the connections implied by the table
    pub graph: NavGraph,
    /// The lookup table
    pub table: LookupTable,
}

/// Format a table in the line-oriented text format.
#[must_use]
pub fn format_table(table: &LookupTable) -> String {
    let mut out = String::with_capacity(table.len() * 48);
    for entry in table.entries() {
        let (c, g, n) = (entry.current, entry.goal, entry.next);
        // Display for f32 prints the shortest text that parses back exactly.
        let _ = writeln!(
            out,
            "{} {} {} {} {} {} {} {} {}",
            c.x, c.y, c.z, g.x, g.y, g.z, n.x, n.y, n.z
        );
    }
    out
}

/// Parse the line-oriented text format.
///
/// Blank lines are ignored. Every line, the last included, must end in a
/// newline, and every step that is not the final one must be continued by an
/// entry from `next` towards the same goal.
///
/// # Errors
///
/// Returns [`PersistError::ParseError`] for any line that is not exactly
/// nine floats, for an unterminated last line, or for an entry whose `next`
/// leads nowhere.
pub fn parse_table(content: &str) -> Result<PersistedNavigation, PersistError> {
    let mut table = LookupTable::new();
    let mut connections = Vec::new();
    let mut steps = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let values = line
            .split_whitespace()
            .map(str::parse::<f32>)
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| PersistError::ParseError {
                line: i + 1,
                message: e.to_string(),
            })?;
        if values.len() != 9 {
            return Err(PersistError::ParseError {
                line: i + 1,
                message: format!("expected 9 values, found {}", values.len()),
            });
        }

        let entry = LookupEntry {
            current: Vec3::new(values[0], values[1], values[2]),
            goal: Vec3::new(values[3], values[4], values[5]),
            next: Vec3::new(values[6], values[7], values[8]),
        };
        connections.push(Connection {
            a: entry.current,
            b: entry.next,
        });
        steps.push((i + 1, entry));
        table.insert(entry);
    }

    // A file cut inside its last number can still hold nine floats.
    if !content.trim().is_empty() && !content.ends_with('\n') {
        return Err(PersistError::ParseError {
            line: content.lines().count(),
            message: "unterminated last line".to_string(),
        });
    }

    for (line, entry) in steps {
        if entry.next != entry.goal && table.next(entry.next, entry.goal).is_none() {
            return Err(PersistError::ParseError {
                line,
                message: format!("no entry continues from {} towards {}", entry.next, entry.goal),
            });
        }
    }

    Ok(PersistedNavigation {
        graph: NavGraph::from_connections(&connections),
        table,
    })
}

/// Write a table to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written
pub fn save_table(path: impl AsRef<Path>, table: &LookupTable) -> Result<(), PersistError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PersistError::IoError(e.to_string()))?;
    }
    fs::write(path, format_table(table)).map_err(|e| PersistError::IoError(e.to_string()))?;
    Ok(())
}

/// Read a table from `path`.
///
/// # Errors
///
/// Returns [`PersistError::MissingFile`] if nothing exists at `path`, an IO
/// error if it cannot be read, or a parse error if it is malformed
pub fn load_table(path: impl AsRef<Path>) -> Result<PersistedNavigation, PersistError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PersistError::MissingFile(path.display().to_string()));
    }
    let content = fs::read_to_string(path).map_err(|e| PersistError::IoError(e.to_string()))?;
    parse_table(&content)
}

/// Per-level lookup table files inside a data directory.
#[derive(Debug, Clone)]
pub struct NavigationStore {
    directory: PathBuf,
}

impl NavigationStore {
    /// Store rooted at `directory`. The directory need not exist yet.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Root directory
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the table file for `level`
    #[must_use]
    pub fn table_path(&self, level: &str) -> PathBuf {
        self.directory.join(format!("{level}.{TABLE_EXTENSION}"))
    }

    /// Path of the fingerprint sidecar for `level`
    #[must_use]
    pub fn fingerprint_path(&self, level: &str) -> PathBuf {
        self.directory
            .join(format!("{level}.{TABLE_EXTENSION}.fingerprint"))
    }

    /// Persist `table` for `level`, with an optional geometry fingerprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the table or sidecar cannot be written
    pub fn save(
        &self,
        level: &str,
        table: &LookupTable,
        fingerprint: Option<u64>,
    ) -> Result<(), PersistError> {
        save_table(self.table_path(level), table)?;
        let sidecar = self.fingerprint_path(level);
        match fingerprint {
            Some(value) => fs::write(&sidecar, format!("{value:016x}\n"))
                .map_err(|e| PersistError::IoError(e.to_string()))?,
            None if sidecar.exists() => {
                fs::remove_file(&sidecar).map_err(|e| PersistError::IoError(e.to_string()))?;
            }
            None => {}
        }
        log::info!(
            "Saved navigation table for '{}' ({} entries) to {}",
            level,
            table.len(),
            self.table_path(level).display()
        );
        Ok(())
    }

    /// Load the table for `level`.
    ///
    /// Returns `None` when the data is missing, unreadable, malformed, or
    /// (if `fingerprint` is given) baked for different geometry. Every one
    /// of those means "regenerate"; none is an error for the caller.
    #[must_use]
    pub fn load(&self, level: &str, fingerprint: Option<u64>) -> Option<PersistedNavigation> {
        if let Some(expected) = fingerprint {
            let stored = fs::read_to_string(self.fingerprint_path(level))
                .ok()
                .and_then(|s| u64::from_str_radix(s.trim(), 16).ok());
            if stored != Some(expected) {
                log::warn!(
                    "Navigation table for '{}' is stale or unfingerprinted, regenerating",
                    level
                );
                return None;
            }
        }

        match load_table(self.table_path(level)) {
            Ok(loaded) if loaded.table.is_empty() => {
                log::warn!("Navigation table for '{}' is empty, regenerating", level);
                None
            }
            Ok(loaded) => {
                log::info!(
                    "Loaded navigation table for '{}': {} nodes, {} entries",
                    level,
                    loaded.graph.node_count(),
                    loaded.table.len()
                );
                Some(loaded)
            }
            Err(PersistError::MissingFile(path)) => {
                log::info!("No navigation table at {}, generating", path);
                None
            }
            Err(e) => {
                log::warn!("Discarding navigation table for '{}': {}", level, e);
                None
            }
        }
    }
}

/// Errors that can occur while persisting lookup tables
#[derive(Debug, Clone)]
pub enum PersistError {
    /// IO error
    IoError(String),
    /// Malformed line
    ParseError {
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },
    /// No file at the given path
    MissingFile(String),
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::ParseError { line, message } => {
                write!(f, "Parse error on line {line}: {message}")
            }
            Self::MissingFile(path) => write!(f, "Missing file: {path}"),
        }
    }
}

impl std::error::Error for PersistError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> LookupTable {
        [
            LookupEntry {
                current: Vec3::ZERO,
                goal: Vec3::new(2.0, 0.0, 0.0),
                next: Vec3::new(1.0, 0.0, 1.0),
            },
            LookupEntry {
                current: Vec3::new(1.0, 0.0, 1.0),
                goal: Vec3::new(2.0, 0.0, 0.0),
                next: Vec3::new(2.0, 0.0, 0.0),
            },
            LookupEntry {
                current: Vec3::new(0.1, -3.25, 1e-7),
                goal: Vec3::ZERO,
                next: Vec3::ZERO,
            },
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_format_is_nine_floats_per_line() {
        let text = format_table(&sample_table());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "0 0 0 2 0 0 1 0 1");
        assert!(lines.iter().all(|l| l.split_whitespace().count() == 9));
    }

    #[test]
    fn test_parse_exact_values() {
        let table = sample_table();
        let loaded = parse_table(&format_table(&table)).unwrap();
        assert_eq!(loaded.table.entries(), table.entries());
    }

    #[test]
    fn test_parse_rebuilds_connections() {
        let loaded = parse_table(&format_table(&sample_table())).unwrap();
        assert_eq!(loaded.graph.node_count(), 4);
        assert_eq!(loaded.graph.connection_count(), 3);
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let loaded = parse_table("\n0 0 0 1 0 0 1 0 0\n\n").unwrap();
        assert_eq!(loaded.table.len(), 1);
    }

    #[test]
    fn test_parse_rejects_short_line() {
        let err = parse_table("0 0 0 1 0 0 1 0 0\n0 0 0 1").unwrap_err();
        assert!(matches!(err, PersistError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_unterminated_last_line() {
        let err = parse_table("0 0 0 1 0 0 1 0 0\n0 0 0 2 0 0 2 0 0").unwrap_err();
        assert!(matches!(err, PersistError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_step_that_leads_nowhere() {
        // (1, 0, 1) -> (2, 0, 0) is missing.
        let err = parse_table("0 0 0 2 0 0 1 0 1\n").unwrap_err();
        assert!(matches!(err, PersistError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_table("0 0 0 1 0 0 1 0 zero").unwrap_err();
        assert!(matches!(err, PersistError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_table(dir.path().join("nothing.nav")).unwrap_err();
        assert!(matches!(err, PersistError::MissingFile(_)));
    }

    #[test]
    fn test_store_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = NavigationStore::new(dir.path().join("levels").join("nested"));

        store.save("arena", &sample_table(), None).unwrap();

        assert!(store.table_path("arena").is_file());
        assert!(store.load("arena", None).is_some());
    }

    #[test]
    fn test_store_fingerprint_mismatch_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let store = NavigationStore::new(dir.path());

        store.save("arena", &sample_table(), Some(42)).unwrap();

        assert!(store.load("arena", Some(42)).is_some());
        assert!(store.load("arena", Some(43)).is_none());
        // Callers that do not care about freshness still get the data.
        assert!(store.load("arena", None).is_some());
    }

    #[test]
    fn test_store_corrupt_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = NavigationStore::new(dir.path());
        store.save("arena", &sample_table(), None).unwrap();

        let path = store.table_path("arena");
        let text = fs::read_to_string(&path).unwrap();
        fs::write(&path, &text[..text.len() / 2]).unwrap();

        assert!(store.load("arena", None).is_none());
    }

    #[test]
    fn test_store_rejects_file_cut_inside_last_number() {
        let dir = tempfile::tempdir().unwrap();
        let store = NavigationStore::new(dir.path());
        let table: LookupTable = [LookupEntry {
            current: Vec3::new(1.5, 0.0, 1.5),
            goal: Vec3::new(7.5, 0.0, 2.5),
            next: Vec3::new(7.5, 0.0, 2.5),
        }]
        .into_iter()
        .collect();
        store.save("arena", &table, None).unwrap();

        // "... 7.5 0 2.5\n" becomes "... 7.5 0 2", still nine floats.
        let path = store.table_path("arena");
        let text = fs::read_to_string(&path).unwrap();
        let cut = &text[..text.len() - 3];
        assert_eq!(cut.split_whitespace().count(), 9);
        fs::write(&path, cut).unwrap();

        assert!(store.load("arena", None).is_none());
    }
}
