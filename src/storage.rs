use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::error::CodeScoutError;
use crate::scanner::FileReport;

/// A snapshot row from the database.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: i64,
    pub timestamp: String,
    pub marker_count: i64,
    pub symbol_count: i64,
}

/// A marker row from the database, including optional git blame info.
#[derive(Debug, Clone)]
pub struct StoredMarker {
    pub id: i64,
    pub snapshot_id: i64,
    pub file_path: String,
    pub line_number: i64,
    pub kind: String,
    pub author: Option<String>,
    pub issue_ref: Option<String>,
    pub description: String,
    pub owner: Option<String>,
    pub git_author: Option<String>,
    pub git_date: Option<String>,
}

/// A symbol row from the database.
#[derive(Debug, Clone)]
pub struct StoredSymbol {
    pub id: i64,
    pub snapshot_id: i64,
    pub file_path: String,
    pub name: String,
    pub qualified_name: String,
    pub kind: String,
    pub parent: Option<String>,
    pub start_line: i64,
    pub end_line: i64,
    pub is_async: bool,
    pub signature: String,
}

/// Get the path to the database file, creating the directory if needed.
pub fn db_path(root: &Path) -> Result<PathBuf, CodeScoutError> {
    let dir = root.join(".code-scout");
    fs::create_dir_all(&dir)?;
    Ok(dir.join("db.sqlite"))
}

/// Open (or create) the SQLite database and run migrations.
pub fn open_db(root: &Path) -> Result<Connection, CodeScoutError> {
    let path = db_path(root)?;
    let conn = Connection::open(path)?;
    migrate(&conn)?;
    Ok(conn)
}

fn migrate(conn: &Connection) -> Result<(), CodeScoutError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS snapshots (
            id INTEGER PRIMARY KEY,
            timestamp TEXT NOT NULL,
            marker_count INTEGER NOT NULL,
            symbol_count INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS markers (
            id INTEGER PRIMARY KEY,
            snapshot_id INTEGER NOT NULL,
            file_path TEXT NOT NULL,
            line_number INTEGER NOT NULL,
            kind TEXT NOT NULL,
            author TEXT,
            issue_ref TEXT,
            description TEXT NOT NULL,
            owner TEXT,
            git_author TEXT,
            git_date TEXT,
            FOREIGN KEY (snapshot_id) REFERENCES snapshots(id)
        );
        CREATE TABLE IF NOT EXISTS symbols (
            id INTEGER PRIMARY KEY,
            snapshot_id INTEGER NOT NULL,
            file_path TEXT NOT NULL,
            name TEXT NOT NULL,
            qualified_name TEXT NOT NULL,
            kind TEXT NOT NULL,
            parent TEXT,
            start_line INTEGER NOT NULL,
            end_line INTEGER NOT NULL,
            is_async INTEGER NOT NULL,
            signature TEXT NOT NULL,
            FOREIGN KEY (snapshot_id) REFERENCES snapshots(id)
        );",
    )?;
    Ok(())
}

/// Insert a new snapshot with all markers and symbols. Returns the snapshot
/// ID. Uses an explicit transaction for the bulk inserts.
pub fn save_snapshot(
    conn: &Connection,
    reports: &[FileReport],
) -> Result<i64, CodeScoutError> {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let marker_count: i64 = reports.iter().map(|r| r.markers.len() as i64).sum();
    let symbol_count: i64 = reports.iter().map(|r| r.symbols.len() as i64).sum();

    conn.execute("BEGIN", [])?;

    let result = (|| -> Result<i64, CodeScoutError> {
        conn.execute(
            "INSERT INTO snapshots (timestamp, marker_count, symbol_count) VALUES (?1, ?2, ?3)",
            params![timestamp, marker_count, symbol_count],
        )?;

        let snapshot_id = conn.last_insert_rowid();

        let mut marker_stmt = conn.prepare(
            "INSERT INTO markers (snapshot_id, file_path, line_number, kind, author, issue_ref, description, owner)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        let mut symbol_stmt = conn.prepare(
            "INSERT INTO symbols (snapshot_id, file_path, name, qualified_name, kind, parent, start_line, end_line, is_async, signature)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;

        for report in reports {
            let file_path = report.file_path.to_string_lossy().to_string();

            for owned in &report.markers {
                marker_stmt.execute(params![
                    snapshot_id,
                    file_path,
                    owned.marker.line_number as i64,
                    owned.marker.kind.as_str(),
                    owned.marker.author,
                    owned.marker.issue_ref,
                    owned.marker.description,
                    owned.owner,
                ])?;
            }

            for symbol in &report.symbols {
                symbol_stmt.execute(params![
                    snapshot_id,
                    file_path,
                    symbol.name,
                    symbol.qualified_name,
                    symbol.kind.as_str(),
                    symbol.parent,
                    symbol.start_line as i64,
                    symbol.end_line as i64,
                    symbol.is_async,
                    symbol.signature(),
                ])?;
            }
        }

        Ok(snapshot_id)
    })();

    match result {
        Ok(id) => {
            conn.execute("COMMIT", [])?;
            Ok(id)
        }
        Err(e) => {
            let _ = conn.execute("ROLLBACK", []);
            Err(e)
        }
    }
}

/// Update git blame info for a specific marker row.
pub fn update_git_blame(
    conn: &Connection,
    marker_id: i64,
    git_author: &str,
    git_date: &str,
) -> Result<(), CodeScoutError> {
    conn.execute(
        "UPDATE markers SET git_author = ?1, git_date = ?2 WHERE id = ?3",
        params![git_author, git_date, marker_id],
    )?;
    Ok(())
}

/// Get all snapshots ordered oldest first.
pub fn get_snapshots(conn: &Connection) -> Result<Vec<Snapshot>, CodeScoutError> {
    let mut stmt = conn.prepare(
        "SELECT id, timestamp, marker_count, symbol_count FROM snapshots ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(Snapshot {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            marker_count: row.get(2)?,
            symbol_count: row.get(3)?,
        })
    })?;

    let mut snapshots = Vec::new();
    for row in rows {
        snapshots.push(row?);
    }
    Ok(snapshots)
}

/// Get the latest snapshot.
pub fn get_latest_snapshot(conn: &Connection) -> Result<Option<Snapshot>, CodeScoutError> {
    let mut stmt = conn.prepare(
        "SELECT id, timestamp, marker_count, symbol_count FROM snapshots ORDER BY id DESC LIMIT 1",
    )?;

    let mut rows = stmt.query_map([], |row| {
        Ok(Snapshot {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            marker_count: row.get(2)?,
            symbol_count: row.get(3)?,
        })
    })?;

    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// Get all markers for a given snapshot.
pub fn get_markers_for_snapshot(
    conn: &Connection,
    snapshot_id: i64,
) -> Result<Vec<StoredMarker>, CodeScoutError> {
    let mut stmt = conn.prepare(
        "SELECT id, snapshot_id, file_path, line_number, kind, author, issue_ref, description, owner, git_author, git_date
         FROM markers
         WHERE snapshot_id = ?1
         ORDER BY file_path, line_number",
    )?;

    let rows = stmt.query_map(params![snapshot_id], |row| {
        Ok(StoredMarker {
            id: row.get(0)?,
            snapshot_id: row.get(1)?,
            file_path: row.get(2)?,
            line_number: row.get(3)?,
            kind: row.get(4)?,
            author: row.get(5)?,
            issue_ref: row.get(6)?,
            description: row.get(7)?,
            owner: row.get(8)?,
            git_author: row.get(9)?,
            git_date: row.get(10)?,
        })
    })?;

    let mut markers = Vec::new();
    for row in rows {
        markers.push(row?);
    }
    Ok(markers)
}

/// Get all symbols for a given snapshot.
pub fn get_symbols_for_snapshot(
    conn: &Connection,
    snapshot_id: i64,
) -> Result<Vec<StoredSymbol>, CodeScoutError> {
    let mut stmt = conn.prepare(
        "SELECT id, snapshot_id, file_path, name, qualified_name, kind, parent, start_line, end_line, is_async, signature
         FROM symbols
         WHERE snapshot_id = ?1
         ORDER BY file_path, start_line",
    )?;

    let rows = stmt.query_map(params![snapshot_id], |row| {
        Ok(StoredSymbol {
            id: row.get(0)?,
            snapshot_id: row.get(1)?,
            file_path: row.get(2)?,
            name: row.get(3)?,
            qualified_name: row.get(4)?,
            kind: row.get(5)?,
            parent: row.get(6)?,
            start_line: row.get(7)?,
            end_line: row.get(8)?,
            is_async: row.get(9)?,
            signature: row.get(10)?,
        })
    })?;

    let mut symbols = Vec::new();
    for row in rows {
        symbols.push(row?);
    }
    Ok(symbols)
}

/// Get the marker count from the most recent snapshot.
pub fn get_latest_marker_count(conn: &Connection) -> Result<Option<i64>, CodeScoutError> {
    match get_latest_snapshot(conn)? {
        Some(s) => Ok(Some(s.marker_count)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::python::PythonAnalyzer;
    use crate::scanner;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn sample_reports() -> Vec<FileReport> {
        let mut analyzer = PythonAnalyzer::new().unwrap();
        let source = include_str!("../test_cases/comment_sample.py");
        let (markers, symbols) = scanner::analyze_file(
            &mut analyzer,
            Path::new("comment_sample.py"),
            source,
        );
        vec![FileReport {
            file_path: PathBuf::from("comment_sample.py"),
            markers,
            symbols,
        }]
    }

    #[test]
    fn save_and_load_roundtrip() {
        let conn = memory_db();
        let reports = sample_reports();
        let snapshot_id = save_snapshot(&conn, &reports).unwrap();

        let snapshot = get_latest_snapshot(&conn).unwrap().unwrap();
        assert_eq!(snapshot.id, snapshot_id);
        assert_eq!(snapshot.marker_count, 6);

        let markers = get_markers_for_snapshot(&conn, snapshot_id).unwrap();
        assert_eq!(markers.len(), 6);
        let todo = markers.iter().find(|m| m.kind == "TODO").unwrap();
        assert_eq!(todo.owner.as_deref(), Some("User.validate"));

        let symbols = get_symbols_for_snapshot(&conn, snapshot_id).unwrap();
        assert!(symbols.iter().any(|s| s.qualified_name == "fetch_data" && s.is_async));
    }

    #[test]
    fn latest_snapshot_is_most_recent() {
        let conn = memory_db();
        let reports = sample_reports();
        save_snapshot(&conn, &reports).unwrap();
        let second = save_snapshot(&conn, &reports).unwrap();

        assert_eq!(get_latest_snapshot(&conn).unwrap().unwrap().id, second);
        assert_eq!(get_snapshots(&conn).unwrap().len(), 2);
    }

    #[test]
    fn empty_db_has_no_snapshots() {
        let conn = memory_db();
        assert!(get_latest_snapshot(&conn).unwrap().is_none());
        assert!(get_latest_marker_count(&conn).unwrap().is_none());
    }

    #[test]
    fn blame_update_persists() {
        let conn = memory_db();
        let snapshot_id = save_snapshot(&conn, &sample_reports()).unwrap();
        let markers = get_markers_for_snapshot(&conn, snapshot_id).unwrap();

        update_git_blame(&conn, markers[0].id, "alice", "2024-06-01").unwrap();

        let reloaded = get_markers_for_snapshot(&conn, snapshot_id).unwrap();
        let updated = reloaded.iter().find(|m| m.id == markers[0].id).unwrap();
        assert_eq!(updated.git_author.as_deref(), Some("alice"));
        assert_eq!(updated.git_date.as_deref(), Some("2024-06-01"));
    }
}
