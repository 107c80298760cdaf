use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodeScoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Failed to load Python grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("Failed to parse {0}")]
    Parse(String),

    #[error("Path error: {0}")]
    InvalidPath(String),

    #[error("No snapshots found. Run 'code-scout scan' first.")]
    NoSnapshots,

    #[error("Git blame failed for {file}: {reason}")]
    GitBlame { file: String, reason: String },
}
