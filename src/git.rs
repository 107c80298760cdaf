use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::process::Command;

use crate::error::CodeScoutError;

/// Blame result for one line.
#[derive(Debug, Clone)]
pub struct BlameInfo {
    pub author: String,
    pub date: String,
}

/// Check if the given path is inside a git repository.
pub fn is_git_repo(path: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(path)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Blame a whole file once and return BlameInfo for the requested lines.
/// One process spawn per file, however many marker lines it has.
pub fn blame_lines(
    repo_root: &Path,
    file_path: &str,
    line_numbers: &[usize],
) -> Result<HashMap<usize, BlameInfo>, CodeScoutError> {
    if line_numbers.is_empty() {
        return Ok(HashMap::new());
    }

    let output = Command::new("git")
        .args(["blame", "--porcelain", "--", file_path])
        .current_dir(repo_root)
        .output()
        .map_err(|e| CodeScoutError::GitBlame {
            file: file_path.to_string(),
            reason: format!("failed to execute git blame: {}", e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CodeScoutError::GitBlame {
            file: file_path.to_string(),
            reason: stderr.to_string(),
        });
    }

    let wanted: HashSet<usize> = line_numbers.iter().copied().collect();
    Ok(parse_porcelain(
        &String::from_utf8_lossy(&output.stdout),
        &wanted,
    ))
}

/// Parse `git blame --porcelain` output, keeping only the wanted lines.
///
/// Each block starts with `<hash> <orig-line> <final-line> [<num-lines>]`,
/// followed by header lines (`author`, `author-time`, ...). Headers appear
/// only the first time a commit shows up; later blocks for the same commit
/// carry just the hash line. Blame info is therefore keyed by commit hash
/// and looked up per line at the end.
fn parse_porcelain(stdout: &str, wanted: &HashSet<usize>) -> HashMap<usize, BlameInfo> {
    let mut commits: HashMap<String, BlameInfo> = HashMap::new();
    let mut line_commits: Vec<(usize, String)> = Vec::new();
    let mut current_hash: Option<String> = None;

    for line in stdout.lines() {
        // Commit line: 40-hex hash followed by line numbers
        if line.len() >= 40 && line.chars().take(40).all(|c| c.is_ascii_hexdigit()) {
            let hash = line[..40].to_string();
            let parts: Vec<&str> = line.split_whitespace().collect();
            if let Some(ln) = parts.get(2).and_then(|s| s.parse().ok()) {
                if wanted.contains(&ln) {
                    line_commits.push((ln, hash.clone()));
                }
            }
            commits.entry(hash.clone()).or_insert_with(|| BlameInfo {
                author: String::from("Unknown"),
                date: String::from("Unknown"),
            });
            current_hash = Some(hash);
        } else if let Some(val) = line.strip_prefix("author ") {
            if let Some(info) = current_hash.as_ref().and_then(|h| commits.get_mut(h)) {
                info.author = val.trim().to_string();
            }
        } else if let Some(val) = line.strip_prefix("author-time ") {
            if let Ok(ts) = val.trim().parse::<i64>() {
                if let Some(dt) = chrono::DateTime::from_timestamp(ts, 0) {
                    if let Some(info) = current_hash.as_ref().and_then(|h| commits.get_mut(h)) {
                        info.date = dt.format("%Y-%m-%d").to_string();
                    }
                }
            }
        }
    }

    line_commits
        .into_iter()
        .filter_map(|(ln, hash)| commits.get(&hash).map(|info| (ln, info.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PORCELAIN: &str = "\
0123456789abcdef0123456789abcdef01234567 1 1 2
author Alice
author-time 1717200000
filename sample.py
\tdef add(a, b):
0123456789abcdef0123456789abcdef01234567 2 2
\t    # TODO: overflow check
fedcba9876543210fedcba9876543210fedcba98 3 3 1
author Bob
author-time 1614556800
filename sample.py
\t    return a + b
";

    #[test]
    fn parses_wanted_lines() {
        let wanted: HashSet<usize> = [2, 3].into_iter().collect();
        let blames = parse_porcelain(PORCELAIN, &wanted);

        assert_eq!(blames.len(), 2);
        assert_eq!(blames[&2].author, "Alice");
        assert_eq!(blames[&2].date, "2024-06-01");
        assert_eq!(blames[&3].author, "Bob");
        assert_eq!(blames[&3].date, "2021-03-01");
    }

    #[test]
    fn repeated_commit_reuses_first_headers() {
        // Line 2 has no author header of its own; it reuses Alice's commit
        let wanted: HashSet<usize> = [2].into_iter().collect();
        let blames = parse_porcelain(PORCELAIN, &wanted);
        assert_eq!(blames[&2].author, "Alice");
    }

    #[test]
    fn interleaved_commits_keep_their_own_authors() {
        // Commit A owns lines 1 and 3, commit B owns line 2. Headers appear
        // only on a commit's first block, so line 3 carries just the hash
        // and must still resolve to Alice, not to the last-seen headers.
        let porcelain = "\
aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa 1 1 2
author Alice
author-time 1717200000
filename sample.py
\tdef add(a, b):
bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb 2 2 1
author Bob
author-time 1614556800
filename sample.py
\t    # TODO: overflow check
aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa 3 3
\t    return a + b
";
        let wanted: HashSet<usize> = [1, 2, 3].into_iter().collect();
        let blames = parse_porcelain(porcelain, &wanted);

        assert_eq!(blames[&1].author, "Alice");
        assert_eq!(blames[&2].author, "Bob");
        assert_eq!(blames[&2].date, "2021-03-01");
        assert_eq!(blames[&3].author, "Alice");
        assert_eq!(blames[&3].date, "2024-06-01");
    }

    #[test]
    fn headerless_commit_reports_unknown() {
        let porcelain = "\
cccccccccccccccccccccccccccccccccccccccc 1 1 1
\tmystery line
";
        let wanted: HashSet<usize> = [1].into_iter().collect();
        let blames = parse_porcelain(porcelain, &wanted);
        assert_eq!(blames[&1].author, "Unknown");
        assert_eq!(blames[&1].date, "Unknown");
    }

    #[test]
    fn unwanted_lines_are_dropped() {
        let wanted: HashSet<usize> = [99].into_iter().collect();
        assert!(parse_porcelain(PORCELAIN, &wanted).is_empty());
    }

    #[test]
    fn empty_request_short_circuits() {
        let result = blame_lines(Path::new("."), "whatever.py", &[]).unwrap();
        assert!(result.is_empty());
    }
}
