/// Literal pattern search over files and directory trees.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use super::errors::ScanError;

/// A single match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub path: PathBuf,
    /// 1-based line number.
    pub line: usize,
    /// 1-based character column of the first match on the line.
    pub column: usize,
    /// The matching line without surrounding whitespace.
    pub text: String,
}

/// Search options.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    pub ignore_case: bool,
}

/// Check the pattern and every root before any file is read.
///
/// # Errors
///
/// Returns `ScanError::EmptyPattern` or `ScanError::MissingTarget`.
pub fn validate(pattern: &str, roots: &[PathBuf]) -> Result<(), ScanError> {
    if pattern.is_empty() {
        return Err(ScanError::EmptyPattern);
    }
    if let Some(missing) = roots.iter().find(|p| !p.exists()) {
        return Err(ScanError::MissingTarget {
            path: missing.clone(),
        });
    }
    Ok(())
}

/// Collect the files under `roots`, depth-first, sorted within each directory.
///
/// Symlinks are not followed.
///
/// # Errors
///
/// Returns an error if a directory cannot be listed.
pub fn collect_files(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in roots {
        for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
            let entry = entry.with_context(|| format!("walking '{}'", root.display()))?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

/// 1-based character column of the first occurrence of `needle` in `line`.
///
/// With `ignore_case`, `needle` must already be lowercase. The column is
/// counted in `line` itself, not in its lowercased form, which can hold more
/// characters.
fn match_column(line: &str, needle: &str, ignore_case: bool) -> Option<usize> {
    if !ignore_case {
        let byte_idx = line.find(needle)?;
        return Some(line[..byte_idx].chars().count() + 1);
    }

    let mut lowered = String::with_capacity(line.len());
    // Column in `line` for every byte of `lowered`.
    let mut columns = Vec::with_capacity(line.len());
    for (col, ch) in line.chars().enumerate() {
        let start = lowered.len();
        lowered.extend(ch.to_lowercase());
        columns.resize(columns.len() + lowered.len() - start, col + 1);
    }
    let byte_idx = lowered.find(needle)?;
    columns.get(byte_idx).copied()
}

/// Find every line of `content` containing `pattern`.
#[must_use]
pub fn search_text(path: &Path, content: &str, pattern: &str, opts: SearchOptions) -> Vec<Finding> {
    let needle = if opts.ignore_case {
        pattern.to_lowercase()
    } else {
        pattern.to_owned()
    };

    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let column = match_column(line, &needle, opts.ignore_case)?;
            Some(Finding {
                path: path.to_path_buf(),
                line: idx + 1,
                column,
                text: line.trim().to_owned(),
            })
        })
        .collect()
}

/// Search one file. Files that are not valid UTF-8 are skipped.
///
/// # Errors
///
/// Returns an error for any read failure other than invalid UTF-8.
pub fn search_file(path: &Path, pattern: &str, opts: SearchOptions) -> Result<Vec<Finding>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(search_text(path, &content, pattern, opts)),
        Err(err) if err.kind() == ErrorKind::InvalidData => {
            tracing::debug!(path = %path.display(), "skipping non-UTF-8 file");
            Ok(Vec::new())
        }
        Err(err) => Err(err).with_context(|| format!("reading '{}'", path.display())),
    }
}

/// Search every file under `roots`.
///
/// # Errors
///
/// Returns an error if a directory cannot be listed or a file cannot be read.
pub fn search(roots: &[PathBuf], pattern: &str, opts: SearchOptions) -> Result<Vec<Finding>> {
    let files = collect_files(roots)?;
    tracing::debug!(files = files.len(), "searching");

    let mut findings = Vec::new();
    for file in &files {
        findings.extend(search_file(file, pattern, opts)?);
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_search_text_reports_line_and_column() {
        let findings = search_text(
            Path::new("a.txt"),
            "first\n  let x = TODO;\nlast",
            "TODO",
            SearchOptions::default(),
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 2);
        assert_eq!(findings[0].column, 11);
        assert_eq!(findings[0].text, "let x = TODO;");
    }

    #[test]
    fn test_search_text_column_counts_characters() {
        let findings = search_text(Path::new("a"), "ééx", "x", SearchOptions::default());
        assert_eq!(findings[0].column, 3);
    }

    #[test]
    fn test_ignore_case_column_counts_original_characters() {
        // 'İ' lowercases to two characters.
        let opts = SearchOptions { ignore_case: true };
        let findings = search_text(Path::new("a"), "İİ TODO", "todo", opts);
        assert_eq!(findings[0].column, 4);
    }

    #[test]
    fn test_ignore_case() {
        let content = "Todo\ntodo\nTODO\nnone";
        let sensitive = search_text(Path::new("a"), content, "TODO", SearchOptions::default());
        let insensitive = search_text(
            Path::new("a"),
            content,
            "TODO",
            SearchOptions { ignore_case: true },
        );
        assert_eq!(sensitive.len(), 1);
        assert_eq!(insensitive.len(), 3);
    }

    #[test]
    fn test_validate_rejects_empty_pattern() {
        assert!(matches!(
            validate("", &[PathBuf::from(".")]),
            Err(ScanError::EmptyPattern)
        ));
    }

    #[test]
    fn test_validate_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = validate("x", &[dir.path().to_path_buf(), missing.clone()]).unwrap_err();
        assert!(matches!(err, ScanError::MissingTarget { path } if path == missing));
    }

    #[test]
    fn test_collect_files_walks_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.txt", "");
        write(dir.path(), "a/z.txt", "");
        write(dir.path(), "a/y.txt", "");

        let files = collect_files(&[dir.path().to_path_buf()]).unwrap();
        let rel: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("a/y.txt"),
                PathBuf::from("a/z.txt"),
                PathBuf::from("b.txt"),
            ]
        );
    }

    #[test]
    fn test_collect_files_accepts_file_roots() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "only.txt", "");
        assert_eq!(collect_files(&[file.clone()]).unwrap(), vec![file]);
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_files_skips_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let target = write(dir.path(), "real/a.txt", "");
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();

        let files = collect_files(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(files, vec![target]);
    }

    #[test]
    fn test_search_skips_binary_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, b'x']).unwrap();
        write(dir.path(), "text.txt", "x marks the spot");

        let findings = search(&[dir.path().to_path_buf()], "x", SearchOptions::default()).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].path.ends_with("text.txt"));
    }
}
