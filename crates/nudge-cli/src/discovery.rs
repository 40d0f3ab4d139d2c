//! Candidate file discovery.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// Files to scan, plus the entries that could not be visited.
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<PathBuf>,
    pub errors: Vec<String>,
}

/// Expand `paths` into the files to scan.
///
/// Directories are walked recursively, keeping files whose extension is in
/// `extensions` and skipping hidden entries. Files named explicitly are kept
/// whatever their extension. Output is sorted per directory and free of
/// duplicates. Missing paths and unreadable entries are recorded and skipped.
pub fn discover_files(paths: &[PathBuf], extensions: &[String]) -> Discovery {
    let mut seen = HashSet::new();
    let mut found = Discovery::default();

    for path in paths {
        if path.is_file() {
            if seen.insert(path.clone()) {
                found.files.push(path.clone());
            }
            continue;
        }
        if !path.is_dir() {
            found
                .errors
                .push(format!("{}: no such file or directory", path.display()));
            continue;
        }

        let walker = WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let at = e.path().unwrap_or(path);
                    warn!(path = %at.display(), error = %e, "skipping unreadable entry");
                    found.errors.push(format!("{}: {e}", at.display()));
                    continue;
                }
            };
            if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
                let file = entry.into_path();
                if seen.insert(file.clone()) {
                    found.files.push(file);
                }
            }
        }
    }

    debug!(count = found.files.len(), skipped = found.errors.len(), "discovered files");
    found
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted.trim_start_matches('.') == ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "# nothing\n").unwrap();
        path
    }

    #[test]
    fn test_walks_directories_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "app/a.rb");
        let b = touch(dir.path(), "lib/deep/b.rb");
        touch(dir.path(), "lib/notes.md");
        touch(dir.path(), ".git/hooks/c.rb");

        let found = discover_files(&[dir.path().to_path_buf()], &["rb".to_string()]);

        assert_eq!(found.files, vec![a, b]);
        assert!(found.errors.is_empty());
    }

    #[test]
    fn test_explicit_files_are_kept_once() {
        let dir = tempfile::tempdir().unwrap();
        let script = touch(dir.path(), "bin/setup");
        let lib = touch(dir.path(), "lib.rb");

        let found = discover_files(
            &[script.clone(), dir.path().to_path_buf(), lib.clone()],
            &[".rb".to_string()],
        );

        assert_eq!(found.files, vec![script, lib]);
    }

    #[test]
    fn test_missing_path_is_recorded_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let kept = touch(dir.path(), "kept.rb");

        let found = discover_files(&[missing, kept.clone()], &["rb".to_string()]);

        assert_eq!(found.files, vec![kept]);
        assert_eq!(found.errors.len(), 1);
        assert!(found.errors[0].contains("no such file"), "{:?}", found.errors);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_does_not_stop_the_walk() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let good = touch(dir.path(), "good.rb");
        touch(dir.path(), "locked/hidden.rb");
        let locked = dir.path().join("locked");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        // root can read anything, so only expect an error when we really can't
        let denied = std::fs::read_dir(&locked).is_err();

        let found = discover_files(&[dir.path().to_path_buf()], &["rb".to_string()]);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert!(found.files.contains(&good));
        if denied {
            assert_eq!(found.files, vec![good]);
            assert_eq!(found.errors.len(), 1);
            assert!(found.errors[0].contains("locked"), "{:?}", found.errors);
        }
    }
}
