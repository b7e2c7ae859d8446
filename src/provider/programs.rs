//! Installed programs provider
//!
//! Enumerates executables on `PATH` once at construction and serves them as
//! unscored candidates; the pipeline's matcher does the ranking. Selecting a
//! result spawns the program detached and closes the launcher.

use crate::error::AppError;
use crate::provider::{Provider, ProviderMetadata, ResultItem};
use crate::search::Query;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, warn};

/// One launchable executable
#[derive(Debug, Clone)]
struct ProgramEntry {
    name: String,
    path: PathBuf,
}

/// Provider over the executables reachable through `PATH`
pub struct ProgramsProvider {
    programs: Vec<ProgramEntry>,
    wildcard: String,
}

impl ProgramsProvider {
    /// Scan the directories of the `PATH` environment variable.
    pub fn new(wildcard: &str) -> Self {
        let dirs: Vec<PathBuf> = env::var_os("PATH")
            .map(|path| env::split_paths(&path).collect())
            .unwrap_or_default();
        Self::with_dirs(dirs, wildcard)
    }

    /// Scan an explicit directory list. Earlier directories shadow later
    /// ones, matching `PATH` resolution.
    pub fn with_dirs(dirs: Vec<PathBuf>, wildcard: &str) -> Self {
        let mut seen = HashSet::new();
        let mut programs = Vec::new();

        for dir in dirs {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                let path = entry.path();
                // fs::metadata follows symlinks; many PATH entries are links.
                let executable = fs::metadata(&path)
                    .map(|metadata| is_executable(&metadata))
                    .unwrap_or(false);
                if executable && seen.insert(name.clone()) {
                    programs.push(ProgramEntry { name, path });
                }
            }
        }

        // Deterministic candidate order regardless of directory read order.
        programs.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(count = programs.len(), "scanned programs");
        Self {
            programs,
            wildcard: wildcard.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

impl Provider for ProgramsProvider {
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: "programs".to_string(),
            name: "Programs".to_string(),
            action_keyword: self.wildcard.clone(),
            enabled: true,
            pre_scored: false,
        }
    }

    fn query(&self, query: &Query) -> Result<Vec<ResultItem>, AppError> {
        // An empty term would list every binary on PATH; the launcher shows
        // nothing instead.
        if query.is_empty_search() {
            return Ok(Vec::new());
        }

        Ok(self
            .programs
            .iter()
            .map(|program| {
                let path = program.path.clone();
                ResultItem::new(program.name.as_str(), path.display().to_string())
                    .with_icon("application")
                    .with_action(move || match Command::new(&path).spawn() {
                        Ok(_) => true,
                        Err(e) => {
                            warn!(program = %path.display(), error = %e, "failed to launch");
                            false
                        }
                    })
            })
            .collect())
    }
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(metadata: &fs::Metadata) -> bool {
    metadata.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn make_executable(dir: &std::path::Path, name: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_finds_executables_and_skips_plain_files() {
        let dir = tempfile::tempdir().unwrap();
        make_executable(dir.path(), "firefox");
        make_executable(dir.path(), "files");
        fs::write(dir.path().join("notes.txt"), "not a program").unwrap();

        let provider = ProgramsProvider::with_dirs(vec![dir.path().to_path_buf()], "*");
        assert_eq!(provider.len(), 2);

        let query = Query::plain("fire");
        let items = provider.query(&query).unwrap();
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["files", "firefox"]);
        // Unscored; the pipeline matcher ranks and filters.
        assert!(items.iter().all(|i| i.score == 0));
    }

    #[cfg(unix)]
    #[test]
    fn test_first_path_entry_shadows_later_ones() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        make_executable(first.path(), "python");
        make_executable(second.path(), "python");

        let provider = ProgramsProvider::with_dirs(
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            "*",
        );
        assert_eq!(provider.len(), 1);
        let items = provider.query(&Query::plain("python")).unwrap();
        assert!(items[0].subtitle.starts_with(first.path().to_str().unwrap()));
    }

    #[test]
    fn test_empty_search_lists_nothing() {
        let provider = ProgramsProvider::with_dirs(Vec::new(), "*");
        let items = provider.query(&Query::plain("")).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_missing_directories_degrade_silently() {
        let provider =
            ProgramsProvider::with_dirs(vec![PathBuf::from("/does/not/exist")], "*");
        assert!(provider.is_empty());
    }
}
