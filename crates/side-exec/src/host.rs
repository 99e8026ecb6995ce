use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::command;
use crate::contracts::CommandOutput;
use crate::contracts::CommandRequest;
use crate::contracts::DirEntry;
use crate::contracts::SearchHit;
use crate::contracts::SearchOptions;
use crate::error::HostError;
use crate::search;
use crate::search::LineMatcher;

/// File-system, search and process services the shell delegates to.
/// Every call is a single blocking round trip; callers run them off the UI
/// thread.
pub trait HostRuntime: Send + Sync {
    fn read_file(&self, path: &Path) -> Result<String, HostError>;

    fn write_file(&self, path: &Path, content: &str) -> Result<(), HostError>;

    /// Immediate children, directories first, then by name.
    fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>, HostError>;

    fn search_in_files(
        &self,
        folder: &Path,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>, HostError>;

    fn run_command(&self, request: &CommandRequest) -> Result<CommandOutput, HostError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalHost;

#[derive(Debug, Default)]
pub struct SimulatedHost {
    files: Mutex<BTreeMap<PathBuf, String>>,
    commands: HashMap<String, CommandOutput>,
}

impl HostRuntime for LocalHost {
    fn read_file(&self, path: &Path) -> Result<String, HostError> {
        std::fs::read_to_string(path).map_err(|source| HostError::FileRead {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<(), HostError> {
        std::fs::write(path, content).map_err(|source| HostError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>, HostError> {
        let list_err = |source| HostError::DirectoryList {
            path: path.to_path_buf(),
            source,
        };
        let mut entries = Vec::new();
        for item in std::fs::read_dir(path).map_err(list_err)? {
            let item = item.map_err(list_err)?;
            let is_directory = item.file_type().map_err(list_err)?.is_dir();
            entries.push(DirEntry {
                name: item.file_name().to_string_lossy().into_owned(),
                path: item.path(),
                is_directory,
            });
        }
        sort_entries(&mut entries);
        Ok(entries)
    }

    fn search_in_files(
        &self,
        folder: &Path,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>, HostError> {
        search::search_in_files(folder, query, options)
    }

    fn run_command(&self, request: &CommandRequest) -> Result<CommandOutput, HostError> {
        command::run_command(request)
    }
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.into(), content.into());
        }
        self
    }

    pub fn with_command(mut self, command: impl Into<String>, output: CommandOutput) -> Self {
        self.commands.insert(command.into(), output);
        self
    }

    pub fn file(&self, path: &Path) -> Option<String> {
        self.files.lock().ok()?.get(path).cloned()
    }

    fn snapshot(&self) -> BTreeMap<PathBuf, String> {
        self.files
            .lock()
            .map(|files| files.clone())
            .unwrap_or_default()
    }
}

fn not_found(what: &Path) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{} does not exist", what.display()),
    )
}

impl HostRuntime for SimulatedHost {
    fn read_file(&self, path: &Path) -> Result<String, HostError> {
        self.file(path).ok_or_else(|| HostError::FileRead {
            path: path.to_path_buf(),
            source: not_found(path),
        })
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<(), HostError> {
        let mut files = self.files.lock().map_err(|_| HostError::FileWrite {
            path: path.to_path_buf(),
            source: std::io::Error::other("simulated file store poisoned"),
        })?;
        files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>, HostError> {
        let files = self.snapshot();
        let mut directories = BTreeSet::new();
        let mut plain = BTreeSet::new();
        let mut known = false;
        for file in files.keys() {
            let Ok(rest) = file.strip_prefix(path) else {
                continue;
            };
            let mut parts = rest.components();
            let Some(first) = parts.next() else {
                continue;
            };
            known = true;
            let child = path.join(first);
            if parts.next().is_some() {
                directories.insert(child);
            } else {
                plain.insert(child);
            }
        }
        if !known {
            return Err(HostError::DirectoryList {
                path: path.to_path_buf(),
                source: not_found(path),
            });
        }

        let mut entries: Vec<DirEntry> = directories
            .into_iter()
            .map(|child| (child, true))
            .chain(plain.into_iter().map(|child| (child, false)))
            .map(|(child, is_directory)| DirEntry {
                name: child
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path: child,
                is_directory,
            })
            .collect();
        sort_entries(&mut entries);
        Ok(entries)
    }

    fn search_in_files(
        &self,
        folder: &Path,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>, HostError> {
        let matcher =
            LineMatcher::new(query, options.case_sensitive).map_err(|err| HostError::Search {
                folder: folder.to_path_buf(),
                reason: err.to_string(),
            })?;
        let mut hits = Vec::new();
        for (path, content) in self.snapshot() {
            if path.starts_with(folder) {
                matcher.collect(&path, &content, options.max_results, &mut hits);
            }
        }
        Ok(hits)
    }

    fn run_command(&self, request: &CommandRequest) -> Result<CommandOutput, HostError> {
        Ok(self
            .commands
            .get(&request.command)
            .cloned()
            .unwrap_or_else(|| CommandOutput {
                output: format!("simulated: command not found: {}", request.command),
                is_error: true,
            }))
    }
}

/// Locale-style name order: case-folded comparison first, and on a tie the
/// lowercase spelling sorts ahead of the uppercase one.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

pub fn sort_entries(entries: &mut [DirEntry]) {
    entries.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| compare_names(&a.name, &b.name))
    });
}
