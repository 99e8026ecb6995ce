use std::path::Path;

use ignore::WalkBuilder;
use regex::Regex;
use regex::RegexBuilder;

use crate::contracts::SearchHit;
use crate::contracts::SearchOptions;
use crate::error::HostError;

/// Literal, line-oriented matcher shared by the local and simulated hosts.
#[derive(Debug, Clone)]
pub struct LineMatcher {
    regex: Regex,
}

impl LineMatcher {
    pub fn new(query: &str, case_sensitive: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(!case_sensitive)
            .build()?;
        Ok(Self { regex })
    }

    /// Appends hits for `content` until `limit` total hits are collected.
    pub fn collect(&self, path: &Path, content: &str, limit: usize, hits: &mut Vec<SearchHit>) {
        for (idx, line) in content.lines().enumerate() {
            if hits.len() >= limit {
                return;
            }
            if self.regex.is_match(line) {
                hits.push(SearchHit {
                    file_path: path.to_path_buf(),
                    line_number: idx + 1,
                    match_text: line.trim().to_string(),
                });
            }
        }
    }
}

/// Walks `folder` honoring ignore files and collects matching lines in
/// file-name order. Binary and non-UTF-8 files are skipped.
pub fn search_in_files(
    folder: &Path,
    query: &str,
    options: &SearchOptions,
) -> Result<Vec<SearchHit>, HostError> {
    if !folder.is_dir() {
        return Err(HostError::Search {
            folder: folder.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    if query.is_empty() || options.max_results == 0 {
        return Ok(Vec::new());
    }
    let matcher =
        LineMatcher::new(query, options.case_sensitive).map_err(|err| HostError::Search {
            folder: folder.to_path_buf(),
            reason: err.to_string(),
        })?;

    let mut walker = WalkBuilder::new(folder);
    walker
        .hidden(!options.include_hidden)
        .follow_links(false)
        .parents(true)
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut hits = Vec::new();
    for entry in walker.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(error = %err, "skipping unreadable search entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|kind| kind.is_file()) {
            continue;
        }
        let Ok(bytes) = std::fs::read(entry.path()) else {
            continue;
        };
        if bytes.contains(&0) {
            continue;
        }
        let Ok(content) = std::str::from_utf8(&bytes) else {
            continue;
        };
        matcher.collect(entry.path(), content, options.max_results, &mut hits);
        if hits.len() >= options.max_results {
            break;
        }
    }
    tracing::debug!(folder = %folder.display(), hits = hits.len(), "search finished");
    Ok(hits)
}
