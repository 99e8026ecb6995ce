use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use crate::language::is_hidden_file;

/// A directory listing row as delivered by the host. File nodes never carry
/// children; directory nodes carry an empty list until they are expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNode {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    pub children: Option<Vec<DirectoryNode>>,
}

impl DirectoryNode {
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_directory: false,
            children: None,
        }
    }

    pub fn directory(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_directory: true,
            children: Some(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    /// `None` for files, child paths in listing order for directories.
    pub children: Option<Vec<PathBuf>>,
    pub loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub depth: usize,
    pub path: PathBuf,
    pub name: String,
    pub is_directory: bool,
    pub expanded: bool,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingOutcome {
    Applied,
    Stale,
    Orphaned,
}

/// Explorer tree stored as an arena keyed by path. Expanding a directory
/// inserts its children and rewrites a single parent entry.
#[derive(Debug, Clone, Default)]
pub struct FileTree {
    root: Option<PathBuf>,
    generation: u64,
    nodes: HashMap<PathBuf, TreeEntry>,
    top_level: Vec<PathBuf>,
    expanded: HashSet<PathBuf>,
    pending: HashSet<PathBuf>,
    selected: Option<PathBuf>,
}

impl FileTree {
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self, path: &Path) -> bool {
        self.pending.contains(path)
    }

    /// Points the explorer at a new root. The previous tree stays visible
    /// until the new root listing arrives; returns the generation the
    /// listing request must carry.
    pub fn open_root(&mut self, root: PathBuf) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.pending.clear();
        self.pending.insert(root.clone());
        self.root = Some(root);
        self.generation
    }

    /// Requests a fresh root listing without changing the root.
    pub fn refresh(&mut self) -> Option<(PathBuf, u64)> {
        let root = self.root.clone()?;
        let generation = self.open_root(root.clone());
        Some((root, generation))
    }

    pub fn apply_listing(
        &mut self,
        generation: u64,
        path: &Path,
        listing: Vec<DirectoryNode>,
    ) -> ListingOutcome {
        if generation != self.generation {
            return ListingOutcome::Stale;
        }
        self.pending.remove(path);

        if self.root.as_deref() == Some(path) {
            self.nodes.clear();
            self.expanded.clear();
            self.top_level = self.insert_children(listing);
            if self
                .selected
                .as_ref()
                .is_some_and(|selected| !self.nodes.contains_key(selected))
            {
                self.selected = None;
            }
            return ListingOutcome::Applied;
        }

        match self.nodes.get(path) {
            Some(entry) if entry.is_directory => {}
            _ => return ListingOutcome::Orphaned,
        }
        self.remove_descendants(path);
        let child_paths = self.insert_children(listing);
        if let Some(entry) = self.nodes.get_mut(path) {
            entry.children = Some(child_paths);
            entry.loaded = true;
        }
        ListingOutcome::Applied
    }

    pub fn listing_failed(&mut self, generation: u64, path: &Path) -> ListingOutcome {
        if generation != self.generation {
            return ListingOutcome::Stale;
        }
        self.pending.remove(path);
        self.expanded.remove(path);
        ListingOutcome::Applied
    }

    /// Expands or collapses a directory. Returns the path to list when the
    /// directory is expanded for the first time.
    pub fn toggle(&mut self, path: &Path) -> Option<PathBuf> {
        let entry = self.nodes.get(path)?;
        if !entry.is_directory {
            return None;
        }
        if self.expanded.remove(path) {
            return None;
        }
        self.expanded.insert(path.to_path_buf());
        if entry.loaded || self.pending.contains(path) {
            return None;
        }
        self.pending.insert(path.to_path_buf());
        Some(path.to_path_buf())
    }

    pub fn is_expanded(&self, path: &Path) -> bool {
        self.expanded.contains(path)
    }

    pub fn get(&self, path: &Path) -> Option<&TreeEntry> {
        self.nodes.get(path)
    }

    pub fn top_level(&self) -> &[PathBuf] {
        &self.top_level
    }

    /// Rebuilds the nested node view, mostly for inspection and tests.
    pub fn to_nodes(&self) -> Vec<DirectoryNode> {
        self.top_level
            .iter()
            .filter_map(|path| self.materialize(path))
            .collect()
    }

    pub fn visible_rows(&self, show_hidden: bool) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        for path in &self.top_level {
            self.push_rows(path, 0, show_hidden, &mut rows);
        }
        rows
    }

    pub fn selected(&self) -> Option<&Path> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, path: Option<PathBuf>) {
        self.selected = path;
    }

    pub fn move_selection(&mut self, delta: isize, show_hidden: bool) {
        let rows = self.visible_rows(show_hidden);
        if rows.is_empty() {
            self.selected = None;
            return;
        }
        let current = self
            .selected
            .as_ref()
            .and_then(|selected| rows.iter().position(|row| &row.path == selected));
        let next = match current {
            None => 0,
            Some(idx) => idx
                .saturating_add_signed(delta)
                .min(rows.len().saturating_sub(1)),
        };
        self.selected = Some(rows[next].path.clone());
    }

    fn insert_children(&mut self, listing: Vec<DirectoryNode>) -> Vec<PathBuf> {
        let mut paths = Vec::with_capacity(listing.len());
        for node in listing {
            paths.push(node.path.clone());
            self.nodes.insert(
                node.path.clone(),
                TreeEntry {
                    name: node.name,
                    path: node.path,
                    is_directory: node.is_directory,
                    children: if node.is_directory {
                        Some(Vec::new())
                    } else {
                        None
                    },
                    loaded: false,
                },
            );
        }
        paths
    }

    fn remove_descendants(&mut self, path: &Path) {
        let children = self
            .nodes
            .get(path)
            .and_then(|entry| entry.children.clone())
            .unwrap_or_default();
        for child in children {
            self.remove_descendants(&child);
            self.nodes.remove(&child);
            self.expanded.remove(&child);
            self.pending.remove(&child);
        }
    }

    fn materialize(&self, path: &Path) -> Option<DirectoryNode> {
        let entry = self.nodes.get(path)?;
        Some(DirectoryNode {
            name: entry.name.clone(),
            path: entry.path.clone(),
            is_directory: entry.is_directory,
            children: entry.children.as_ref().map(|children| {
                children
                    .iter()
                    .filter_map(|child| self.materialize(child))
                    .collect()
            }),
        })
    }

    fn push_rows(&self, path: &Path, depth: usize, show_hidden: bool, rows: &mut Vec<TreeRow>) {
        let Some(entry) = self.nodes.get(path) else {
            return;
        };
        if !show_hidden && is_hidden_file(&entry.name) {
            return;
        }
        let expanded = self.expanded.contains(path);
        rows.push(TreeRow {
            depth,
            path: entry.path.clone(),
            name: entry.name.clone(),
            is_directory: entry.is_directory,
            expanded,
            loading: self.pending.contains(path),
        });
        if !expanded {
            return;
        }
        if let Some(children) = &entry.children {
            for child in children {
                self.push_rows(child, depth + 1, show_hidden, rows);
            }
        }
    }
}
