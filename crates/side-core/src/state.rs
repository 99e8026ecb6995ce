use std::collections::VecDeque;
use std::path::Path;
use std::path::PathBuf;

use crate::config::Preferences;
use crate::editor::EditorState;
use crate::language::display_name;
use crate::language::extension_label;
use crate::language::language_for_file_name;
use crate::tree::FileTree;

pub const LOG_CAPACITY: usize = 2_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFile {
    pub path: PathBuf,
    pub name: String,
}

impl OpenFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            name: display_name(&path),
            path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusRegion {
    Explorer,
    /// The editor, or the search panel while it is shown in its place.
    #[default]
    Main,
    Terminal,
}

impl FocusRegion {
    pub fn next(self, terminal_visible: bool) -> Self {
        match self {
            Self::Explorer => Self::Main,
            Self::Main if terminal_visible => Self::Terminal,
            Self::Main | Self::Terminal => Self::Explorer,
        }
    }

    pub fn prev(self, terminal_visible: bool) -> Self {
        match self {
            Self::Explorer if terminal_visible => Self::Terminal,
            Self::Explorer | Self::Terminal => Self::Main,
            Self::Main => Self::Explorer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelVisibility {
    pub search: bool,
    pub terminal: bool,
    pub preferences: bool,
    pub logs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShellOverlay {
    #[default]
    None,
    ConfirmClose {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeErrorKind {
    FileRead,
    FileWrite,
    DirectoryList,
    Search,
    CommandExecution,
}

impl BridgeErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::FileRead => "read file",
            Self::FileWrite => "write file",
            Self::DirectoryList => "list directory",
            Self::Search => "search",
            Self::CommandExecution => "run command",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeError {
    pub kind: BridgeErrorKind,
    pub message: String,
}

impl BridgeError {
    pub fn new(kind: BridgeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Non-blocking status-bar toast. Replaced by the next notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    Host,
    Shell,
}

impl LogSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Shell => "shell",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub seq: u64,
    pub level: LogLevel,
    pub ts_ms: Option<u64>,
    pub source: LogSource,
    pub context: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct LogBuffer {
    cap: usize,
    next_seq: u64,
    buf: VecDeque<LogEntry>,
}

impl LogBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            next_seq: 1,
            buf: VecDeque::with_capacity(cap),
        }
    }

    pub fn append(&mut self, mut entry: LogEntry) {
        entry.seq = self.next_seq;
        self.next_seq += 1;

        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.next_seq = 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.buf.iter()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub file_path: PathBuf,
    /// One-based.
    pub line_number: usize,
    pub match_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Searching,
    Results,
}

#[derive(Debug, Clone, Default)]
pub struct SearchPanel {
    pub query: String,
    pub phase: SearchPhase,
    pub results: Vec<SearchResult>,
    pub current: Option<usize>,
    /// Set when the last completed search matched nothing.
    pub no_results: bool,
    pub generation: u64,
}

impl SearchPanel {
    pub fn current_result(&self) -> Option<&SearchResult> {
        self.current.and_then(|idx| self.results.get(idx))
    }

    /// Drops results and any in-flight request.
    pub fn reset(&mut self) {
        self.phase = SearchPhase::Idle;
        self.results.clear();
        self.current = None;
        self.no_results = false;
        self.generation = self.generation.wrapping_add(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Command,
    Output,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub kind: EntryKind,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub entries: Vec<TranscriptEntry>,
    pub input: String,
    /// `Some(0)` is the most recent command.
    pub history_index: Option<usize>,
    pub running: bool,
}

impl Transcript {
    /// Commands in submission order, derived from the transcript each time.
    pub fn commands(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::Command)
            .map(|entry| entry.text.as_str())
            .collect()
    }

    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| match entry.kind {
                EntryKind::Command => format!("$ {}", entry.text),
                EntryKind::Output | EntryKind::Error => entry.text.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Preferences being edited. Changes stay in `draft` until saved.
#[derive(Debug, Clone, Default)]
pub struct PreferencesForm {
    pub draft: Preferences,
    pub selected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBar {
    pub file_label: String,
    pub extension: String,
    pub encoding: &'static str,
    pub line_ending: &'static str,
    pub language: &'static str,
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone)]
pub struct ShellState {
    pub preferences: Preferences,
    pub open_files: Vec<OpenFile>,
    pub active_file: Option<PathBuf>,
    pub editor: EditorState,
    pub tree: FileTree,
    pub panels: PanelVisibility,
    pub focus: FocusRegion,
    pub overlay: ShellOverlay,
    pub search: SearchPanel,
    pub transcript: Transcript,
    pub preferences_form: PreferencesForm,
    pub notice: Option<Notice>,
    pub logs: LogBuffer,
    /// Ticket of the newest read request; older responses are stale.
    pub read_ticket: u64,
    /// The active file was switched by closing a tab and its content has
    /// not arrived yet. Edits and saves wait for it.
    pub content_pending: bool,
}

impl ShellState {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            preferences,
            open_files: Vec::new(),
            active_file: None,
            editor: EditorState::default(),
            tree: FileTree::default(),
            panels: PanelVisibility::default(),
            focus: FocusRegion::default(),
            overlay: ShellOverlay::None,
            search: SearchPanel::default(),
            transcript: Transcript::default(),
            preferences_form: PreferencesForm::default(),
            notice: None,
            logs: LogBuffer::new(LOG_CAPACITY),
            read_ticket: 0,
            content_pending: false,
        }
    }

    pub fn root_folder(&self) -> Option<&Path> {
        self.tree.root()
    }

    pub fn is_open(&self, path: &Path) -> bool {
        self.open_files.iter().any(|file| file.path == path)
    }

    pub fn is_active(&self, path: &Path) -> bool {
        self.active_file.as_deref() == Some(path)
    }

    pub fn show_hidden(&self) -> bool {
        self.preferences.search.include_hidden
    }

    pub fn status_bar(&self) -> StatusBar {
        let (file_label, extension, language) = match self.active_file.as_deref() {
            Some(path) => {
                let name = display_name(path);
                let label = if self.editor.is_modified {
                    format!("{name} •")
                } else {
                    name.clone()
                };
                (label, extension_label(path), language_for_file_name(&name))
            }
            None => ("No file open".to_string(), String::new(), "plaintext"),
        };
        StatusBar {
            file_label,
            extension,
            encoding: "UTF-8",
            line_ending: "LF",
            language,
            notice: self.notice.clone(),
        }
    }
}
