use std::path::PathBuf;

use super::editor::CursorMove;
use super::state::BridgeError;
use super::state::FocusRegion;
use super::state::SearchResult;
use super::tree::DirectoryNode;

#[derive(Debug, Clone)]
pub enum ShellAction {
    User(UserAction),
    Host(HostEvent),
}

#[derive(Debug, Clone)]
pub enum UserAction {
    // Files and tabs.
    SelectFile {
        path: PathBuf,
        line: Option<usize>,
    },
    OpenFolderDialog,
    OpenFileDialog,
    CloseTab(PathBuf),
    CloseActiveTab,
    ConfirmClose,
    CancelClose,
    CycleTab(isize),

    // Editor.
    EditContent(String),
    InsertText(String),
    InsertNewline,
    InsertIndent,
    Backspace,
    DeleteForward,
    MoveCursor(CursorMove),

    // Explorer.
    ToggleDirectory(PathBuf),
    ExplorerMove(isize),
    ExplorerActivate,
    RefreshExplorer,

    // Layout.
    ToggleSearchPanel,
    ToggleTerminal,
    TogglePreferences,
    ToggleLogs,
    FocusNext,
    FocusPrev,
    SetFocus(FocusRegion),
    ToggleTheme,

    // Search panel.
    SetSearchQuery(String),
    SubmitSearch,
    NextResult,
    PreviousResult,
    ActivateResult(usize),

    // Command transcript.
    SetCommandInput(String),
    SubmitCommand,
    HistoryPrevious,
    HistoryNext,
    ClearTranscript,
    CopyTranscript,

    // Preferences form.
    PreferencesMove(isize),
    PreferencesAdjust(i8),
    SavePreferences,
    CancelPreferences,

    ClearLogs,
    CopyActivePath,
    DismissNotice,
    Quit,
}

/// Responses to bridge requests and events pushed by the host.
#[derive(Debug, Clone)]
pub enum HostEvent {
    FileRead {
        path: PathBuf,
        line: Option<usize>,
        ticket: u64,
        result: Result<String, BridgeError>,
    },
    FileWritten {
        path: PathBuf,
        /// Editor revision the written content was taken from.
        revision: u64,
        result: Result<(), BridgeError>,
    },
    DirectoryListed {
        path: PathBuf,
        generation: u64,
        result: Result<Vec<DirectoryNode>, BridgeError>,
    },
    SearchCompleted {
        generation: u64,
        result: Result<Vec<SearchResult>, BridgeError>,
    },
    TerminalOutput {
        command: String,
        output: String,
        is_error: bool,
    },
    /// The command could not be started at all.
    CommandFailed {
        command: String,
        error: BridgeError,
    },
    FolderPicked(Option<PathBuf>),
    SaveTargetPicked(Option<PathBuf>),
    FolderOpened(PathBuf),
    FileOpened {
        path: PathBuf,
        content: String,
    },
    /// The open-file prompt could not read its target. Unlike a failed
    /// [`HostEvent::FileRead`] this never goes stale.
    FileOpenFailed {
        path: PathBuf,
        error: BridgeError,
    },
    SaveRequested,
    SaveAsRequested,
    PreferencesSaved(Result<(), String>),
}
