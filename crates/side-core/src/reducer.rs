use std::path::Path;
use std::path::PathBuf;

use super::actions::HostEvent;
use super::actions::ShellAction;
use super::actions::UserAction;
use super::config::Preferences;
use super::config::SearchPreferences;
use super::config::PREFERENCE_FIELDS;
use super::language::display_name;
use super::state::BridgeError;
use super::state::EntryKind;
use super::state::FocusRegion;
use super::state::LogEntry;
use super::state::LogLevel;
use super::state::LogSource;
use super::state::Notice;
use super::state::NoticeLevel;
use super::state::OpenFile;
use super::state::PreferencesForm;
use super::state::SearchPhase;
use super::state::SearchResult;
use super::state::ShellOverlay;
use super::state::ShellState;
use super::state::TranscriptEntry;
use super::tree::ListingOutcome;

/// Requests the reducer hands to the host side of the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    RequestFrame,
    ReadFile {
        path: PathBuf,
        line: Option<usize>,
        ticket: u64,
    },
    WriteFile {
        path: PathBuf,
        content: String,
        revision: u64,
    },
    ListDirectory {
        path: PathBuf,
        generation: u64,
    },
    SearchInFiles {
        folder: PathBuf,
        query: String,
        generation: u64,
        options: SearchPreferences,
    },
    RunCommand {
        command: String,
        cwd: Option<PathBuf>,
        shell: Option<String>,
    },
    PickFolder,
    PickSaveTarget,
    PickFile,
    SavePreferences(Preferences),
    SaveSession {
        last_opened_folder: PathBuf,
    },
    CopyToClipboard(String),
    Quit,
}

pub fn reduce(state: &mut ShellState, action: ShellAction) -> Vec<SideEffect> {
    match action {
        ShellAction::User(user) => reduce_user(state, user),
        ShellAction::Host(event) => reduce_host(state, event),
    }
}

fn reduce_user(state: &mut ShellState, action: UserAction) -> Vec<SideEffect> {
    match action {
        UserAction::SelectFile { path, line } => {
            vec![select_file(state, path, line), SideEffect::RequestFrame]
        }
        UserAction::OpenFolderDialog => vec![SideEffect::PickFolder],
        UserAction::OpenFileDialog => vec![SideEffect::PickFile],
        UserAction::CloseTab(path) => close_tab(state, &path),
        UserAction::CloseActiveTab => match state.active_file.clone() {
            Some(path) => close_tab(state, &path),
            None => Vec::new(),
        },
        UserAction::ConfirmClose => {
            let ShellOverlay::ConfirmClose { path } = std::mem::take(&mut state.overlay) else {
                return Vec::new();
            };
            match state.open_files.iter().position(|file| file.path == path) {
                Some(idx) => remove_tab(state, idx),
                None => vec![SideEffect::RequestFrame],
            }
        }
        UserAction::CancelClose => {
            state.overlay = ShellOverlay::None;
            vec![SideEffect::RequestFrame]
        }
        UserAction::CycleTab(delta) => {
            if state.open_files.is_empty() {
                return Vec::new();
            }
            let len = state.open_files.len() as isize;
            let current = state
                .active_file
                .as_ref()
                .and_then(|active| state.open_files.iter().position(|file| &file.path == active))
                .unwrap_or(0) as isize;
            let next = (current + delta).rem_euclid(len) as usize;
            let path = state.open_files[next].path.clone();
            vec![select_file(state, path, None), SideEffect::RequestFrame]
        }

        UserAction::EditContent(value) => {
            if !editable(state) {
                return Vec::new();
            }
            state.editor.edit(value);
            vec![SideEffect::RequestFrame]
        }
        UserAction::InsertText(text) => {
            if !editable(state) {
                return Vec::new();
            }
            state.editor.insert_text(&text);
            vec![SideEffect::RequestFrame]
        }
        UserAction::InsertNewline => {
            if !editable(state) {
                return Vec::new();
            }
            state.editor.insert_text("\n");
            vec![SideEffect::RequestFrame]
        }
        UserAction::InsertIndent => {
            if !editable(state) {
                return Vec::new();
            }
            let unit = state.preferences.editor.indent_unit();
            state.editor.insert_text(&unit);
            vec![SideEffect::RequestFrame]
        }
        UserAction::Backspace => {
            if editable(state) && state.editor.backspace() {
                return vec![SideEffect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::DeleteForward => {
            if editable(state) && state.editor.delete_forward() {
                return vec![SideEffect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::MoveCursor(movement) => {
            state.editor.move_cursor(movement);
            vec![SideEffect::RequestFrame]
        }

        UserAction::ToggleDirectory(path) => {
            let mut effects = toggle_directory(state, &path);
            effects.push(SideEffect::RequestFrame);
            effects
        }
        UserAction::ExplorerMove(delta) => {
            let show_hidden = state.show_hidden();
            state.tree.move_selection(delta, show_hidden);
            vec![SideEffect::RequestFrame]
        }
        UserAction::ExplorerActivate => {
            let Some(selected) = state.tree.selected().map(Path::to_path_buf) else {
                return Vec::new();
            };
            let is_directory = state
                .tree
                .get(&selected)
                .is_some_and(|entry| entry.is_directory);
            let mut effects = if is_directory {
                toggle_directory(state, &selected)
            } else {
                vec![select_file(state, selected, None)]
            };
            effects.push(SideEffect::RequestFrame);
            effects
        }
        UserAction::RefreshExplorer => match state.tree.refresh() {
            Some((path, generation)) => vec![
                SideEffect::ListDirectory { path, generation },
                SideEffect::RequestFrame,
            ],
            None => Vec::new(),
        },

        UserAction::ToggleSearchPanel => {
            state.panels.search = !state.panels.search;
            if state.panels.search {
                state.focus = FocusRegion::Main;
            }
            vec![SideEffect::RequestFrame]
        }
        UserAction::ToggleTerminal => {
            state.panels.terminal = !state.panels.terminal;
            if state.panels.terminal {
                state.focus = FocusRegion::Terminal;
            } else if state.focus == FocusRegion::Terminal {
                state.focus = FocusRegion::Main;
            }
            vec![SideEffect::RequestFrame]
        }
        UserAction::TogglePreferences => {
            if state.panels.preferences {
                state.panels.preferences = false;
            } else {
                state.preferences_form = PreferencesForm {
                    draft: state.preferences.clone(),
                    selected: 0,
                };
                state.panels.preferences = true;
            }
            vec![SideEffect::RequestFrame]
        }
        UserAction::ToggleLogs => {
            state.panels.logs = !state.panels.logs;
            vec![SideEffect::RequestFrame]
        }
        UserAction::ClearLogs => {
            state.logs.clear();
            vec![SideEffect::RequestFrame]
        }
        UserAction::FocusNext => {
            state.focus = state.focus.next(state.panels.terminal);
            vec![SideEffect::RequestFrame]
        }
        UserAction::FocusPrev => {
            state.focus = state.focus.prev(state.panels.terminal);
            vec![SideEffect::RequestFrame]
        }
        UserAction::SetFocus(region) => {
            if region == FocusRegion::Terminal && !state.panels.terminal {
                return Vec::new();
            }
            state.focus = region;
            vec![SideEffect::RequestFrame]
        }
        UserAction::ToggleTheme => {
            state.preferences.ui.theme = state.preferences.ui.theme.toggled();
            vec![
                SideEffect::SavePreferences(state.preferences.clone()),
                SideEffect::RequestFrame,
            ]
        }

        UserAction::SetSearchQuery(query) => {
            state.search.query = query;
            vec![SideEffect::RequestFrame]
        }
        UserAction::SubmitSearch => submit_search(state),
        UserAction::NextResult => step_result(state, 1),
        UserAction::PreviousResult => step_result(state, -1),
        UserAction::ActivateResult(idx) => {
            let Some(result) = state.search.results.get(idx).cloned() else {
                return Vec::new();
            };
            state.search.current = Some(idx);
            state.panels.search = false;
            state.focus = FocusRegion::Main;
            vec![
                select_file(state, result.file_path, Some(result.line_number)),
                SideEffect::RequestFrame,
            ]
        }

        UserAction::SetCommandInput(input) => {
            state.transcript.input = input;
            vec![SideEffect::RequestFrame]
        }
        UserAction::SubmitCommand => submit_command(state),
        UserAction::HistoryPrevious => {
            let commands = state.transcript.commands();
            if commands.is_empty() {
                return Vec::new();
            }
            let last = commands.len() - 1;
            let idx = state
                .transcript
                .history_index
                .map_or(0, |idx| (idx + 1).min(last));
            let recalled = commands[last - idx].to_string();
            state.transcript.input = recalled;
            state.transcript.history_index = Some(idx);
            vec![SideEffect::RequestFrame]
        }
        UserAction::HistoryNext => {
            let commands = state.transcript.commands();
            if commands.is_empty() {
                return Vec::new();
            }
            let last = commands.len() - 1;
            match state.transcript.history_index {
                None => return Vec::new(),
                Some(0) => {
                    state.transcript.history_index = None;
                    state.transcript.input.clear();
                }
                Some(idx) => {
                    let idx = (idx - 1).min(last);
                    let recalled = commands[last - idx].to_string();
                    state.transcript.input = recalled;
                    state.transcript.history_index = Some(idx);
                }
            }
            vec![SideEffect::RequestFrame]
        }
        UserAction::ClearTranscript => {
            state.transcript.entries.clear();
            vec![SideEffect::RequestFrame]
        }
        UserAction::CopyTranscript => {
            if state.transcript.entries.is_empty() {
                return Vec::new();
            }
            vec![SideEffect::CopyToClipboard(state.transcript.to_text())]
        }

        UserAction::PreferencesMove(delta) => {
            if !state.panels.preferences {
                return Vec::new();
            }
            let last = PREFERENCE_FIELDS.len() - 1;
            let form = &mut state.preferences_form;
            form.selected = form.selected.saturating_add_signed(delta).min(last);
            vec![SideEffect::RequestFrame]
        }
        UserAction::PreferencesAdjust(delta) => {
            if !state.panels.preferences {
                return Vec::new();
            }
            let form = &mut state.preferences_form;
            if let Some(field) = PREFERENCE_FIELDS.get(form.selected) {
                field.adjust(&mut form.draft, delta);
            }
            vec![SideEffect::RequestFrame]
        }
        UserAction::SavePreferences => {
            if !state.panels.preferences {
                return Vec::new();
            }
            state.preferences = state.preferences_form.draft.clone();
            state.panels.preferences = false;
            vec![
                SideEffect::SavePreferences(state.preferences.clone()),
                SideEffect::RequestFrame,
            ]
        }
        UserAction::CancelPreferences => {
            state.panels.preferences = false;
            vec![SideEffect::RequestFrame]
        }

        UserAction::CopyActivePath => match state.active_file.as_ref() {
            Some(path) => vec![SideEffect::CopyToClipboard(path.display().to_string())],
            None => Vec::new(),
        },
        UserAction::DismissNotice => {
            state.notice = None;
            vec![SideEffect::RequestFrame]
        }
        UserAction::Quit => vec![SideEffect::Quit],
    }
}

fn reduce_host(state: &mut ShellState, event: HostEvent) -> Vec<SideEffect> {
    match event {
        HostEvent::FileRead {
            path,
            line,
            ticket,
            result,
        } => {
            if ticket != state.read_ticket {
                tracing::debug!(path = %path.display(), ticket, "discarding stale file read");
                log(
                    state,
                    LogLevel::Debug,
                    "read",
                    format!("discarded stale read of {}", path.display()),
                );
                return Vec::new();
            }
            match result {
                Ok(content) => {
                    open_file(state, path, content);
                    if let Some(line) = line {
                        state.editor.reveal_line(line);
                    }
                    Vec::new()
                }
                Err(err) => {
                    report_error(state, err);
                    if state.content_pending && state.is_active(&path) {
                        return drop_unreadable_tab(state, &path);
                    }
                    Vec::new()
                }
            }
        }
        HostEvent::FileWritten {
            path,
            revision,
            result,
        } => {
            match result {
                Ok(()) => {
                    let unchanged = revision == state.editor.revision;
                    if !state.is_open(&path) {
                        state.open_files.push(OpenFile::new(path.clone()));
                        if unchanged {
                            state.active_file = Some(path.clone());
                        }
                    }
                    if unchanged && state.is_active(&path) {
                        state.editor.is_modified = false;
                    }
                    notify(state, NoticeLevel::Info, format!("Saved {}", display_name(&path)));
                }
                Err(err) => report_error(state, err),
            }
            Vec::new()
        }
        HostEvent::DirectoryListed {
            path,
            generation,
            result,
        } => {
            let outcome = match result {
                Ok(listing) => state.tree.apply_listing(generation, &path, listing),
                Err(err) => {
                    let outcome = state.tree.listing_failed(generation, &path);
                    if outcome == ListingOutcome::Applied {
                        report_error(state, err);
                    }
                    outcome
                }
            };
            if outcome != ListingOutcome::Applied {
                tracing::debug!(path = %path.display(), generation, ?outcome, "discarding listing");
                log(
                    state,
                    LogLevel::Debug,
                    "explorer",
                    format!("discarded {outcome:?} listing of {}", path.display()),
                );
            }
            Vec::new()
        }
        HostEvent::SearchCompleted { generation, result } => {
            if generation != state.search.generation
                || state.search.phase != SearchPhase::Searching
            {
                tracing::debug!(generation, "discarding stale search results");
                log(
                    state,
                    LogLevel::Debug,
                    "search",
                    "discarded stale search results".to_string(),
                );
                return Vec::new();
            }
            match result {
                Ok(results) => apply_search_results(state, results),
                Err(err) => {
                    state.search.phase = SearchPhase::Idle;
                    report_error(state, err);
                }
            }
            Vec::new()
        }
        HostEvent::TerminalOutput {
            command,
            output,
            is_error,
        } => {
            let kind = if is_error {
                EntryKind::Error
            } else {
                EntryKind::Output
            };
            append_run(state, command, kind, output);
            Vec::new()
        }
        HostEvent::CommandFailed { command, error } => {
            append_run(state, command, EntryKind::Error, error.message.clone());
            report_error(state, error);
            Vec::new()
        }
        HostEvent::FolderPicked(Some(path)) | HostEvent::FolderOpened(path) => {
            open_folder(state, path)
        }
        HostEvent::FolderPicked(None) | HostEvent::SaveTargetPicked(None) => Vec::new(),
        HostEvent::SaveTargetPicked(Some(path)) => {
            if !savable(state) {
                return Vec::new();
            }
            vec![write_active(state, path)]
        }
        HostEvent::FileOpened { path, content } => {
            // Supersedes any read still in flight.
            state.read_ticket += 1;
            open_file(state, path, content);
            Vec::new()
        }
        HostEvent::FileOpenFailed { path, error } => {
            tracing::debug!(path = %path.display(), "open-file prompt target unreadable");
            report_error(state, error);
            Vec::new()
        }
        HostEvent::SaveRequested => {
            if !savable(state) {
                return Vec::new();
            }
            match state.active_file.clone() {
                Some(path) => vec![write_active(state, path)],
                None => Vec::new(),
            }
        }
        HostEvent::SaveAsRequested => {
            if !savable(state) {
                return Vec::new();
            }
            vec![SideEffect::PickSaveTarget]
        }
        HostEvent::PreferencesSaved(result) => {
            match result {
                Ok(()) => notify(state, NoticeLevel::Info, "Preferences saved".to_string()),
                Err(message) => {
                    log(
                        state,
                        LogLevel::Error,
                        "preferences",
                        format!("failed to save preferences: {message}"),
                    );
                    notify(
                        state,
                        NoticeLevel::Error,
                        format!("Failed to save preferences: {message}"),
                    );
                }
            }
            Vec::new()
        }
    }
}

/// Makes `path` the active file with `content`, adding it to the open list
/// when it is not already there.
pub fn open_file(state: &mut ShellState, path: PathBuf, content: String) {
    if !state.is_open(&path) {
        state.open_files.push(OpenFile::new(path.clone()));
    }
    state.active_file = Some(path);
    state.editor.load(content);
    state.content_pending = false;
}

fn select_file(state: &mut ShellState, path: PathBuf, line: Option<usize>) -> SideEffect {
    state.read_ticket += 1;
    SideEffect::ReadFile {
        path,
        line,
        ticket: state.read_ticket,
    }
}

fn close_tab(state: &mut ShellState, path: &Path) -> Vec<SideEffect> {
    let Some(idx) = state.open_files.iter().position(|file| file.path == path) else {
        return Vec::new();
    };
    if state.is_active(path)
        && state.editor.is_modified
        && state.preferences.editor.confirm_close_modified
    {
        state.overlay = ShellOverlay::ConfirmClose {
            path: path.to_path_buf(),
        };
        return vec![SideEffect::RequestFrame];
    }
    remove_tab(state, idx)
}

fn remove_tab(state: &mut ShellState, idx: usize) -> Vec<SideEffect> {
    let removed = state.open_files.remove(idx);
    if !state.is_active(&removed.path) {
        return vec![SideEffect::RequestFrame];
    }

    state.editor.clear();
    match state.open_files.first().map(|file| file.path.clone()) {
        Some(next) => {
            state.active_file = Some(next.clone());
            state.content_pending = true;
            vec![select_file(state, next, None), SideEffect::RequestFrame]
        }
        None => {
            state.active_file = None;
            state.content_pending = false;
            vec![SideEffect::RequestFrame]
        }
    }
}

/// The tab whose content was being re-read after a close could not be read.
/// It is dropped rather than left behind an empty buffer that a save would
/// write over the file.
fn drop_unreadable_tab(state: &mut ShellState, path: &Path) -> Vec<SideEffect> {
    state.open_files.retain(|file| file.path != path);
    state.active_file = None;
    state.content_pending = false;
    state.editor.clear();
    vec![SideEffect::RequestFrame]
}

fn write_active(state: &ShellState, path: PathBuf) -> SideEffect {
    SideEffect::WriteFile {
        path,
        content: state.editor.content.clone(),
        revision: state.editor.revision,
    }
}

fn editable(state: &ShellState) -> bool {
    state.active_file.is_some() && !state.content_pending
}

fn savable(state: &mut ShellState) -> bool {
    if state.content_pending {
        notify(
            state,
            NoticeLevel::Info,
            "File is still loading; nothing saved".to_string(),
        );
        return false;
    }
    true
}

fn toggle_directory(state: &mut ShellState, path: &Path) -> Vec<SideEffect> {
    match state.tree.toggle(path) {
        Some(path) => vec![SideEffect::ListDirectory {
            path,
            generation: state.tree.generation(),
        }],
        None => Vec::new(),
    }
}

fn open_folder(state: &mut ShellState, path: PathBuf) -> Vec<SideEffect> {
    let generation = state.tree.open_root(path.clone());
    state.search.reset();
    log(
        state,
        LogLevel::Info,
        "explorer",
        format!("opened folder {}", path.display()),
    );
    vec![
        SideEffect::ListDirectory {
            path: path.clone(),
            generation,
        },
        SideEffect::SaveSession {
            last_opened_folder: path,
        },
        SideEffect::RequestFrame,
    ]
}

fn submit_search(state: &mut ShellState) -> Vec<SideEffect> {
    if state.search.phase == SearchPhase::Searching || state.search.query.is_empty() {
        return Vec::new();
    }
    let Some(folder) = state.root_folder().map(Path::to_path_buf) else {
        return Vec::new();
    };
    let search = &mut state.search;
    search.generation = search.generation.wrapping_add(1);
    search.phase = SearchPhase::Searching;
    search.results.clear();
    search.current = None;
    search.no_results = false;
    vec![
        SideEffect::SearchInFiles {
            folder,
            query: search.query.clone(),
            generation: search.generation,
            options: state.preferences.search.clone(),
        },
        SideEffect::RequestFrame,
    ]
}

fn apply_search_results(state: &mut ShellState, results: Vec<SearchResult>) {
    let search = &mut state.search;
    if results.is_empty() {
        search.phase = SearchPhase::Idle;
        search.no_results = true;
        search.current = None;
        search.results.clear();
    } else {
        search.phase = SearchPhase::Results;
        search.no_results = false;
        search.current = Some(0);
        search.results = results;
    }
}

fn step_result(state: &mut ShellState, delta: isize) -> Vec<SideEffect> {
    let len = state.search.results.len();
    if len == 0 {
        return Vec::new();
    }
    let current = state.search.current.unwrap_or(0) as isize;
    let next = (current + delta).rem_euclid(len as isize) as usize;
    state.search.current = Some(next);
    let target = state.search.results[next].clone();
    vec![
        select_file(state, target.file_path, Some(target.line_number)),
        SideEffect::RequestFrame,
    ]
}

fn submit_command(state: &mut ShellState) -> Vec<SideEffect> {
    if state.transcript.running {
        log(
            state,
            LogLevel::Warn,
            "terminal",
            "command rejected: another command is still running".to_string(),
        );
        return Vec::new();
    }
    if state.transcript.input.trim().is_empty() {
        return Vec::new();
    }
    let command = std::mem::take(&mut state.transcript.input);
    state.transcript.history_index = None;
    state.transcript.running = true;
    vec![
        SideEffect::RunCommand {
            command,
            cwd: state.root_folder().map(Path::to_path_buf),
            shell: state.preferences.terminal.shell.clone(),
        },
        SideEffect::RequestFrame,
    ]
}

fn append_run(state: &mut ShellState, command: String, kind: EntryKind, text: String) {
    let transcript = &mut state.transcript;
    transcript.entries.push(TranscriptEntry {
        kind: EntryKind::Command,
        text: command,
    });
    transcript.entries.push(TranscriptEntry { kind, text });
    transcript.running = false;
}

fn report_error(state: &mut ShellState, err: BridgeError) {
    tracing::warn!(kind = err.kind.label(), message = %err.message, "host request failed");
    state.logs.append(LogEntry {
        seq: 0,
        level: LogLevel::Error,
        ts_ms: now_ms(),
        source: LogSource::Host,
        context: Some(err.kind.label().to_string()),
        message: err.message.clone(),
    });
    notify(
        state,
        NoticeLevel::Error,
        format!("Failed to {}: {}", err.kind.label(), err.message),
    );
}

fn notify(state: &mut ShellState, level: NoticeLevel, message: String) {
    state.notice = Some(Notice { level, message });
}

fn log(state: &mut ShellState, level: LogLevel, context: &str, message: String) {
    state.logs.append(LogEntry {
        seq: 0,
        level,
        ts_ms: now_ms(),
        source: LogSource::Shell,
        context: Some(context.to_string()),
        message,
    });
}

fn now_ms() -> Option<u64> {
    u64::try_from(chrono::Utc::now().timestamp_millis()).ok()
}

#[cfg(test)]
mod tests;
