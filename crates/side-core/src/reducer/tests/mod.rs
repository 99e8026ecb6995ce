pub(super) use std::path::Path;
pub(super) use std::path::PathBuf;

pub(super) use super::reduce;
pub(super) use super::SideEffect;
pub(super) use crate::actions::HostEvent;
pub(super) use crate::actions::ShellAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::config::Preferences;
pub(super) use crate::state::BridgeError;
pub(super) use crate::state::BridgeErrorKind;
pub(super) use crate::state::EntryKind;
pub(super) use crate::state::FocusRegion;
pub(super) use crate::state::LogBuffer;
pub(super) use crate::state::LogLevel;
pub(super) use crate::state::NoticeLevel;
pub(super) use crate::state::SearchPhase;
pub(super) use crate::state::SearchResult;
pub(super) use crate::state::ShellOverlay;
pub(super) use crate::state::ShellState;
pub(super) use crate::tree::DirectoryNode;

mod explorer;
mod open_files;
mod search_panel;

fn state() -> ShellState {
    ShellState::new(Preferences::default())
}

fn user(state: &mut ShellState, action: UserAction) -> Vec<SideEffect> {
    without_frames(reduce(state, ShellAction::User(action)))
}

fn host(state: &mut ShellState, event: HostEvent) -> Vec<SideEffect> {
    reduce(state, ShellAction::Host(event))
}

fn without_frames(effects: Vec<SideEffect>) -> Vec<SideEffect> {
    effects
        .into_iter()
        .filter(|effect| *effect != SideEffect::RequestFrame)
        .collect()
}

/// Issues `select_file` and answers the read request with `content`.
fn open(state: &mut ShellState, path: &str, content: &str) {
    let effects = user(
        state,
        UserAction::SelectFile {
            path: PathBuf::from(path),
            line: None,
        },
    );
    answer_read(state, effects, content);
}

/// Answers the single `ReadFile` in `effects`.
fn answer_read(state: &mut ShellState, effects: Vec<SideEffect>, content: &str) {
    let read = effects
        .into_iter()
        .find_map(|effect| match effect {
            SideEffect::ReadFile { path, line, ticket } => Some((path, line, ticket)),
            _ => None,
        })
        .expect("read request");
    host(
        state,
        HostEvent::FileRead {
            path: read.0,
            line: read.1,
            ticket: read.2,
            result: Ok(content.to_string()),
        },
    );
}

/// Completes the single `WriteFile` in `effects` successfully.
fn answer_write(state: &mut ShellState, effects: Vec<SideEffect>) {
    let (path, revision) = effects
        .into_iter()
        .find_map(|effect| match effect {
            SideEffect::WriteFile { path, revision, .. } => Some((path, revision)),
            _ => None,
        })
        .expect("write request");
    host(
        state,
        HostEvent::FileWritten {
            path,
            revision,
            result: Ok(()),
        },
    );
}

fn open_paths(state: &ShellState) -> Vec<PathBuf> {
    state
        .open_files
        .iter()
        .map(|file| file.path.clone())
        .collect()
}

fn active(state: &ShellState) -> Option<&Path> {
    state.active_file.as_deref()
}

/// Opens `root` and delivers its listing.
fn open_folder(state: &mut ShellState, root: &str, listing: Vec<DirectoryNode>) {
    let effects = host(state, HostEvent::FolderOpened(PathBuf::from(root)));
    let generation = effects
        .iter()
        .find_map(|effect| match effect {
            SideEffect::ListDirectory { generation, .. } => Some(*generation),
            _ => None,
        })
        .expect("root listing request");
    host(
        state,
        HostEvent::DirectoryListed {
            path: PathBuf::from(root),
            generation,
            result: Ok(listing),
        },
    );
}

fn outline(nodes: &[DirectoryNode]) -> Vec<(usize, String)> {
    fn walk(nodes: &[DirectoryNode], depth: usize, out: &mut Vec<(usize, String)>) {
        for node in nodes {
            out.push((depth, node.name.clone()));
            if let Some(children) = &node.children {
                walk(children, depth + 1, out);
            }
        }
    }
    let mut out = Vec::new();
    walk(nodes, 0, &mut out);
    out
}
