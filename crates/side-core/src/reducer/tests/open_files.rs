use super::*;
use pretty_assertions::assert_eq;

#[test]
fn selecting_a_file_reads_it_then_opens_it() {
    let mut state = state();
    let effects = user(
        &mut state,
        UserAction::SelectFile {
            path: PathBuf::from("/proj/a.rs"),
            line: None,
        },
    );
    assert_eq!(
        effects,
        vec![SideEffect::ReadFile {
            path: PathBuf::from("/proj/a.rs"),
            line: None,
            ticket: 1,
        }]
    );
    assert_eq!(active(&state), None);

    answer_read(&mut state, effects, "fn a() {}");
    assert_eq!(active(&state), Some(Path::new("/proj/a.rs")));
    assert_eq!(state.editor.content, "fn a() {}");
    assert!(!state.editor.is_modified);
    assert_eq!(state.open_files[0].name, "a.rs");
}

#[test]
fn reopening_focuses_existing_entry_and_replaces_content() {
    let mut state = state();
    open(&mut state, "/proj/a.rs", "one");
    open(&mut state, "/proj/b.rs", "two");
    user(&mut state, UserAction::InsertText("x".to_string()));
    assert!(state.editor.is_modified);

    open(&mut state, "/proj/a.rs", "one again");
    assert_eq!(
        open_paths(&state),
        vec![PathBuf::from("/proj/a.rs"), PathBuf::from("/proj/b.rs")]
    );
    assert_eq!(active(&state), Some(Path::new("/proj/a.rs")));
    assert_eq!(state.editor.content, "one again");
    assert!(!state.editor.is_modified);
}

#[test]
fn select_with_line_reveals_that_line() {
    let mut state = state();
    let effects = user(
        &mut state,
        UserAction::SelectFile {
            path: PathBuf::from("/proj/a.rs"),
            line: Some(3),
        },
    );
    answer_read(&mut state, effects, "1\n2\n3\n4");
    assert_eq!(state.editor.cursor.line, 2);
    assert_eq!(state.editor.cursor.column, 0);
    assert!(state.editor.center_on_cursor);
}

#[test]
fn failed_read_leaves_editor_untouched_and_raises_notice() {
    let mut state = state();
    open(&mut state, "/proj/a.rs", "keep me");
    user(&mut state, UserAction::InsertText("!".to_string()));

    let effects = user(
        &mut state,
        UserAction::SelectFile {
            path: PathBuf::from("/proj/missing.rs"),
            line: None,
        },
    );
    let SideEffect::ReadFile { ticket, .. } = effects[0].clone() else {
        panic!("expected read request");
    };
    host(
        &mut state,
        HostEvent::FileRead {
            path: PathBuf::from("/proj/missing.rs"),
            line: None,
            ticket,
            result: Err(BridgeError::new(BridgeErrorKind::FileRead, "not found")),
        },
    );

    assert_eq!(active(&state), Some(Path::new("/proj/a.rs")));
    assert_eq!(state.editor.content, "!keep me");
    assert!(state.editor.is_modified);
    assert_eq!(open_paths(&state), vec![PathBuf::from("/proj/a.rs")]);
    let notice = state.notice.expect("notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Failed to read file: not found");
    assert_eq!(
        state.logs.iter().last().map(|entry| entry.level),
        Some(LogLevel::Error)
    );
}

#[test]
fn stale_read_is_discarded() {
    let mut state = state();
    let first = user(
        &mut state,
        UserAction::SelectFile {
            path: PathBuf::from("/proj/slow.rs"),
            line: None,
        },
    );
    let second = user(
        &mut state,
        UserAction::SelectFile {
            path: PathBuf::from("/proj/fast.rs"),
            line: None,
        },
    );
    answer_read(&mut state, second, "fast");
    answer_read(&mut state, first, "slow");

    assert_eq!(active(&state), Some(Path::new("/proj/fast.rs")));
    assert_eq!(state.editor.content, "fast");
    assert_eq!(open_paths(&state), vec![PathBuf::from("/proj/fast.rs")]);
}

#[test]
fn pushed_file_opened_event_opens_file() {
    let mut state = state();
    host(
        &mut state,
        HostEvent::FileOpened {
            path: PathBuf::from("/tmp/notes.md"),
            content: "# notes".to_string(),
        },
    );
    assert_eq!(active(&state), Some(Path::new("/tmp/notes.md")));
    assert_eq!(state.editor.content, "# notes");
}

#[test]
fn save_writes_active_content_and_clears_modified() {
    let mut state = state();
    open(&mut state, "/proj/a.rs", "a");
    user(&mut state, UserAction::InsertText("b".to_string()));

    let effects = host(&mut state, HostEvent::SaveRequested);
    assert_eq!(
        effects,
        vec![SideEffect::WriteFile {
            path: PathBuf::from("/proj/a.rs"),
            content: "ba".to_string(),
            revision: state.editor.revision,
        }]
    );
    answer_write(&mut state, effects);
    assert!(!state.editor.is_modified);
    assert_eq!(open_paths(&state), vec![PathBuf::from("/proj/a.rs")]);
}

#[test]
fn save_without_active_file_is_noop() {
    let mut state = state();
    assert!(host(&mut state, HostEvent::SaveRequested).is_empty());
}

#[test]
fn failed_save_keeps_modified_flag() {
    let mut state = state();
    open(&mut state, "/proj/a.rs", "a");
    user(&mut state, UserAction::InsertText("b".to_string()));
    let revision = state.editor.revision;
    host(
        &mut state,
        HostEvent::FileWritten {
            path: PathBuf::from("/proj/a.rs"),
            revision,
            result: Err(BridgeError::new(
                BridgeErrorKind::FileWrite,
                "permission denied",
            )),
        },
    );
    assert!(state.editor.is_modified);
    assert_eq!(state.editor.content, "ba");
    assert_eq!(
        state.notice.map(|notice| notice.level),
        Some(NoticeLevel::Error)
    );
}

#[test]
fn save_as_inserts_new_target_and_activates_it() {
    let mut state = state();
    open(&mut state, "/proj/a.rs", "a");
    user(&mut state, UserAction::InsertText("b".to_string()));

    assert_eq!(
        host(&mut state, HostEvent::SaveAsRequested),
        vec![SideEffect::PickSaveTarget]
    );
    let effects = host(
        &mut state,
        HostEvent::SaveTargetPicked(Some(PathBuf::from("/proj/copy.rs"))),
    );
    assert_eq!(
        effects,
        vec![SideEffect::WriteFile {
            path: PathBuf::from("/proj/copy.rs"),
            content: "ba".to_string(),
            revision: state.editor.revision,
        }]
    );
    answer_write(&mut state, effects);
    assert_eq!(
        open_paths(&state),
        vec![PathBuf::from("/proj/a.rs"), PathBuf::from("/proj/copy.rs")]
    );
    assert_eq!(active(&state), Some(Path::new("/proj/copy.rs")));
    assert!(!state.editor.is_modified);
}

#[test]
fn save_completing_after_switching_files_leaves_the_new_buffer_alone() {
    let mut state = state();
    open(&mut state, "/proj/a.rs", "A");
    user(&mut state, UserAction::EditContent("A-edited".to_string()));
    let pending_write = host(&mut state, HostEvent::SaveRequested);

    open(&mut state, "/proj/b.rs", "B");
    user(&mut state, UserAction::EditContent("B-edited".to_string()));
    answer_write(&mut state, pending_write);

    assert_eq!(active(&state), Some(Path::new("/proj/b.rs")));
    assert_eq!(state.editor.content, "B-edited");
    assert!(state.editor.is_modified);
    assert_eq!(
        host(&mut state, HostEvent::SaveRequested),
        vec![SideEffect::WriteFile {
            path: PathBuf::from("/proj/b.rs"),
            content: "B-edited".to_string(),
            revision: state.editor.revision,
        }]
    );
}

#[test]
fn edits_made_while_a_save_is_in_flight_stay_modified() {
    let mut state = state();
    open(&mut state, "/proj/a.rs", "a");
    user(&mut state, UserAction::InsertText("1".to_string()));
    let pending_write = host(&mut state, HostEvent::SaveRequested);
    user(&mut state, UserAction::InsertText("2".to_string()));

    answer_write(&mut state, pending_write);
    assert_eq!(active(&state), Some(Path::new("/proj/a.rs")));
    assert!(state.editor.is_modified);
    assert_eq!(
        state.notice.map(|notice| notice.message),
        Some("Saved a.rs".to_string())
    );
}

#[test]
fn save_as_completing_after_a_switch_adds_the_tab_without_activating_it() {
    let mut state = state();
    open(&mut state, "/proj/a.rs", "a");
    let picked = host(
        &mut state,
        HostEvent::SaveTargetPicked(Some(PathBuf::from("/proj/copy.rs"))),
    );
    open(&mut state, "/proj/b.rs", "b");

    answer_write(&mut state, picked);
    assert_eq!(
        open_paths(&state),
        vec![
            PathBuf::from("/proj/a.rs"),
            PathBuf::from("/proj/b.rs"),
            PathBuf::from("/proj/copy.rs"),
        ]
    );
    assert_eq!(active(&state), Some(Path::new("/proj/b.rs")));
    assert_eq!(state.editor.content, "b");
}

#[test]
fn cancelled_save_target_does_nothing() {
    let mut state = state();
    open(&mut state, "/proj/a.rs", "a");
    assert!(host(&mut state, HostEvent::SaveTargetPicked(None)).is_empty());
    assert_eq!(open_paths(&state), vec![PathBuf::from("/proj/a.rs")]);
}

#[test]
fn closing_inactive_tab_keeps_active_pointer() {
    let mut state = state();
    open(&mut state, "/proj/a.rs", "a");
    open(&mut state, "/proj/b.rs", "b");
    open(&mut state, "/proj/c.rs", "c");

    let effects = user(&mut state, UserAction::CloseTab(PathBuf::from("/proj/a.rs")));
    assert!(effects.is_empty());
    assert_eq!(active(&state), Some(Path::new("/proj/c.rs")));
    assert_eq!(state.editor.content, "c");
}

#[test]
fn closing_active_tab_activates_first_remaining_and_reads_it() {
    let mut state = state();
    open(&mut state, "/proj/a.rs", "a");
    open(&mut state, "/proj/b.rs", "b");
    open(&mut state, "/proj/c.rs", "c");

    let effects = user(&mut state, UserAction::CloseTab(PathBuf::from("/proj/c.rs")));
    assert_eq!(active(&state), Some(Path::new("/proj/a.rs")));
    assert_eq!(state.editor.content, "");
    assert!(state.content_pending);
    assert!(matches!(
        effects.as_slice(),
        [SideEffect::ReadFile { path, line: None, .. }] if path == Path::new("/proj/a.rs")
    ));

    answer_read(&mut state, effects, "a");
    assert_eq!(state.editor.content, "a");
    assert!(!state.content_pending);
}

#[test]
fn saving_while_replacement_content_is_loading_is_refused() {
    let mut state = state();
    open(&mut state, "/proj/a.rs", "a");
    open(&mut state, "/proj/b.rs", "b");
    user(&mut state, UserAction::CloseActiveTab);

    assert!(host(&mut state, HostEvent::SaveRequested).is_empty());
    assert!(user(&mut state, UserAction::InsertText("x".to_string())).is_empty());
    assert_eq!(state.editor.content, "");
}

#[test]
fn failed_reread_after_close_drops_the_tab_and_unblocks_the_editor() {
    let mut state = state();
    open(&mut state, "/proj/a.rs", "a");
    open(&mut state, "/proj/b.rs", "b");
    let effects = user(&mut state, UserAction::CloseActiveTab);
    let Some(SideEffect::ReadFile { path, ticket, .. }) = effects.first().cloned() else {
        panic!("expected re-read of the next tab");
    };
    host(
        &mut state,
        HostEvent::FileRead {
            path,
            line: None,
            ticket,
            result: Err(BridgeError::new(BridgeErrorKind::FileRead, "gone")),
        },
    );

    assert!(!state.content_pending);
    assert_eq!(active(&state), None);
    assert!(state.open_files.is_empty());
    assert_eq!(
        state.notice.as_ref().map(|notice| notice.message.as_str()),
        Some("Failed to read file: gone")
    );
    assert!(host(&mut state, HostEvent::SaveRequested).is_empty());
    assert_eq!(
        state.notice.as_ref().map(|notice| notice.message.clone()),
        Some("Failed to read file: gone".to_string())
    );

    open(&mut state, "/proj/c.rs", "c");
    user(&mut state, UserAction::InsertText("!".to_string()));
    assert_eq!(state.editor.content, "!c");
}

#[test]
fn failed_open_prompt_read_is_reported_even_after_other_selections() {
    let mut state = state();
    user(
        &mut state,
        UserAction::SelectFile {
            path: PathBuf::from("/proj/a.rs"),
            line: None,
        },
    );
    host(
        &mut state,
        HostEvent::FileOpenFailed {
            path: PathBuf::from("/tmp/locked.txt"),
            error: BridgeError::new(BridgeErrorKind::FileRead, "permission denied"),
        },
    );
    assert_eq!(
        state.notice.map(|notice| (notice.level, notice.message)),
        Some((
            NoticeLevel::Error,
            "Failed to read file: permission denied".to_string()
        ))
    );
    assert!(state.open_files.is_empty());
}

#[test]
fn closing_last_tab_clears_editor() {
    let mut state = state();
    open(&mut state, "/proj/a.rs", "a");
    user(&mut state, UserAction::InsertText("z".to_string()));

    let effects = user(&mut state, UserAction::CloseActiveTab);
    assert!(effects.is_empty());
    assert_eq!(active(&state), None);
    assert_eq!(state.editor.content, "");
    assert!(!state.editor.is_modified);
    assert!(state.open_files.is_empty());
}

#[test]
fn closing_modified_tab_prompts_when_configured() {
    let mut prefs = Preferences::default();
    prefs.editor.confirm_close_modified = true;
    let mut state = ShellState::new(prefs);
    open(&mut state, "/proj/a.rs", "a");
    user(&mut state, UserAction::InsertText("z".to_string()));

    user(&mut state, UserAction::CloseActiveTab);
    assert_eq!(
        state.overlay,
        ShellOverlay::ConfirmClose {
            path: PathBuf::from("/proj/a.rs")
        }
    );
    assert_eq!(state.open_files.len(), 1);

    user(&mut state, UserAction::CancelClose);
    assert_eq!(state.overlay, ShellOverlay::None);
    assert_eq!(state.open_files.len(), 1);

    user(&mut state, UserAction::CloseActiveTab);
    user(&mut state, UserAction::ConfirmClose);
    assert!(state.open_files.is_empty());
    assert_eq!(active(&state), None);
}

#[test]
fn cycling_tabs_rereads_target_and_wraps() {
    let mut state = state();
    open(&mut state, "/proj/a.rs", "a");
    open(&mut state, "/proj/b.rs", "b");

    let effects = user(&mut state, UserAction::CycleTab(1));
    assert!(matches!(
        effects.as_slice(),
        [SideEffect::ReadFile { path, .. }] if path == Path::new("/proj/a.rs")
    ));
    answer_read(&mut state, effects, "a");

    let effects = user(&mut state, UserAction::CycleTab(-1));
    assert!(matches!(
        effects.as_slice(),
        [SideEffect::ReadFile { path, .. }] if path == Path::new("/proj/b.rs")
    ));
}

#[test]
fn tab_indent_follows_preferences() {
    let mut prefs = Preferences::default();
    prefs.editor.tab_size = 2;
    let mut state = ShellState::new(prefs);
    open(&mut state, "/proj/a.rs", "x");
    user(&mut state, UserAction::InsertIndent);
    assert_eq!(state.editor.content, "  x");
}

#[test]
fn editing_without_a_file_is_ignored() {
    let mut state = state();
    assert!(user(&mut state, UserAction::EditContent("text".to_string())).is_empty());
    assert!(!state.editor.is_modified);
}

#[test]
fn copy_active_path_goes_to_clipboard() {
    let mut state = state();
    assert!(user(&mut state, UserAction::CopyActivePath).is_empty());
    open(&mut state, "/proj/a.rs", "a");
    assert_eq!(
        user(&mut state, UserAction::CopyActivePath),
        vec![SideEffect::CopyToClipboard("/proj/a.rs".to_string())]
    );
}
