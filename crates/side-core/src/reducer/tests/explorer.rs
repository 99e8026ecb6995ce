use super::*;
use pretty_assertions::assert_eq;

fn proj_listing() -> Vec<DirectoryNode> {
    vec![
        DirectoryNode::directory("src", "/proj/src"),
        DirectoryNode::file("readme.md", "/proj/readme.md"),
    ]
}

#[test]
fn opening_folder_lists_root_and_remembers_it() {
    let mut state = state();
    let effects = host(&mut state, HostEvent::FolderOpened(PathBuf::from("/proj")));
    assert_eq!(
        without_frames(effects),
        vec![
            SideEffect::ListDirectory {
                path: PathBuf::from("/proj"),
                generation: 1,
            },
            SideEffect::SaveSession {
                last_opened_folder: PathBuf::from("/proj"),
            },
        ]
    );
    assert_eq!(state.root_folder(), Some(Path::new("/proj")));
}

#[test]
fn expanding_src_merges_children_in_place() {
    let mut state = state();
    open_folder(&mut state, "/proj", proj_listing());

    let effects = user(
        &mut state,
        UserAction::ToggleDirectory(PathBuf::from("/proj/src")),
    );
    assert_eq!(
        effects,
        vec![SideEffect::ListDirectory {
            path: PathBuf::from("/proj/src"),
            generation: 1,
        }]
    );
    let readme_before = state.tree.get(Path::new("/proj/readme.md")).cloned();

    host(
        &mut state,
        HostEvent::DirectoryListed {
            path: PathBuf::from("/proj/src"),
            generation: 1,
            result: Ok(vec![
                DirectoryNode::directory("bin", "/proj/src/bin"),
                DirectoryNode::file("lib.rs", "/proj/src/lib.rs"),
            ]),
        },
    );

    assert_eq!(
        outline(&state.tree.to_nodes()),
        vec![
            (0, "src".to_string()),
            (1, "bin".to_string()),
            (1, "lib.rs".to_string()),
            (0, "readme.md".to_string()),
        ]
    );
    assert_eq!(
        state.tree.get(Path::new("/proj/readme.md")).cloned(),
        readme_before
    );
    assert_eq!(
        state.tree.get(Path::new("/proj/readme.md")).and_then(|e| e.children.clone()),
        None
    );
}

#[test]
fn collapsing_and_reexpanding_does_not_refetch() {
    let mut state = state();
    open_folder(&mut state, "/proj", proj_listing());
    user(&mut state, UserAction::ToggleDirectory(PathBuf::from("/proj/src")));
    host(
        &mut state,
        HostEvent::DirectoryListed {
            path: PathBuf::from("/proj/src"),
            generation: 1,
            result: Ok(Vec::new()),
        },
    );

    assert!(user(&mut state, UserAction::ToggleDirectory(PathBuf::from("/proj/src"))).is_empty());
    assert!(!state.tree.is_expanded(Path::new("/proj/src")));
    assert!(user(&mut state, UserAction::ToggleDirectory(PathBuf::from("/proj/src"))).is_empty());
    assert!(state.tree.is_expanded(Path::new("/proj/src")));
}

#[test]
fn failed_listing_keeps_prior_tree_and_raises_notice() {
    let mut state = state();
    open_folder(&mut state, "/proj", proj_listing());
    user(&mut state, UserAction::ToggleDirectory(PathBuf::from("/proj/src")));
    host(
        &mut state,
        HostEvent::DirectoryListed {
            path: PathBuf::from("/proj/src"),
            generation: 1,
            result: Err(BridgeError::new(
                BridgeErrorKind::DirectoryList,
                "permission denied",
            )),
        },
    );

    assert_eq!(outline(&state.tree.to_nodes()).len(), 2);
    assert!(!state.tree.is_expanded(Path::new("/proj/src")));
    assert!(!state.tree.is_loading(Path::new("/proj/src")));
    assert_eq!(
        state.notice.map(|notice| notice.message),
        Some("Failed to list directory: permission denied".to_string())
    );
}

#[test]
fn listing_for_previous_folder_is_discarded() {
    let mut state = state();
    host(&mut state, HostEvent::FolderOpened(PathBuf::from("/old")));
    host(&mut state, HostEvent::FolderOpened(PathBuf::from("/new")));
    host(
        &mut state,
        HostEvent::DirectoryListed {
            path: PathBuf::from("/old"),
            generation: 1,
            result: Ok(vec![DirectoryNode::file("stale.txt", "/old/stale.txt")]),
        },
    );
    assert!(state.tree.top_level().is_empty());
    assert!(state.notice.is_none());
    assert_eq!(
        state.logs.iter().last().map(|entry| entry.level),
        Some(LogLevel::Debug)
    );
}

#[test]
fn activating_a_file_row_selects_it() {
    let mut state = state();
    open_folder(&mut state, "/proj", proj_listing());
    user(&mut state, UserAction::ExplorerMove(1));
    user(&mut state, UserAction::ExplorerMove(1));
    assert_eq!(state.tree.selected(), Some(Path::new("/proj/readme.md")));

    let effects = user(&mut state, UserAction::ExplorerActivate);
    assert!(matches!(
        effects.as_slice(),
        [SideEffect::ReadFile { path, .. }] if path == Path::new("/proj/readme.md")
    ));
}

#[test]
fn refresh_relists_root_with_new_generation() {
    let mut state = state();
    assert!(user(&mut state, UserAction::RefreshExplorer).is_empty());
    open_folder(&mut state, "/proj", proj_listing());
    assert_eq!(
        user(&mut state, UserAction::RefreshExplorer),
        vec![SideEffect::ListDirectory {
            path: PathBuf::from("/proj"),
            generation: 2,
        }]
    );
}

#[test]
fn picked_folder_opens_and_cancel_is_noop() {
    let mut state = state();
    assert_eq!(
        user(&mut state, UserAction::OpenFolderDialog),
        vec![SideEffect::PickFolder]
    );
    assert!(host(&mut state, HostEvent::FolderPicked(None)).is_empty());
    assert_eq!(state.root_folder(), None);

    host(&mut state, HostEvent::FolderPicked(Some(PathBuf::from("/proj"))));
    assert_eq!(state.root_folder(), Some(Path::new("/proj")));
}
