use super::*;
use pretty_assertions::assert_eq;

fn hit(path: &str, line: usize) -> SearchResult {
    SearchResult {
        file_path: PathBuf::from(path),
        line_number: line,
        match_text: format!("match on {line}"),
    }
}

fn searching_state(query: &str) -> (ShellState, u64) {
    let mut state = state();
    open_folder(&mut state, "/proj", Vec::new());
    user(&mut state, UserAction::SetSearchQuery(query.to_string()));
    let effects = user(&mut state, UserAction::SubmitSearch);
    let generation = match effects.as_slice() {
        [SideEffect::SearchInFiles { generation, .. }] => *generation,
        other => panic!("unexpected effects {other:?}"),
    };
    (state, generation)
}

fn read_target(effects: &[SideEffect]) -> (PathBuf, Option<usize>) {
    match effects {
        [SideEffect::ReadFile { path, line, .. }] => (path.clone(), *line),
        other => panic!("unexpected effects {other:?}"),
    }
}

#[test]
fn submit_requires_query_and_folder() {
    let mut state = state();
    user(&mut state, UserAction::SetSearchQuery("needle".to_string()));
    assert!(user(&mut state, UserAction::SubmitSearch).is_empty());
    assert_eq!(state.search.phase, SearchPhase::Idle);

    open_folder(&mut state, "/proj", Vec::new());
    user(&mut state, UserAction::SetSearchQuery(String::new()));
    assert!(user(&mut state, UserAction::SubmitSearch).is_empty());
}

#[test]
fn submit_carries_query_and_search_preferences() {
    let mut state = state();
    state.preferences.search.case_sensitive = true;
    open_folder(&mut state, "/proj", Vec::new());
    user(&mut state, UserAction::SetSearchQuery("TODO".to_string()));
    let effects = user(&mut state, UserAction::SubmitSearch);
    assert_eq!(
        effects,
        vec![SideEffect::SearchInFiles {
            folder: PathBuf::from("/proj"),
            query: "TODO".to_string(),
            generation: state.search.generation,
            options: state.preferences.search.clone(),
        }]
    );
    assert_eq!(state.search.phase, SearchPhase::Searching);
}

#[test]
fn submit_while_searching_is_noop() {
    let (mut state, _) = searching_state("needle");
    assert!(user(&mut state, UserAction::SubmitSearch).is_empty());
}

#[test]
fn results_select_first_index_without_opening() {
    let (mut state, generation) = searching_state("needle");
    let effects = host(
        &mut state,
        HostEvent::SearchCompleted {
            generation,
            result: Ok(vec![hit("/proj/a.rs", 3), hit("/proj/b.rs", 7)]),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.search.phase, SearchPhase::Results);
    assert_eq!(state.search.current, Some(0));
    assert_eq!(state.active_file, None);
}

#[test]
fn empty_response_returns_to_idle_with_no_results_flag() {
    let (mut state, generation) = searching_state("needle");
    host(
        &mut state,
        HostEvent::SearchCompleted {
            generation,
            result: Ok(Vec::new()),
        },
    );
    assert_eq!(state.search.phase, SearchPhase::Idle);
    assert!(state.search.no_results);
    assert!(user(&mut state, UserAction::NextResult).is_empty());
}

#[test]
fn next_wraps_after_result_count_steps() {
    let (mut state, generation) = searching_state("needle");
    let results = vec![hit("/proj/a.rs", 1), hit("/proj/b.rs", 2), hit("/proj/c.rs", 3)];
    host(
        &mut state,
        HostEvent::SearchCompleted {
            generation,
            result: Ok(results.clone()),
        },
    );

    let start = state.search.current;
    let mut visited = Vec::new();
    for _ in 0..results.len() {
        let effects = user(&mut state, UserAction::NextResult);
        visited.push(read_target(&effects));
    }
    assert_eq!(state.search.current, start);
    assert_eq!(
        visited,
        vec![
            (PathBuf::from("/proj/b.rs"), Some(2)),
            (PathBuf::from("/proj/c.rs"), Some(3)),
            (PathBuf::from("/proj/a.rs"), Some(1)),
        ]
    );
}

#[test]
fn previous_wraps_to_last_result() {
    let (mut state, generation) = searching_state("needle");
    host(
        &mut state,
        HostEvent::SearchCompleted {
            generation,
            result: Ok(vec![hit("/proj/a.rs", 1), hit("/proj/b.rs", 9)]),
        },
    );
    let effects = user(&mut state, UserAction::PreviousResult);
    assert_eq!(state.search.current, Some(1));
    assert_eq!(read_target(&effects), (PathBuf::from("/proj/b.rs"), Some(9)));
}

#[test]
fn activating_result_opens_it_and_returns_to_editor() {
    let (mut state, generation) = searching_state("needle");
    user(&mut state, UserAction::ToggleSearchPanel);
    host(
        &mut state,
        HostEvent::SearchCompleted {
            generation,
            result: Ok(vec![hit("/proj/a.rs", 1), hit("/proj/b.rs", 2)]),
        },
    );

    let effects = user(&mut state, UserAction::ActivateResult(1));
    assert_eq!(state.search.current, Some(1));
    assert!(!state.panels.search);
    assert_eq!(state.focus, FocusRegion::Main);
    assert_eq!(read_target(&effects), (PathBuf::from("/proj/b.rs"), Some(2)));

    answer_read(&mut state, effects, "x\ny");
    assert_eq!(state.editor.cursor.line, 1);
}

#[test]
fn results_from_superseded_search_are_discarded() {
    let (mut state, generation) = searching_state("needle");
    open_folder(&mut state, "/other", Vec::new());
    host(
        &mut state,
        HostEvent::SearchCompleted {
            generation,
            result: Ok(vec![hit("/proj/a.rs", 1)]),
        },
    );
    assert!(state.search.results.is_empty());
    assert_eq!(state.search.phase, SearchPhase::Idle);
}

#[test]
fn search_failure_returns_to_idle_with_notice() {
    let (mut state, generation) = searching_state("needle");
    host(
        &mut state,
        HostEvent::SearchCompleted {
            generation,
            result: Err(BridgeError::new(BridgeErrorKind::Search, "walk failed")),
        },
    );
    assert_eq!(state.search.phase, SearchPhase::Idle);
    assert!(!state.search.no_results);
    assert_eq!(
        state.notice.map(|notice| notice.level),
        Some(NoticeLevel::Error)
    );
}
