use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs};
use ratatui::Terminal;

use side_core::actions::{HostEvent, ShellAction, UserAction};
use side_core::config::{UiTheme, PREFERENCE_FIELDS};
use side_core::editor::CursorMove;
use side_core::language::{
    display_name, format_file_size, icon_for_file_name, language_for_file_name,
};
use side_core::persistence::{PreferencesStore, SessionSnapshot, SessionStore};
use side_core::reducer::{reduce, SideEffect};
use side_core::state::{
    EntryKind, FocusRegion, LogLevel, NoticeLevel, SearchPhase, ShellOverlay, ShellState,
};

use crate::bridge::HostBridge;
use crate::highlight::{clip_spans, highlight_viewport};

pub struct Stores {
    pub preferences: PreferencesStore,
    pub session: SessionStore,
}

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            LeaveAlternateScreen,
            DisableBracketedPaste,
            crossterm::cursor::Show
        );
    }
}

/// Runs the full-screen shell until quit. `startup` is fed through the
/// reducer before the first frame.
pub fn run(
    state: ShellState,
    bridge: HostBridge,
    stores: Stores,
    startup: Vec<ShellAction>,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let _guard = TuiGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(state, bridge, stores);
    for action in startup {
        app.dispatch(action);
    }
    let result = run_app(&mut terminal, &mut app);
    app.bridge.shutdown();
    result.map_err(|e| e.into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptPurpose {
    OpenFolder,
    OpenFile,
    SaveAs,
}

impl PromptPurpose {
    fn title(self) -> &'static str {
        match self {
            Self::OpenFolder => "Open Folder",
            Self::OpenFile => "Open File",
            Self::SaveAs => "Save As",
        }
    }
}

/// Stand-in for the native file dialogs: a single path input.
#[derive(Debug, Clone)]
struct PathPrompt {
    purpose: PromptPurpose,
    input: String,
}

struct App {
    state: ShellState,
    bridge: HostBridge,
    stores: Stores,
    prompt: Option<PathPrompt>,
    /// Query of the last submitted search; Enter on an unchanged query opens
    /// the current result instead of searching again.
    searched_query: Option<String>,
    page_rows: usize,
    dirty: bool,
    quit: bool,
}

impl App {
    fn new(state: ShellState, bridge: HostBridge, stores: Stores) -> Self {
        Self {
            state,
            bridge,
            stores,
            prompt: None,
            searched_query: None,
            page_rows: 20,
            dirty: true,
            quit: false,
        }
    }

    fn dispatch(&mut self, action: ShellAction) {
        if matches!(action, ShellAction::Host(_)) {
            self.dirty = true;
        }
        let effects = reduce(&mut self.state, action);
        self.apply(effects);
    }

    fn user(&mut self, action: UserAction) {
        self.dispatch(ShellAction::User(action));
    }

    fn host(&mut self, event: HostEvent) {
        self.dispatch(ShellAction::Host(event));
    }

    fn apply(&mut self, effects: Vec<SideEffect>) {
        for effect in effects {
            let Some(effect) = self.bridge.dispatch(effect) else {
                continue;
            };
            match effect {
                SideEffect::RequestFrame => self.dirty = true,
                SideEffect::PickFolder => self.open_prompt(PromptPurpose::OpenFolder),
                SideEffect::PickFile => self.open_prompt(PromptPurpose::OpenFile),
                SideEffect::PickSaveTarget => self.open_prompt(PromptPurpose::SaveAs),
                SideEffect::SavePreferences(prefs) => {
                    let result = self
                        .stores
                        .preferences
                        .save(&prefs)
                        .map_err(|err| err.to_string());
                    if let Err(err) = &result {
                        tracing::error!(error = %err, "failed to save preferences");
                    }
                    self.host(HostEvent::PreferencesSaved(result));
                }
                SideEffect::SaveSession { last_opened_folder } => {
                    let snapshot = SessionSnapshot {
                        last_opened_folder: Some(last_opened_folder),
                    };
                    if let Err(err) = self.stores.session.save(&snapshot) {
                        tracing::warn!(error = %err, "failed to save session");
                    }
                }
                SideEffect::CopyToClipboard(text) => {
                    let copied =
                        arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
                    if let Err(err) = copied {
                        tracing::warn!(error = %err, "clipboard unavailable");
                    }
                }
                SideEffect::Quit => self.quit = true,
                other => tracing::debug!(?other, "effect not handled by the frontend"),
            }
        }
    }

    fn open_prompt(&mut self, purpose: PromptPurpose) {
        let base = self
            .state
            .root_folder()
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default();
        let input = match purpose {
            PromptPurpose::SaveAs => self
                .state
                .active_file
                .clone()
                .unwrap_or_else(|| base.join("untitled.txt")),
            PromptPurpose::OpenFolder | PromptPurpose::OpenFile => base,
        };
        let mut input = input.display().to_string();
        if purpose == PromptPurpose::OpenFile && !input.ends_with(std::path::MAIN_SEPARATOR) {
            input.push(std::path::MAIN_SEPARATOR);
        }
        self.prompt = Some(PathPrompt { purpose, input });
        self.dirty = true;
    }

    fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        self.dirty = true;
        let Some(path) = resolve_input(&prompt.input, self.state.root_folder()) else {
            self.cancel_prompt(prompt.purpose);
            return;
        };
        match prompt.purpose {
            PromptPurpose::OpenFolder => self.host(HostEvent::FolderPicked(Some(path))),
            PromptPurpose::OpenFile => self.bridge.open_file(path),
            PromptPurpose::SaveAs => self.host(HostEvent::SaveTargetPicked(Some(path))),
        }
    }

    fn cancel_prompt(&mut self, purpose: PromptPurpose) {
        self.prompt = None;
        self.dirty = true;
        match purpose {
            PromptPurpose::OpenFolder => self.host(HostEvent::FolderPicked(None)),
            PromptPurpose::SaveAs => self.host(HostEvent::SaveTargetPicked(None)),
            PromptPurpose::OpenFile => {}
        }
    }

    /// Scrolls the editor so the cursor stays on screen for the next frame.
    fn prepare_viewport(&mut self, area: Rect) {
        let areas = layout(area, &self.state);
        let (text, _) = editor_viewport(areas.main, &self.state);
        let rows = usize::from(text.height);
        let cols = usize::from(text.width);
        self.state.editor.scroll_into_view(rows, cols);
        self.page_rows = rows.max(1);
    }

    fn busy(&self) -> bool {
        self.state.transcript.running || self.state.search.phase == SearchPhase::Searching
    }
}

/// Expands `~` and resolves relative input against the open folder.
fn resolve_input(input: &str, root: Option<&Path>) -> Option<PathBuf> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let path = match trimmed.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()?.join(rest),
        None if trimmed == "~" => dirs::home_dir()?,
        None => PathBuf::from(trimmed),
    };
    if path.is_absolute() {
        return Some(path);
    }
    let base = match root {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir().ok()?,
    };
    Some(base.join(path))
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        while let Some(event) = app.bridge.try_recv() {
            app.host(event);
        }
        if app.quit {
            return Ok(());
        }

        if app.dirty || app.busy() {
            let size = terminal.size()?;
            app.prepare_viewport(Rect::new(0, 0, size.width, size.height));
            let view = &*app;
            terminal.draw(|f| ui(f, &view.state, view.prompt.as_ref()))?;
            app.dirty = false;
        }

        if event::poll(Duration::from_millis(30))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key_event(key, app),
                Event::Paste(text) => handle_paste(text, app),
                Event::Resize(..) => app.dirty = true,
                _ => {}
            }
        }
    }
}

fn handle_key_event(key: KeyEvent, app: &mut App) {
    if let Some(prompt) = app.prompt.as_mut() {
        match key.code {
            KeyCode::Esc => {
                let purpose = prompt.purpose;
                app.cancel_prompt(purpose);
            }
            KeyCode::Enter => app.submit_prompt(),
            KeyCode::Backspace => {
                prompt.input.pop();
                app.dirty = true;
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                prompt.input.clear();
                app.dirty = true;
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                prompt.input.push(c);
                app.dirty = true;
            }
            _ => {}
        }
        return;
    }

    let effects = if matches!(app.state.overlay, ShellOverlay::ConfirmClose { .. }) {
        handle_confirm_close_keys(key, &mut app.state)
    } else if app.state.panels.preferences {
        handle_preferences_keys(key, &mut app.state)
    } else if app.state.panels.logs {
        handle_logs_keys(key, &mut app.state)
    } else if let Some(effects) = handle_global_keys(key, &mut app.state) {
        effects
    } else {
        match app.state.focus {
            FocusRegion::Explorer => handle_explorer_keys(key, &mut app.state),
            FocusRegion::Main if app.state.panels.search => {
                handle_search_keys(key, &mut app.state, &mut app.searched_query)
            }
            FocusRegion::Main => handle_editor_keys(key, &mut app.state, app.page_rows),
            FocusRegion::Terminal => handle_terminal_keys(key, &mut app.state),
        }
    };
    app.apply(effects);
}

fn handle_paste(text: String, app: &mut App) {
    if let Some(prompt) = app.prompt.as_mut() {
        prompt.input.push_str(text.lines().next().unwrap_or_default());
        app.dirty = true;
        return;
    }
    if app.state.overlay != ShellOverlay::None
        || app.state.panels.preferences
        || app.state.panels.logs
    {
        return;
    }
    let action = match app.state.focus {
        FocusRegion::Main if app.state.panels.search => {
            let line = text.lines().next().unwrap_or_default();
            UserAction::SetSearchQuery(format!("{}{line}", app.state.search.query))
        }
        FocusRegion::Main => UserAction::InsertText(text.replace("\r\n", "\n")),
        FocusRegion::Terminal => {
            let line = text.lines().next().unwrap_or_default();
            UserAction::SetCommandInput(format!("{}{line}", app.state.transcript.input))
        }
        FocusRegion::Explorer => return,
    };
    app.user(action);
}

fn user(state: &mut ShellState, action: UserAction) -> Vec<SideEffect> {
    reduce(state, ShellAction::User(action))
}

fn handle_confirm_close_keys(key: KeyEvent, state: &mut ShellState) -> Vec<SideEffect> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => user(state, UserAction::ConfirmClose),
        KeyCode::Char('n') | KeyCode::Esc => user(state, UserAction::CancelClose),
        _ => Vec::new(),
    }
}

fn handle_preferences_keys(key: KeyEvent, state: &mut ShellState) -> Vec<SideEffect> {
    match key.code {
        KeyCode::Esc => user(state, UserAction::CancelPreferences),
        KeyCode::Enter => user(state, UserAction::SavePreferences),
        KeyCode::Up => user(state, UserAction::PreferencesMove(-1)),
        KeyCode::Down => user(state, UserAction::PreferencesMove(1)),
        KeyCode::Left => user(state, UserAction::PreferencesAdjust(-1)),
        KeyCode::Right | KeyCode::Char(' ') => user(state, UserAction::PreferencesAdjust(1)),
        _ => Vec::new(),
    }
}

fn handle_logs_keys(key: KeyEvent, state: &mut ShellState) -> Vec<SideEffect> {
    match key.code {
        KeyCode::Esc | KeyCode::F(12) => user(state, UserAction::ToggleLogs),
        KeyCode::Char('c') => user(state, UserAction::ClearLogs),
        _ => Vec::new(),
    }
}

/// Shortcuts that work from every focus region. `None` when the key is not
/// one of them.
fn handle_global_keys(key: KeyEvent, state: &mut ShellState) -> Option<Vec<SideEffect>> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let action = match key.code {
        KeyCode::Char('q') if ctrl => ShellAction::User(UserAction::Quit),
        KeyCode::Char('o') if ctrl => ShellAction::User(UserAction::OpenFolderDialog),
        KeyCode::Char('p') if ctrl => ShellAction::User(UserAction::OpenFileDialog),
        KeyCode::Char('s') if ctrl => ShellAction::Host(HostEvent::SaveRequested),
        KeyCode::Char('s') if alt => ShellAction::Host(HostEvent::SaveAsRequested),
        KeyCode::Char('w') if ctrl => ShellAction::User(UserAction::CloseActiveTab),
        KeyCode::Left if alt => ShellAction::User(UserAction::CycleTab(-1)),
        KeyCode::Right if alt => ShellAction::User(UserAction::CycleTab(1)),
        KeyCode::Char('d') if ctrl => ShellAction::User(UserAction::ToggleTheme),
        KeyCode::F(5) => ShellAction::User(UserAction::RefreshExplorer),
        KeyCode::Char('y') if ctrl && state.focus != FocusRegion::Terminal => {
            ShellAction::User(UserAction::CopyActivePath)
        }
        KeyCode::Char('f') if ctrl => ShellAction::User(UserAction::ToggleSearchPanel),
        // Ctrl+` reaches most terminals as Ctrl+Space.
        KeyCode::Char('`' | ' ' | 'j') if ctrl => ShellAction::User(UserAction::ToggleTerminal),
        KeyCode::Char(',') if ctrl => ShellAction::User(UserAction::TogglePreferences),
        KeyCode::F(2) => ShellAction::User(UserAction::TogglePreferences),
        KeyCode::F(12) => ShellAction::User(UserAction::ToggleLogs),
        KeyCode::Tab if ctrl => ShellAction::User(UserAction::FocusNext),
        KeyCode::F(6) => ShellAction::User(UserAction::FocusNext),
        KeyCode::BackTab => ShellAction::User(UserAction::FocusPrev),
        KeyCode::Esc if state.notice.is_some() => ShellAction::User(UserAction::DismissNotice),
        _ => return None,
    };
    Some(reduce(state, action))
}

fn handle_explorer_keys(key: KeyEvent, state: &mut ShellState) -> Vec<SideEffect> {
    let selected_dir = state
        .tree
        .selected()
        .and_then(|path| state.tree.get(path))
        .filter(|entry| entry.is_directory)
        .map(|entry| entry.path.clone());
    match key.code {
        KeyCode::Up => user(state, UserAction::ExplorerMove(-1)),
        KeyCode::Down => user(state, UserAction::ExplorerMove(1)),
        KeyCode::PageUp => user(state, UserAction::ExplorerMove(-10)),
        KeyCode::PageDown => user(state, UserAction::ExplorerMove(10)),
        KeyCode::Enter | KeyCode::Char(' ') => user(state, UserAction::ExplorerActivate),
        KeyCode::Right => match selected_dir {
            Some(path) if !state.tree.is_expanded(&path) => {
                user(state, UserAction::ToggleDirectory(path))
            }
            _ => Vec::new(),
        },
        KeyCode::Left => match selected_dir {
            Some(path) if state.tree.is_expanded(&path) => {
                user(state, UserAction::ToggleDirectory(path))
            }
            _ => Vec::new(),
        },
        KeyCode::Tab => user(state, UserAction::FocusNext),
        _ => Vec::new(),
    }
}

fn handle_search_keys(
    key: KeyEvent,
    state: &mut ShellState,
    searched_query: &mut Option<String>,
) -> Vec<SideEffect> {
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return Vec::new();
    }
    match key.code {
        KeyCode::Esc => user(state, UserAction::ToggleSearchPanel),
        KeyCode::Tab => user(state, UserAction::FocusNext),
        KeyCode::Down => user(state, UserAction::NextResult),
        KeyCode::Up => user(state, UserAction::PreviousResult),
        KeyCode::Enter => {
            let unchanged = searched_query.as_deref() == Some(state.search.query.as_str());
            match state.search.current {
                Some(idx) if unchanged && state.search.phase == SearchPhase::Results => {
                    user(state, UserAction::ActivateResult(idx))
                }
                _ => {
                    *searched_query = Some(state.search.query.clone());
                    user(state, UserAction::SubmitSearch)
                }
            }
        }
        KeyCode::Backspace => {
            let mut query = state.search.query.clone();
            query.pop();
            user(state, UserAction::SetSearchQuery(query))
        }
        KeyCode::Char(c) => {
            let query = format!("{}{c}", state.search.query);
            user(state, UserAction::SetSearchQuery(query))
        }
        _ => Vec::new(),
    }
}

fn handle_editor_keys(key: KeyEvent, state: &mut ShellState, page_rows: usize) -> Vec<SideEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let action = match key.code {
        KeyCode::Left => UserAction::MoveCursor(CursorMove::Left),
        KeyCode::Right => UserAction::MoveCursor(CursorMove::Right),
        KeyCode::Up => UserAction::MoveCursor(CursorMove::Up),
        KeyCode::Down => UserAction::MoveCursor(CursorMove::Down),
        KeyCode::Home if ctrl => UserAction::MoveCursor(CursorMove::DocumentStart),
        KeyCode::End if ctrl => UserAction::MoveCursor(CursorMove::DocumentEnd),
        KeyCode::Home => UserAction::MoveCursor(CursorMove::LineStart),
        KeyCode::End => UserAction::MoveCursor(CursorMove::LineEnd),
        KeyCode::PageUp => UserAction::MoveCursor(CursorMove::PageUp(page_rows)),
        KeyCode::PageDown => UserAction::MoveCursor(CursorMove::PageDown(page_rows)),
        KeyCode::Enter => UserAction::InsertNewline,
        KeyCode::Tab => UserAction::InsertIndent,
        KeyCode::Backspace => UserAction::Backspace,
        KeyCode::Delete => UserAction::DeleteForward,
        KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
            UserAction::InsertText(c.to_string())
        }
        _ => return Vec::new(),
    };
    user(state, action)
}

fn handle_terminal_keys(key: KeyEvent, state: &mut ShellState) -> Vec<SideEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => user(state, UserAction::SetFocus(FocusRegion::Main)),
        KeyCode::Tab => user(state, UserAction::FocusNext),
        KeyCode::Enter => user(state, UserAction::SubmitCommand),
        KeyCode::Up => user(state, UserAction::HistoryPrevious),
        KeyCode::Down => user(state, UserAction::HistoryNext),
        KeyCode::Char('l') if ctrl => user(state, UserAction::ClearTranscript),
        KeyCode::Char('y') if ctrl => user(state, UserAction::CopyTranscript),
        KeyCode::Backspace => {
            let mut input = state.transcript.input.clone();
            input.pop();
            user(state, UserAction::SetCommandInput(input))
        }
        KeyCode::Char(c) if !ctrl => {
            let input = format!("{}{c}", state.transcript.input);
            user(state, UserAction::SetCommandInput(input))
        }
        _ => Vec::new(),
    }
}

#[derive(Clone, Copy)]
struct UiPalette {
    accent: Color,
    success: Color,
    warning: Color,
    danger: Color,
    muted: Color,
    text: Color,
    border: Color,
    focus_border: Color,
    panel_bg: Color,
    selected_bg: Color,
}

fn palette_for(theme: UiTheme) -> UiPalette {
    match theme {
        UiTheme::Dark => UiPalette {
            accent: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::LightRed,
            muted: Color::DarkGray,
            text: Color::Gray,
            border: Color::DarkGray,
            focus_border: Color::Cyan,
            panel_bg: Color::Rgb(30, 30, 30),
            selected_bg: Color::Rgb(55, 55, 70),
        },
        UiTheme::Light => UiPalette {
            accent: Color::Blue,
            success: Color::Green,
            warning: Color::Rgb(170, 110, 0),
            danger: Color::Red,
            muted: Color::Gray,
            text: Color::Black,
            border: Color::Gray,
            focus_border: Color::Blue,
            panel_bg: Color::Rgb(250, 250, 250),
            selected_bg: Color::Rgb(215, 225, 245),
        },
    }
}

struct Areas {
    tabs: Rect,
    explorer: Rect,
    main: Rect,
    terminal: Option<Rect>,
    status: Rect,
}

fn layout(area: Rect, state: &ShellState) -> Areas {
    let terminal_h = if state.panels.terminal {
        (area.height / 3).max(6)
    } else {
        0
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(terminal_h),
            Constraint::Length(1),
        ])
        .split(area);
    let explorer_w = (area.width / 4).clamp(18, 40);
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(explorer_w), Constraint::Min(10)])
        .split(rows[1]);
    Areas {
        tabs: rows[0],
        explorer: body[0],
        main: body[1],
        terminal: state.panels.terminal.then_some(rows[2]),
        status: rows[3],
    }
}

fn gutter_width(state: &ShellState) -> u16 {
    if !state.preferences.editor.line_numbers {
        return 0;
    }
    let digits = state.editor.line_count().max(1).to_string().len();
    u16::try_from(digits + 1).unwrap_or(u16::MAX)
}

/// Text area of the editor (inside the border, right of the gutter) and the
/// gutter width.
fn editor_viewport(main: Rect, state: &ShellState) -> (Rect, u16) {
    let inner = Block::default().borders(Borders::ALL).inner(main);
    let gutter = gutter_width(state).min(inner.width);
    let text = Rect::new(
        inner.x + gutter,
        inner.y,
        inner.width - gutter,
        inner.height,
    );
    (text, gutter)
}

fn panel_block(title: String, focused: bool, palette: UiPalette) -> Block<'static> {
    let border = if focused {
        palette.focus_border
    } else {
        palette.border
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(palette.panel_bg).fg(palette.text))
        .title(title)
}

fn get_spinner() -> &'static str {
    let frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    frames[(millis / 100) as usize % frames.len()]
}

fn ui(f: &mut ratatui::Frame, state: &ShellState, prompt: Option<&PathPrompt>) {
    let palette = palette_for(state.preferences.ui.theme);
    let area = f.area();
    f.render_widget(
        Block::default().style(Style::default().bg(palette.panel_bg).fg(palette.text)),
        area,
    );
    let areas = layout(area, state);

    render_tabs(f, areas.tabs, state, palette);
    render_explorer(f, areas.explorer, state, palette);
    if state.panels.search {
        render_search(f, areas.main, state, palette);
    } else {
        render_editor(f, areas.main, state, palette);
    }
    if let Some(terminal) = areas.terminal {
        render_terminal(f, terminal, state, palette);
    }
    render_status_bar(f, areas.status, state, palette);

    if state.panels.preferences {
        render_preferences(f, area, state, palette);
    }
    if state.panels.logs {
        render_logs(f, area, state, palette);
    }
    if let ShellOverlay::ConfirmClose { path } = &state.overlay {
        render_confirm_close(f, area, path, palette);
    }
    if let Some(prompt) = prompt {
        render_prompt(f, area, prompt, palette);
    }
}

fn render_tabs(f: &mut ratatui::Frame, area: Rect, state: &ShellState, palette: UiPalette) {
    if state.open_files.is_empty() {
        let p = Paragraph::new(Span::styled(" side ", Style::default().fg(palette.muted)));
        f.render_widget(p, area);
        return;
    }
    let titles: Vec<Line> = state
        .open_files
        .iter()
        .map(|file| {
            let marker = if state.is_active(&file.path) && state.editor.is_modified {
                "*"
            } else {
                ""
            };
            Line::from(format!(" {}{marker} ", file.name))
        })
        .collect();
    let selected = state
        .active_file
        .as_ref()
        .and_then(|active| state.open_files.iter().position(|file| &file.path == active));
    let tabs = Tabs::new(titles)
        .select(selected.unwrap_or(0))
        .style(Style::default().fg(palette.muted))
        .highlight_style(
            Style::default()
                .fg(palette.accent)
                .bg(palette.selected_bg)
                .add_modifier(Modifier::BOLD),
        )
        .divider("│");
    f.render_widget(tabs, area);
}

fn file_badge(name: &str) -> &'static str {
    match icon_for_file_name(name) {
        "javascript" => "js",
        "react" => "jx",
        "typescript" => "ts",
        "html" => "<>",
        "css" | "sass" => "# ",
        "json" => "{}",
        "markdown" => "md",
        "python" => "py",
        "ruby" => "rb",
        "java" => "jv",
        "c" => "c ",
        "cpp" => "c+",
        "csharp" => "c#",
        "go" => "go",
        "php" => "ph",
        "swift" => "sw",
        "rust" => "rs",
        _ => "· ",
    }
}

fn render_explorer(f: &mut ratatui::Frame, area: Rect, state: &ShellState, palette: UiPalette) {
    let focused = state.focus == FocusRegion::Explorer;
    let title = match state.root_folder() {
        Some(root) => format!(" {} ", display_name(root)),
        None => " Explorer ".to_string(),
    };
    let block = panel_block(title, focused, palette);

    let rows = state.tree.visible_rows(state.show_hidden());
    if rows.is_empty() {
        let text = if state.root_folder().is_some() {
            vec![Line::from(Span::styled(
                format!("{} Loading…", get_spinner()),
                Style::default().fg(palette.muted),
            ))]
        } else {
            vec![
                Line::from("No folder open"),
                Line::from(Span::styled(
                    "Ctrl+O to open one",
                    Style::default().fg(palette.muted),
                )),
            ]
        };
        f.render_widget(Paragraph::new(text).block(block), area);
        return;
    }

    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let indent = "  ".repeat(row.depth);
            let (marker, marker_style) = if row.is_directory {
                let arrow = if row.expanded { "▾ " } else { "▸ " };
                (arrow, Style::default().fg(palette.accent))
            } else {
                (file_badge(&row.name), Style::default().fg(palette.muted))
            };
            let mut spans = vec![
                Span::raw(indent),
                Span::styled(marker, marker_style),
                Span::raw(" "),
                Span::raw(row.name.clone()),
            ];
            if row.loading {
                spans.push(Span::styled(" …", Style::default().fg(palette.muted)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    let selected = state
        .tree
        .selected()
        .and_then(|path| rows.iter().position(|row| row.path == path));
    let mut list_state = ListState::default().with_selected(selected);
    let highlight = if focused {
        Style::default().bg(palette.selected_bg).fg(palette.accent)
    } else {
        Style::default().bg(palette.selected_bg)
    };
    let list = List::new(items).block(block).highlight_style(highlight);
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_editor(f: &mut ratatui::Frame, area: Rect, state: &ShellState, palette: UiPalette) {
    let focused = state.focus == FocusRegion::Main;
    let Some(active) = state.active_file.as_deref() else {
        let block = panel_block(" Editor ".to_string(), focused, palette);
        let help = vec![
            Line::from(""),
            Line::from("No file open"),
            Line::from(Span::styled(
                "Ctrl+O open folder · Ctrl+P open file · Ctrl+F search · Ctrl+J terminal",
                Style::default().fg(palette.muted),
            )),
        ];
        f.render_widget(
            Paragraph::new(help).alignment(Alignment::Center).block(block),
            area,
        );
        return;
    };

    let title = format!(" {} ", display_name(active));
    let block = panel_block(title, focused, palette);
    if state.content_pending {
        let p = Paragraph::new(Span::styled(
            format!("{} Loading…", get_spinner()),
            Style::default().fg(palette.muted),
        ))
        .block(block);
        f.render_widget(p, area);
        return;
    }
    f.render_widget(block, area);

    let (text_area, gutter) = editor_viewport(area, state);
    let editor = &state.editor;
    let rows = usize::from(text_area.height);
    let language = language_for_file_name(&display_name(active));
    let visible = highlight_viewport(
        &editor.content,
        language,
        state.preferences.ui.theme,
        editor.scroll_top,
        rows,
    );

    let width = usize::from(gutter.saturating_sub(1));
    let lines: Vec<Line> = visible
        .into_iter()
        .enumerate()
        .map(|(offset, spans)| {
            let line_idx = editor.scroll_top + offset;
            let mut out = Vec::new();
            if gutter > 0 {
                let style = if line_idx == editor.cursor.line {
                    Style::default().fg(palette.accent)
                } else {
                    Style::default().fg(palette.muted)
                };
                out.push(Span::styled(format!("{:>width$} ", line_idx + 1), style));
            }
            out.extend(clip_spans(
                spans,
                editor.scroll_left,
                usize::from(text_area.width),
            ));
            Line::from(out)
        })
        .collect();
    let full = Rect::new(
        text_area.x - gutter,
        text_area.y,
        text_area.width + gutter,
        text_area.height,
    );
    f.render_widget(Paragraph::new(lines), full);

    if focused
        && !state.panels.preferences
        && !state.panels.logs
        && state.overlay == ShellOverlay::None
    {
        let row = editor.cursor.line.checked_sub(editor.scroll_top);
        let col = editor.cursor.column.checked_sub(editor.scroll_left);
        if let (Some(row), Some(col)) = (row, col) {
            if row < rows && col < usize::from(text_area.width) {
                f.set_cursor_position((
                    text_area.x + col as u16,
                    text_area.y + row as u16,
                ));
            }
        }
    }
}

fn render_search(f: &mut ratatui::Frame, area: Rect, state: &ShellState, palette: UiPalette) {
    let focused = state.focus == FocusRegion::Main;
    let block = panel_block(" Search ".to_string(), focused, palette);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let search = &state.search;
    let input = Line::from(vec![
        Span::styled("› ", Style::default().fg(palette.accent)),
        Span::raw(search.query.clone()),
    ]);
    f.render_widget(Paragraph::new(input), parts[0]);

    let (status, color) = match search.phase {
        SearchPhase::Searching => (format!("{} Searching…", get_spinner()), palette.warning),
        SearchPhase::Results => (
            format!(
                "{}/{} results · ↑↓ navigate · Enter open",
                search.current.map_or(0, |idx| idx + 1),
                search.results.len()
            ),
            palette.success,
        ),
        SearchPhase::Idle if search.no_results => ("No results".to_string(), palette.muted),
        SearchPhase::Idle => match state.root_folder() {
            Some(root) => (
                format!("Enter to search in {}", display_name(root)),
                palette.muted,
            ),
            None => ("Open a folder to search".to_string(), palette.muted),
        },
    };
    f.render_widget(
        Paragraph::new(Span::styled(status, Style::default().fg(color))),
        parts[1],
    );

    let root = state.root_folder();
    let items: Vec<ListItem> = search
        .results
        .iter()
        .map(|result| {
            let shown = root
                .and_then(|root| result.file_path.strip_prefix(root).ok())
                .unwrap_or(result.file_path.as_path());
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{}:{}", shown.display(), result.line_number),
                    Style::default().fg(palette.accent),
                ),
                Span::raw("  "),
                Span::raw(result.match_text.clone()),
            ]))
        })
        .collect();
    let mut list_state = ListState::default().with_selected(search.current);
    let list = List::new(items).highlight_style(Style::default().bg(palette.selected_bg));
    f.render_stateful_widget(list, parts[2], &mut list_state);

    if focused
        && !state.panels.preferences
        && !state.panels.logs
        && state.overlay == ShellOverlay::None
    {
        let col = 2 + search.query.chars().count() as u16;
        if col < parts[0].width {
            f.set_cursor_position((parts[0].x + col, parts[0].y));
        }
    }
}

fn render_terminal(f: &mut ratatui::Frame, area: Rect, state: &ShellState, palette: UiPalette) {
    let focused = state.focus == FocusRegion::Terminal;
    let title = match state.root_folder() {
        Some(root) => format!(" Terminal · {} ", root.display()),
        None => " Terminal ".to_string(),
    };
    let block = panel_block(title, focused, palette);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let transcript = &state.transcript;
    let mut lines: Vec<Line> = Vec::new();
    for entry in &transcript.entries {
        match entry.kind {
            EntryKind::Command => lines.push(Line::from(vec![
                Span::styled("$ ", Style::default().fg(palette.success)),
                Span::styled(
                    entry.text.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ])),
            EntryKind::Output | EntryKind::Error => {
                let style = if entry.kind == EntryKind::Error {
                    Style::default().fg(palette.danger)
                } else {
                    Style::default()
                };
                lines.extend(
                    entry
                        .text
                        .split('\n')
                        .map(|line| Line::from(Span::styled(line.replace('\t', "    "), style))),
                );
            }
        }
    }
    let prompt_line = if transcript.running {
        Line::from(Span::styled(
            format!("{} running…", get_spinner()),
            Style::default().fg(palette.warning),
        ))
    } else {
        Line::from(vec![
            Span::styled("$ ", Style::default().fg(palette.accent)),
            Span::raw(transcript.input.clone()),
        ])
    };
    lines.push(prompt_line);

    let height = usize::from(inner.height);
    let total = lines.len();
    let offset = u16::try_from(total.saturating_sub(height)).unwrap_or(u16::MAX);
    f.render_widget(Paragraph::new(lines).scroll((offset, 0)), inner);

    if focused
        && !transcript.running
        && !state.panels.preferences
        && !state.panels.logs
        && height > 0
    {
        let col = 2 + transcript.input.chars().count() as u16;
        let row = u16::try_from(total.min(height) - 1).unwrap_or(0);
        if col < inner.width {
            f.set_cursor_position((inner.x + col, inner.y + row));
        }
    }
}

fn render_status_bar(f: &mut ratatui::Frame, area: Rect, state: &ShellState, palette: UiPalette) {
    let status = state.status_bar();
    let parts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(40),
            Constraint::Percentage(30),
        ])
        .split(area);

    let mut left = vec![Span::styled(
        format!(" {}", status.file_label),
        Style::default().fg(palette.accent),
    )];
    if state.active_file.is_some() && !state.content_pending {
        left.push(Span::styled(
            format!("  {}", format_file_size(state.editor.content.len() as u64)),
            Style::default().fg(palette.muted),
        ));
        left.push(Span::styled(
            format!(
                "  Ln {}, Col {}",
                state.editor.cursor.line + 1,
                state.editor.cursor.column + 1
            ),
            Style::default().fg(palette.muted),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(left)), parts[0]);

    if let Some(notice) = &status.notice {
        let color = match notice.level {
            NoticeLevel::Info => palette.success,
            NoticeLevel::Error => palette.danger,
        };
        let p = Paragraph::new(Span::styled(notice.message.clone(), Style::default().fg(color)))
            .alignment(Alignment::Center);
        f.render_widget(p, parts[1]);
    }

    let mut right = Vec::new();
    if !status.extension.is_empty() {
        right.push(status.extension.clone());
    }
    right.extend([
        status.encoding.to_string(),
        status.line_ending.to_string(),
        status.language.to_string(),
        state.preferences.ui.theme.label().to_string(),
    ]);
    let p = Paragraph::new(Span::styled(
        format!("{} ", right.join("  ")),
        Style::default().fg(palette.muted),
    ))
    .alignment(Alignment::Right);
    f.render_widget(p, parts[2]);
}

fn render_preferences(f: &mut ratatui::Frame, area: Rect, state: &ShellState, palette: UiPalette) {
    let popup = centered_rect(60, 70, area);
    f.render_widget(Clear, popup);
    let block = panel_block(" Preferences ".to_string(), true, palette);
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let form = &state.preferences_form;
    let mut lines = Vec::new();
    let mut section = "";
    for (idx, field) in PREFERENCE_FIELDS.iter().enumerate() {
        if field.section() != section {
            section = field.section();
            if !lines.is_empty() {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled(
                section,
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            )));
        }
        let style = if idx == form.selected {
            Style::default().bg(palette.selected_bg)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<32}", field.label()), style),
            Span::styled(
                field.display_value(&form.draft),
                style.fg(palette.warning),
            ),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "↑↓ select · ←→ change · Enter save · Esc cancel",
        Style::default().fg(palette.muted),
    )));
    f.render_widget(Paragraph::new(lines), inner);
}

/// Newest entries of the in-state log, bottom-aligned like the terminal.
fn render_logs(f: &mut ratatui::Frame, area: Rect, state: &ShellState, palette: UiPalette) {
    let popup = centered_rect(80, 70, area);
    f.render_widget(Clear, popup);
    let block = panel_block(format!(" Logs ({}) ", state.logs.len()), true, palette);
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);
    f.render_widget(
        Paragraph::new(Span::styled(
            "c clear · Esc / F12 close",
            Style::default().fg(palette.muted),
        )),
        parts[1],
    );

    if state.logs.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled("No log entries", Style::default().fg(palette.muted))),
            parts[0],
        );
        return;
    }
    let height = usize::from(parts[0].height);
    let skip = state.logs.len().saturating_sub(height);
    let lines: Vec<Line> = state
        .logs
        .iter()
        .skip(skip)
        .map(|entry| {
            let color = match entry.level {
                LogLevel::Debug => palette.muted,
                LogLevel::Info => palette.accent,
                LogLevel::Warn => palette.warning,
                LogLevel::Error => palette.danger,
            };
            let origin = match &entry.context {
                Some(context) => format!("{}/{context}", entry.source.label()),
                None => entry.source.label().to_string(),
            };
            Line::from(vec![
                Span::styled(format!("{:>4} ", entry.seq), Style::default().fg(palette.muted)),
                Span::styled(format!("{:<5} ", entry.level.label()), Style::default().fg(color)),
                Span::styled(format!("{origin}: "), Style::default().fg(palette.muted)),
                Span::raw(entry.message.clone()),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), parts[0]);
}

fn render_confirm_close(f: &mut ratatui::Frame, area: Rect, path: &Path, palette: UiPalette) {
    let popup = centered_rect(50, 20, area);
    f.render_widget(Clear, popup);
    let block = panel_block(" Unsaved Changes ".to_string(), true, palette);
    let text = vec![
        Line::from(format!("Close {} and discard changes?", display_name(path))),
        Line::from(""),
        Line::from(Span::styled(
            "y / Enter close · n / Esc keep editing",
            Style::default().fg(palette.muted),
        )),
    ];
    f.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).block(block),
        popup,
    );
}

fn render_prompt(f: &mut ratatui::Frame, area: Rect, prompt: &PathPrompt, palette: UiPalette) {
    let popup = centered_rect(70, 20, area);
    f.render_widget(Clear, popup);
    let block = panel_block(format!(" {} ", prompt.purpose.title()), true, palette);
    let inner = block.inner(popup);
    f.render_widget(block, popup);
    let text = vec![
        Line::from(prompt.input.clone()),
        Line::from(""),
        Line::from(Span::styled(
            "Enter confirm · Esc cancel · Ctrl+U clear",
            Style::default().fg(palette.muted),
        )),
    ];
    f.render_widget(Paragraph::new(text), inner);

    let col = prompt.input.chars().count() as u16;
    if col < inner.width && inner.height > 0 {
        f.set_cursor_position((inner.x + col, inner.y));
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
