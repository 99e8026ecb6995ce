use serde::Deserialize;
use serde::Serialize;

pub const FONT_SIZE_RANGE: (u16, u16) = (8, 24);
pub const TAB_SIZES: [u8; 3] = [2, 4, 8];
pub const ZOOM_RANGE: (f32, f32) = (0.5, 2.0);
pub const ZOOM_STEP: f32 = 0.1;

pub const EDITOR_FONT_FAMILIES: [&str; 3] = [
    "Fira Code, monospace",
    "monospace",
    "'Courier New', monospace",
];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Preferences {
    pub editor: EditorPreferences,
    pub terminal: TerminalPreferences,
    pub ui: UiPreferences,
    pub search: SearchPreferences,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EditorPreferences {
    pub font_size: u16,
    pub font_family: String,
    pub tab_size: u8,
    pub insert_spaces: bool,
    pub auto_save: bool,
    pub format_on_save: bool,
    pub line_numbers: bool,
    pub word_wrap: bool,
    pub minimap: bool,
    /// Ask before closing the active tab while it has unsaved edits.
    pub confirm_close_modified: bool,
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            font_size: 14,
            font_family: EDITOR_FONT_FAMILIES[0].to_string(),
            tab_size: 4,
            insert_spaces: true,
            auto_save: false,
            format_on_save: false,
            line_numbers: true,
            word_wrap: true,
            minimap: true,
            confirm_close_modified: false,
        }
    }
}

impl EditorPreferences {
    /// Text inserted for a single tab keypress.
    pub fn indent_unit(&self) -> String {
        if self.insert_spaces {
            " ".repeat(usize::from(self.tab_size.max(1)))
        } else {
            "\t".to_string()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TerminalPreferences {
    pub font_size: u16,
    pub font_family: String,
    /// Program used to run commands instead of the platform shell.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
}

impl Default for TerminalPreferences {
    fn default() -> Self {
        Self {
            font_size: 14,
            font_family: "monospace".to_string(),
            shell: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UiTheme {
    #[default]
    Dark,
    Light,
}

impl UiTheme {
    pub fn label(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct UiPreferences {
    pub theme: UiTheme,
    pub zoom_factor: f32,
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            theme: UiTheme::Dark,
            zoom_factor: 1.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SearchPreferences {
    pub case_sensitive: bool,
    pub max_results: usize,
    pub include_hidden: bool,
}

impl Default for SearchPreferences {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            max_results: 1000,
            include_hidden: false,
        }
    }
}

/// One editable row of the preferences form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceField {
    EditorFontFamily,
    EditorFontSize,
    EditorTabSize,
    EditorInsertSpaces,
    EditorAutoSave,
    EditorFormatOnSave,
    EditorLineNumbers,
    EditorWordWrap,
    EditorMinimap,
    EditorConfirmCloseModified,
    TerminalFontSize,
    UiTheme,
    UiZoomFactor,
    SearchCaseSensitive,
    SearchIncludeHidden,
}

pub const PREFERENCE_FIELDS: [PreferenceField; 15] = [
    PreferenceField::EditorFontFamily,
    PreferenceField::EditorFontSize,
    PreferenceField::EditorTabSize,
    PreferenceField::EditorInsertSpaces,
    PreferenceField::EditorAutoSave,
    PreferenceField::EditorFormatOnSave,
    PreferenceField::EditorLineNumbers,
    PreferenceField::EditorWordWrap,
    PreferenceField::EditorMinimap,
    PreferenceField::EditorConfirmCloseModified,
    PreferenceField::TerminalFontSize,
    PreferenceField::UiTheme,
    PreferenceField::UiZoomFactor,
    PreferenceField::SearchCaseSensitive,
    PreferenceField::SearchIncludeHidden,
];

impl PreferenceField {
    pub fn section(self) -> &'static str {
        match self {
            Self::EditorFontFamily
            | Self::EditorFontSize
            | Self::EditorTabSize
            | Self::EditorInsertSpaces
            | Self::EditorAutoSave
            | Self::EditorFormatOnSave
            | Self::EditorLineNumbers
            | Self::EditorWordWrap
            | Self::EditorMinimap
            | Self::EditorConfirmCloseModified => "Editor",
            Self::TerminalFontSize => "Terminal",
            Self::UiTheme | Self::UiZoomFactor => "Appearance",
            Self::SearchCaseSensitive | Self::SearchIncludeHidden => "Search",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::EditorFontFamily => "Font Family",
            Self::EditorFontSize => "Font Size",
            Self::EditorTabSize => "Tab Size",
            Self::EditorInsertSpaces => "Insert Spaces",
            Self::EditorAutoSave => "Auto Save",
            Self::EditorFormatOnSave => "Format on Save",
            Self::EditorLineNumbers => "Line Numbers",
            Self::EditorWordWrap => "Word Wrap",
            Self::EditorMinimap => "Minimap",
            Self::EditorConfirmCloseModified => "Confirm Closing Modified Files",
            Self::TerminalFontSize => "Terminal Font Size",
            Self::UiTheme => "Theme",
            Self::UiZoomFactor => "Zoom",
            Self::SearchCaseSensitive => "Case Sensitive Search",
            Self::SearchIncludeHidden => "Include Hidden Files",
        }
    }

    pub fn display_value(self, prefs: &Preferences) -> String {
        fn flag(on: bool) -> String {
            if on { "on" } else { "off" }.to_string()
        }
        match self {
            Self::EditorFontFamily => prefs.editor.font_family.clone(),
            Self::EditorFontSize => format!("{}px", prefs.editor.font_size),
            Self::EditorTabSize => prefs.editor.tab_size.to_string(),
            Self::EditorInsertSpaces => flag(prefs.editor.insert_spaces),
            Self::EditorAutoSave => flag(prefs.editor.auto_save),
            Self::EditorFormatOnSave => flag(prefs.editor.format_on_save),
            Self::EditorLineNumbers => flag(prefs.editor.line_numbers),
            Self::EditorWordWrap => flag(prefs.editor.word_wrap),
            Self::EditorMinimap => flag(prefs.editor.minimap),
            Self::EditorConfirmCloseModified => flag(prefs.editor.confirm_close_modified),
            Self::TerminalFontSize => format!("{}px", prefs.terminal.font_size),
            Self::UiTheme => prefs.ui.theme.label().to_string(),
            Self::UiZoomFactor => format!("{:.1}x", prefs.ui.zoom_factor),
            Self::SearchCaseSensitive => flag(prefs.search.case_sensitive),
            Self::SearchIncludeHidden => flag(prefs.search.include_hidden),
        }
    }

    /// Steps the field by `delta`. Booleans flip regardless of sign, choice
    /// fields cycle, numeric fields clamp to their range.
    pub fn adjust(self, prefs: &mut Preferences, delta: i8) {
        match self {
            Self::EditorFontFamily => {
                let current = EDITOR_FONT_FAMILIES
                    .iter()
                    .position(|family| *family == prefs.editor.font_family)
                    .unwrap_or(0);
                let next = cycle_index(current, EDITOR_FONT_FAMILIES.len(), delta);
                prefs.editor.font_family = EDITOR_FONT_FAMILIES[next].to_string();
            }
            Self::EditorFontSize => {
                prefs.editor.font_size = step_font_size(prefs.editor.font_size, delta);
            }
            Self::EditorTabSize => {
                let current = TAB_SIZES
                    .iter()
                    .position(|size| *size == prefs.editor.tab_size)
                    .unwrap_or(1);
                prefs.editor.tab_size = TAB_SIZES[cycle_index(current, TAB_SIZES.len(), delta)];
            }
            Self::EditorInsertSpaces => prefs.editor.insert_spaces = !prefs.editor.insert_spaces,
            Self::EditorAutoSave => prefs.editor.auto_save = !prefs.editor.auto_save,
            Self::EditorFormatOnSave => prefs.editor.format_on_save = !prefs.editor.format_on_save,
            Self::EditorLineNumbers => prefs.editor.line_numbers = !prefs.editor.line_numbers,
            Self::EditorWordWrap => prefs.editor.word_wrap = !prefs.editor.word_wrap,
            Self::EditorMinimap => prefs.editor.minimap = !prefs.editor.minimap,
            Self::EditorConfirmCloseModified => {
                prefs.editor.confirm_close_modified = !prefs.editor.confirm_close_modified
            }
            Self::TerminalFontSize => {
                prefs.terminal.font_size = step_font_size(prefs.terminal.font_size, delta);
            }
            Self::UiTheme => prefs.ui.theme = prefs.ui.theme.toggled(),
            Self::UiZoomFactor => {
                let next = prefs.ui.zoom_factor + f32::from(delta.signum()) * ZOOM_STEP;
                prefs.ui.zoom_factor = (next.clamp(ZOOM_RANGE.0, ZOOM_RANGE.1) * 10.0).round() / 10.0;
            }
            Self::SearchCaseSensitive => prefs.search.case_sensitive = !prefs.search.case_sensitive,
            Self::SearchIncludeHidden => prefs.search.include_hidden = !prefs.search.include_hidden,
        }
    }
}

fn cycle_index(current: usize, len: usize, delta: i8) -> usize {
    if delta < 0 {
        (current + len - 1) % len
    } else {
        (current + 1) % len
    }
}

fn step_font_size(current: u16, delta: i8) -> u16 {
    let next = if delta < 0 {
        current.saturating_sub(1)
    } else {
        current.saturating_add(1)
    };
    next.clamp(FONT_SIZE_RANGE.0, FONT_SIZE_RANGE.1)
}
