use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::config::Preferences;

pub const PREFERENCES_FILE: &str = "preferences.toml";
pub const SESSION_FILE: &str = "session.json";

/// What survives between runs besides preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSnapshot {
    pub last_opened_folder: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    pub fn open(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(PREFERENCES_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file yields defaults; missing keys fall back individually.
    pub fn load(&self) -> std::io::Result<Preferences> {
        if !self.path.exists() {
            return Ok(Preferences::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        toml::from_str::<Preferences>(&raw)
            .map_err(|err| std::io::Error::other(format!("parse preferences: {err}")))
    }

    pub fn save(&self, preferences: &Preferences) -> std::io::Result<()> {
        let encoded = toml::to_string_pretty(preferences)
            .map_err(|err| std::io::Error::other(format!("serialize preferences: {err}")))?;
        write_atomic(&self.path, encoded.as_bytes())
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn open(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(SESSION_FILE),
        })
    }

    pub fn load(&self) -> std::io::Result<SessionSnapshot> {
        if !self.path.exists() {
            return Ok(SessionSnapshot::default());
        }
        let bytes = std::fs::read(&self.path)?;
        serde_json::from_slice::<SessionSnapshot>(&bytes)
            .map_err(|err| std::io::Error::other(format!("parse session: {err}")))
    }

    pub fn save(&self, snapshot: &SessionSnapshot) -> std::io::Result<()> {
        let encoded = serde_json::to_vec_pretty(snapshot)
            .map_err(|err| std::io::Error::other(format!("serialize session: {err}")))?;
        write_atomic(&self.path, &encoded)
    }
}

/// Writes a sibling temp file and renames it over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}
