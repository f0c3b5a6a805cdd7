// SkillForge platform paths
// Settings live in the per-user config directory; the saved session lives in the data directory.
//
// - Linux:   $XDG_CONFIG_HOME/skillforge, $XDG_DATA_HOME/skillforge (~/.config, ~/.local/share)
// - macOS:   ~/Library/Application Support/SkillForge (both)
// - Windows: %APPDATA%/SkillForge (both)

use std::env;
use std::path::PathBuf;

#[cfg(not(target_os = "windows"))]
fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

#[cfg(target_os = "linux")]
fn xdg_dir(var: &str, fallback: &[&str]) -> PathBuf {
    match env::var(var) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir).join("skillforge"),
        _ => fallback
            .iter()
            .fold(home_dir(), |path, part| path.join(part))
            .join("skillforge"),
    }
}

#[cfg(target_os = "windows")]
fn appdata_dir() -> PathBuf {
    let appdata = env::var("APPDATA")
        .unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("SkillForge")
}

/// Directory holding `settings.json`.
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        xdg_dir("XDG_CONFIG_HOME", &[".config"])
    }
    #[cfg(target_os = "macos")]
    {
        home_dir()
            .join("Library")
            .join("Application Support")
            .join("SkillForge")
    }
    #[cfg(target_os = "windows")]
    {
        appdata_dir()
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        home_dir().join(".skillforge")
    }
}

/// Directory holding the saved session.
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        xdg_dir("XDG_DATA_HOME", &[".local", "share"])
    }
    #[cfg(not(target_os = "linux"))]
    {
        get_config_dir()
    }
}

/// Default location of the saved session file.
pub fn default_session_file() -> PathBuf {
    get_data_dir().join("session.json")
}
