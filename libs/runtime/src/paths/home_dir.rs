use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

/// Resolve the server home directory.
///
/// - `Some(path)`: `~` is expanded, relative paths are made absolute against
///   the current directory.
/// - `None`: the platform default, `%APPDATA%/<subdir>` on Windows and
///   `$HOME/<subdir>` elsewhere.
///
/// With `create` set the directory is created if missing.
pub fn resolve_home_dir(configured: Option<String>, subdir: &str, create: bool) -> Result<PathBuf> {
    let path = match configured {
        Some(raw) => expand_user(raw.trim())?,
        None => platform_base()?.join(subdir),
    };

    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .context("current directory is not accessible")?
            .join(path)
    };

    if create {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("failed to create home dir {}", path.display()))?;
    }
    Ok(path)
}

fn expand_user(raw: &str) -> Result<PathBuf> {
    if raw == "~" {
        return user_home();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(user_home()?.join(rest));
    }
    Ok(Path::new(raw).to_path_buf())
}

fn user_home() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("user home directory is not known"))
}

/// `%APPDATA%` on Windows, the user home elsewhere.
fn platform_base() -> Result<PathBuf> {
    if cfg!(windows) {
        dirs::config_dir().ok_or_else(|| anyhow!("config directory is not known"))
    } else {
        user_home()
    }
}
