//! `WriteMO2Profile` step body: `workspace/profiles/<name>/modlist.txt`.

use std::path::{Component, Path, PathBuf};

use anyhow::{Result, bail};
use tracing::debug;

use crate::io::storage::write_text;
use crate::io::workspace::WorkspacePaths;

/// Path of the modlist for `profile_name` under `root`.
pub fn modlist_path(root: &Path, profile_name: &str) -> PathBuf {
    WorkspacePaths::new(root)
        .profiles_dir
        .join(profile_name)
        .join("modlist.txt")
}

/// Write the modlist for `profile_name`, replacing any previous one.
///
/// The name must be a single path segment so the profile stays inside
/// `workspace/profiles/`.
pub fn write_modlist(root: &Path, profile_name: &str) -> Result<PathBuf> {
    let mut components = Path::new(profile_name).components();
    let single_segment = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_segment {
        bail!("invalid profile name '{}'", profile_name);
    }

    let path = modlist_path(root, profile_name);
    write_text(&path, &render_modlist(profile_name))?;
    debug!(path = %path.display(), profile = profile_name, "modlist written");
    Ok(path)
}

fn render_modlist(profile_name: &str) -> String {
    format!("# Managed by modbs for profile {}\n", profile_name)
}
