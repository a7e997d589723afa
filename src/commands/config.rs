//! Opens the config file in the user's editor.

use crate::config::config_path;
use std::process::Command;

/// Editors tried when `$EDITOR` is unset, in order.
const FALLBACK_EDITORS: &[&str] = &["nano", "vi"];

/// Opens `~/.config/quickrec/quickrec.toml` in `$EDITOR`, nano or vi.
///
/// # Errors
/// - If no editor can be found or it exits with an error
pub fn handle_config() -> anyhow::Result<()> {
    let path = config_path()?;
    tracing::info!("Opening config file: {}", path.display());

    let editor = find_editor(std::env::var("EDITOR").ok(), is_editor_available)?;
    tracing::debug!("Using editor: {}", editor);

    let status = Command::new(&editor).arg(&path).status().map_err(|e| {
        anyhow::anyhow!(
            "Failed to open editor '{editor}': {e}. Make sure the editor is installed and accessible."
        )
    })?;
    if !status.success() {
        return Err(anyhow::anyhow!(
            "Editor exited with error code: {}",
            status.code().unwrap_or(-1)
        ));
    }

    tracing::info!("Config file edited");
    Ok(())
}

fn find_editor(from_env: Option<String>, available: impl Fn(&str) -> bool) -> anyhow::Result<String> {
    if let Some(editor) = from_env.filter(|editor| !editor.trim().is_empty()) {
        return Ok(editor);
    }
    FALLBACK_EDITORS
        .iter()
        .find(|editor| available(editor))
        .map(|editor| editor.to_string())
        .ok_or_else(|| anyhow::anyhow!("No editor found. Please set the $EDITOR environment variable."))
}

fn is_editor_available(editor: &str) -> bool {
    Command::new("which")
        .arg(editor)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_editor_wins() {
        let editor = find_editor(Some("hx".to_string()), |_| true).unwrap();
        assert_eq!(editor, "hx");
    }

    #[test]
    fn test_blank_env_falls_back() {
        let editor = find_editor(Some("  ".to_string()), |name| name == "vi").unwrap();
        assert_eq!(editor, "vi");
    }

    #[test]
    fn test_no_editor_is_an_error() {
        assert!(find_editor(None, |_| false).is_err());
    }
}
