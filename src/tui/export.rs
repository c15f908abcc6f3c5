use anyhow::Result;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

use super::state::UiState;

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Save the log as JSON and report the path in the status line.
pub fn save_and_show_path(state: &mut UiState) {
    if state.log.is_empty() {
        state.info = "Log is empty; nothing to save yet.".into();
        return;
    }
    match crate::storage::save_log_json(&state.log) {
        Ok(path) => {
            state.info = format!("Saved: {}", path.display());
        }
        Err(e) => {
            state.info = format!("Save failed: {e:#}");
        }
    }
}

/// Copy the whole log as plain text.
pub fn copy_log(state: &mut UiState) {
    if state.log.is_empty() {
        state.info = "Log is empty; nothing to copy.".into();
        return;
    }
    let text = crate::storage::format_log_text(&state.log);
    match copy_to_clipboard(&text) {
        Ok(_) => state.info = format!("✓ Copied {} log entries to clipboard", state.log.len()),
        Err(e) => state.info = format!("Clipboard copy failed: {e:#}"),
    }
}

/// Start the clipboard thread on first use. Each clipboard instance is kept alive for a
/// while so clipboard managers on Linux can read it.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Queue text for the clipboard thread; returns without waiting.
fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}
