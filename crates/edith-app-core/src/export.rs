//! Export of selected chats to a JSON file.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use edith_types::{ChatId, ChatSession};
use tracing::info;

use crate::error::CoreError;

/// `edith_chats_<YYYY-MM-DD>.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("edith_chats_{}.json", date.format("%Y-%m-%d"))
}

/// Chats of `chats` whose id is in `selected`, in list order.
pub fn select_chats(chats: &[ChatSession], selected: &[ChatId]) -> Result<Vec<ChatSession>, CoreError> {
    if chats.is_empty() {
        return Err(CoreError::Validation("No chats found.".into()));
    }
    if selected.is_empty() {
        return Err(CoreError::Validation("Select at least one chat.".into()));
    }
    let picked: Vec<_> = chats
        .iter()
        .filter(|c| selected.contains(&c.id))
        .cloned()
        .collect();
    if picked.is_empty() {
        return Err(CoreError::Validation("Select at least one chat.".into()));
    }
    Ok(picked)
}

/// Write the selected chats as pretty JSON into `dir`; returns the file path.
pub async fn export_chats(
    chats: &[ChatSession],
    selected: &[ChatId],
    dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf, CoreError> {
    let picked = select_chats(chats, selected)?;
    let path = dir.join(export_file_name(date));
    let json = serde_json::to_vec_pretty(&picked)?;
    tokio::fs::write(&path, json).await?;
    info!(path = %path.display(), count = picked.len(), "exported chats");
    Ok(path)
}
