use crate::prelude::*;
use crate::{tg, Result};
use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::InputFile;

/// Uploads the processed files back into the chat, one document per file,
/// in deterministic order. Split parts arrive numbered, so sorting by
/// path keeps them in sequence.
pub(crate) async fn send_files(bot: &tg::Bot, chat_id: ChatId, files: &[impl AsRef<Path>]) -> Result {
    let mut files: Vec<&Path> = files.iter().map(AsRef::as_ref).collect();
    files.sort();

    for file in files {
        info!(file = %file.display(), "Uploading to Telegram");

        bot.send_document(chat_id, InputFile::file(file.to_path_buf()))
            .await?;
    }

    Ok(())
}
