use crate::prelude::*;
use crate::settings::SettingMap;
use crate::tg::{self, task, TaskCommandError};
use crate::Result;
use async_trait::async_trait;
use itertools::Itertools;
use teloxide::payloads::SendMessageSetters as _;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use teloxide::utils::html;

#[derive(BotCommands, Clone, Debug)]
#[command(
    rename_rule = "snake_case",
    description = "The following commands are available:"
)]
pub(crate) enum Cmd {
    #[command(description = "display this text")]
    Help,

    #[command(description = "mirror a link to cloud storage: <link> [flags]")]
    Mirror(String),

    #[command(description = "download a link and upload it to this chat: <link> [flags]")]
    Leech(String),

    #[command(description = "show your saved settings")]
    Settings,

    #[command(description = "save a setting: <KEY> <value>")]
    Set(String),

    #[command(description = "remove a setting: <KEY>")]
    Unset(String),

    #[command(description = "cancel a running task: <task id>")]
    Cancel(String),
}

#[async_trait]
impl tg::cmd::Command for Cmd {
    async fn handle(self, ctx: &tg::Ctx, msg: &Message) -> Result {
        match self {
            Cmd::Help => {
                ctx.bot
                    .send_message(msg.chat.id, Cmd::descriptions().to_string())
                    .await?;
            }
            Cmd::Mirror(args) => task::start(ctx, msg, args, false).await?,
            Cmd::Leech(args) => task::start(ctx, msg, args, true).await?,
            Cmd::Settings => show_settings(ctx, msg).await?,
            Cmd::Set(args) => set_setting(ctx, msg, &args).await?,
            Cmd::Unset(key) => unset_setting(ctx, msg, &key).await?,
            Cmd::Cancel(task_id) => cancel_task(ctx, msg, &task_id).await?,
        }
        Ok(())
    }
}

async fn show_settings(ctx: &tg::Ctx, msg: &Message) -> Result {
    let user = msg.from().ok_or(TaskCommandError::NoSender)?;
    let settings = ctx.db.user_settings.snapshot(user.id).await?;

    let reply = render_settings(&settings);

    ctx.bot
        .send_message(msg.chat.id, reply)
        .reply_to_message_id(msg.id)
        .await?;

    Ok(())
}

fn render_settings(settings: &SettingMap) -> String {
    if settings.is_empty() {
        return "You have no saved settings. Use /set to add one.".to_owned();
    }

    let listing = settings
        .iter()
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(key, value)| format!("{key} = {value}"))
        .join("\n");

    format!("<pre>{}</pre>", html::escape(&listing))
}

async fn set_setting(ctx: &tg::Ctx, msg: &Message, args: &str) -> Result {
    let user = msg.from().ok_or(TaskCommandError::NoSender)?;

    let (key, raw_value) = args
        .trim()
        .split_once(char::is_whitespace)
        .ok_or(TaskCommandError::MalformedSet)?;

    // Accept JSON (`true`, `3`, `"text"`) and treat anything that doesn't
    // parse as a plain string
    let value = serde_json::from_str(raw_value.trim())
        .unwrap_or_else(|_| serde_json::Value::String(raw_value.trim().to_owned()));

    ctx.db.user_settings.set(user.id, key, value).await?;

    ctx.bot
        .send_message(msg.chat.id, format!("Saved <code>{}</code>", html::escape(key)))
        .reply_to_message_id(msg.id)
        .await?;

    Ok(())
}

async fn unset_setting(ctx: &tg::Ctx, msg: &Message, key: &str) -> Result {
    let user = msg.from().ok_or(TaskCommandError::NoSender)?;
    let key = key.trim();

    if key.is_empty() {
        return Err(TaskCommandError::MalformedSet.into());
    }

    ctx.db.user_settings.unset(user.id, key).await?;

    ctx.bot
        .send_message(
            msg.chat.id,
            format!("Removed <code>{}</code>", html::escape(key)),
        )
        .reply_to_message_id(msg.id)
        .await?;

    Ok(())
}

async fn cancel_task(ctx: &tg::Ctx, msg: &Message, task_id: &str) -> Result {
    let task_id = task_id.trim();
    let parsed: u64 = task_id.parse().map_err(|_| TaskCommandError::MalformedTaskId {
        input: task_id.to_owned(),
    })?;

    if !ctx.tasks.cancel(parsed) {
        return Err(TaskCommandError::UnknownTask {
            task_id: task_id.to_owned(),
        }
        .into());
    }

    ctx.bot
        .send_message(
            msg.chat.id,
            format!("Requested cancellation of task <code>{parsed}</code>"),
        )
        .reply_to_message_id(msg.id)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;
    use serde_json::json;

    #[test]
    fn settings_render_sorted() {
        let settings: SettingMap = [
            ("MERGE_ENABLED".to_owned(), json!(true)),
            ("COMPRESSION_VIDEO_CRF".to_owned(), json!(23)),
        ]
        .into_iter()
        .collect();

        expect![[r#"
            <pre>COMPRESSION_VIDEO_CRF = 23
            MERGE_ENABLED = true</pre>"#]]
        .assert_eq(&render_settings(&settings));
    }
}
