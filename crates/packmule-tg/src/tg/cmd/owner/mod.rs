use crate::prelude::*;
use crate::tg;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::macros::BotCommands;
use teloxide::prelude::*;

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "snake_case")]
pub(crate) enum Cmd {
    #[command(description = "show the bot status")]
    Stats,
}

pub(crate) fn filter(msg: Message, ctx: Arc<tg::Ctx>) -> bool {
    msg.from()
        .is_some_and(|user| user.id == ctx.cfg.owner)
}

#[async_trait]
impl tg::cmd::Command for Cmd {
    async fn handle(self, ctx: &tg::Ctx, msg: &Message) -> Result {
        match self {
            Cmd::Stats => {
                let reply = format!(
                    "Version: <code>{}</code> ({})\nActive tasks: <code>{}</code>",
                    env!("CARGO_PKG_VERSION"),
                    env!("VERGEN_GIT_SHA"),
                    ctx.tasks.active_count(),
                );

                ctx.bot.send_message(msg.chat.id, reply).await?;
            }
        }
        Ok(())
    }
}
