//! Telegram bot surface: command dispatch and task orchestration.

pub(crate) mod cmd;
mod config;
pub(crate) mod task;

use crate::config::ProcConfig;
use crate::prelude::*;
use crate::{db, http, transfer, Result};
use dptree::di::DependencyMap;
use std::sync::Arc;
use teloxide::adaptors::{CacheMe, DefaultParseMode, Throttle, Trace};
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;

pub(crate) use config::*;
pub(crate) use task::{TaskCommandError, TaskRegistry};

pub(crate) type Bot = Trace<CacheMe<DefaultParseMode<Throttle<teloxide::Bot>>>>;

#[derive(Clone)]
pub(crate) struct Ctx {
    pub(crate) bot: Bot,
    pub(crate) cfg: Arc<Config>,
    pub(crate) db: Arc<db::Repo>,
    pub(crate) proc: Arc<ProcConfig>,
    pub(crate) transfer: Arc<transfer::Config>,
    pub(crate) http: http::Client,
    pub(crate) tasks: Arc<TaskRegistry>,

    /// The process-wide guard serializing CPU-bound tool invocations
    /// across all concurrent tasks.
    pub(crate) cpu_lock: Arc<tokio::sync::Mutex<()>>,
}

pub(crate) struct RunBotOptions {
    pub(crate) tg_cfg: Config,
    pub(crate) db: db::Repo,
    pub(crate) proc_cfg: ProcConfig,
    pub(crate) transfer_cfg: transfer::Config,
}

pub(crate) async fn run_bot(opts: RunBotOptions) -> Result {
    let mut di = DependencyMap::new();

    let bot: Bot = teloxide::Bot::new(opts.tg_cfg.token.clone())
        .throttle(Default::default())
        .parse_mode(ParseMode::Html)
        .cache_me()
        .trace(teloxide::adaptors::trace::Settings::all());

    di.insert(Arc::new(Ctx {
        bot: bot.clone(),
        cfg: Arc::new(opts.tg_cfg),
        db: Arc::new(opts.db),
        proc: Arc::new(opts.proc_cfg),
        transfer: Arc::new(opts.transfer_cfg),
        http: http::create_client(),
        tasks: Arc::default(),
        cpu_lock: Arc::default(),
    }));

    info!("Starting bot...");

    bot.set_my_commands(cmd::regular::Cmd::bot_commands())
        .await?;

    let handler = dptree::entry()
        .inspect(|update: Update| {
            trace!(target: "tg_update", "{update:#?}");
            metrics::increment_counter!("packmule_tg_updates_total");
        })
        .branch(
            Update::filter_message()
                .filter_command::<cmd::regular::Cmd>()
                .endpoint(cmd::handle::<cmd::regular::Cmd>()),
        )
        .branch(
            Update::filter_message()
                .filter_command::<cmd::owner::Cmd>()
                .chain(dptree::filter(cmd::owner::filter))
                .endpoint(cmd::handle::<cmd::owner::Cmd>()),
        )
        .inspect(|_: Update| {
            metrics::increment_counter!("packmule_tg_updates_skipped_total");
        });

    Dispatcher::builder(bot, handler)
        .dependencies(di)
        // We don't handle all possible messages that users send,
        // so to suppress the warning that we don't do this we have
        // a noop default handler here
        .default_handler(|_| std::future::ready(()))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");

    Ok(())
}
