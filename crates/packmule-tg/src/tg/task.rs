use crate::prelude::*;
use crate::processing::pipeline::Pipeline;
use crate::settings::{parse_task_args, TaskArgs, TaskSettings};
use crate::transfer::{self, Credentials, CredentialsError, Destination};
use crate::{tg, Error, ErrorKind, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use teloxide::payloads::SendMessageSetters as _;
use teloxide::prelude::*;
use teloxide::types::{ChatId, UserId};
use teloxide::utils::html;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub(crate) enum TaskCommandError {
    #[error("This command only works for messages with a sender")]
    NoSender,

    #[error("Send me a link to process: /mirror <link> [flags]")]
    MissingPayload,

    #[error("This doesn't look like a link I can download: {input}")]
    UnsupportedPayload { input: String },

    #[error("Usage: /set <KEY> <value>")]
    MalformedSet,

    #[error("Task ids are numeric, got: {input}")]
    MalformedTaskId { input: String },

    #[error("There is no running task with id {task_id}")]
    UnknownTask { task_id: String },
}

/// Live tasks and their cancellation tokens. `/cancel` trips the token;
/// the pipeline polls it between files and kills in-flight tool runs.
#[derive(Default)]
pub(crate) struct TaskRegistry {
    next_id: AtomicU64,
    active: Mutex<HashMap<u64, CancellationToken>>,
}

impl TaskRegistry {
    fn register(&self) -> (u64, CancellationToken) {
        let task_id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();
        self.active.lock().insert(task_id, token.clone());
        (task_id, token)
    }

    fn remove(&self, task_id: u64) {
        self.active.lock().remove(&task_id);
    }

    pub(crate) fn cancel(&self, task_id: u64) -> bool {
        match self.active.lock().get(&task_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub(crate) fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}

/// What a `/mirror`/`/leech` payload turned out to be.
enum PayloadSource {
    Http(url::Url),
    Rclone(String),
}

fn classify_payload(payload: &str) -> Result<PayloadSource, TaskCommandError> {
    if let Some(remote) = payload.strip_prefix("rc:") {
        if !remote.is_empty() {
            return Ok(PayloadSource::Rclone(remote.to_owned()));
        }
    }

    if payload.starts_with("http://") || payload.starts_with("https://") {
        if let Ok(url) = payload.parse() {
            return Ok(PayloadSource::Http(url));
        }
    }

    Err(TaskCommandError::UnsupportedPayload {
        input: payload.to_owned(),
    })
}

struct TaskReport {
    files: usize,
    total_size: u64,
}

/// Validates the command inline (so usage errors reply immediately), then
/// detaches the heavy lifting into its own tokio task. The dispatcher
/// handles one update per chat at a time, and `/cancel` must get through
/// while a task runs.
pub(crate) async fn start(ctx: &tg::Ctx, msg: &Message, raw: String, leech: bool) -> Result {
    let user = msg.from().ok_or(TaskCommandError::NoSender)?.clone();

    let parsed = parse_task_args(&raw);
    let payload = parsed
        .payload
        .clone()
        .ok_or(TaskCommandError::MissingPayload)?;
    let source = classify_payload(&payload)?;

    let (task_id, cancel) = ctx.tasks.register();

    ctx.bot
        .send_message(
            msg.chat.id,
            format!("Task <code>{task_id}</code> started. Cancel it with /cancel {task_id}"),
        )
        .reply_to_message_id(msg.id)
        .await?;

    let ctx = ctx.clone();
    let chat_id = msg.chat.id;
    let span = info_span!("task", task_id, user = %user.debug_id(), leech);

    tokio::spawn(
        async move {
            metrics::increment_counter!(
                "packmule_tasks_total",
                "kind" => if leech { "leech" } else { "mirror" }
            );

            let result = run(&ctx, user.id, &parsed, source, leech, task_id, chat_id, &cancel).await;

            ctx.tasks.remove(task_id);
            report(&ctx, chat_id, task_id, result).await;
        }
        .instrument(span),
    );

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run(
    ctx: &tg::Ctx,
    user_id: UserId,
    parsed: &TaskArgs,
    source: PayloadSource,
    leech: bool,
    task_id: u64,
    chat_id: ChatId,
    cancel: &CancellationToken,
) -> Result<TaskReport> {
    // RESOLVING_SETTINGS: one snapshot, one resolution, immutable afterwards
    let user_settings = ctx.db.user_settings.snapshot(user_id).await?;
    let settings = TaskSettings::resolve(&parsed.args, &user_settings, &ctx.proc.owner_settings);

    let destination = if leech {
        Destination::Telegram
    } else {
        transfer::resolve_destination(settings.upload.value.as_deref()).map_err(Error::from)?
    };

    let creds = Credentials {
        cfg: &ctx.transfer,
        user_id,
        user_tokens: settings.user_tokens.value,
    };
    creds.ensure_for(&destination).await?;

    let task_dir = ctx.proc.work_dir.join(task_id.to_string());
    fs_err::tokio::create_dir_all(&task_dir).await?;

    let outcome = process(ctx, &settings, &destination, &creds, source, &task_dir, leech, chat_id, cancel).await;

    // CLEANUP runs regardless of the outcome
    if let Err(err) = fs_err::tokio::remove_dir_all(&task_dir).await {
        warn!(err = tracing_err(&err), "Failed to clean up the task dir");
    }

    outcome
}

#[allow(clippy::too_many_arguments)]
async fn process(
    ctx: &tg::Ctx,
    settings: &TaskSettings,
    destination: &Destination,
    creds: &Credentials<'_>,
    source: PayloadSource,
    task_dir: &Path,
    leech: bool,
    chat_id: ChatId,
    cancel: &CancellationToken,
) -> Result<TaskReport> {
    let mut files = match source {
        PayloadSource::Http(url) => {
            vec![transfer::download_http(&ctx.http, url, task_dir).await?]
        }
        PayloadSource::Rclone(remote) => {
            let config = creds.rclone_config_path();
            if fs_err::tokio::metadata(&config).await.is_err() {
                return Err(CredentialsError::TokenNotFound { path: config }.into());
            }
            transfer::copy_from_remote(&config, &remote, task_dir).await?;
            list_files(task_dir).await?
        }
    };

    if cancel.is_cancelled() {
        return Err(ErrorKind::Cancelled.into());
    }

    // `-n` renames a single download before processing
    if let (Some(name), [only]) = (&settings.name_substitute, files.as_slice()) {
        let renamed = only.with_file_name(name);
        fs_err::tokio::rename(only, &renamed).await?;
        files = vec![renamed];
    }

    let pipeline = Pipeline {
        proc: &ctx.proc,
        settings,
        cancel,
        cpu_lock: &ctx.cpu_lock,
        leech,
    };
    let files = pipeline.run(files).await?;

    let mut total_size = 0;
    for file in &files {
        total_size += fs_err::tokio::metadata(file).await?.len();
    }

    match destination {
        Destination::Telegram => {
            transfer::send_files(&ctx.bot, chat_id, &files).await?;
        }
        Destination::GDrive { folder } => {
            let config = creds.rclone_config_path();
            for file in &files {
                transfer::copy_to_remote(&config, file, &format!("gdrive:{folder}")).await?;
            }
        }
        Destination::Rclone { remote } => {
            let config = creds.rclone_config_path();
            for file in &files {
                transfer::copy_to_remote(&config, file, remote).await?;
            }
        }
        Destination::Mega { path } => {
            let config = creds.rclone_config_path();
            for file in &files {
                transfer::copy_to_remote(&config, file, &format!("mega:{path}")).await?;
            }
        }
        Destination::Ddl => {
            let endpoint = ctx
                .transfer
                .ddl_endpoint
                .as_ref()
                .fatal_ctx(|| "BUG: ddl endpoint vanished after the credentials check")?;
            for file in &files {
                transfer::upload_http(&ctx.http, endpoint, file).await?;
            }
        }
    }

    Ok(TaskReport {
        files: files.len(),
        total_size,
    })
}

async fn report(ctx: &tg::Ctx, chat_id: ChatId, task_id: u64, result: Result<TaskReport>) {
    let reply = match &result {
        Ok(report) => {
            info!(files = report.files, total_size = report.total_size, "Task finished");
            format!(
                "Task <code>{task_id}</code> is done: {} file(s), {}",
                report.files,
                humansize::format_size(report.total_size, humansize::BINARY),
            )
        }
        Err(err) if matches!(err.kind(), ErrorKind::Cancelled) => {
            info!("Task was cancelled");
            format!("Task <code>{task_id}</code> was cancelled")
        }
        Err(err) => {
            if !err.is_user_error() {
                warn!(err = tracing_err(err), id = err.id(), "Task failed");
            }
            format!(
                "Task <code>{task_id}</code> failed:\n<pre>{}</pre>",
                html::escape(&err.display_chain().to_string()),
            )
        }
    };

    if let Err(err) = ctx.bot.send_message(chat_id, reply).await {
        warn!(err = tracing_err(&err), "Failed to report the task outcome");
    }
}

async fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut stack = vec![dir.to_path_buf()];
    let mut files = Vec::new();

    while let Some(dir) = stack.pop() {
        let mut entries = fs_err::tokio::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                stack.push(path);
            } else {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
