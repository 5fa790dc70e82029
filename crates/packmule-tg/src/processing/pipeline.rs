use super::ffmpeg::{self, ToolCommand};
use super::probe::MediaProbe;
use crate::config::ProcConfig;
use crate::prelude::*;
use crate::settings::{SplitSettings, TaskSettings};
use crate::util::process;
use crate::{ErrorKind, Result};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

const VIDEO_EXTS: &[&str] = &[
    "mkv", "mp4", "mov", "avi", "webm", "ts", "m4v", "wmv", "flv",
];
const AUDIO_EXTS: &[&str] = &["mp3", "m4a", "aac", "flac", "wav", "ogg", "opus", "mka"];

/// Post-processing stages in their canonical order. The effective order is
/// resolved from the per-feature priorities, with this order as the tie
/// break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum Stage {
    Extract,
    Remove,
    Add,
    Trim,
    Merge,
    Watermark,
    Convert,
    Compress,
    Split,
}

/// Terminal state of one stage for one task. A skipped stage passed its
/// input through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum StageOutcome {
    Success,
    Skipped,
    Failed,
}

/// Drives one task's files through the post-processing chain. Each stage
/// consumes the previous stage's output paths; disabled or inapplicable
/// stages pass their input through unchanged.
pub(crate) struct Pipeline<'a> {
    pub(crate) proc: &'a ProcConfig,
    pub(crate) settings: &'a TaskSettings,
    pub(crate) cancel: &'a CancellationToken,

    /// Serializes CPU-bound tool invocations across all concurrent tasks.
    /// FIFO, no timeout: a wedged invocation is handled by the per-run
    /// timeout, not by the lock.
    pub(crate) cpu_lock: &'a tokio::sync::Mutex<()>,

    /// Splitting only applies to Telegram leech uploads.
    pub(crate) leech: bool,
}

impl Pipeline<'_> {
    pub(crate) async fn run(&self, mut files: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
        for stage in self.stage_order() {
            if self.cancel.is_cancelled() {
                return Err(ErrorKind::Cancelled.into());
            }

            let span = info_span!("stage", %stage);

            let (result, duration) = self
                .run_stage(stage, files)
                .instrument(span)
                .with_duration()
                .await;

            let (outcome, next) = result?;
            files = next;

            metrics::increment_counter!(
                "packmule_stage_outcomes_total",
                "stage" => stage.to_string(),
                "outcome" => outcome.to_string()
            );
            metrics::histogram!(
                "packmule_stage_duration_seconds",
                duration.as_secs_f64(),
                "stage" => stage.to_string()
            );

            info!(%stage, %outcome, files = files.len(), "Stage finished");

            if let StageOutcome::Failed = outcome {
                // Failed stages degrade to no-ops; the pipeline carries on
                // with the unmodified inputs.
                warn!(%stage, "Stage failed, continuing with its input files");
            }
        }

        Ok(files)
    }

    fn stage_order(&self) -> Vec<Stage> {
        let s = self.settings;

        let mut stages = vec![
            (Stage::Extract, s.extract.priority.value, 1),
            (Stage::Remove, s.remove.priority.value, 2),
            (Stage::Add, s.add.priority.value, 3),
            (Stage::Trim, s.trim.priority.value, 4),
            (Stage::Merge, s.merge.priority.value, 5),
            (Stage::Watermark, s.watermark.priority.value, 6),
            (Stage::Convert, s.convert.priority.value, 7),
            (Stage::Compress, s.compress.priority.value, 8),
        ];

        if self.leech {
            stages.push((Stage::Split, SplitSettings::DEFAULT_PRIORITY, 9));
        }

        stages.sort_by_key(|(_, priority, canonical)| (*priority, *canonical));
        stages.into_iter().map(|(stage, _, _)| stage).collect()
    }

    async fn run_stage(
        &self,
        stage: Stage,
        files: Vec<PathBuf>,
    ) -> Result<(StageOutcome, Vec<PathBuf>)> {
        let s = self.settings;

        match stage {
            Stage::Extract => {
                if !s.extract.enabled.value {
                    return Ok((StageOutcome::Skipped, files));
                }
                self.run_extract(files).await
            }
            Stage::Remove => {
                if !s.remove.enabled.value {
                    return Ok((StageOutcome::Skipped, files));
                }
                let settings = &s.remove;
                self.apply_transform(files, settings.delete_original.value, |input, probe| {
                    ffmpeg::remove_command(settings, input, probe)
                })
                .await
            }
            Stage::Add => {
                if !s.add.enabled.value {
                    return Ok((StageOutcome::Skipped, files));
                }
                self.run_add(files).await
            }
            Stage::Trim => {
                if !s.trim.enabled.value {
                    return Ok((StageOutcome::Skipped, files));
                }
                let settings = &s.trim;
                self.apply_transform(files, settings.delete_original.value, |input, _| {
                    ffmpeg::trim_command(settings, input)
                })
                .await
            }
            Stage::Merge => {
                if !s.merge.enabled.value {
                    return Ok((StageOutcome::Skipped, files));
                }
                self.run_merge(files).await
            }
            Stage::Watermark => {
                if !s.watermark.enabled.value {
                    return Ok((StageOutcome::Skipped, files));
                }
                let settings = &s.watermark;
                self.apply_transform(files, settings.remove_original.value, |input, probe| {
                    // A watermark needs a video stream to land on
                    probe
                        .has(super::probe::TrackKind::Video)
                        .then(|| ffmpeg::watermark_command(settings, input))
                        .flatten()
                })
                .await
            }
            Stage::Convert => {
                if !s.convert.enabled.value {
                    return Ok((StageOutcome::Skipped, files));
                }
                let settings = &s.convert;
                self.apply_transform(files, settings.delete_original.value, |input, probe| {
                    ffmpeg::convert_command(settings, input, probe)
                })
                .await
            }
            Stage::Compress => {
                if !s.compress.enabled.value {
                    return Ok((StageOutcome::Skipped, files));
                }
                let settings = &s.compress;
                self.apply_transform(files, settings.delete_original.value, |input, probe| {
                    ffmpeg::compress_command(settings, input, probe)
                })
                .await
            }
            Stage::Split => self.run_split(files).await,
        }
    }

    /// Shared shape of the per-file transform stages: probe, build, run.
    /// Files the builder finds inapplicable pass through unchanged.
    async fn apply_transform(
        &self,
        files: Vec<PathBuf>,
        delete_original: bool,
        build: impl Fn(&Path, &MediaProbe) -> Option<ToolCommand>,
    ) -> Result<(StageOutcome, Vec<PathBuf>)> {
        let mut next = Vec::new();
        let mut ran = false;
        let mut succeeded = false;

        for file in files {
            if self.cancel.is_cancelled() {
                return Err(ErrorKind::Cancelled.into());
            }

            let Some(probe) = self.probe_or_skip(&file).await else {
                next.push(file);
                continue;
            };

            let Some(command) = build(&file, &probe) else {
                next.push(file);
                continue;
            };

            ran = true;

            if self.execute(&command).await? {
                succeeded = true;
                if delete_original {
                    remove_file_logged(&file).await;
                } else {
                    next.push(file);
                }
                next.push(command.output);
            } else {
                next.push(file);
            }
        }

        Ok((outcome_of(ran, succeeded), next))
    }

    async fn run_extract(&self, files: Vec<PathBuf>) -> Result<(StageOutcome, Vec<PathBuf>)> {
        let settings = &self.settings.extract;
        let mut next = Vec::new();
        let mut ran = false;
        let mut succeeded = false;

        for file in files {
            if self.cancel.is_cancelled() {
                return Err(ErrorKind::Cancelled.into());
            }

            let Some(probe) = self.probe_or_skip(&file).await else {
                next.push(file);
                continue;
            };

            let commands = ffmpeg::extract_commands(settings, &file, &probe);
            if commands.is_empty() {
                next.push(file);
                continue;
            }

            ran = true;
            let mut outputs = Vec::new();

            for command in commands {
                if self.execute(&command).await? {
                    outputs.push(command.output);
                }
            }

            if outputs.is_empty() {
                // Zero extracted tracks is a warning, not a failure
                warn!(file = %file.display(), "Extraction produced no tracks");
                next.push(file);
                continue;
            }

            succeeded = true;
            if settings.delete_original.value {
                remove_file_logged(&file).await;
            } else {
                next.push(file);
            }
            next.extend(outputs);
        }

        Ok((outcome_of(ran, succeeded), next))
    }

    async fn run_add(&self, files: Vec<PathBuf>) -> Result<(StageOutcome, Vec<PathBuf>)> {
        let settings = &self.settings.add;

        if files.len() < 2 {
            return Ok((StageOutcome::Skipped, files));
        }
        let base = files[0].clone();
        let donors: Vec<PathBuf> = files[1..].to_vec();

        let Some(_) = self.probe_or_skip(&base).await else {
            return Ok((StageOutcome::Skipped, files));
        };

        let mut donor_probes = Vec::new();
        let mut usable_donors = Vec::new();
        for donor in &donors {
            if let Some(probe) = self.probe_or_skip(donor).await {
                donor_probes.push(probe);
                usable_donors.push(donor.clone());
            }
        }

        let Some(command) = ffmpeg::add_command(settings, &base, &usable_donors, &donor_probes)
        else {
            return Ok((StageOutcome::Skipped, files));
        };

        if !self.execute(&command).await? {
            return Ok((StageOutcome::Failed, files));
        }

        let mut next = Vec::new();
        if settings.delete_original.value {
            remove_file_logged(&base).await;
            for donor in &usable_donors {
                remove_file_logged(donor).await;
            }
            for file in &donors {
                if !usable_donors.contains(file) {
                    next.push(file.clone());
                }
            }
        } else {
            next.push(base);
            next.extend(donors);
        }
        next.push(command.output);

        Ok((StageOutcome::Success, next))
    }

    async fn run_merge(&self, files: Vec<PathBuf>) -> Result<(StageOutcome, Vec<PathBuf>)> {
        let settings = &self.settings.merge;

        let mut video_group = Vec::new();
        let mut audio_group = Vec::new();
        let mut passthrough = Vec::new();

        for file in files {
            match container_kind(&file) {
                ContainerKind::Video => video_group.push(file),
                ContainerKind::Audio => audio_group.push(file),
                ContainerKind::Other => passthrough.push(file),
            }
        }

        let mut next = passthrough;
        let mut ran = false;
        let mut succeeded = false;

        for group in [video_group, audio_group] {
            if group.len() < 2 {
                next.extend(group);
                continue;
            }

            if self.cancel.is_cancelled() {
                return Err(ErrorKind::Cancelled.into());
            }

            let mut probes = Vec::new();
            let mut inputs = Vec::new();
            for file in &group {
                match self.probe_or_skip(file).await {
                    Some(probe) => {
                        probes.push(probe);
                        inputs.push(file.clone());
                    }
                    None => next.push(file.clone()),
                }
            }

            let Some(command) = ffmpeg::merge_command(settings, &inputs, &probes) else {
                warn!("Merge is enabled but no strategy applies to the input group");
                next.extend(inputs);
                continue;
            };

            ran = true;

            if self.execute(&command).await? {
                succeeded = true;
                if settings.remove_original.value {
                    for input in &inputs {
                        remove_file_logged(input).await;
                    }
                } else {
                    next.extend(inputs);
                }
                next.push(command.output);
            } else {
                next.extend(inputs);
            }
        }

        Ok((outcome_of(ran, succeeded), next))
    }

    async fn run_split(&self, files: Vec<PathBuf>) -> Result<(StageOutcome, Vec<PathBuf>)> {
        let settings = &self.settings.split;
        let mut next = Vec::new();
        let mut ran = false;
        let mut succeeded = false;

        for file in files {
            if self.cancel.is_cancelled() {
                return Err(ErrorKind::Cancelled.into());
            }

            let size = fs_err::tokio::metadata(&file).await?.len();

            let Some(probe) = self.probe_or_skip(&file).await else {
                next.push(file);
                continue;
            };

            let Some(command) = ffmpeg::split_command(settings, &file, &probe, size) else {
                next.push(file);
                continue;
            };

            ran = true;

            if self.execute(&command).await? {
                succeeded = true;
                let parts = collect_split_parts(&command.output).await?;
                // The oversized original can't be uploaded anyway
                remove_file_logged(&file).await;
                next.extend(parts);
            } else {
                next.push(file);
            }
        }

        Ok((outcome_of(ran, succeeded), next))
    }

    async fn probe_or_skip(&self, file: &Path) -> Option<MediaProbe> {
        match MediaProbe::read(&self.proc.probe_tool, file).await {
            Ok(probe) => Some(probe),
            Err(err) => {
                // Non-media files simply pass through the media stages
                debug!(
                    file = %file.display(),
                    err = tracing_err(&err),
                    "File is not probeable, passing it through",
                );
                None
            }
        }
    }

    /// Runs one built command under the process-wide CPU lock.
    /// Returns whether the expected output materialized.
    async fn execute(&self, command: &ToolCommand) -> Result<bool> {
        if let Some((path, content)) = &command.aux_file {
            fs_err::tokio::write(path, content).await?;
        }

        let guard = tokio::select! {
            guard = self.cpu_lock.lock() => guard,
            () = self.cancel.cancelled() => return Err(ErrorKind::Cancelled.into()),
        };

        let run = process::run_tool(
            &self.proc.media_tool,
            &command.argv,
            None,
            self.cancel,
            self.proc.tool_timeout(),
        )
        .await;

        drop(guard);

        if let Some((path, _)) = &command.aux_file {
            let _ = fs_err::tokio::remove_file(path).await;
        }

        let run = run?;
        let produced = output_exists(&command.output).await?;

        match (run.success, produced) {
            (true, true) => Ok(true),
            (true, false) => {
                warn!(
                    output = %command.output.display(),
                    "Tool exited successfully but produced no output",
                );
                Ok(false)
            }
            (false, true) => {
                // The attachment dump complains about a missing output file
                // while still writing the attachment
                debug!(
                    output = %command.output.display(),
                    "Tool exited non-zero but the output exists, counting as success",
                );
                Ok(true)
            }
            (false, false) => {
                warn!(
                    output = %command.output.display(),
                    stderr_tail = %run.stderr_tail,
                    "Tool invocation failed",
                );
                Ok(false)
            }
        }
    }
}

fn outcome_of(ran: bool, succeeded: bool) -> StageOutcome {
    match (ran, succeeded) {
        (false, _) => StageOutcome::Skipped,
        (true, true) => StageOutcome::Success,
        (true, false) => StageOutcome::Failed,
    }
}

enum ContainerKind {
    Video,
    Audio,
    Other,
}

fn container_kind(file: &Path) -> ContainerKind {
    let Some(ext) = file.extension().map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    else {
        return ContainerKind::Other;
    };

    if VIDEO_EXTS.contains(&ext.as_str()) {
        ContainerKind::Video
    } else if AUDIO_EXTS.contains(&ext.as_str()) {
        ContainerKind::Audio
    } else {
        ContainerKind::Other
    }
}

async fn output_exists(output: &Path) -> crate::Result<bool> {
    if is_segment_pattern(output) {
        return Ok(!collect_split_parts(output).await?.is_empty());
    }
    Ok(fs_err::tokio::metadata(output).await.is_ok())
}

fn is_segment_pattern(output: &Path) -> bool {
    output.to_string_lossy().contains("%03d")
}

/// Expands the segment output pattern into the part files the tool wrote.
async fn collect_split_parts(pattern: &Path) -> crate::Result<Vec<PathBuf>> {
    let name = pattern
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Some((prefix, suffix)) = name.split_once("%03d") else {
        return Ok(vec![pattern.to_path_buf()]);
    };

    let dir = pattern.parent().unwrap_or_else(|| Path::new("."));
    let mut parts = Vec::new();

    let mut entries = fs_err::tokio::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await.map_err(crate::Error::from)? {
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if file_name.starts_with(prefix) && file_name.ends_with(suffix) {
            parts.push(entry.path());
        }
    }

    parts.sort();
    Ok(parts)
}

async fn remove_file_logged(file: &Path) {
    if let Err(err) = fs_err::tokio::remove_file(file).await {
        warn!(
            file = %file.display(),
            err = tracing_err(&err),
            "Failed to remove the original file",
        );
    }
}
