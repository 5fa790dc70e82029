//! Pure construction of media-tool argument lists from resolved feature
//! settings. Nothing here touches the filesystem or spawns processes;
//! execution belongs to the pipeline.

use super::probe::{MediaProbe, TrackKind};
use crate::settings::{
    AddSettings, CompressSettings, ConvertSettings, ExtractSettings, MergeSettings,
    RemoveSettings, Resolved, SourceTag, SplitSettings, TrimSettings, WatermarkSettings,
};
use std::path::{Path, PathBuf};

/// A fully built media-tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ToolCommand {
    pub(crate) argv: Vec<String>,
    pub(crate) output: PathBuf,

    /// A support file that must exist before the invocation runs (the
    /// concat demuxer list). The executor writes it; the builder only
    /// describes it.
    pub(crate) aux_file: Option<(PathBuf, String)>,
}

impl ToolCommand {
    fn new(argv: Vec<String>, output: PathBuf) -> Self {
        Self {
            argv,
            output,
            aux_file: None,
        }
    }
}

/// Every invocation overwrites its output and keeps quiet on stderr except
/// for actual errors.
fn base_argv(input: &Path) -> Vec<String> {
    vec![
        "-hide_banner".to_owned(),
        "-loglevel".to_owned(),
        "error".to_owned(),
        "-y".to_owned(),
        "-i".to_owned(),
        input.to_string_lossy().into_owned(),
    ]
}

/// Derives the deterministic output path: same directory, the stage tag
/// spliced into the file name, optionally a new extension.
fn derived_output(input: &Path, tag: &str, ext: Option<&str>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_owned());

    let ext = ext
        .map(str::to_owned)
        .or_else(|| {
            input
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "mkv".to_owned());

    input.with_file_name(format!("{stem}.{tag}.{ext}"))
}

fn push(argv: &mut Vec<String>, args: impl IntoIterator<Item = impl Into<String>>) {
    argv.extend(args.into_iter().map(Into::into));
}

/// Track kinds addressed by a selector bundle, with the per-kind selected
/// state and indices.
fn selected_kinds<'a>(
    selectors: [(&'a Resolved<Vec<u32>>, TrackKind); 4],
) -> impl Iterator<Item = (TrackKind, &'a [u32])> {
    selectors
        .into_iter()
        .filter(|(resolved, _)| resolved.source != SourceTag::Default)
        .map(|(resolved, kind)| (kind, resolved.value.as_slice()))
}

/// One command per extracted track. An empty index list selects every
/// track of that kind.
pub(crate) fn extract_commands(
    settings: &ExtractSettings,
    input: &Path,
    probe: &MediaProbe,
) -> Vec<ToolCommand> {
    let selectors = [
        (&settings.video_indices, TrackKind::Video),
        (&settings.audio_indices, TrackKind::Audio),
        (&settings.subtitle_indices, TrackKind::Subtitle),
        (&settings.attachment_indices, TrackKind::Attachment),
    ];

    let mut commands = Vec::new();

    for (kind, indices) in selected_kinds(selectors) {
        let available = probe.count(kind);

        let ordinals: Vec<u32> = if indices.is_empty() {
            (0..available as u32).collect()
        } else {
            indices
                .iter()
                .copied()
                .filter(|ordinal| (*ordinal as usize) < available)
                .collect()
        };

        for ordinal in ordinals {
            commands.push(extract_one(settings, input, kind, ordinal));
        }
    }

    commands
}

fn extract_one(
    settings: &ExtractSettings,
    input: &Path,
    kind: TrackKind,
    ordinal: u32,
) -> ToolCommand {
    let tag = format!("{kind}.{ordinal}");

    if kind == TrackKind::Attachment {
        // Attachments don't go through -map; the tool dumps them directly.
        // The tool dumps the attachment while opening the input and then
        // complains about the missing output file. The pipeline judges
        // success by the dumped file, not by the exit status.
        let output = derived_output(input, &tag, Some("bin"));
        let argv = vec![
            "-hide_banner".to_owned(),
            "-loglevel".to_owned(),
            "error".to_owned(),
            "-y".to_owned(),
            format!("-dump_attachment:t:{ordinal}"),
            output.to_string_lossy().into_owned(),
            "-i".to_owned(),
            input.to_string_lossy().into_owned(),
        ];
        return ToolCommand::new(argv, output);
    }

    let ext = match kind {
        TrackKind::Video => "mkv",
        TrackKind::Audio => "mka",
        // Any subtitle codec fits into a Matroska subtitle container
        TrackKind::Subtitle => "mks",
        TrackKind::Attachment => unreachable!(),
    };

    let output = derived_output(input, &tag, Some(ext));
    let mut argv = base_argv(input);
    push(
        &mut argv,
        ["-map".to_owned(), format!("0:{}:{ordinal}", kind.specifier())],
    );
    if settings.maintain_quality.value {
        push(&mut argv, ["-c", "copy"]);
    }
    argv.push(output.to_string_lossy().into_owned());

    ToolCommand::new(argv, output)
}

/// Keeps everything except the selected tracks. An empty index list drops
/// every track of that kind.
pub(crate) fn remove_command(
    settings: &RemoveSettings,
    input: &Path,
    _probe: &MediaProbe,
) -> Option<ToolCommand> {
    let selectors = [
        (&settings.video_indices, TrackKind::Video),
        (&settings.audio_indices, TrackKind::Audio),
        (&settings.subtitle_indices, TrackKind::Subtitle),
        (&settings.attachment_indices, TrackKind::Attachment),
    ];

    let selected: Vec<_> = selected_kinds(selectors).collect();
    if selected.is_empty() && !settings.metadata.value {
        return None;
    }

    let output = derived_output(input, "cleaned", None);
    let mut argv = base_argv(input);
    push(&mut argv, ["-map", "0"]);

    for (kind, indices) in selected {
        if indices.is_empty() {
            push(&mut argv, ["-map".to_owned(), format!("-0:{}", kind.specifier())]);
        } else {
            for ordinal in indices {
                push(
                    &mut argv,
                    ["-map".to_owned(), format!("-0:{}:{ordinal}", kind.specifier())],
                );
            }
        }
    }

    if settings.metadata.value {
        push(&mut argv, ["-map_metadata", "-1"]);
    }

    push(&mut argv, ["-c", "copy"]);
    argv.push(output.to_string_lossy().into_owned());

    Some(ToolCommand::new(argv, output))
}

/// Muxes donor files' tracks into the first file. `replace` drops the base
/// file's tracks of the kinds the donors provide; otherwise donor tracks
/// are appended after the base ones.
pub(crate) fn add_command(
    settings: &AddSettings,
    input: &Path,
    donors: &[PathBuf],
    donor_probes: &[MediaProbe],
) -> Option<ToolCommand> {
    if donors.is_empty() || donors.len() != donor_probes.len() {
        return None;
    }

    let output = derived_output(input, "muxed", None);
    let mut argv = base_argv(input);

    for donor in donors {
        push(&mut argv, ["-i".to_owned(), donor.to_string_lossy().into_owned()]);
    }

    if settings.replace.value {
        // Keep base tracks only for the kinds no donor provides
        let donated: Vec<TrackKind> = [
            TrackKind::Video,
            TrackKind::Audio,
            TrackKind::Subtitle,
            TrackKind::Attachment,
        ]
        .into_iter()
        .filter(|kind| donor_probes.iter().any(|probe| probe.has(*kind)))
        .collect();

        push(&mut argv, ["-map", "0"]);
        for kind in donated {
            push(&mut argv, ["-map".to_owned(), format!("-0:{}", kind.specifier())]);
        }
    } else {
        push(&mut argv, ["-map", "0"]);
    }

    for donor_position in 1..=donors.len() {
        push(&mut argv, ["-map".to_owned(), donor_position.to_string()]);
    }

    push(&mut argv, ["-c", "copy"]);
    argv.push(output.to_string_lossy().into_owned());

    Some(ToolCommand::new(argv, output))
}

/// Stream-copy cut. Inapplicable without at least one of the bounds.
pub(crate) fn trim_command(settings: &TrimSettings, input: &Path) -> Option<ToolCommand> {
    let start = settings.start_time.value.as_deref();
    let end = settings.end_time.value.as_deref();

    if start.is_none() && end.is_none() {
        return None;
    }

    let output = derived_output(input, "trimmed", None);
    let mut argv = base_argv(input);

    if let Some(start) = start {
        push(&mut argv, ["-ss", start]);
    }
    if let Some(end) = end {
        push(&mut argv, ["-to", end]);
    }

    push(&mut argv, ["-c", "copy"]);
    argv.push(output.to_string_lossy().into_owned());

    Some(ToolCommand::new(argv, output))
}

/// Concatenates two or more files of the same kind. The concat demuxer is
/// attempted first (fast, stream copy, requires matching codecs), then the
/// concat filter (re-encodes, tolerates heterogeneous inputs). Neither
/// enabled or applicable means the bundle yields no actionable command.
pub(crate) fn merge_command(
    settings: &MergeSettings,
    inputs: &[PathBuf],
    probes: &[MediaProbe],
) -> Option<ToolCommand> {
    if inputs.len() < 2 || inputs.len() != probes.len() {
        return None;
    }

    let has_video = probes.iter().any(|probe| probe.has(TrackKind::Video));
    let ext = if has_video {
        settings.output_format_video.value.as_str()
    } else {
        settings.output_format_audio.value.as_str()
    };

    let first = &inputs[0];
    let output = derived_output(first, "merged", Some(ext));

    let codecs_match = probes
        .iter()
        .all(|probe| probe.lead_codecs() == probes[0].lead_codecs());

    if settings.concat_demuxer.value && codecs_match {
        let list_path = first.with_file_name("concat_inputs.txt");
        let list_content = inputs
            .iter()
            .map(|input| {
                // The demuxer's list format escapes single quotes shell-style
                let path = input.to_string_lossy().replace('\'', r"'\''");
                format!("file '{path}'\n")
            })
            .collect::<String>();

        let argv = vec![
            "-hide_banner".to_owned(),
            "-loglevel".to_owned(),
            "error".to_owned(),
            "-y".to_owned(),
            "-f".to_owned(),
            "concat".to_owned(),
            "-safe".to_owned(),
            "0".to_owned(),
            "-i".to_owned(),
            list_path.to_string_lossy().into_owned(),
            "-c".to_owned(),
            "copy".to_owned(),
            output.to_string_lossy().into_owned(),
        ];

        return Some(ToolCommand {
            argv,
            output,
            aux_file: Some((list_path, list_content)),
        });
    }

    if !settings.filter_complex.value {
        return None;
    }

    // The concat filter requires the same stream layout from every input,
    // so audio is only concatenated when every input has it.
    let with_audio = probes.iter().all(|probe| probe.has(TrackKind::Audio));

    let mut argv = vec![
        "-hide_banner".to_owned(),
        "-loglevel".to_owned(),
        "error".to_owned(),
        "-y".to_owned(),
    ];
    for input in inputs {
        push(&mut argv, ["-i".to_owned(), input.to_string_lossy().into_owned()]);
    }

    let mut filter = String::new();
    for position in 0..inputs.len() {
        if has_video {
            filter.push_str(&format!("[{position}:v:0]"));
        }
        if with_audio {
            filter.push_str(&format!("[{position}:a:0]"));
        }
    }
    filter.push_str(&format!(
        "concat=n={}:v={}:a={}",
        inputs.len(),
        u8::from(has_video),
        u8::from(with_audio),
    ));

    match (has_video, with_audio) {
        (true, true) => filter.push_str("[v][a]"),
        (true, false) => filter.push_str("[v]"),
        (false, _) => filter.push_str("[a]"),
    }

    push(&mut argv, ["-filter_complex".to_owned(), filter]);
    if has_video {
        push(&mut argv, ["-map", "[v]"]);
    }
    if with_audio || !has_video {
        push(&mut argv, ["-map", "[a]"]);
    }
    if !settings.threading.value {
        push(&mut argv, ["-threads", "1"]);
    }
    argv.push(output.to_string_lossy().into_owned());

    Some(ToolCommand::new(argv, output))
}

/// Stamps the watermark key over the video via a drawtext filter.
pub(crate) fn watermark_command(
    settings: &WatermarkSettings,
    input: &Path,
) -> Option<ToolCommand> {
    let key = settings.key.value.as_deref()?;

    let escaped = key
        .replace('\\', r"\\")
        .replace('\'', r"\'")
        .replace(':', r"\:");

    let (x, y) = match settings.position.value.as_str() {
        "top_right" => ("w-tw-10", "10"),
        "bottom_left" => ("10", "h-th-10"),
        "bottom_right" => ("w-tw-10", "h-th-10"),
        "center" => ("(w-tw)/2", "(h-th)/2"),
        // `top_left` and anything unrecognized
        _ => ("10", "10"),
    };

    let filter = format!(
        "drawtext=text='{escaped}':fontsize={}:fontcolor=white:alpha={}:x={x}:y={y}",
        settings.size.value, settings.opacity.value,
    );

    let output = derived_output(input, "watermarked", None);
    let mut argv = base_argv(input);
    push(&mut argv, ["-vf".to_owned(), filter]);
    if !settings.threading.value {
        push(&mut argv, ["-threads", "1"]);
    }
    argv.push(output.to_string_lossy().into_owned());

    Some(ToolCommand::new(argv, output))
}

/// Container/layout conversion. Video files follow `video_format`, audio
/// files follow `audio_format`; a file already in the target container is
/// left alone.
pub(crate) fn convert_command(
    settings: &ConvertSettings,
    input: &Path,
    probe: &MediaProbe,
) -> Option<ToolCommand> {
    let is_video = probe.has(TrackKind::Video);

    let target = if is_video {
        settings.video_format.value.as_deref()?
    } else {
        settings.audio_format.value.as_deref()?
    };

    let current = input
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    if current.as_deref() == Some(target) {
        return None;
    }

    let output = derived_output(input, "converted", Some(target));
    let mut argv = base_argv(input);

    if is_video {
        push(&mut argv, ["-c:v", "libx264", "-c:a", "aac"]);
    }
    if let Some(channels) = settings.audio_channels.value {
        push(&mut argv, ["-ac".to_owned(), channels.to_string()]);
    }
    if let Some(sampling) = settings.audio_sampling.value {
        push(&mut argv, ["-ar".to_owned(), sampling.to_string()]);
    }
    argv.push(output.to_string_lossy().into_owned());

    Some(ToolCommand::new(argv, output))
}

/// Re-encodes with the configured preset/CRF to shrink the file.
pub(crate) fn compress_command(
    settings: &CompressSettings,
    input: &Path,
    probe: &MediaProbe,
) -> Option<ToolCommand> {
    let is_video = probe.has(TrackKind::Video);
    let has_audio = probe.has(TrackKind::Audio);
    if !is_video && !has_audio {
        return None;
    }

    let output = derived_output(input, "compressed", settings.format.value.as_deref());
    let mut argv = base_argv(input);

    if is_video {
        push(
            &mut argv,
            [
                "-c:v".to_owned(),
                "libx264".to_owned(),
                "-preset".to_owned(),
                settings.video_preset.value.clone(),
                "-crf".to_owned(),
                settings.video_crf.value.to_string(),
            ],
        );
    }
    if has_audio {
        push(
            &mut argv,
            [
                "-c:a".to_owned(),
                "aac".to_owned(),
                "-b:a".to_owned(),
                settings.audio_bitrate.value.clone(),
            ],
        );
    }
    argv.push(output.to_string_lossy().into_owned());

    Some(ToolCommand::new(argv, output))
}

/// Splits an oversized file into stream-copied segments that fit the
/// upload cap. Only applicable to media with a known duration.
pub(crate) fn split_command(
    settings: &SplitSettings,
    input: &Path,
    probe: &MediaProbe,
    file_size: u64,
) -> Option<ToolCommand> {
    let split_size = settings.split_size.value.max(1) as u64;
    if file_size <= split_size {
        return None;
    }

    let duration = probe.duration()?;
    if duration <= 0.0 {
        return None;
    }

    let parts = file_size.div_ceil(split_size);
    let segment_time = if settings.equal_splits.value {
        duration / parts as f64
    } else {
        // Maximal chunks: segment duration proportional to the size cap
        duration * split_size as f64 / file_size as f64
    };

    let ext = input
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mkv".to_owned());
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_owned());
    let output = input.with_file_name(format!("{stem}.part%03d.{ext}"));

    let mut argv = base_argv(input);
    push(
        &mut argv,
        [
            "-map".to_owned(),
            "0".to_owned(),
            "-c".to_owned(),
            "copy".to_owned(),
            "-f".to_owned(),
            "segment".to_owned(),
            "-segment_time".to_owned(),
            format!("{segment_time:.3}"),
        ],
    );
    argv.push(output.to_string_lossy().into_owned());

    Some(ToolCommand::new(argv, output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{parse_task_args, SettingMap, TaskSettings};
    use expect_test::{expect, Expect};
    use serde_json::json;

    fn settings_for(input: &str, owner: &[(&str, serde_json::Value)]) -> TaskSettings {
        let parsed = parse_task_args(input);
        let owner: SettingMap = owner
            .iter()
            .map(|(key, value)| ((*key).to_owned(), value.clone()))
            .collect();
        TaskSettings::resolve(&parsed.args, &SettingMap::new(), &owner)
    }

    fn probe_with(streams: &[(&str, &str)]) -> MediaProbe {
        MediaProbe {
            streams: streams
                .iter()
                .map(|(codec_type, codec_name)| crate::processing::probe::StreamInfo {
                    codec_type: Some((*codec_type).to_owned()),
                    codec_name: Some((*codec_name).to_owned()),
                })
                .collect(),
            format: None,
        }
    }

    fn assert_argv(command: &ToolCommand, expected: &Expect) {
        expected.assert_eq(&command.argv.join(" "));
    }

    #[test]
    fn merge_needs_at_least_two_files() {
        let settings = settings_for("link", &[("MERGE_ENABLED", json!(true))]);
        let inputs = [PathBuf::from("/work/a.mkv")];
        let probes = [probe_with(&[("video", "h264"), ("audio", "aac")])];

        assert_eq!(merge_command(&settings.merge, &inputs, &probes), None);
    }

    #[test]
    fn merge_prefers_concat_demuxer_for_matching_codecs() {
        let settings = settings_for("link", &[("MERGE_ENABLED", json!(true))]);
        let inputs = [PathBuf::from("/work/a.mkv"), PathBuf::from("/work/b.mkv")];
        let probes = [
            probe_with(&[("video", "h264"), ("audio", "aac")]),
            probe_with(&[("video", "h264"), ("audio", "aac")]),
        ];

        let command = merge_command(&settings.merge, &inputs, &probes).unwrap();

        let (list_path, list_content) = command.aux_file.as_ref().unwrap();
        assert_eq!(list_path, &PathBuf::from("/work/concat_inputs.txt"));
        assert_eq!(list_content, "file '/work/a.mkv'\nfile '/work/b.mkv'\n");
        assert_argv(
            &command,
            &expect![[
                "-hide_banner -loglevel error -y -f concat -safe 0 -i /work/concat_inputs.txt -c copy /work/a.merged.mkv"
            ]],
        );
    }

    #[test]
    fn merge_falls_back_to_filter_graph() {
        let settings = settings_for(
            "link",
            &[
                ("MERGE_ENABLED", json!(true)),
                ("MERGE_FILTER_COMPLEX", json!(true)),
            ],
        );
        let inputs = [PathBuf::from("/work/a.mkv"), PathBuf::from("/work/b.webm")];
        let probes = [
            probe_with(&[("video", "h264"), ("audio", "aac")]),
            probe_with(&[("video", "vp9"), ("audio", "opus")]),
        ];

        let command = merge_command(&settings.merge, &inputs, &probes).unwrap();

        assert_eq!(command.aux_file, None);
        assert_argv(
            &command,
            &expect![[
                "-hide_banner -loglevel error -y -i /work/a.mkv -i /work/b.webm -filter_complex [0:v:0][0:a:0][1:v:0][1:a:0]concat=n=2:v=1:a=1[v][a] -map [v] -map [a] /work/a.merged.mkv"
            ]],
        );
    }

    #[test]
    fn merge_without_either_strategy_is_not_actionable() {
        let settings = settings_for(
            "link",
            &[
                ("MERGE_ENABLED", json!(true)),
                ("MERGE_CONCAT_DEMUXER", json!(false)),
            ],
        );
        let inputs = [PathBuf::from("/work/a.mkv"), PathBuf::from("/work/b.mkv")];
        let probes = [
            probe_with(&[("video", "h264")]),
            probe_with(&[("video", "h264")]),
        ];

        assert_eq!(merge_command(&settings.merge, &inputs, &probes), None);
    }

    #[test]
    fn trim_without_bounds_is_not_actionable() {
        let settings = settings_for("link", &[("TRIM_ENABLED", json!(true))]);

        assert_eq!(trim_command(&settings.trim, Path::new("/work/a.mkv")), None);
    }

    #[test]
    fn trim_with_flag_bounds() {
        let settings = settings_for("link -trim-start 00:00:10 -trim-end 00:01:00", &[]);

        let command = trim_command(&settings.trim, Path::new("/work/a.mkv")).unwrap();

        assert_argv(
            &command,
            &expect![[
                "-hide_banner -loglevel error -y -i /work/a.mkv -ss 00:00:10 -to 00:01:00 -c copy /work/a.trimmed.mkv"
            ]],
        );
    }

    #[test]
    fn extract_selected_audio_track() {
        let settings = settings_for("link -extract-audio-index 1", &[]);
        let probe = probe_with(&[("video", "h264"), ("audio", "aac"), ("audio", "ac3")]);

        let commands = extract_commands(&settings.extract, Path::new("/work/a.mkv"), &probe);

        assert_eq!(commands.len(), 1);
        assert_argv(
            &commands[0],
            &expect![[
                "-hide_banner -loglevel error -y -i /work/a.mkv -map 0:a:1 -c copy /work/a.audio.1.mka"
            ]],
        );
    }

    #[test]
    fn extract_all_audio_tracks() {
        let settings = settings_for("link -extract-audio-index all", &[]);
        let probe = probe_with(&[("video", "h264"), ("audio", "aac"), ("audio", "ac3")]);

        let commands = extract_commands(&settings.extract, Path::new("/work/a.mkv"), &probe);

        let outputs: Vec<_> = commands
            .iter()
            .map(|command| command.output.to_string_lossy().into_owned())
            .collect();
        assert_eq!(outputs, ["/work/a.audio.0.mka", "/work/a.audio.1.mka"]);
    }

    #[test]
    fn extract_out_of_range_index_builds_nothing() {
        let settings = settings_for("link -extract-video-index 5", &[]);
        let probe = probe_with(&[("video", "h264")]);

        let commands = extract_commands(&settings.extract, Path::new("/work/a.mkv"), &probe);

        assert!(commands.is_empty());
    }

    #[test]
    fn remove_all_subtitles_and_metadata() {
        let settings = settings_for(
            "link -remove-subtitle-index all",
            &[("REMOVE_METADATA", json!(true)), ("REMOVE_ENABLED", json!(true))],
        );
        let probe = probe_with(&[("video", "h264"), ("subtitle", "srt")]);

        let command = remove_command(&settings.remove, Path::new("/work/a.mkv"), &probe).unwrap();

        assert_argv(
            &command,
            &expect![[
                "-hide_banner -loglevel error -y -i /work/a.mkv -map 0 -map -0:s -map_metadata -1 -c copy /work/a.cleaned.mkv"
            ]],
        );
    }

    #[test]
    fn watermark_without_key_is_not_actionable() {
        let settings = settings_for("link", &[("WATERMARK_ENABLED", json!(true))]);

        assert_eq!(
            watermark_command(&settings.watermark, Path::new("/work/a.mkv")),
            None
        );
    }

    #[test]
    fn watermark_escapes_the_key() {
        let settings = settings_for("link -watermark-key it's:mine", &[
            ("WATERMARK_ENABLED", json!(true)),
        ]);

        let command = watermark_command(&settings.watermark, Path::new("/work/a.mkv")).unwrap();

        let filter = &command.argv[7];
        assert_eq!(
            filter,
            r"drawtext=text='it\'s\:mine':fontsize=20:fontcolor=white:alpha=1:x=10:y=10"
        );
    }

    #[test]
    fn convert_skips_files_already_in_target_container() {
        let settings = settings_for("link", &[
            ("CONVERT_ENABLED", json!(true)),
            ("CONVERT_VIDEO_FORMAT", json!("mp4")),
        ]);
        let probe = probe_with(&[("video", "h264"), ("audio", "aac")]);

        assert_eq!(
            convert_command(&settings.convert, Path::new("/work/a.mp4"), &probe),
            None
        );

        let command = convert_command(&settings.convert, Path::new("/work/a.mkv"), &probe).unwrap();
        assert_eq!(command.output, PathBuf::from("/work/a.converted.mp4"));
    }

    #[test]
    fn split_only_oversized_files() {
        let settings = settings_for("link -split-size 1000", &[]);
        let mut probe = probe_with(&[("video", "h264")]);
        probe.format = Some(crate::processing::probe::FormatInfo {
            duration: Some("100.0".to_owned()),
        });

        assert_eq!(
            split_command(&settings.split, Path::new("/work/a.mkv"), &probe, 500),
            None
        );

        let command =
            split_command(&settings.split, Path::new("/work/a.mkv"), &probe, 2500).unwrap();

        assert_argv(
            &command,
            &expect![[
                "-hide_banner -loglevel error -y -i /work/a.mkv -map 0 -c copy -f segment -segment_time 40.000 /work/a.part%03d.mkv"
            ]],
        );
    }
}
