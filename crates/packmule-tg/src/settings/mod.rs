//! The configuration resolution engine: three layered settings sources
//! (invocation flags, the per-user snapshot, the owner config), one
//! precedence rule, and one immutable settings struct per processing
//! feature.

mod args;
mod index;
mod resolve;
mod source;

pub(crate) mod features;

pub(crate) use args::*;
pub(crate) use features::*;
pub(crate) use index::*;
pub(crate) use resolve::*;
pub(crate) use source::*;

pub(crate) const DEFAULT_UPLOAD: &str = "DEFAULT_UPLOAD";
pub(crate) const USER_TOKENS: &str = "USER_TOKENS";

/// Everything one task needs to know about its effective configuration.
/// Assembled once when the task starts and never mutated afterwards; the
/// `-del` pass happens inside [`TaskSettings::resolve`] before the value
/// is handed out.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TaskSettings {
    /// `-n`: rename the download before processing.
    pub(crate) name_substitute: Option<String>,

    /// The raw upload destination (`-up` or `DEFAULT_UPLOAD`); parsed into
    /// a destination by the transfer layer.
    pub(crate) upload: Resolved<Option<String>>,

    /// Whether the task must use the user's own cloud credentials instead
    /// of the owner's.
    pub(crate) user_tokens: Resolved<bool>,

    pub(crate) watermark: WatermarkSettings,
    pub(crate) merge: MergeSettings,
    pub(crate) trim: TrimSettings,
    pub(crate) extract: ExtractSettings,
    pub(crate) remove: RemoveSettings,
    pub(crate) add: AddSettings,
    pub(crate) compress: CompressSettings,
    pub(crate) convert: ConvertSettings,
    pub(crate) split: SplitSettings,
}

impl TaskSettings {
    pub(crate) fn resolve(args: &ArgSource, user: &SettingMap, owner: &SettingMap) -> Self {
        let r = Resolver { args, user, owner };

        let mut settings = Self {
            name_substitute: args.text("-n").map(str::to_owned),
            upload: r.text(true, DEFAULT_UPLOAD, Some("-up"), None),
            user_tokens: r.boolean(true, USER_TOKENS, None, false),
            watermark: WatermarkSettings::resolve(&r),
            merge: MergeSettings::resolve(&r),
            trim: TrimSettings::resolve(&r),
            extract: ExtractSettings::resolve(&r),
            remove: RemoveSettings::resolve(&r),
            add: AddSettings::resolve(&r),
            compress: CompressSettings::resolve(&r),
            convert: ConvertSettings::resolve(&r),
            split: SplitSettings::resolve(&r),
        };

        settings.apply_delete_override(args);
        settings
    }

    /// `-del` is the one deliberate cross-feature coupling: an explicit
    /// final pass over the five delete-original flags, applied after every
    /// feature has resolved independently.
    fn apply_delete_override(&mut self, args: &ArgSource) {
        let Some(delete) = args.flag("-del") else {
            return;
        };

        let targets = [
            &mut self.watermark.remove_original,
            &mut self.merge.remove_original,
            &mut self.add.delete_original,
            &mut self.trim.delete_original,
            &mut self.extract.delete_original,
        ];

        for target in targets {
            *target = Resolved::arg(delete);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings_with(input: &str, user: &[(&str, serde_json::Value)]) -> TaskSettings {
        let parsed = parse_task_args(input);
        let user: SettingMap = user
            .iter()
            .map(|(key, value)| ((*key).to_owned(), value.clone()))
            .collect();
        TaskSettings::resolve(&parsed.args, &user, &SettingMap::new())
    }

    #[test]
    fn del_flag_overrides_all_five_delete_flags() {
        let settings = settings_with("link -del t", &[("MERGE_REMOVE_ORIGINAL", json!(false))]);

        for resolved in [
            &settings.watermark.remove_original,
            &settings.merge.remove_original,
            &settings.add.delete_original,
            &settings.trim.delete_original,
            &settings.extract.delete_original,
        ] {
            assert_eq!(resolved.value, true);
            assert_eq!(resolved.source, SourceTag::Arg);
        }

        let settings = settings_with("link -del f", &[("TRIM_DELETE_ORIGINAL", json!(true)), ("TRIM_ENABLED", json!(true))]);
        assert_eq!(settings.trim.delete_original.value, false);
        assert_eq!(settings.trim.delete_original.source, SourceTag::Arg);

        // Non-overridden delete flags are untouched
        assert_eq!(settings.compress.delete_original.source, SourceTag::Default);
    }

    #[test]
    fn owner_enabled_extract_all_tracks() {
        let parsed = parse_task_args("link");
        let owner: SettingMap = [
            ("EXTRACT_ENABLED".to_owned(), json!(true)),
            ("EXTRACT_VIDEO_INDEX".to_owned(), json!("all")),
        ]
        .into_iter()
        .collect();

        let settings = TaskSettings::resolve(&parsed.args, &SettingMap::new(), &owner);

        assert_eq!(settings.extract.enabled.value, true);
        assert_eq!(settings.extract.enabled.source, SourceTag::Owner);
        // "all" means the empty, unbounded selection
        assert_eq!(settings.extract.video_indices.value, Vec::<u32>::new());
        assert_eq!(settings.extract.video_indices.source, SourceTag::Owner);
    }

    #[test]
    fn index_flag_force_enables_extraction() {
        let settings = settings_with(
            "link -extract-audio-index 2",
            &[("EXTRACT_ENABLED", json!(false))],
        );

        assert_eq!(settings.extract.enabled.value, true);
        assert_eq!(settings.extract.enabled.source, SourceTag::Arg);
        assert_eq!(settings.extract.audio_indices.value, vec![2]);
        assert_eq!(settings.extract.audio_indices.source, SourceTag::Arg);
    }

    #[test]
    fn disabled_features_resolve_to_defaults() {
        let settings = settings_with(
            "link",
            &[
                ("MERGE_OUTPUT_FORMAT_VIDEO", json!("webm")),
                ("COMPRESSION_VIDEO_CRF", json!(18)),
            ],
        );

        assert_eq!(settings.merge.enabled.value, false);
        assert_eq!(settings.merge.output_format_video.value, "mkv");
        assert_eq!(settings.compress.video_crf.value, 27);
    }

    #[test]
    fn rename_and_upload_flags() {
        let settings = settings_with("link -n out.mkv -up gd:folder", &[]);

        assert_eq!(settings.name_substitute.as_deref(), Some("out.mkv"));
        assert_eq!(settings.upload.value.as_deref(), Some("gd:folder"));
        assert_eq!(settings.upload.source, SourceTag::Arg);
    }
}
