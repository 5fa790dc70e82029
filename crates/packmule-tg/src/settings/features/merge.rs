use crate::settings::{Resolved, Resolver, ZeroPolicy};

pub(crate) const MERGE_ENABLED: &str = "MERGE_ENABLED";
pub(crate) const MERGE_PRIORITY: &str = "MERGE_PRIORITY";
pub(crate) const MERGE_THREADING: &str = "MERGE_THREADING";
pub(crate) const MERGE_CONCAT_DEMUXER: &str = "MERGE_CONCAT_DEMUXER";
pub(crate) const MERGE_FILTER_COMPLEX: &str = "MERGE_FILTER_COMPLEX";
pub(crate) const MERGE_OUTPUT_FORMAT_VIDEO: &str = "MERGE_OUTPUT_FORMAT_VIDEO";
pub(crate) const MERGE_OUTPUT_FORMAT_AUDIO: &str = "MERGE_OUTPUT_FORMAT_AUDIO";
pub(crate) const MERGE_REMOVE_ORIGINAL: &str = "MERGE_REMOVE_ORIGINAL";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MergeSettings {
    pub(crate) enabled: Resolved<bool>,
    pub(crate) priority: Resolved<i64>,
    pub(crate) threading: Resolved<bool>,
    /// Fast strategy: requires every input to share codecs.
    pub(crate) concat_demuxer: Resolved<bool>,
    /// Slow fallback strategy: re-encodes, handles heterogeneous inputs.
    pub(crate) filter_complex: Resolved<bool>,
    pub(crate) output_format_video: Resolved<String>,
    pub(crate) output_format_audio: Resolved<String>,
    pub(crate) remove_original: Resolved<bool>,
}

impl MergeSettings {
    pub(crate) const DEFAULT_PRIORITY: i64 = 5;

    pub(crate) fn resolve(r: &Resolver<'_>) -> Self {
        let enabled = r.enabled(MERGE_ENABLED, &[]);
        let on = enabled.value;

        Self {
            priority: r.integer_or(
                on,
                MERGE_PRIORITY,
                None,
                ZeroPolicy::Unset,
                Self::DEFAULT_PRIORITY,
            ),
            threading: r.boolean(on, MERGE_THREADING, None, true),
            concat_demuxer: r.boolean(on, MERGE_CONCAT_DEMUXER, None, true),
            filter_complex: r.boolean(on, MERGE_FILTER_COMPLEX, None, false),
            output_format_video: r.text_or(on, MERGE_OUTPUT_FORMAT_VIDEO, None, "mkv"),
            output_format_audio: r.text_or(on, MERGE_OUTPUT_FORMAT_AUDIO, None, "mka"),
            remove_original: r.boolean(on, MERGE_REMOVE_ORIGINAL, None, false),
            enabled,
        }
    }
}
