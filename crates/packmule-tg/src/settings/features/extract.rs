use crate::settings::{Resolved, Resolver, ZeroPolicy};

pub(crate) const EXTRACT_ENABLED: &str = "EXTRACT_ENABLED";
pub(crate) const EXTRACT_PRIORITY: &str = "EXTRACT_PRIORITY";
pub(crate) const EXTRACT_VIDEO_INDEX: &str = "EXTRACT_VIDEO_INDEX";
pub(crate) const EXTRACT_AUDIO_INDEX: &str = "EXTRACT_AUDIO_INDEX";
pub(crate) const EXTRACT_SUBTITLE_INDEX: &str = "EXTRACT_SUBTITLE_INDEX";
pub(crate) const EXTRACT_ATTACHMENT_INDEX: &str = "EXTRACT_ATTACHMENT_INDEX";
pub(crate) const EXTRACT_MAINTAIN_QUALITY: &str = "EXTRACT_MAINTAIN_QUALITY";
pub(crate) const EXTRACT_DELETE_ORIGINAL: &str = "EXTRACT_DELETE_ORIGINAL";

/// The per-track index flags double as implicit enablers: passing
/// `-extract-audio-index 2` turns extraction on even when the user has the
/// toggle disabled.
const ENABLER_FLAGS: &[&str] = &[
    "-extract-video-index",
    "-extract-audio-index",
    "-extract-subtitle-index",
    "-extract-attachment-index",
];

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExtractSettings {
    pub(crate) enabled: Resolved<bool>,
    pub(crate) priority: Resolved<i64>,
    /// Empty list means "all tracks of this kind".
    pub(crate) video_indices: Resolved<Vec<u32>>,
    pub(crate) audio_indices: Resolved<Vec<u32>>,
    pub(crate) subtitle_indices: Resolved<Vec<u32>>,
    pub(crate) attachment_indices: Resolved<Vec<u32>>,
    pub(crate) maintain_quality: Resolved<bool>,
    pub(crate) delete_original: Resolved<bool>,
}

impl ExtractSettings {
    pub(crate) const DEFAULT_PRIORITY: i64 = 1;

    pub(crate) fn resolve(r: &Resolver<'_>) -> Self {
        let enabled = r.enabled(EXTRACT_ENABLED, ENABLER_FLAGS);
        let on = enabled.value;

        Self {
            priority: r.integer_or(
                on,
                EXTRACT_PRIORITY,
                None,
                ZeroPolicy::Unset,
                Self::DEFAULT_PRIORITY,
            ),
            video_indices: r.indices(on, EXTRACT_VIDEO_INDEX, Some("-extract-video-index")),
            audio_indices: r.indices(on, EXTRACT_AUDIO_INDEX, Some("-extract-audio-index")),
            subtitle_indices: r.indices(on, EXTRACT_SUBTITLE_INDEX, Some("-extract-subtitle-index")),
            attachment_indices: r.indices(
                on,
                EXTRACT_ATTACHMENT_INDEX,
                Some("-extract-attachment-index"),
            ),
            maintain_quality: r.boolean(on, EXTRACT_MAINTAIN_QUALITY, None, true),
            delete_original: r.boolean(on, EXTRACT_DELETE_ORIGINAL, None, false),
            enabled,
        }
    }
}
