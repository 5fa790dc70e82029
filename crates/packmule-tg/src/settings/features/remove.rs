use crate::settings::{Resolved, Resolver, ZeroPolicy};

pub(crate) const REMOVE_ENABLED: &str = "REMOVE_ENABLED";
pub(crate) const REMOVE_PRIORITY: &str = "REMOVE_PRIORITY";
pub(crate) const REMOVE_VIDEO_INDEX: &str = "REMOVE_VIDEO_INDEX";
pub(crate) const REMOVE_AUDIO_INDEX: &str = "REMOVE_AUDIO_INDEX";
pub(crate) const REMOVE_SUBTITLE_INDEX: &str = "REMOVE_SUBTITLE_INDEX";
pub(crate) const REMOVE_ATTACHMENT_INDEX: &str = "REMOVE_ATTACHMENT_INDEX";
pub(crate) const REMOVE_METADATA: &str = "REMOVE_METADATA";
pub(crate) const REMOVE_DELETE_ORIGINAL: &str = "REMOVE_DELETE_ORIGINAL";

const ENABLER_FLAGS: &[&str] = &[
    "-remove-video-index",
    "-remove-audio-index",
    "-remove-subtitle-index",
    "-remove-attachment-index",
];

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RemoveSettings {
    pub(crate) enabled: Resolved<bool>,
    pub(crate) priority: Resolved<i64>,
    /// Empty list means "drop all tracks of this kind".
    pub(crate) video_indices: Resolved<Vec<u32>>,
    pub(crate) audio_indices: Resolved<Vec<u32>>,
    pub(crate) subtitle_indices: Resolved<Vec<u32>>,
    pub(crate) attachment_indices: Resolved<Vec<u32>>,
    pub(crate) metadata: Resolved<bool>,
    pub(crate) delete_original: Resolved<bool>,
}

impl RemoveSettings {
    pub(crate) const DEFAULT_PRIORITY: i64 = 2;

    pub(crate) fn resolve(r: &Resolver<'_>) -> Self {
        let enabled = r.enabled(REMOVE_ENABLED, ENABLER_FLAGS);
        let on = enabled.value;

        Self {
            priority: r.integer_or(
                on,
                REMOVE_PRIORITY,
                None,
                ZeroPolicy::Unset,
                Self::DEFAULT_PRIORITY,
            ),
            video_indices: r.indices(on, REMOVE_VIDEO_INDEX, Some("-remove-video-index")),
            audio_indices: r.indices(on, REMOVE_AUDIO_INDEX, Some("-remove-audio-index")),
            subtitle_indices: r.indices(on, REMOVE_SUBTITLE_INDEX, Some("-remove-subtitle-index")),
            attachment_indices: r.indices(
                on,
                REMOVE_ATTACHMENT_INDEX,
                Some("-remove-attachment-index"),
            ),
            metadata: r.boolean(on, REMOVE_METADATA, None, false),
            delete_original: r.boolean(on, REMOVE_DELETE_ORIGINAL, None, false),
            enabled,
        }
    }
}
