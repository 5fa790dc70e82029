use crate::settings::{Resolved, Resolver, ZeroPolicy};

pub(crate) const COMPRESSION_ENABLED: &str = "COMPRESSION_ENABLED";
pub(crate) const COMPRESSION_PRIORITY: &str = "COMPRESSION_PRIORITY";
pub(crate) const COMPRESSION_VIDEO_PRESET: &str = "COMPRESSION_VIDEO_PRESET";
pub(crate) const COMPRESSION_VIDEO_CRF: &str = "COMPRESSION_VIDEO_CRF";
pub(crate) const COMPRESSION_AUDIO_BITRATE: &str = "COMPRESSION_AUDIO_BITRATE";
pub(crate) const COMPRESSION_FORMAT: &str = "COMPRESSION_FORMAT";
pub(crate) const COMPRESSION_DELETE_ORIGINAL: &str = "COMPRESSION_DELETE_ORIGINAL";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompressSettings {
    pub(crate) enabled: Resolved<bool>,
    pub(crate) priority: Resolved<i64>,
    pub(crate) video_preset: Resolved<String>,
    /// CRF zero is a valid lossless request, hence `ZeroPolicy::Valid`.
    pub(crate) video_crf: Resolved<i64>,
    pub(crate) audio_bitrate: Resolved<String>,
    /// Target container; `None` keeps the input container.
    pub(crate) format: Resolved<Option<String>>,
    pub(crate) delete_original: Resolved<bool>,
}

impl CompressSettings {
    pub(crate) const DEFAULT_PRIORITY: i64 = 8;

    pub(crate) fn resolve(r: &Resolver<'_>) -> Self {
        let enabled = r.enabled(COMPRESSION_ENABLED, &[]);
        let on = enabled.value;

        Self {
            priority: r.integer_or(
                on,
                COMPRESSION_PRIORITY,
                None,
                ZeroPolicy::Unset,
                Self::DEFAULT_PRIORITY,
            ),
            video_preset: r.text_or(on, COMPRESSION_VIDEO_PRESET, None, "medium"),
            video_crf: r.integer_or(on, COMPRESSION_VIDEO_CRF, None, ZeroPolicy::Valid, 27),
            audio_bitrate: r.text_or(on, COMPRESSION_AUDIO_BITRATE, None, "128k"),
            format: r.text(on, COMPRESSION_FORMAT, None, None),
            delete_original: r.boolean(on, COMPRESSION_DELETE_ORIGINAL, None, false),
            enabled,
        }
    }
}
