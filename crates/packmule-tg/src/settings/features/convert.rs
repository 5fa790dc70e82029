use crate::settings::{Resolved, Resolver, ZeroPolicy};

pub(crate) const CONVERT_ENABLED: &str = "CONVERT_ENABLED";
pub(crate) const CONVERT_PRIORITY: &str = "CONVERT_PRIORITY";
pub(crate) const CONVERT_VIDEO_FORMAT: &str = "CONVERT_VIDEO_FORMAT";
pub(crate) const CONVERT_AUDIO_FORMAT: &str = "CONVERT_AUDIO_FORMAT";
pub(crate) const CONVERT_AUDIO_CHANNELS: &str = "CONVERT_AUDIO_CHANNELS";
pub(crate) const CONVERT_AUDIO_SAMPLING: &str = "CONVERT_AUDIO_SAMPLING";
pub(crate) const CONVERT_DELETE_ORIGINAL: &str = "CONVERT_DELETE_ORIGINAL";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ConvertSettings {
    pub(crate) enabled: Resolved<bool>,
    pub(crate) priority: Resolved<i64>,
    /// Target container for video inputs; `None` leaves video files alone.
    pub(crate) video_format: Resolved<Option<String>>,
    /// Target container for audio inputs; `None` leaves audio files alone.
    pub(crate) audio_format: Resolved<Option<String>>,
    /// Zero channels means "keep the channel layout".
    pub(crate) audio_channels: Resolved<Option<i64>>,
    /// Zero sampling rate means "keep the sampling rate".
    pub(crate) audio_sampling: Resolved<Option<i64>>,
    pub(crate) delete_original: Resolved<bool>,
}

impl ConvertSettings {
    pub(crate) const DEFAULT_PRIORITY: i64 = 7;

    pub(crate) fn resolve(r: &Resolver<'_>) -> Self {
        let enabled = r.enabled(CONVERT_ENABLED, &[]);
        let on = enabled.value;

        Self {
            priority: r.integer_or(
                on,
                CONVERT_PRIORITY,
                None,
                ZeroPolicy::Unset,
                Self::DEFAULT_PRIORITY,
            ),
            video_format: r.text(on, CONVERT_VIDEO_FORMAT, None, None),
            audio_format: r.text(on, CONVERT_AUDIO_FORMAT, None, None),
            audio_channels: r.integer(on, CONVERT_AUDIO_CHANNELS, None, ZeroPolicy::Unset, None),
            audio_sampling: r.integer(on, CONVERT_AUDIO_SAMPLING, None, ZeroPolicy::Unset, None),
            delete_original: r.boolean(on, CONVERT_DELETE_ORIGINAL, None, false),
            enabled,
        }
    }
}
