use crate::settings::{Resolved, Resolver, ZeroPolicy};

pub(crate) const WATERMARK_ENABLED: &str = "WATERMARK_ENABLED";
pub(crate) const WATERMARK_PRIORITY: &str = "WATERMARK_PRIORITY";
pub(crate) const WATERMARK_KEY: &str = "WATERMARK_KEY";
pub(crate) const WATERMARK_POSITION: &str = "WATERMARK_POSITION";
pub(crate) const WATERMARK_SIZE: &str = "WATERMARK_SIZE";
pub(crate) const WATERMARK_OPACITY: &str = "WATERMARK_OPACITY";
pub(crate) const WATERMARK_THREADING: &str = "WATERMARK_THREADING";
pub(crate) const WATERMARK_REMOVE_ORIGINAL: &str = "WATERMARK_REMOVE_ORIGINAL";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WatermarkSettings {
    pub(crate) enabled: Resolved<bool>,
    pub(crate) priority: Resolved<i64>,
    /// The text stamped over the video. No key means the stage is
    /// inapplicable even when enabled.
    pub(crate) key: Resolved<Option<String>>,
    pub(crate) position: Resolved<String>,
    pub(crate) size: Resolved<i64>,
    pub(crate) opacity: Resolved<f64>,
    pub(crate) threading: Resolved<bool>,
    pub(crate) remove_original: Resolved<bool>,
}

impl WatermarkSettings {
    pub(crate) const DEFAULT_PRIORITY: i64 = 6;

    pub(crate) fn resolve(r: &Resolver<'_>) -> Self {
        let enabled = r.enabled(WATERMARK_ENABLED, &[]);
        let on = enabled.value;

        Self {
            priority: r.integer_or(
                on,
                WATERMARK_PRIORITY,
                None,
                ZeroPolicy::Unset,
                Self::DEFAULT_PRIORITY,
            ),
            key: r.text(on, WATERMARK_KEY, Some("-watermark-key"), None),
            position: r.text_or(on, WATERMARK_POSITION, None, "top_left"),
            size: r.integer_or(on, WATERMARK_SIZE, None, ZeroPolicy::Unset, 20),
            // Zero opacity is a valid (if pointless) fully-transparent stamp
            opacity: r.float_or(on, WATERMARK_OPACITY, None, ZeroPolicy::Valid, 1.0),
            threading: r.boolean(on, WATERMARK_THREADING, None, true),
            remove_original: r.boolean(on, WATERMARK_REMOVE_ORIGINAL, None, false),
            enabled,
        }
    }
}
