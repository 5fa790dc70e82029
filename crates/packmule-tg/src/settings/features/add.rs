use crate::settings::{Resolved, Resolver, ZeroPolicy};

pub(crate) const ADD_ENABLED: &str = "ADD_ENABLED";
pub(crate) const ADD_PRIORITY: &str = "ADD_PRIORITY";
pub(crate) const ADD_VIDEO_INDEX: &str = "ADD_VIDEO_INDEX";
pub(crate) const ADD_AUDIO_INDEX: &str = "ADD_AUDIO_INDEX";
pub(crate) const ADD_SUBTITLE_INDEX: &str = "ADD_SUBTITLE_INDEX";
pub(crate) const ADD_ATTACHMENT_INDEX: &str = "ADD_ATTACHMENT_INDEX";
pub(crate) const ADD_PRESERVE: &str = "ADD_PRESERVE";
pub(crate) const ADD_REPLACE: &str = "ADD_REPLACE";
pub(crate) const ADD_DELETE_ORIGINAL: &str = "ADD_DELETE_ORIGINAL";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AddSettings {
    pub(crate) enabled: Resolved<bool>,
    pub(crate) priority: Resolved<i64>,
    /// Insert positions for donor tracks. Position zero is valid: it means
    /// "insert before the existing tracks".
    pub(crate) video_index: Resolved<Option<i64>>,
    pub(crate) audio_index: Resolved<Option<i64>>,
    pub(crate) subtitle_index: Resolved<Option<i64>>,
    pub(crate) attachment_index: Resolved<Option<i64>>,
    pub(crate) preserve: Resolved<bool>,
    pub(crate) replace: Resolved<bool>,
    pub(crate) delete_original: Resolved<bool>,
}

impl AddSettings {
    pub(crate) const DEFAULT_PRIORITY: i64 = 3;

    pub(crate) fn resolve(r: &Resolver<'_>) -> Self {
        let enabled = r.enabled(ADD_ENABLED, &[]);
        let on = enabled.value;

        Self {
            priority: r.integer_or(
                on,
                ADD_PRIORITY,
                None,
                ZeroPolicy::Unset,
                Self::DEFAULT_PRIORITY,
            ),
            video_index: r.integer(on, ADD_VIDEO_INDEX, None, ZeroPolicy::Valid, None),
            audio_index: r.integer(on, ADD_AUDIO_INDEX, None, ZeroPolicy::Valid, None),
            subtitle_index: r.integer(on, ADD_SUBTITLE_INDEX, None, ZeroPolicy::Valid, None),
            attachment_index: r.integer(on, ADD_ATTACHMENT_INDEX, None, ZeroPolicy::Valid, None),
            preserve: r.boolean(on, ADD_PRESERVE, None, false),
            replace: r.boolean(on, ADD_REPLACE, None, false),
            delete_original: r.boolean(on, ADD_DELETE_ORIGINAL, None, false),
            enabled,
        }
    }
}
