use crate::settings::{Resolved, Resolver, ZeroPolicy};

pub(crate) const TRIM_ENABLED: &str = "TRIM_ENABLED";
pub(crate) const TRIM_PRIORITY: &str = "TRIM_PRIORITY";
pub(crate) const TRIM_START_TIME: &str = "TRIM_START_TIME";
pub(crate) const TRIM_END_TIME: &str = "TRIM_END_TIME";
pub(crate) const TRIM_DELETE_ORIGINAL: &str = "TRIM_DELETE_ORIGINAL";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrimSettings {
    pub(crate) enabled: Resolved<bool>,
    pub(crate) priority: Resolved<i64>,
    /// `HH:MM:SS` or plain seconds; both are passed to the tool verbatim.
    pub(crate) start_time: Resolved<Option<String>>,
    pub(crate) end_time: Resolved<Option<String>>,
    pub(crate) delete_original: Resolved<bool>,
}

impl TrimSettings {
    pub(crate) const DEFAULT_PRIORITY: i64 = 4;

    pub(crate) fn resolve(r: &Resolver<'_>) -> Self {
        let enabled = r.enabled(TRIM_ENABLED, &["-trim-start", "-trim-end"]);
        let on = enabled.value;

        Self {
            priority: r.integer_or(
                on,
                TRIM_PRIORITY,
                None,
                ZeroPolicy::Unset,
                Self::DEFAULT_PRIORITY,
            ),
            start_time: r.text(on, TRIM_START_TIME, Some("-trim-start"), None),
            end_time: r.text(on, TRIM_END_TIME, Some("-trim-end"), None),
            delete_original: r.boolean(on, TRIM_DELETE_ORIGINAL, None, false),
            enabled,
        }
    }
}
