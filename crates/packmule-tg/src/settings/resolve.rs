use super::index::parse_track_indices;
use super::source::{is_sentinel, parse_bool_token, ArgSource, SettingMap};
use serde_json::Value;

/// Which settings tier produced an effective value. The tag never affects
/// behavior; it exists for logs, the `/settings` view, and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum SourceTag {
    Arg,
    User,
    Owner,
    Default,
}

/// An effective setting value together with the tier that produced it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resolved<T> {
    pub(crate) value: T,
    pub(crate) source: SourceTag,
}

impl<T> Resolved<T> {
    pub(crate) fn arg(value: T) -> Self {
        Self { value, source: SourceTag::Arg }
    }

    pub(crate) fn user(value: T) -> Self {
        Self { value, source: SourceTag::User }
    }

    pub(crate) fn owner(value: T) -> Self {
        Self { value, source: SourceTag::Owner }
    }

    pub(crate) fn fallback(value: T) -> Self {
        Self { value, source: SourceTag::Default }
    }

    pub(crate) fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        Resolved {
            value: f(self.value),
            source: self.source,
        }
    }
}

/// Whether numeric zero counts as "unset" for a given key. The settings
/// surface is inconsistent about this on purpose: zero audio channels
/// means "don't touch the channel layout", while a zero CRF is a valid
/// lossless-encoding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ZeroPolicy {
    Unset,
    Valid,
}

/// The three settings tiers of one task. Holds references only: the user
/// snapshot and the owner map are shared and never mutated here.
#[derive(Clone, Copy)]
pub(crate) struct Resolver<'a> {
    pub(crate) args: &'a ArgSource,
    pub(crate) user: &'a SettingMap,
    pub(crate) owner: &'a SettingMap,
}

impl Resolver<'_> {
    /// Feature toggles use presence-in-map as "this tier has an opinion":
    /// a user who explicitly disabled a feature vetoes the owner default.
    pub(crate) fn toggle(&self, key: &str) -> Resolved<bool> {
        if let Some(value) = bool_of(self.user.get(key)) {
            return Resolved::user(value);
        }
        if let Some(value) = bool_of(self.owner.get(key)) {
            return Resolved::owner(value);
        }
        Resolved::fallback(false)
    }

    /// Feature-enabled state. Some invocation flags double as implicit
    /// enablers (the per-track index flags, `-del`): their bare presence
    /// with a usable value turns the feature on even when the user has
    /// it disabled.
    pub(crate) fn enabled(&self, key: &str, enabler_flags: &[&str]) -> Resolved<bool> {
        if enabler_flags.iter().any(|flag| self.args.enables(flag)) {
            return Resolved::arg(true);
        }
        self.toggle(key)
    }

    pub(crate) fn text(
        &self,
        enabled: bool,
        key: &str,
        flag: Option<&str>,
        default: Option<&str>,
    ) -> Resolved<Option<String>> {
        self.tiered(enabled, key, flag, |raw| Some(raw.to_owned()), text_of, default.map(str::to_owned))
    }

    pub(crate) fn text_or(
        &self,
        enabled: bool,
        key: &str,
        flag: Option<&str>,
        default: &str,
    ) -> Resolved<String> {
        self.text(enabled, key, flag, Some(default))
            .map(|value| value.unwrap_or_else(|| default.to_owned()))
    }

    pub(crate) fn integer(
        &self,
        enabled: bool,
        key: &str,
        flag: Option<&str>,
        zero: ZeroPolicy,
        default: Option<i64>,
    ) -> Resolved<Option<i64>> {
        self.tiered(
            enabled,
            key,
            flag,
            |raw| apply_zero_policy(raw.trim().parse().ok()?, zero),
            |value| int_of(value, zero),
            default,
        )
    }

    pub(crate) fn integer_or(
        &self,
        enabled: bool,
        key: &str,
        flag: Option<&str>,
        zero: ZeroPolicy,
        default: i64,
    ) -> Resolved<i64> {
        self.integer(enabled, key, flag, zero, Some(default))
            .map(|value| value.unwrap_or(default))
    }

    pub(crate) fn float_or(
        &self,
        enabled: bool,
        key: &str,
        flag: Option<&str>,
        zero: ZeroPolicy,
        default: f64,
    ) -> Resolved<f64> {
        self.tiered(
            enabled,
            key,
            flag,
            |raw| apply_zero_policy_f64(raw.trim().parse().ok()?, zero),
            |value| float_of(value, zero),
            Some(default),
        )
        .map(|value| value.unwrap_or(default))
    }

    /// Boolean sub-settings follow the toggle semantics (presence-in-map),
    /// gated by the feature-enabled state, with the arg tier on top.
    pub(crate) fn boolean(
        &self,
        enabled: bool,
        key: &str,
        flag: Option<&str>,
        default: bool,
    ) -> Resolved<bool> {
        if let Some(value) = flag.and_then(|flag| self.args.flag(flag)) {
            return Resolved::arg(value);
        }
        if !enabled {
            return Resolved::fallback(default);
        }
        if let Some(value) = bool_of(self.user.get(key)) {
            return Resolved::user(value);
        }
        if let Some(value) = bool_of(self.owner.get(key)) {
            return Resolved::owner(value);
        }
        Resolved::fallback(default)
    }

    /// Track-index settings carry the `all | n | n,m,...` mini-language.
    /// An empty resolved list means "all tracks".
    pub(crate) fn indices(&self, enabled: bool, key: &str, flag: Option<&str>) -> Resolved<Vec<u32>> {
        self.tiered(
            enabled,
            key,
            flag,
            |raw| Some(parse_track_indices(raw)),
            indices_of,
            None,
        )
        .map(Option::unwrap_or_default)
    }

    /// The one precedence rule; every typed getter above delegates here.
    ///
    /// 1. The invocation flag, when present with a usable value, wins
    ///    regardless of the feature-enabled state.
    /// 2. A disabled feature never consults the user/owner maps: stray
    ///    sub-setting values under a disabled toggle are ignored.
    /// 3. The user snapshot, under the sentinel/zero rules.
    /// 4. The owner config, under the same rules.
    /// 5. The built-in default.
    fn tiered<T>(
        &self,
        enabled: bool,
        key: &str,
        flag: Option<&str>,
        from_arg: impl Fn(&str) -> Option<T>,
        from_map: impl Fn(&Value) -> Option<T>,
        default: Option<T>,
    ) -> Resolved<Option<T>> {
        let arg_value = flag
            .and_then(|flag| self.args.text(flag))
            .and_then(|raw| from_arg(raw));
        if let Some(value) = arg_value {
            return Resolved::arg(Some(value));
        }
        if !enabled {
            return Resolved::fallback(default);
        }
        if let Some(value) = self.user.get(key).and_then(&from_map) {
            return Resolved::user(Some(value));
        }
        if let Some(value) = self.owner.get(key).and_then(&from_map) {
            return Resolved::owner(Some(value));
        }
        Resolved::fallback(default)
    }
}

fn bool_of(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(value) => Some(*value),
        Value::String(raw) => parse_bool_token(raw),
        _ => None,
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) if !is_sentinel(raw) => Some(raw.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn int_of(value: &Value, zero: ZeroPolicy) -> Option<i64> {
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(raw) if !is_sentinel(raw) => raw.trim().parse().ok(),
        _ => None,
    }?;
    apply_zero_policy(parsed, zero)
}

fn float_of(value: &Value, zero: ZeroPolicy) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) if !is_sentinel(raw) => raw.trim().parse().ok(),
        _ => None,
    }?;
    apply_zero_policy_f64(parsed, zero)
}

fn indices_of(value: &Value) -> Option<Vec<u32>> {
    match value {
        Value::String(raw) if !is_sentinel(raw) => Some(parse_track_indices(raw)),
        Value::Number(number) => Some(number.as_u64().map(|n| n as u32).into_iter().collect()),
        _ => None,
    }
}

fn apply_zero_policy(value: i64, zero: ZeroPolicy) -> Option<i64> {
    match zero {
        ZeroPolicy::Unset if value == 0 => None,
        _ => Some(value),
    }
}

fn apply_zero_policy_f64(value: f64, zero: ZeroPolicy) -> Option<f64> {
    match zero {
        ZeroPolicy::Unset if value == 0.0 => None,
        _ => Some(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::source::ArgValue;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> SettingMap {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), value.clone()))
            .collect()
    }

    #[test]
    fn arg_tier_always_wins() {
        let mut args = ArgSource::default();
        args.insert("-up", ArgValue::Text("rc:backup".to_owned()));
        let user = map(&[("DEFAULT_UPLOAD", json!("gd:user"))]);
        let owner = map(&[("DEFAULT_UPLOAD", json!("gd:owner"))]);
        let resolver = Resolver { args: &args, user: &user, owner: &owner };

        let resolved = resolver.text(true, "DEFAULT_UPLOAD", Some("-up"), None);
        assert_eq!(resolved.value.as_deref(), Some("rc:backup"));
        assert_eq!(resolved.source, SourceTag::Arg);
    }

    #[test]
    fn unset_toggle_ignores_stray_sub_settings() {
        let args = ArgSource::default();
        let user = map(&[("MERGE_OUTPUT_FORMAT_VIDEO", json!("webm"))]);
        let owner = map(&[]);
        let resolver = Resolver { args: &args, user: &user, owner: &owner };

        let enabled = resolver.enabled("MERGE_ENABLED", &[]);
        assert_eq!(enabled.value, false);
        assert_eq!(enabled.source, SourceTag::Default);

        let format = resolver.text_or(
            enabled.value,
            "MERGE_OUTPUT_FORMAT_VIDEO",
            None,
            "mkv",
        );
        assert_eq!(format.value, "mkv");
        assert_eq!(format.source, SourceTag::Default);
    }

    #[test]
    fn user_veto_beats_owner_enablement() {
        let args = ArgSource::default();
        let user = map(&[("WATERMARK_ENABLED", json!(false))]);
        let owner = map(&[("WATERMARK_ENABLED", json!(true))]);
        let resolver = Resolver { args: &args, user: &user, owner: &owner };

        let enabled = resolver.enabled("WATERMARK_ENABLED", &[]);
        assert_eq!(enabled.value, false);
        assert_eq!(enabled.source, SourceTag::User);
    }

    #[test]
    fn user_settings_beat_owner_settings() {
        let args = ArgSource::default();
        let user = map(&[("MERGE_ENABLED", json!(true)), ("MERGE_PRIORITY", json!(3))]);
        let owner = map(&[("MERGE_ENABLED", json!(false)), ("MERGE_PRIORITY", json!(9))]);
        let resolver = Resolver { args: &args, user: &user, owner: &owner };

        let enabled = resolver.enabled("MERGE_ENABLED", &[]);
        assert_eq!(enabled.value, true);
        assert_eq!(enabled.source, SourceTag::User);

        let priority = resolver.integer_or(true, "MERGE_PRIORITY", None, ZeroPolicy::Unset, 5);
        assert_eq!(priority.value, 3);
        assert_eq!(priority.source, SourceTag::User);
    }

    #[test]
    fn sentinel_user_value_falls_through_to_owner() {
        let args = ArgSource::default();
        let user = map(&[("CONVERT_VIDEO_FORMAT", json!("none"))]);
        let owner = map(&[("CONVERT_VIDEO_FORMAT", json!("mp4"))]);
        let resolver = Resolver { args: &args, user: &user, owner: &owner };

        let format = resolver.text(true, "CONVERT_VIDEO_FORMAT", None, None);
        assert_eq!(format.value.as_deref(), Some("mp4"));
        assert_eq!(format.source, SourceTag::Owner);
    }

    #[test]
    fn zero_policy_is_per_key() {
        let args = ArgSource::default();
        let user = map(&[
            ("CONVERT_AUDIO_CHANNELS", json!(0)),
            ("COMPRESSION_VIDEO_CRF", json!(0)),
        ]);
        let owner = map(&[("CONVERT_AUDIO_CHANNELS", json!(2))]);
        let resolver = Resolver { args: &args, user: &user, owner: &owner };

        // Zero channels is "unset": falls through to the owner tier
        let channels =
            resolver.integer(true, "CONVERT_AUDIO_CHANNELS", None, ZeroPolicy::Unset, None);
        assert_eq!(channels.value, Some(2));
        assert_eq!(channels.source, SourceTag::Owner);

        // Zero CRF is a valid lossless request
        let crf = resolver.integer_or(true, "COMPRESSION_VIDEO_CRF", None, ZeroPolicy::Valid, 27);
        assert_eq!(crf.value, 0);
        assert_eq!(crf.source, SourceTag::User);
    }
}
