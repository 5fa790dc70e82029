use std::collections::HashMap;

/// Snapshot of one settings tier: either the per-user settings loaded from
/// the database at task start, or the process-wide owner defaults. Values
/// are heterogeneous (booleans, numbers, strings), hence raw JSON values.
pub(crate) type SettingMap = HashMap<String, serde_json::Value>;

/// The `"none"` sentinel (case-insensitive) and the empty string mean
/// "explicitly absent". Both fall through to the next settings tier,
/// exactly as if the key was missing from the map.
pub(crate) fn is_sentinel(raw: &str) -> bool {
    raw.is_empty() || raw.eq_ignore_ascii_case("none")
}

pub(crate) fn parse_bool_token(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "1" => Some(true),
        "f" | "false" | "n" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ArgValue {
    /// A boolean flag, e.g. `-del` / `-del f`
    Flag(bool),

    /// A flag carrying a textual value, e.g. `-up rc:backup`
    Text(String),
}

/// Per-invocation flags parsed from the chat command. Created per task and
/// discarded with it; the highest-priority settings tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ArgSource {
    values: HashMap<String, ArgValue>,
}

impl ArgSource {
    /// Later inserts overwrite earlier ones: last flag wins.
    pub(crate) fn insert(&mut self, flag: impl Into<String>, value: ArgValue) {
        self.values.insert(flag.into(), value);
    }

    /// Textual value of a flag, with the sentinel rules applied.
    pub(crate) fn text(&self, flag: &str) -> Option<&str> {
        match self.values.get(flag)? {
            ArgValue::Text(text) if !is_sentinel(text) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn flag(&self, flag: &str) -> Option<bool> {
        match self.values.get(flag)? {
            ArgValue::Flag(value) => Some(*value),
            ArgValue::Text(text) => parse_bool_token(text),
        }
    }

    /// Whether a flag that doubles as an implicit feature enabler is
    /// present with a usable value.
    pub(crate) fn enables(&self, flag: &str) -> bool {
        match self.values.get(flag) {
            Some(ArgValue::Flag(value)) => *value,
            Some(ArgValue::Text(text)) => !is_sentinel(text),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_values_are_absent() {
        let mut args = ArgSource::default();
        args.insert("-up", ArgValue::Text("none".to_owned()));
        args.insert("-n", ArgValue::Text(String::new()));

        // Present with a sentinel value falls through like a missing flag
        assert_eq!(args.text("-up"), None);
        assert_eq!(args.text("-n"), None);
        assert!(!args.enables("-up"));
    }

    #[test]
    fn last_insert_wins() {
        let mut args = ArgSource::default();
        args.insert("-up", ArgValue::Text("gd:old".to_owned()));
        args.insert("-up", ArgValue::Text("rc:new".to_owned()));

        assert_eq!(args.text("-up"), Some("rc:new"));
    }
}
