use super::source::{parse_bool_token, ArgSource, ArgValue};
use crate::prelude::*;

/// Flags that consume the next token as their value.
const VALUE_FLAGS: &[&str] = &[
    "-n",
    "-m",
    "-up",
    "-rcf",
    "-extract-video-index",
    "-extract-audio-index",
    "-extract-subtitle-index",
    "-extract-attachment-index",
    "-remove-video-index",
    "-remove-audio-index",
    "-remove-subtitle-index",
    "-remove-attachment-index",
    "-trim-start",
    "-trim-end",
    "-watermark-key",
    "-split-size",
];

/// Flags that are boolean: bare presence means `true`, and an optional
/// `t`/`f` token right after them flips the value explicitly.
const BOOL_FLAGS: &[&str] = &["-del"];

/// A parsed `/mirror` or `/leech` invocation: the non-flag payload (the
/// link or file reference) and the flag map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TaskArgs {
    pub(crate) payload: Option<String>,
    pub(crate) args: ArgSource,
}

/// Parses the free text after the command name. The grammar is a thin
/// convention: whitespace-separated tokens with shell-style quoting,
/// flags start with `-`, last flag wins, unknown flags are ignored.
pub(crate) fn parse_task_args(input: &str) -> TaskArgs {
    let tokens = shlex::split(input)
        .unwrap_or_else(|| input.split_whitespace().map(str::to_owned).collect());

    let mut payload_parts = Vec::new();
    let mut args = ArgSource::default();

    let mut tokens = tokens.into_iter().peekable();
    while let Some(token) = tokens.next() {
        if VALUE_FLAGS.contains(&token.as_str()) {
            match tokens.peek() {
                Some(next) if !is_flag_like(next) => {
                    let value = tokens.next().unwrap_or_default();
                    args.insert(token, ArgValue::Text(value));
                }
                _ => debug!(flag = %token, "Ignoring a value flag with no value"),
            }
        } else if BOOL_FLAGS.contains(&token.as_str()) {
            let explicit = tokens.peek().and_then(|next| parse_bool_token(next));
            let value = match explicit {
                Some(value) => {
                    tokens.next();
                    value
                }
                None => true,
            };
            args.insert(token, ArgValue::Flag(value));
        } else if is_flag_like(&token) {
            debug!(flag = %token, "Ignoring an unknown flag");
        } else {
            payload_parts.push(token);
        }
    }

    let payload = (!payload_parts.is_empty()).then(|| payload_parts.join(" "));

    TaskArgs { payload, args }
}

fn is_flag_like(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next() == Some('-') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_and_flags() {
        let parsed = parse_task_args("https://host/file.mkv -up rc:backup -del");

        assert_eq!(parsed.payload.as_deref(), Some("https://host/file.mkv"));
        assert_eq!(parsed.args.text("-up"), Some("rc:backup"));
        assert_eq!(parsed.args.flag("-del"), Some(true));
    }

    #[test]
    fn last_flag_wins() {
        let parsed = parse_task_args("link -up gd:first -up rc:second");

        assert_eq!(parsed.args.text("-up"), Some("rc:second"));
    }

    #[test]
    fn explicit_bool_tokens() {
        let parsed = parse_task_args("link -del f");
        assert_eq!(parsed.args.flag("-del"), Some(false));

        let parsed = parse_task_args("link -del t");
        assert_eq!(parsed.args.flag("-del"), Some(true));
    }

    #[test]
    fn quoted_values_survive() {
        let parsed = parse_task_args(r#"link -n "My File.mkv""#);

        assert_eq!(parsed.args.text("-n"), Some("My File.mkv"));
    }

    // The parser logs the flags it drops; `test_log` shows them on failure
    #[test_log::test]
    fn unknown_flags_are_ignored() {
        let parsed = parse_task_args("link -frobnicate -up gd:x");

        assert_eq!(parsed.payload.as_deref(), Some("link"));
        assert_eq!(parsed.args.text("-up"), Some("gd:x"));
    }

    #[test]
    fn comma_lists_are_passed_through_raw() {
        let parsed = parse_task_args("link -extract-audio-index 1,2,5");

        assert_eq!(parsed.args.text("-extract-audio-index"), Some("1,2,5"));
    }

    #[test_log::test]
    fn missing_value_is_ignored() {
        let parsed = parse_task_args("link -up");

        assert_eq!(parsed.args.text("-up"), None);
        assert!(!parsed.args.enables("-up"));
    }
}
