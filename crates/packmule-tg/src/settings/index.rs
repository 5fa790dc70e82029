/// Parses the track-index mini-language: `all` (meaning every track,
/// represented as an empty list), a single index, or a comma-separated
/// list of indices.
///
/// Parsing is deliberately permissive: malformed tokens are dropped, never
/// raised. A value that yields no valid indices still counts as "present",
/// and downstream treats the empty list as "process all tracks".
pub(crate) fn parse_track_indices(raw: &str) -> Vec<u32> {
    if raw.trim().eq_ignore_ascii_case("all") {
        return Vec::new();
    }

    raw.split(',')
        .filter_map(|token| token.trim().parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_the_empty_list() {
        assert_eq!(parse_track_indices("all"), Vec::<u32>::new());
        assert_eq!(parse_track_indices(" All "), Vec::<u32>::new());
    }

    #[test]
    fn single_and_list() {
        assert_eq!(parse_track_indices("2"), vec![2]);
        assert_eq!(parse_track_indices("0, 3,5"), vec![0, 3, 5]);
    }

    #[test]
    fn malformed_tokens_are_dropped() {
        assert_eq!(parse_track_indices("1,2,x,3"), vec![1, 2, 3]);
        assert_eq!(parse_track_indices("x"), Vec::<u32>::new());
        assert_eq!(parse_track_indices("-1,4"), vec![4]);
    }

    #[test]
    fn parsing_is_idempotent() {
        let first = parse_track_indices("1,2,x,3");
        let rendered = first
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        assert_eq!(parse_track_indices(&rendered), first);
    }
}
