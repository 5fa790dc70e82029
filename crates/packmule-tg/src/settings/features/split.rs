use crate::settings::{Resolved, Resolver, ZeroPolicy};

pub(crate) const LEECH_SPLIT_SIZE: &str = "LEECH_SPLIT_SIZE";
pub(crate) const EQUAL_SPLITS: &str = "EQUAL_SPLITS";

/// Telegram bot API caps uploads at 2 GiB.
pub(crate) const MAX_SPLIT_SIZE: i64 = 2 * 1024 * 1024 * 1024;

/// Splitting is not a toggled feature: it always applies to leech uploads
/// that exceed the size cap, so its settings resolve unconditionally.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SplitSettings {
    pub(crate) split_size: Resolved<i64>,
    /// Split into equal parts instead of maximal chunks.
    pub(crate) equal_splits: Resolved<bool>,
}

impl SplitSettings {
    pub(crate) const DEFAULT_PRIORITY: i64 = 9;

    pub(crate) fn resolve(r: &Resolver<'_>) -> Self {
        let split_size = r
            .integer_or(
                true,
                LEECH_SPLIT_SIZE,
                Some("-split-size"),
                ZeroPolicy::Unset,
                MAX_SPLIT_SIZE,
            )
            .map(|size| size.clamp(1, MAX_SPLIT_SIZE));

        Self {
            split_size,
            equal_splits: r.boolean(true, EQUAL_SPLITS, None, false),
        }
    }
}
