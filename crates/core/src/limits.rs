//! Size limits enforced at the boundary between callers and the engine.

/// Maximum length of a single value, in bytes.
///
/// One below `u32::MAX` so that [`crate::types::MISSING_VALUE_LENGTH`]
/// remains a length no real value can ever reach.
pub const MAX_VALUE_LEN: u64 = (u32::MAX as u64) - 1;

/// Maximum number of tasks accepted in a single batched call.
///
/// Purely a sanity bound to keep a misbehaving caller from requesting an
/// allocation large enough to exhaust memory; batches below this limit are
/// never rejected for size alone.
pub const MAX_BATCH_TASKS: usize = 16 * 1024 * 1024;

/// Maximum byte length of a collection name.
pub const MAX_COLLECTION_NAME_LEN: usize = 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_value_len_leaves_missing_length_unreachable() {
        assert_eq!(MAX_VALUE_LEN, u32::MAX as u64 - 1);
        assert!(MAX_VALUE_LEN < u32::MAX as u64);
    }
}
