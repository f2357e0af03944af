//! Reserved record keys and synthetic keys for malformed input

/// Key of the capture time
pub const TIME_KEY: &str = "t";
/// Key of the level tag
pub const LEVEL_KEY: &str = "l";
/// Key of the logger name
pub const NAME_KEY: &str = "n";
/// Key of the message
pub const MESSAGE_KEY: &str = "m";
/// Key of a call stack captured together with an error value
pub const CALLSTACK_KEY: &str = "c";

/// Keys callers must never use
pub const RESERVED_KEYS: [&str; 5] = [TIME_KEY, LEVEL_KEY, NAME_KEY, MESSAGE_KEY, CALLSTACK_KEY];

/// Holds the raw arguments when a call has no value for its last key
pub const IMBALANCED_PAIRS_KEY: &str = "FIX_IMBALANCED_PAIRS";

/// Placeholder for a key that is not a string or is empty
pub fn bad_key_at_index(index: usize) -> String {
    format!("BAD_KEY_AT_INDEX_{}", index)
}

#[inline]
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}
