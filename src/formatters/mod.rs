//! Record formatters
//!
//! A formatter turns one call (level, message, key/value arguments) into one
//! newline-terminated record. Formatting never fails: malformed arguments
//! are made visible in the output and values that cannot be encoded fall
//! back to a textual description.

pub mod happy;
pub mod json;
pub mod text;

pub use happy::HappyFormatter;
pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::args;
use crate::core::callstack::CallstackResolver;
use crate::core::config::Settings;
use crate::core::internal::internal_log;
use crate::core::keys::{bad_key_at_index, is_reserved_key};
use crate::core::{LogLevel, Value};
use std::borrow::Cow;
use std::sync::Arc;

pub trait Formatter: Send + Sync {
    /// Append one record to `buf`
    fn format(&self, buf: &mut Vec<u8>, level: LogLevel, msg: &str, args: &[Value]);

    /// Kind name this formatter is registered under
    fn kind(&self) -> &str;
}

/// Builds a formatter for a logger name from the current settings
pub type FormatterFactory =
    Arc<dyn Fn(&str, &Settings, &Arc<CallstackResolver>) -> Arc<dyn Formatter> + Send + Sync>;

/// Factories of the formatter kinds that ship with the crate
pub fn builtin_factories() -> Vec<(&'static str, FormatterFactory)> {
    let happy: FormatterFactory = Arc::new(|name, settings, resolver| {
        Arc::new(HappyFormatter::from_settings(name, settings, Arc::clone(resolver)))
    });
    let json: FormatterFactory = Arc::new(|name, settings, _| {
        Arc::new(JsonFormatter::new(name).with_timestamp(settings.format.timestamp.clone()))
    });
    let text: FormatterFactory = Arc::new(|name, settings, _| {
        Arc::new(TextFormatter::new(name).with_timestamp(settings.format.timestamp.clone()))
    });
    vec![
        (crate::core::config::HAPPY_FORMAT, happy),
        (crate::core::config::JSON_FORMAT, json),
        (crate::core::config::TEXT_FORMAT, text),
    ]
}

/// Caller fields of one record after validating the argument list
#[derive(Debug)]
pub enum Fields<'a> {
    /// Key/value pairs in call order
    Pairs(Vec<(Cow<'a, str>, &'a Value)>),
    /// Odd argument count: the whole raw list
    Imbalanced(&'a [Value]),
}

impl<'a> Fields<'a> {
    /// Validate the arguments of a call.
    ///
    /// A key that is not a string is reported through the internal logger
    /// and, like an empty key, shown as `BAD_KEY_AT_INDEX_<i>`. A key equal
    /// to a reserved key is fatal.
    pub fn extract(args: &'a [Value], formatter: &str) -> Self {
        if args.len() % 2 != 0 {
            return Fields::Imbalanced(args);
        }

        let mut pairs = Vec::with_capacity(args.len() / 2);
        for (index, pair) in args.chunks_exact(2).enumerate() {
            let i = index * 2;
            let key = match &pair[0] {
                Value::Str(key) if key.is_empty() => Cow::Owned(bad_key_at_index(i)),
                Value::Str(key) => {
                    if is_reserved_key(key) {
                        internal_log().fatal(
                            "Key conflicts with reserved key. Avoid using single letter keys.",
                            &args!["key", key.as_str(), "formatter", formatter],
                        );
                    }
                    Cow::Borrowed(key.as_str())
                }
                other => {
                    internal_log().error(
                        "Key is not a string.",
                        &args![
                            "err",
                            format!("args[{}]={}", i, other),
                            "formatter",
                            formatter
                        ],
                    );
                    Cow::Owned(bad_key_at_index(i))
                }
            };
            pairs.push((key, &pair[1]));
        }
        Fields::Pairs(pairs)
    }
}

/// Keys of the caller's fields in call order, as they appear in the record
pub fn field_order(args: &[Value]) -> Vec<String> {
    if args.len() % 2 != 0 {
        return vec![crate::core::keys::IMBALANCED_PAIRS_KEY.to_string()];
    }
    args.chunks_exact(2)
        .enumerate()
        .map(|(index, pair)| match pair[0].as_key() {
            Some(key) => key.to_string(),
            None => bad_key_at_index(index * 2),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_pairs() {
        let values = args!["user", "ann", "", 1];
        match Fields::extract(&values, "test") {
            Fields::Pairs(pairs) => {
                assert_eq!(pairs.len(), 2);
                assert_eq!(pairs[0].0, "user");
                assert_eq!(pairs[1].0, "BAD_KEY_AT_INDEX_2");
            }
            other => panic!("expected pairs, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_imbalanced() {
        let values = args!["user", "ann", "dangling"];
        assert!(matches!(
            Fields::extract(&values, "test"),
            Fields::Imbalanced(raw) if raw.len() == 3
        ));
    }

    #[test]
    #[should_panic]
    fn test_extract_reserved_key_is_fatal() {
        let values = args!["m", "overwritten"];
        let _ = Fields::extract(&values, "test");
    }

    #[test]
    fn test_field_order() {
        assert_eq!(field_order(&args!["b", 1, "a", 2]), vec!["b", "a"]);
        assert_eq!(field_order(&args![3, 1]), vec!["BAD_KEY_AT_INDEX_0"]);
        assert_eq!(field_order(&args!["a"]), vec!["FIX_IMBALANCED_PAIRS"]);
        assert!(field_order(&[]).is_empty());
    }
}
