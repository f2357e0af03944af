//! Property-based tests for rust_kv_logger using proptest

use proptest::prelude::*;
use rust_kv_logger::core::keys::RESERVED_KEYS;
use rust_kv_logger::core::LevelMap;
use rust_kv_logger::prelude::*;
use serde_json::Value as Json;
use std::sync::Arc;

fn any_record_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
    ]
}

fn any_threshold() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::All),
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
        Just(LogLevel::Off),
    ]
}

/// Keys that are valid and never reserved: at least two characters
fn field_key() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{1,12}"
}

#[derive(Debug, Clone)]
enum Scalar {
    Int(i64),
    Uint(u64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    fn to_value(&self) -> Value {
        match self {
            Scalar::Int(i) => Value::from(*i),
            Scalar::Uint(u) => Value::from(*u),
            Scalar::Bool(b) => Value::from(*b),
            Scalar::Text(s) => Value::from(s.as_str()),
        }
    }

    fn to_json(&self) -> Json {
        match self {
            Scalar::Int(i) => Json::from(*i),
            Scalar::Uint(u) => Json::from(*u),
            Scalar::Bool(b) => Json::from(*b),
            Scalar::Text(s) => Json::from(s.as_str()),
        }
    }
}

fn scalar() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        any::<i64>().prop_map(Scalar::Int),
        any::<u64>().prop_map(Scalar::Uint),
        any::<bool>().prop_map(Scalar::Bool),
        any::<String>().prop_map(Scalar::Text),
    ]
}

fn format_json(args: &[Value]) -> String {
    let formatter = JsonFormatter::new("prop").with_timestamp(TimestampFormat::UnixMillis);
    let mut buf = Vec::new();
    formatter.format(&mut buf, LogLevel::Info, "m", args);
    String::from_utf8(buf).expect("records are UTF-8")
}

fn decode(line: &str) -> serde_json::Map<String, Json> {
    serde_json::from_str(line).expect("record should be valid JSON")
}

proptest! {
    /// Every field comes back with its key and an equivalent value
    #[test]
    fn test_fields_round_trip(
        fields in proptest::collection::btree_map(field_key(), scalar(), 0..8)
    ) {
        let mut args = Vec::new();
        for (key, value) in &fields {
            args.push(Value::from(key.as_str()));
            args.push(value.to_value());
        }

        let line = format_json(&args);
        prop_assert!(line.ends_with('\n'));
        prop_assert_eq!(line.matches('\n').count(), 1);

        let record = decode(&line);
        prop_assert_eq!(record.len(), fields.len() + 4);
        for (key, value) in &fields {
            prop_assert_eq!(&record[key.as_str()], &value.to_json());
        }
    }

    /// Any message survives escaping unchanged
    #[test]
    fn test_message_escaping(msg in any::<String>()) {
        let formatter = JsonFormatter::new("prop").with_timestamp(TimestampFormat::Unix);
        let mut buf = Vec::new();
        formatter.format(&mut buf, LogLevel::Warn, &msg, &[]);
        let record = decode(&String::from_utf8(buf).unwrap());
        prop_assert_eq!(record["m"].as_str(), Some(msg.as_str()));
    }

    /// Odd argument lists end up whole under the imbalanced pairs key
    #[test]
    fn test_odd_counts_imbalanced(
        values in proptest::collection::vec(scalar(), 0..6).prop_filter("odd", |v| v.len() % 2 == 1)
    ) {
        let args: Vec<Value> = values.iter().map(Scalar::to_value).collect();
        let record = decode(&format_json(&args));

        let expected: Vec<Json> = values.iter().map(Scalar::to_json).collect();
        prop_assert_eq!(&record["FIX_IMBALANCED_PAIRS"], &Json::Array(expected));
        prop_assert_eq!(record.len(), 5);
    }

    /// Integer keys are replaced by a placeholder naming their index
    #[test]
    fn test_non_string_keys(key in any::<i64>(), index in 0usize..4) {
        let mut args = Vec::new();
        for i in 0..4 {
            if i == index {
                args.push(Value::from(key));
            } else {
                args.push(Value::from(format!("k{}", i)));
            }
            args.push(Value::from(i as u64));
        }

        let record = decode(&format_json(&args));
        let placeholder = format!("BAD_KEY_AT_INDEX_{}", index * 2);
        prop_assert_eq!(&record[placeholder.as_str()], &Json::from(index as u64));
    }

    /// Calls below the threshold never reach the sink
    #[test]
    fn test_level_filtering(threshold in any_threshold(), level in any_record_level()) {
        let sink = MemorySink::new();
        let logger = DefaultLogger::builder("prop")
            .level(threshold)
            .sink(Arc::new(sink.clone()))
            .build();
        logger.log(level, "m", &[]);
        prop_assert_eq!(sink.len(), usize::from(level >= threshold));
    }

    /// Level tags parse back to the same level
    #[test]
    fn test_level_tag_roundtrip(level in any_threshold()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
        let lower: LogLevel = level.to_str().to_lowercase().parse().unwrap();
        prop_assert_eq!(level, lower);
    }

    /// Exact names win over wildcards whatever their position
    #[test]
    fn test_exact_beats_wildcard(name in "[a-z]{2,8}", exact_first in any::<bool>()) {
        let wildcard = format!("{}*=WRN", &name[..1]);
        let exact = format!("{}=DBG", name);
        let spec = if exact_first {
            format!("*=ERR,{},{}", exact, wildcard)
        } else {
            format!("*=ERR,{},{}", wildcard, exact)
        };
        let (map, diagnostics) = LevelMap::parse(&spec, false);
        prop_assert!(diagnostics.is_empty());
        prop_assert_eq!(map.resolve(&name), LogLevel::Debug);
    }
}

#[test]
fn test_reserved_keys_panic() {
    for key in RESERVED_KEYS {
        let result = std::panic::catch_unwind(|| format_json(&args![key, 1]));
        assert!(result.is_err(), "key {:?} should be rejected", key);
    }
}
