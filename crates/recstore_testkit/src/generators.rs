//! Property-based test generators using proptest.
//!
//! Provides strategies for records and filters that the server accepts.

use proptest::prelude::*;
use recstore_codec::{Record, Value};
use recstore_protocol::Filter;

/// Words used for text fields; small so equality filters hit often.
const WORDS: &[&str] = &["alpha", "beta", "gamma", "delta", "Chi", "church"];

/// Text fields of [`catalog_record_strategy`] records.
const TEXT_FIELDS: &[&str] = &["name", "type", "tag"];

/// Strategy for valid top-level field names.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,11}").expect("Invalid regex")
}

/// Strategy for text drawn from a small vocabulary.
pub fn word_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(WORDS).prop_map(str::to_string)
}

/// Strategy for arbitrary values, nesting records up to three levels.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Value::Integer),
        prop::string::string_regex("[ -~]{0,16}")
            .expect("Invalid regex")
            .prop_map(Value::Text),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec((field_name_strategy(), inner), 0..4)
            .prop_map(|pairs| Value::Record(pairs.into_iter().collect()))
    })
}

/// Strategy for arbitrary records.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    prop::collection::vec((field_name_strategy(), value_strategy()), 0..6)
        .prop_map(|pairs| pairs.into_iter().collect())
}

/// Strategy for records shaped like the sample data.
///
/// `name` and `type` are always text, `count` is an integer, and `tag` is
/// present in roughly half of the records.
pub fn catalog_record_strategy() -> impl Strategy<Value = Record> {
    (
        word_strategy(),
        word_strategy(),
        0i64..20,
        prop::option::of(word_strategy()),
    )
        .prop_map(|(name, kind, count, tag)| {
            let mut record = Record::new()
                .with("name", name)
                .with("type", kind)
                .with("count", count);
            if let Some(tag) = tag {
                record.insert("tag", tag);
            }
            record
        })
}

/// Strategy for filters over [`catalog_record_strategy`] records.
///
/// Pattern filters only target text fields, so evaluation never fails.
pub fn catalog_filter_strategy() -> impl Strategy<Value = Filter> {
    let leaf = prop_oneof![
        Just(Filter::all()),
        (prop::sample::select(TEXT_FIELDS), word_strategy())
            .prop_map(|(field, word)| Filter::equals(field, word)),
        (0i64..20).prop_map(|n| Filter::equals("count", n)),
        (
            prop::sample::select(TEXT_FIELDS),
            prop::string::string_regex("[a-z]{1,3}").expect("Invalid regex"),
        )
            .prop_map(|(field, fragment)| Filter::pattern(field, fragment)),
    ];
    prop::collection::vec(leaf, 1..3).prop_map(|filters| {
        filters
            .into_iter()
            .reduce(Filter::and)
            .unwrap_or_else(Filter::all)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use recstore_protocol::{validate_field_path, PatternSyntax};

    proptest! {
        #[test]
        fn field_names_are_valid(name in field_name_strategy()) {
            prop_assert!(validate_field_path(&name).is_ok());
        }

        #[test]
        fn catalog_filters_evaluate(
            record in catalog_record_strategy(),
            filter in catalog_filter_strategy()
        ) {
            let compiled = filter.compile(PatternSyntax::Regex).unwrap();
            prop_assert!(compiled.matches(&record).is_ok());
        }
    }
}
