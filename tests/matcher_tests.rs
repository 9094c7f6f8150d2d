//! Integration tests for the expect/matcher API and deep equality

use quicksuite::{expect, Value};
use serde::Serialize;
use std::collections::BTreeMap;

fn record() -> Value {
    Value::object([
        ("a", Value::from(1)),
        ("b", Value::array([1, 2, 3])),
    ])
}

mod equality {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_structurally_equal_objects() {
        let expected = Value::object([
            ("b", Value::array([1, 2, 3])),
            ("a", Value::from(1)),
        ]);
        assert!(expect(record()).to_be_equal(expected).is_ok());
    }

    #[test]
    fn test_nested_difference_is_reported() {
        let expected = Value::object([
            ("a", Value::from(1)),
            ("b", Value::array([1, 2, 4])),
        ]);
        let failure = expect(record()).to_be_equal(expected.clone()).unwrap_err();
        assert_eq!(failure.matcher_name(), "to_be_equal");
        assert_eq!(failure.expected(), Some(&expected));
        assert!(failure.message().contains(".b[2]"));
        assert!(expect(record()).to_be_not_equal(expected).is_ok());
    }

    #[test]
    fn test_nan_equals_nan() {
        assert!(expect(f64::NAN).to_be_equal(f64::NAN).is_ok());
        assert!(expect(vec![f64::NAN]).to_be_equal(vec![f64::NAN]).is_ok());
    }

    #[test]
    fn test_type_mismatch_is_unequal() {
        assert!(expect("1").to_be_equal(1).is_err());
        assert!(expect(Value::Null).to_be_equal(Value::Undefined).is_err());
        assert!(expect(vec![1]).to_be_equal(Value::object([("0", 1)])).is_err());
    }

    #[test]
    fn test_missing_key_is_unequal() {
        let partial = Value::object([("a", 1)]);
        assert!(expect(record()).to_be_equal(partial.clone()).is_err());
        assert!(expect(partial).to_be_equal(record()).is_err());
    }

    #[test]
    fn test_serializable_structs_compare_deeply() {
        #[derive(Serialize)]
        struct Point {
            x: i32,
            y: i32,
        }

        let point = Value::from_serialize(&Point { x: 1, y: 2 }).unwrap();
        let mut expected = BTreeMap::new();
        expected.insert("x".to_string(), 1);
        expected.insert("y".to_string(), 2);
        assert!(expect(point).to_be_equal(expected).is_ok());
    }
}

mod length_and_contents {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_have_length() {
        assert!(expect(vec![1, 2, 3]).to_have_length(3).is_ok());
        assert!(expect("héllo").to_have_length(5).is_ok());

        let failure = expect(vec![1, 2, 3]).to_have_length(2).unwrap_err();
        assert_eq!(failure.matcher_name(), "to_have_length");
        assert_eq!(failure.message(), "expected length 2, got 3");

        assert!(expect(42).to_have_length(0).is_err());
    }

    #[test]
    fn test_to_contain_array_uses_deep_equality() {
        let items = Value::array([Value::array([1, 2]), Value::from("x")]);
        assert!(expect(items.clone()).to_contain(vec![1, 2]).is_ok());
        assert!(expect(items.clone()).to_contain("x").is_ok());
        assert!(expect(items).to_contain(3).is_err());
    }

    #[test]
    fn test_to_contain_string_is_substring() {
        assert!(expect("hello world").to_contain("o w").is_ok());
        assert!(expect("hello world").to_contain("xyz").is_err());
        assert!(expect("hello").to_contain(1).is_err());
        assert!(expect(5).to_contain(5).is_err());
    }

    #[test]
    fn test_to_match() {
        assert!(expect("2024-01-31").to_match(r"^\d{4}-\d{2}-\d{2}$").is_ok());
        assert!(expect("nope").to_match(r"^\d+$").is_err());
        assert!(expect(12).to_match(r"\d").is_err());
        assert!(expect("x").to_match("(").is_err());
    }
}

mod predicates {
    use super::*;

    #[test]
    fn test_truthiness() {
        for falsy in [
            Value::from(false),
            Value::from(0),
            Value::from(f64::NAN),
            Value::from(""),
            Value::Null,
            Value::Undefined,
        ] {
            assert!(expect(falsy.clone()).to_be_falsy().is_ok(), "{}", falsy);
            assert!(expect(falsy).to_be_truthy().is_err());
        }
        for truthy in [
            Value::from(true),
            Value::from(-1),
            Value::from("0"),
            Value::array(Vec::<i32>::new()),
            Value::object(Vec::<(String, i32)>::new()),
        ] {
            assert!(expect(truthy.clone()).to_be_truthy().is_ok(), "{}", truthy);
        }
    }

    #[test]
    fn test_null_and_defined() {
        assert!(expect(Value::Null).to_be_null().is_ok());
        assert!(expect(Value::Null).to_be_defined().is_ok());
        assert!(expect(Value::Undefined).to_be_not_null().is_ok());
        assert!(expect(Value::Undefined).to_be_undefined().is_ok());
        assert!(expect(Value::Undefined).to_be_defined().is_err());
        assert!(expect(None::<i32>).to_be_null().is_ok());
        assert!(expect(Some(3)).to_be_not_null().is_ok());
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(expect(3).to_be_greater_than(2).is_ok());
        assert!(expect(2).to_be_greater_than(2).is_err());
        assert!(expect(1.5).to_be_less_than(2).is_ok());
        assert!(expect("3").to_be_greater_than(2).is_err());
        assert!(expect(f64::NAN).to_be_less_than(1).is_err());
        assert!(expect(f64::NAN).to_be_nan().is_ok());
        assert!(expect(1).to_be_nan().is_err());
    }
}

mod failures {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_failure_display_shows_both_sides() {
        let failure = expect(vec![1, 2]).to_be_equal(vec![1, 3]).unwrap_err();
        let text = failure.to_string();
        assert!(text.starts_with("to_be_equal: "));
        assert!(text.contains("Expected: [1, 3]"));
        assert!(text.contains("Received: [1, 2]"));
    }

    #[test]
    fn test_failure_propagates_through_anyhow() {
        fn body() -> quicksuite::Outcome {
            expect(true).to_be_falsy()?;
            Ok(())
        }
        let err = body().unwrap_err();
        let failure = err.downcast_ref::<quicksuite::MatcherFailure>().unwrap();
        assert_eq!(failure.matcher_name(), "to_be_falsy");
        assert_eq!(failure.received(), &Value::from(true));
    }
}
