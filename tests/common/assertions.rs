//! Custom assertion macros and response helpers

use axum_test::TestResponse;

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a string contains a substring
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "Expected '{}' to contain '{}'",
            $haystack,
            $needle
        );
    };
}

/// The `error` field of an error body
pub fn error_message(response: &TestResponse) -> String {
    let body: serde_json::Value = response.json();
    body["error"].as_str().unwrap_or_default().to_string()
}
