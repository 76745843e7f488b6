//! Test fixtures and constants.

/// A valid age public key nobody in the tests holds the secret for.
pub const BOB_PUBLIC_KEY: &str = "age1ql3z7hjy54pw3hyww5ayyfg7zqgvc7w3j2elw8zmrj2kg5sfn9aqmcac8p";

/// A recipient id no backend can resolve.
pub const INVALID_PUBLIC_KEY: &str = "not-a-valid-age-key";

/// Entries used across tests.
pub const STANDARD_ENTRIES: &[(&str, &str)] = &[
    ("web/github", "gh-token-123"),
    ("web/gitlab", "gl-token-456"),
    ("db/postgres", "postgres://localhost/mydb"),
    ("email", "hunter2"),
];
