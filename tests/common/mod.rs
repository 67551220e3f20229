#![allow(dead_code)]

use snakefmt_rs::{Passthrough, format_str};

/// Format with embedded Python left as written.
pub fn fmt(input: &str) -> String {
    format_str(input, &Passthrough).unwrap_or_else(|e| panic!("format failed: {e}\n{input}"))
}

/// Format `input`, compare with `expected`, and check a second pass is
/// stable.
pub fn assert_formats_to(input: &str, expected: &str) {
    let output = fmt(input);
    assert_eq!(
        output, expected,
        "format mismatch:\n--- input ---\n{input}\n--- expected ---\n{expected}\n--- got ---\n{output}"
    );
    assert_idempotent(&output);
}

/// `format(format(s)) == format(s)`.
pub fn assert_idempotent(input: &str) {
    let once = fmt(input);
    let twice = fmt(&once);
    assert_eq!(
        once, twice,
        "not idempotent:\n--- first ---\n{once}\n--- second ---\n{twice}"
    );
}
