//! Error kinds and the positions they report.

use snakefmt_rs::{
    Error, FormattingErrorKind, Passthrough, PythonError, Span, format_str, parse_str,
};

fn kind_of(input: &str) -> (FormattingErrorKind, Span) {
    let err = format_str(input, &Passthrough).unwrap_err();
    (err.kind, err.span)
}

#[test]
fn spaces_in_tab_document() {
    let (kind, span) = kind_of("rule a:\n\tinput: 'x'\n    output: 'y'\n");
    assert!(matches!(kind, FormattingErrorKind::Indentation { .. }));
    assert_eq!(span.line, 3);
}

#[test]
fn tab_in_space_document() {
    let (kind, span) = kind_of("rule a:\n    input: 'x'\n\toutput: 'y'\n");
    assert!(matches!(kind, FormattingErrorKind::Indentation { .. }));
    assert_eq!(span.line, 3);
}

#[test]
fn rule_without_directives() {
    let (kind, span) = kind_of("x = 1\nrule a:\n");
    assert_eq!(
        kind,
        FormattingErrorKind::UnterminatedBlock {
            keyword: "rule".to_string()
        }
    );
    assert_eq!(span.line, 2);
}

#[test]
fn directive_without_value() {
    let (kind, span) = kind_of("rule a:\n    input:\n");
    assert_eq!(
        kind,
        FormattingErrorKind::UnterminatedBlock {
            keyword: "input".to_string()
        }
    );
    assert_eq!(span, Span::new(2, 5));
}

#[test]
fn unclosed_bracket_points_at_opener() {
    let (kind, span) = kind_of("rule a:\n    input: expand('a'\n");
    assert_eq!(kind, FormattingErrorKind::UnbalancedBracket { bracket: '(' });
    assert_eq!(span, Span::new(2, 18));
}

#[test]
fn mismatched_closer() {
    let (kind, span) = kind_of("rule a:\n    input: ['a')\n");
    assert_eq!(kind, FormattingErrorKind::UnbalancedBracket { bracket: ')' });
    assert_eq!(span, Span::new(2, 16));
}

#[test]
fn unterminated_string() {
    let (kind, span) = kind_of("rule a:\n    input: 'abc\n");
    assert_eq!(kind, FormattingErrorKind::UnterminatedString);
    assert_eq!(span, Span::new(2, 12));
}

#[test]
fn unknown_directive_in_rule() {
    let err = parse_str("rule a:\n    inptu: 'x'\n").unwrap_err();
    assert_eq!(
        err.kind,
        FormattingErrorKind::UnrecognizedKeywordSyntax {
            text: "inptu: 'x'".to_string(),
            context: "rule body",
        }
    );
    assert_eq!(
        err.to_string(),
        "unrecognized syntax in rule body: 'inptu: 'x'' at line 2, column 5"
    );
}

#[test]
fn python_statement_in_rule() {
    let (kind, span) = kind_of("rule a:\n    input: 'x'\n    x = 1\n");
    assert!(matches!(
        kind,
        FormattingErrorKind::UnrecognizedKeywordSyntax { .. }
    ));
    assert_eq!(span, Span::new(3, 5));
}

#[test]
fn module_directive_in_rule() {
    let (kind, _) = kind_of("rule a:\n    snakefile: 'x'\n");
    assert!(matches!(
        kind,
        FormattingErrorKind::UnrecognizedKeywordSyntax {
            context: "rule body",
            ..
        }
    ));
}

#[test]
fn invalid_python_reports_absolute_line() {
    let strict = |code: &str| match code.lines().position(|line| line.contains("= =")) {
        Some(index) => Err(PythonError::Syntax {
            line: index + 1,
            column: 5,
            message: "invalid syntax".to_string(),
        }),
        None => Ok(code.to_string()),
    };

    let err = format_str("configfile: 'c'\n\na = 1\nb = = 2\n", &strict).unwrap_err();
    assert_eq!(
        err.kind,
        FormattingErrorKind::InvalidPython {
            message: "invalid syntax".to_string(),
            first_line: 3,
            last_line: 4,
        }
    );
    assert_eq!(err.line(), 4);
    assert_eq!(
        err.to_string(),
        "invalid python in lines 3-4: invalid syntax at line 4, column 5"
    );
}

#[test]
fn formatter_missing() {
    let missing = |_: &str| Err::<String, _>(PythonError::Unavailable("black: not found".to_string()));
    let err = format_str("x = 1\n", &missing).unwrap_err();
    assert_eq!(
        err.kind,
        FormattingErrorKind::ExternalFormatter {
            message: "black: not found".to_string()
        }
    );
}

#[test]
fn unified_error_wraps_formatting_error() {
    let err: Error = parse_str("rule a:\n").unwrap_err().into();
    assert!(matches!(err, Error::Format(_)));
    assert_eq!(err.to_string(), "'rule' has no body at line 1, column 1");
}
