//! Property-based tests with proptest.
//!
//! Generate random workflow files out of code, comments, top-level
//! directives and rules, written with random indentation and spacing,
//! and check that formatting reaches a fixed point after one pass.

use proptest::prelude::*;
use snakefmt_rs::{Keyword, Passthrough, format_str, parse_str};

// -- Leaf strategies --

/// Parameter value: strings in either quote style, identifiers, numbers,
/// lists, or a lambda whose commas must not split.
fn value() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(|s| format!("'{s}.txt'")),
        "[a-z]{1,8}".prop_map(|s| format!("\"{s}\"")),
        "[a-z]{1,5}".prop_map(|s| format!("v_{s}")),
        (0u16..1000).prop_map(|n| n.to_string()),
        prop::collection::vec("[a-z]{1,5}", 1..=3).prop_map(|items| {
            let quoted: Vec<String> = items.iter().map(|i| format!("'{i}'")).collect();
            format!("[{}]", quoted.join(", "))
        }),
        Just("lambda wc, attempt: attempt * 2".to_string()),
    ]
}

fn parameter() -> impl Strategy<Value = String> {
    (prop::option::of("[a-z]{1,6}"), value()).prop_map(|(name, value)| match name {
        Some(name) => format!("n_{name} = {value}"),
        None => value,
    })
}

fn directive_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "input", "output", "params", "log", "threads", "resources", "shell", "message",
    ])
}

#[derive(Debug, Clone)]
struct Directive {
    name: &'static str,
    params: Vec<String>,
    multiline: bool,
}

fn directive() -> impl Strategy<Value = Directive> {
    (
        directive_name(),
        prop::collection::vec(parameter(), 1..=3),
        any::<bool>(),
    )
        .prop_map(|(name, params, multiline)| Directive {
            name,
            params,
            multiline,
        })
}

#[derive(Debug, Clone)]
enum Item {
    Code(String),
    Nested(String),
    Comment(String),
    Configfile(String),
    Rule {
        keyword: &'static str,
        name: String,
        directives: Vec<Directive>,
        comment: Option<String>,
        run: bool,
    },
}

fn item() -> impl Strategy<Value = Item> {
    prop_oneof![
        1 => ("[a-z]{1,4}", 0u16..1000).prop_map(|(n, v)| Item::Code(format!("x_{n} = {v}"))),
        1 => "[a-z]{1,4}".prop_map(|n| Item::Nested(format!("c_{n}"))),
        1 => "[a-z]{0,10}".prop_map(|c| Item::Comment(format!("# {c}"))),
        1 => "[a-z]{1,8}".prop_map(|s| Item::Configfile(format!("'{s}.yaml'"))),
        3 => (
            prop::sample::select(vec!["rule", "checkpoint"]),
            "[a-z][a-z0-9_]{0,8}",
            prop::collection::vec(directive(), 1..=4),
            prop::option::of("[a-z]{1,8}".prop_map(|c| format!("# {c}"))),
            any::<bool>(),
        )
            .prop_map(|(keyword, name, directives, comment, run)| Item::Rule {
                keyword,
                name,
                directives,
                comment,
                run,
            }),
    ]
}

fn indent_unit() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["\t", "  ", "    "])
}

fn snakefile() -> impl Strategy<Value = String> {
    (
        indent_unit(),
        prop::collection::vec((0usize..=3, item()), 0..=8),
    )
        .prop_map(|(unit, items)| render(unit, &items))
}

fn render(unit: &str, items: &[(usize, Item)]) -> String {
    let mut out = String::new();
    for (blanks, item) in items {
        out.push_str(&"\n".repeat(*blanks));
        match item {
            Item::Code(line) | Item::Comment(line) => {
                out.push_str(line);
                out.push('\n');
            }
            Item::Nested(name) => {
                out.push_str(&format!("if {name}:\n{unit}{name} = 1\n"));
            }
            Item::Configfile(value) => out.push_str(&format!("configfile: {value}\n")),
            Item::Rule {
                keyword,
                name,
                directives,
                comment,
                run,
            } => {
                out.push_str(&format!("{keyword} {name}:\n"));
                if let Some(comment) = comment {
                    out.push_str(&format!("{unit}{comment}\n"));
                }
                for directive in directives {
                    if directive.multiline {
                        out.push_str(&format!("{unit}{}:\n", directive.name));
                        for param in &directive.params {
                            out.push_str(&format!("{unit}{unit}{param},\n"));
                        }
                    } else {
                        out.push_str(&format!(
                            "{unit}{}: {}\n",
                            directive.name,
                            directive.params.join(", ")
                        ));
                    }
                }
                if *run {
                    out.push_str(&format!("{unit}run:\n{unit}{unit}y = 1\n{unit}{unit}print(y)\n"));
                }
            }
        }
    }
    out
}

fn rule_count(items: &str) -> usize {
    parse_str(items).map_or(0, |file| {
        file.blocks(Keyword::Rule).count() + file.blocks(Keyword::Checkpoint).count()
    })
}

proptest! {
    /// Formatting is idempotent: format(format(x)) == format(x).
    #[test]
    fn format_idempotent(source in snakefile()) {
        let once = format_str(&source, &Passthrough).map_err(|e| {
            TestCaseError::fail(std::format!("format error: {e}\n--- input ---\n{source}"))
        })?;
        let twice = format_str(&once, &Passthrough).map_err(|e| {
            TestCaseError::fail(std::format!("reformat error: {e}\n--- output ---\n{once}"))
        })?;
        prop_assert_eq!(once, twice);
    }

    /// Output is empty or ends with exactly one newline.
    #[test]
    fn output_ends_with_one_newline(source in snakefile()) {
        let output = format_str(&source, &Passthrough).unwrap();
        prop_assert!(output.is_empty() || (output.ends_with('\n') && !output.ends_with("\n\n")));
    }

    /// Rules and checkpoints survive formatting.
    #[test]
    fn rule_count_preserved(source in snakefile()) {
        let output = format_str(&source, &Passthrough).unwrap();
        prop_assert_eq!(rule_count(&source), rule_count(&output));
    }
}
