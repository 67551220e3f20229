//! Parser-specific tests: tree shape and line ownership.

use snakefmt_rs::{Body, IndentUnit, Keyword, Segment, parse_str};

#[test]
fn rule_with_directives() {
    let file = parse_str("rule map:\n    input: 'a', 'b'\n    output: 'c'\n").expect("should parse");
    assert_eq!(file.roots.len(), 1);

    let rule = file.find(Keyword::Rule, "map").expect("rule map");
    assert_eq!(rule.depth, 0);
    let Body::Block(children) = &rule.body else {
        panic!("expected block body");
    };
    assert_eq!(children.len(), 2);

    let input = file.directive(rule, Keyword::Input).expect("input");
    let values: Vec<String> = input
        .parameters()
        .expect("parameters")
        .parameters()
        .map(|p| p.value_text())
        .collect();
    assert_eq!(values, vec!["\"a\"", "\"b\""]);
    assert_eq!(input.depth, 1);
}

#[test]
fn parent_links_point_up() {
    let file = parse_str("rule a:\n    run:\n        x = 1\n").expect("should parse");
    let rule_id = file.roots[0];
    let run_id = file.children(rule_id)[0];
    let code_id = file.children(run_id)[0];

    assert_eq!(file.node(run_id).parent, Some(rule_id));
    assert_eq!(file.node(code_id).parent, Some(run_id));
    assert!(file.depth(code_id) > file.depth(run_id));
    assert!(file.depth(run_id) > file.depth(rule_id));
}

#[test]
fn roots_cover_every_line() {
    let input = "# header\n\nimport os\n\nrule a:\n    input: 'x'\n\nrule b:\n    shell: 'y'\n\n\nz = 1\n\n";
    let file = parse_str(input).expect("should parse");
    let total = input.lines().count();

    let mut next = 0;
    for &id in &file.roots {
        let range = &file.node(id).lines;
        assert_eq!(range.start, next, "gap or overlap before {id:?}");
        assert!(range.end > range.start);
        next = range.end;
    }
    assert_eq!(next, total);
}

#[test]
fn named_rules_listed_in_order() {
    let file = parse_str(
        "rule a:\n    shell: 'a'\n\ncheckpoint b:\n    shell: 'b'\n\nrule c:\n    shell: 'c'\n",
    )
    .expect("should parse");
    let rules: Vec<_> = file
        .blocks(Keyword::Rule)
        .filter_map(|block| block.name.as_deref())
        .collect();
    assert_eq!(rules, vec!["a", "c"]);
    assert!(file.find(Keyword::Checkpoint, "b").is_some());
}

#[test]
fn tab_document_style() {
    let file = parse_str("rule a:\n\tinput: 'x'\n").expect("should parse");
    assert_eq!(file.style.unit, IndentUnit::Tab);
}

#[test]
fn space_width_from_first_indented_line() {
    let file = parse_str("x = 1\nif x:\n  y = 2\n").expect("should parse");
    assert_eq!(file.style.unit, IndentUnit::Spaces(2));
}

#[test]
fn keyword_lookalikes_stay_python() {
    let file = parse_str("input = 1\nshell: str = 'x'\nd = {\n    'output': 1,\n}\n")
        .expect("should parse");
    assert_eq!(file.roots.len(), 1);
    assert!(matches!(file.segment(file.roots[0]), Segment::PlainCode(_)));
}

#[test]
fn code_segment_line_range() {
    let file = parse_str("rule a:\n    shell: 'x'\n\nprint(1)\nprint(2)\n").expect("should parse");
    let Segment::PlainCode(code) = file.segment(file.roots[1]) else {
        panic!("expected code");
    };
    assert_eq!(code.first_line, 4);
    assert_eq!(code.last_line, 5);
    assert_eq!(code.code, "print(1)\nprint(2)\n");
    assert_eq!(file.node(file.roots[1]).blank_lines_before, 1);
}

#[test]
fn subworkflow_directives() {
    let file = parse_str("subworkflow other:\n    workdir: '../other'\n    snakefile: 'Snakefile'\n")
        .expect("should parse");
    let sub = file.find(Keyword::Subworkflow, "other").expect("subworkflow");
    assert!(file.directive(sub, Keyword::Workdir).is_some());
    assert!(file.directive(sub, Keyword::Snakefile).is_some());
}
