use std::path::Path;

use super::TemplateParser;
use crate::CompileError;

fn parse(
    source: &str,
    strict: bool,
) -> Result<super::ParsedTemplate, CompileError> {
    TemplateParser::new(source, Path::new("/pages/test.aspx"), strict).parse()
}

#[test]
fn test_directive_and_nested_controls() {
    let template = parse(
        concat!(
            r#"<%@ page title="Login" %>"#,
            "\n",
            r#"<form id="form1"><textbox id="user" text="guest"/>hello</form>"#,
        ),
        true,
    )
    .expect("parse");

    assert_eq!(template.title, "Login");
    assert_eq!(template.roots.len(), 1);
    let form = &template.roots[0];
    assert_eq!(form.tag, "form");
    assert_eq!(form.attribute("id"), Some("form1"));
    assert_eq!(form.children.len(), 2);
    assert_eq!(form.children[0].attribute("text"), Some("guest"));
    assert!(form.children[1].is_literal());
    assert_eq!(form.children[1].text.as_deref(), Some("hello"));
}

#[test]
fn test_unclosed_tag_reports_location() {
    let err = parse("<form id=\"form1\">\n  <textbox id=\"user\"/>", false)
        .expect_err("must fail");
    match err {
        CompileError::Syntax { line, message, .. } => {
            assert_eq!(line, 2);
            assert!(message.contains("unclosed <form>"), "got: {message}");
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_mismatched_closing_tag() {
    let err = parse(r#"<form id="f"><panel id="p"></form></panel>"#, false)
        .expect_err("must fail");
    assert!(matches!(err, CompileError::Syntax { line: 1, column: 28, .. }), "got {err:?}");
}

#[test]
fn test_comments_are_skipped() {
    let template = parse(
        r#"<%-- draft <button id="x"/> --%><label id="l" text="hi"/>"#,
        true,
    )
    .expect("parse");
    assert_eq!(template.roots.len(), 1);
    assert_eq!(template.roots[0].tag, "label");
}

#[test]
fn test_unknown_tag_strictness() {
    let source = r#"<div id="wrap"><textbox id="user"/></div>"#;

    let err = parse(source, true).expect_err("strict must fail");
    assert!(matches!(err, CompileError::Syntax { .. }));

    // Lenient mode drops the wrapper and keeps its content.
    let template = parse(source, false).expect("lenient parse");
    assert_eq!(template.roots.len(), 1);
    assert_eq!(template.roots[0].tag, "textbox");
}

#[test]
fn test_unquoted_attribute_value_is_rejected() {
    let err = parse(r#"<textbox id=user/>"#, false).expect_err("must fail");
    assert!(matches!(err, CompileError::Syntax { .. }));
}

#[test]
fn test_stray_angle_bracket_is_literal_text() {
    let template = parse(r#"<form id="f">1 < 2</form>"#, true).expect("parse");
    assert_eq!(template.roots[0].children.len(), 1);
    assert_eq!(template.roots[0].children[0].text.as_deref(), Some("1 < 2"));
}
