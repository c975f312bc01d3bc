use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::Control;
use crate::ControlId;
use crate::ControlKind;
use crate::MemoryFileProvider;
use crate::Page;
use crate::Result;
use crate::ValidationConfig;
use crate::ValidatorRule;
use crate::ValidatorState;

static LOGGER_INIT: Lazy<()> = Lazy::new(|| {
    env_logger::init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// A page with one form containing one text box, the smallest tree that
/// exercises postback and state.
pub fn simple_page() -> (Page, ControlId, ControlId) {
    let mut page = Page::new(ValidationConfig::default());
    let root = page.root();
    let form = page
        .add_control(root, Control::new("form1", ControlKind::Form))
        .unwrap();
    let textbox = page
        .add_control(form, Control::new("name", ControlKind::TextBox))
        .unwrap();
    (page, form, textbox)
}

/// Adds a validator targeting `target` under `parent`.
pub fn add_validator(
    page: &mut Page,
    parent: ControlId,
    id: &str,
    target: &str,
    rule: ValidatorRule,
) -> Result<ControlId> {
    let mut control = Control::new(id, ControlKind::Validator(ValidatorState::new(rule)));
    control.set_control_to_validate(target);
    control.set_error_message(format!("{id} failed"));
    page.add_control(parent, control)
}

/// In-memory provider preloaded with a login template exercising the
/// directive, nesting, and every validator tag.
pub fn template_corpus() -> Arc<MemoryFileProvider> {
    let files = Arc::new(MemoryFileProvider::new());
    files.write(
        "/pages/login.aspx",
        concat!(
            r#"<%@ page title="Login" %>"#,
            r#"<form id="form1">"#,
            r#"<textbox id="user"/>"#,
            r#"<requiredvalidator id="userRequired" controltovalidate="user" errormessage="user is required"/>"#,
            r#"<textbox id="age"/>"#,
            r#"<rangevalidator id="ageRange" controltovalidate="age" minimumvalue="18" maximumvalue="120" errormessage="age out of range"/>"#,
            r#"<button id="submit" text="Sign in"/>"#,
            r#"</form>"#,
        ),
    );
    files
}
