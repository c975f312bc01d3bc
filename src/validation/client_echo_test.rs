use std::collections::HashMap;

use super::client_attributes;
use super::ValidatorRule;
use crate::test_utils::add_validator;
use crate::test_utils::enable_logger;
use crate::Control;
use crate::ControlKind;
use crate::Page;
use crate::ValidationConfig;

fn attrs_of(
    page: &Page,
    vid: crate::ControlId,
) -> HashMap<String, String> {
    client_attributes(page, vid).into_iter().collect()
}

#[test]
fn test_minimum_attribute_set() {
    enable_logger();
    let mut page = Page::new(ValidationConfig::default());
    let root = page.root();
    let form = page
        .add_control(root, Control::new("form1", ControlKind::Form))
        .expect("form");
    page.add_control(form, Control::new("name", ControlKind::TextBox))
        .expect("textbox");
    let vid = add_validator(
        &mut page,
        form,
        "nameRequired",
        "name",
        ValidatorRule::Required {
            initial_value: "enter name".to_string(),
        },
    )
    .expect("validator");
    let validator = page.get_mut(vid).expect("validator");
    validator.set_validation_group("login");
    validator.state_mut().set("Display", "dynamic");

    let attrs = attrs_of(&page, vid);
    assert_eq!(attrs.get("data-val-controltovalidate").map(String::as_str), Some("name"));
    assert_eq!(
        attrs.get("data-val-errormessage").map(String::as_str),
        Some("nameRequired failed")
    );
    assert_eq!(attrs.get("data-val-display").map(String::as_str), Some("dynamic"));
    assert_eq!(attrs.get("data-val-isvalid").map(String::as_str), Some("true"));
    assert_eq!(attrs.get("data-val-validationgroup").map(String::as_str), Some("login"));
    assert_eq!(
        attrs.get("data-val-evaluationfunction").map(String::as_str),
        Some("required")
    );
    assert_eq!(
        attrs.get("data-val-initialvalue").map(String::as_str),
        Some("enter name")
    );
}

#[test]
fn test_prefix_is_configurable() {
    let config = ValidationConfig {
        unobtrusive_prefix: "v-".to_string(),
        ..ValidationConfig::default()
    };
    let mut page = Page::new(config);
    let root = page.root();
    let form = page
        .add_control(root, Control::new("form1", ControlKind::Form))
        .expect("form");
    page.add_control(form, Control::new("age", ControlKind::TextBox))
        .expect("textbox");
    let vid = add_validator(
        &mut page,
        form,
        "ageRange",
        "age",
        ValidatorRule::Range { min: 18.0, max: 120.0 },
    )
    .expect("validator");

    let attrs = attrs_of(&page, vid);
    assert!(attrs.keys().all(|name| name.starts_with("v-")));
    assert_eq!(attrs.get("v-minimumvalue").map(String::as_str), Some("18"));
    assert_eq!(attrs.get("v-maximumvalue").map(String::as_str), Some("120"));
}

#[test]
fn test_target_id_is_the_client_id_inside_a_container() {
    let mut page = Page::new(ValidationConfig::default());
    let root = page.root();
    let mut panel = Control::new("pnl", ControlKind::Custom("panel".to_string()));
    panel.set_naming_container(true);
    let panel = page.add_control(root, panel).expect("panel");
    page.add_control(panel, Control::new("field", ControlKind::TextBox))
        .expect("textbox");
    let vid = add_validator(
        &mut page,
        panel,
        "fieldRequired",
        "field",
        ValidatorRule::Required {
            initial_value: String::new(),
        },
    )
    .expect("validator");

    let attrs = attrs_of(&page, vid);
    assert_eq!(
        attrs.get("data-val-controltovalidate").map(String::as_str),
        Some("pnl_field")
    );
}
