use super::Control;
use super::ControlKind;
use super::NodeState;
use super::Page;
use super::Phase;
use super::PostbackData;
use super::StateValue;
use crate::test_utils::add_validator;
use crate::test_utils::enable_logger;
use crate::test_utils::simple_page;
use crate::Error;
use crate::StateError;
use crate::ValidationConfig;
use crate::ValidatorRule;

fn drive_to_save_state(page: &mut Page) -> NodeState {
    let data = PostbackData::default();
    page.load_postback_data(&data).expect("load_postback_data");
    page.raise_changed_events().expect("raise_changed_events");
    page.raise_postback_event(&data).expect("raise_postback_event");
    page.pre_render().expect("pre_render");
    page.render().expect("render");
    page.save_state().expect("save_state")
}

#[test]
fn test_phase_order_is_enforced() {
    enable_logger();
    let (mut page, _, _) = simple_page();

    assert!(matches!(page.load_state(None), Err(Error::Fatal(_))));
    assert!(matches!(page.render(), Err(Error::Fatal(_))));

    page.init().expect("init");
    assert_eq!(page.phase(), Phase::Init);
    assert!(matches!(page.init(), Err(Error::Fatal(_))));
}

#[test]
fn test_duplicate_sibling_id_is_rejected() {
    let (mut page, form, _) = simple_page();
    let result = page.add_control(form, Control::new("name", ControlKind::Label));
    assert!(matches!(result, Err(Error::Fatal(_))));
}

#[test]
fn test_unique_ids_cross_naming_containers() {
    let mut page = Page::new(ValidationConfig::default());
    let root = page.root();
    let form = page
        .add_control(root, Control::new("form1", ControlKind::Form))
        .expect("form");
    let mut panel = Control::new("pnl", ControlKind::Custom("panel".to_string()));
    panel.set_naming_container(true);
    let panel = page.add_control(form, panel).expect("panel");
    let inner = page
        .add_control(panel, Control::new("inner", ControlKind::TextBox))
        .expect("inner");

    assert_eq!(page.unique_id(inner).as_deref(), Some("pnl$inner"));
    assert_eq!(page.client_id(inner).as_deref(), Some("pnl_inner"));

    // Resolution from the page scope needs the full path; the bare name
    // stays invisible outside its container.
    assert_eq!(page.find_control(root, "pnl$inner"), Some(inner));
    assert_eq!(page.find_control(root, "inner"), None);
    assert_eq!(page.find_control(panel, "inner"), Some(inner));
    assert_eq!(page.naming_container_of(inner), panel);
}

#[test]
fn test_state_round_trips_between_instances() {
    enable_logger();
    let (mut first, _, textbox) = simple_page();
    first.init().expect("init");
    first.load_state(None).expect("load_state");
    first.get_mut(textbox).expect("textbox").set_text("persisted");
    let state = drive_to_save_state(&mut first);

    let (mut second, _, textbox) = simple_page();
    second.init().expect("init");
    second.load_state(Some(&state)).expect("load_state");
    assert_eq!(second.get(textbox).expect("textbox").text(), "persisted");
}

#[test]
fn test_clean_tree_saves_the_unchanged_sentinel() {
    let (mut page, _, _) = simple_page();
    page.init().expect("init");
    page.load_state(None).expect("load_state");
    let state = drive_to_save_state(&mut page);
    assert!(state.is_empty());
}

#[test]
fn test_corrupt_child_position_fails_only_that_subtree() {
    enable_logger();
    let (mut page, _, textbox) = simple_page();
    page.init().expect("init");

    // Form has one child; position 5 is out of range. The form's own bag
    // still loads.
    let state = NodeState {
        bag: None,
        children: vec![(
            0,
            NodeState {
                bag: Some(vec![("Note".to_string(), StateValue::Str("kept".to_string()))]),
                children: vec![(5, NodeState::default())],
            },
        )],
    };
    let result = page.load_state(Some(&state));
    assert!(matches!(
        result,
        Err(Error::State(StateError::Corruption { .. }))
    ));

    assert!(page.get(textbox).expect("textbox").state().is_empty());
    let form = page.get(page.root()).expect("root").children()[0];
    assert_eq!(
        page.get(form).expect("form").state().get_str("Note"),
        Some("kept")
    );
}

#[test]
fn test_removal_during_postback_event_unregisters_the_subtree() {
    enable_logger();
    let mut page = Page::new(ValidationConfig::default());
    let root = page.root();
    let form = page
        .add_control(root, Control::new("form1", ControlKind::Form))
        .expect("form");
    let textbox = page
        .add_control(form, Control::new("name", ControlKind::TextBox))
        .expect("textbox");
    add_validator(
        &mut page,
        form,
        "nameRequired",
        "name",
        ValidatorRule::Required {
            initial_value: String::new(),
        },
    )
    .expect("validator");
    let validator = page.validators()[0];
    page.add_control(form, Control::new("submit", ControlKind::Button))
        .expect("button");

    page.on_click("submit", Box::new(move |page, _| {
        page.remove_control(textbox)?;
        page.remove_control(validator)?;
        Ok(())
    }));

    page.init().expect("init");
    page.load_state(None).expect("load_state");
    page.get_mut(textbox).expect("textbox").set_text("secret");

    let mut data = PostbackData::new();
    data.set_event("submit", None);
    page.load_postback_data(&data).expect("load_postback_data");
    page.raise_changed_events().expect("raise_changed_events");
    page.raise_postback_event(&data).expect("raise_postback_event");

    assert!(page.validators().is_empty());
    assert!(page.get(textbox).is_none());

    page.pre_render().expect("pre_render");
    page.render().expect("render");
    let state = page.save_state().expect("save_state");
    assert!(!format!("{state:?}").contains("secret"));
}

#[test]
fn test_render_skips_invisible_subtrees() {
    let (mut page, form, textbox) = simple_page();
    page.get_mut(textbox).expect("textbox").set_text("shown");
    page.get_mut(form).expect("form").set_visible(false);

    page.init().expect("init");
    page.load_state(None).expect("load_state");
    let data = PostbackData::default();
    page.load_postback_data(&data).expect("load_postback_data");
    page.raise_changed_events().expect("raise_changed_events");
    page.raise_postback_event(&data).expect("raise_postback_event");
    page.pre_render().expect("pre_render");
    let html = page.render().expect("render");
    assert!(html.is_empty());
}

#[test]
fn test_process_request_full_replay() {
    enable_logger();
    let (mut page, _, _) = simple_page();
    let response = page.process_request(None, None).expect("first request");
    assert!(response.is_valid);
    assert!(response.html.contains(r#"<form id="form1" method="post">"#));
    assert!(NodeState::from_bytes(&response.view_state).expect("payload decodes").is_empty());
    assert_eq!(page.phase(), Phase::Unload);
}

#[test]
fn test_process_request_rejects_malformed_state() {
    let (mut page, _, _) = simple_page();
    let result = page.process_request(None, Some(&[0xde, 0xad]));
    assert!(matches!(
        result,
        Err(Error::State(StateError::Serialization(_)))
    ));
}
