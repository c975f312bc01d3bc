use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::PostbackData;
use crate::test_utils::enable_logger;
use crate::test_utils::simple_page;

#[test]
fn test_changed_value_fires_change_handler() {
    enable_logger();
    let (mut page, _, textbox) = simple_page();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    page.on_changed("name", Box::new(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));

    let mut data = PostbackData::new();
    data.insert("name", "edited");

    page.init().expect("init");
    page.load_state(None).expect("load_state");
    page.load_postback_data(&data).expect("load_postback_data");
    page.raise_changed_events().expect("raise_changed_events");

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(page.get(textbox).expect("textbox").text(), "edited");
}

#[test]
fn test_unchanged_value_raises_no_event() {
    enable_logger();
    let (mut page, _, textbox) = simple_page();
    page.get_mut(textbox).expect("textbox").set_text("same");
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    page.on_changed("name", Box::new(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));

    let mut data = PostbackData::new();
    data.insert("name", "same");

    page.init().expect("init");
    page.load_state(None).expect("load_state");
    page.load_postback_data(&data).expect("load_postback_data");
    page.raise_changed_events().expect("raise_changed_events");

    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[test]
fn test_missing_event_target_is_not_fatal() {
    enable_logger();
    let (mut page, _, _) = simple_page();
    let mut data = PostbackData::new();
    data.set_event("ghost", None);

    page.init().expect("init");
    page.load_state(None).expect("load_state");
    page.load_postback_data(&data).expect("load_postback_data");
    page.raise_changed_events().expect("raise_changed_events");
    page.raise_postback_event(&data).expect("missing target must not fail the page");
}

#[test]
fn test_failing_handler_does_not_abort_the_request() {
    enable_logger();
    let (mut page, _, _) = simple_page();
    page.on_changed("name", Box::new(|_, _| Err(crate::Error::Fatal("boom".to_string()))));

    let mut data = PostbackData::new();
    data.insert("name", "edited");

    page.init().expect("init");
    page.load_state(None).expect("load_state");
    page.load_postback_data(&data).expect("load_postback_data");
    page.raise_changed_events().expect("handler failure is logged, not propagated");
}
