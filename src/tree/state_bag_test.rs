use super::StateBag;
use super::StateValue;

#[test]
fn test_writes_before_tracking_are_template_defaults() {
    let mut bag = StateBag::new();
    bag.set("Text", "default");
    assert!(bag.dirty_entries().is_empty());

    bag.track();
    assert!(bag.dirty_entries().is_empty());
    assert_eq!(bag.get_str("Text"), Some("default"));
}

#[test]
fn test_writes_after_tracking_enter_the_delta_sorted() {
    let mut bag = StateBag::new();
    bag.track();
    bag.set("Zeta", "z");
    bag.set("Alpha", 1i64);
    bag.set("Flag", true);

    let delta = bag.dirty_entries();
    assert_eq!(
        delta,
        vec![
            ("Alpha".to_string(), StateValue::Int(1)),
            ("Flag".to_string(), StateValue::Bool(true)),
            ("Zeta".to_string(), StateValue::Str("z".to_string())),
        ]
    );
}

#[test]
fn test_loaded_entries_survive_the_next_round_trip() {
    let mut bag = StateBag::new();
    bag.track();
    bag.load(vec![("Text".to_string(), StateValue::Str("prior".to_string()))]);

    // Restored without a new write this round trip, still persisted.
    assert_eq!(bag.dirty_entries().len(), 1);
}

#[test]
fn test_set_dirty_overrides_tracking() {
    let mut bag = StateBag::new();
    bag.set("Text", "default");
    bag.track();

    bag.set_dirty("Text", true);
    assert_eq!(bag.dirty_entries().len(), 1);

    bag.set_dirty("Text", false);
    assert!(bag.dirty_entries().is_empty());
}

#[test]
fn test_remove_drops_the_entry() {
    let mut bag = StateBag::new();
    bag.track();
    bag.set("Text", "value");
    bag.remove("Text");
    assert!(bag.is_empty());
    assert!(bag.dirty_entries().is_empty());
}
