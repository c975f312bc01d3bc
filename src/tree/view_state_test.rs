use super::NodeState;
use super::StateValue;

fn sample_state() -> NodeState {
    NodeState {
        bag: None,
        children: vec![(
            0,
            NodeState {
                bag: Some(vec![
                    ("Text".to_string(), StateValue::Str("hello".to_string())),
                    ("Visible".to_string(), StateValue::Bool(false)),
                ]),
                children: vec![(
                    2,
                    NodeState {
                        bag: Some(vec![("Count".to_string(), StateValue::Int(7))]),
                        children: Vec::new(),
                    },
                )],
            },
        )],
    }
}

#[test]
fn test_unchanged_sentinel() {
    assert!(NodeState::default().is_empty());
    assert!(!sample_state().is_empty());
}

#[test]
fn test_round_trip_is_idempotent() {
    let state = sample_state();
    let first = state.to_bytes().expect("serialize");
    let decoded = NodeState::from_bytes(&first).expect("deserialize");
    assert_eq!(decoded, state);

    let second = decoded.to_bytes().expect("reserialize");
    assert_eq!(first, second);
}

#[test]
fn test_malformed_payload_is_an_error() {
    assert!(NodeState::from_bytes(&[0xff, 0x00, 0x13]).is_err());
}
