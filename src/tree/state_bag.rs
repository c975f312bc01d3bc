use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

/// A value held in a control's state bag and round-tripped through the
/// persisted view state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl StateValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StateValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// String form used when a control value feeds validator evaluation.
    pub fn to_display(&self) -> String {
        match self {
            StateValue::Null => String::new(),
            StateValue::Bool(b) => b.to_string(),
            StateValue::Int(i) => i.to_string(),
            StateValue::Str(s) => s.clone(),
        }
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        StateValue::Str(s.to_string())
    }
}

impl From<String> for StateValue {
    fn from(s: String) -> Self {
        StateValue::Str(s)
    }
}

impl From<bool> for StateValue {
    fn from(b: bool) -> Self {
        StateValue::Bool(b)
    }
}

impl From<i64> for StateValue {
    fn from(i: i64) -> Self {
        StateValue::Int(i)
    }
}

#[derive(Debug, Clone)]
struct StateEntry {
    value: StateValue,
    dirty: bool,
}

/// Per-control key-value store surviving the postback round trip.
///
/// Writes before [`StateBag::track`] establish template defaults and are
/// not persisted. Once tracking starts, every write marks its entry dirty
/// and only dirty entries enter the serialized delta. Entries restored
/// from a prior round trip are re-marked dirty so they keep round-tripping.
#[derive(Debug, Clone, Default)]
pub struct StateBag {
    entries: HashMap<String, StateEntry>,
    tracking: bool,
}

impl StateBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins dirty tracking. Called at the end of the Init phase.
    pub fn track(&mut self) {
        self.tracking = true;
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&StateValue> {
        self.entries.get(key).map(|e| &e.value)
    }

    pub fn get_str(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    pub fn get_bool(
        &self,
        key: &str,
    ) -> Option<bool> {
        match self.get(key) {
            Some(StateValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<StateValue>,
    ) {
        let dirty = self.tracking;
        self.entries.insert(
            key.into(),
            StateEntry {
                value: value.into(),
                dirty,
            },
        );
    }

    pub fn remove(
        &mut self,
        key: &str,
    ) {
        self.entries.remove(key);
    }

    /// Overrides the dirty flag of an existing entry.
    pub fn set_dirty(
        &mut self,
        key: &str,
        dirty: bool,
    ) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.dirty = dirty;
        }
    }

    /// The serialized delta: dirty entries only, sorted by key for a
    /// deterministic payload.
    pub fn dirty_entries(&self) -> Vec<(String, StateValue)> {
        let mut dirty: Vec<(String, StateValue)> = self
            .entries
            .iter()
            .filter(|(_, e)| e.dirty)
            .map(|(k, e)| (k.clone(), e.value.clone()))
            .collect();
        dirty.sort_by(|a, b| a.0.cmp(&b.0));
        dirty
    }

    /// Restores entries from a persisted delta. Restored entries are
    /// dirty: they must survive the next round trip too.
    pub fn load(
        &mut self,
        entries: Vec<(String, StateValue)>,
    ) {
        for (key, value) in entries {
            self.entries.insert(key, StateEntry { value, dirty: true });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
