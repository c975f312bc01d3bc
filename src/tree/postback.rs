use std::collections::HashMap;

/// Submitted form data for a postback: prior state plus user edits and
/// the event to replay, keyed by control unique id.
#[derive(Debug, Clone, Default)]
pub struct PostbackData {
    values: HashMap<String, String>,
    event_target: Option<String>,
    event_argument: Option<String>,
}

impl PostbackData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        unique_id: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.values.insert(unique_id.into(), value.into());
        self
    }

    /// Sets the control (by unique id) whose postback event to raise.
    pub fn set_event(
        &mut self,
        target: impl Into<String>,
        argument: Option<String>,
    ) -> &mut Self {
        self.event_target = Some(target.into());
        self.event_argument = argument;
        self
    }

    pub fn get(
        &self,
        unique_id: &str,
    ) -> Option<&str> {
        self.values.get(unique_id).map(|s| s.as_str())
    }

    pub fn event_target(&self) -> Option<&str> {
        self.event_target.as_deref()
    }

    pub fn event_argument(&self) -> Option<&str> {
        self.event_argument.as_deref()
    }
}
