use super::StateBag;
use crate::ValidatorState;

/// Index of a control inside its page's arena. Stable for the lifetime
/// of the request; slots of removed controls are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(pub(crate) usize);

/// Built-in control variants. The set is deliberately minimal: just
/// enough surface to exercise the lifecycle, state, and validator
/// protocols. `Custom` covers host-defined controls.
#[derive(Debug, Clone)]
pub enum ControlKind {
    Page,
    Form,
    TextBox,
    Label,
    Button,
    Validator(ValidatorState),
    /// Literal template text, rendered verbatim
    Literal(String),
    Custom(String),
}

impl ControlKind {
    /// Key used for validation-source registry lookups.
    pub fn source_key(&self) -> &str {
        match self {
            ControlKind::Page => "page",
            ControlKind::Form => "form",
            ControlKind::TextBox => "textbox",
            ControlKind::Label => "label",
            ControlKind::Button => "button",
            ControlKind::Validator(_) => "validator",
            ControlKind::Literal(_) => "literal",
            ControlKind::Custom(name) => name,
        }
    }
}

/// A mutable tree node: identifier (unique among siblings), dirty-tracked
/// state bag, ordered children, enabled/visible flags.
#[derive(Debug)]
pub struct Control {
    pub(crate) id: String,
    pub(crate) kind: ControlKind,
    pub(crate) state: StateBag,
    pub(crate) children: Vec<ControlId>,
    pub(crate) parent: Option<ControlId>,
    pub(crate) enabled: bool,
    pub(crate) visible: bool,
    pub(crate) naming_container: bool,
}

impl Control {
    pub fn new(
        id: impl Into<String>,
        kind: ControlKind,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            state: StateBag::new(),
            children: Vec::new(),
            parent: None,
            enabled: true,
            visible: true,
            naming_container: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &ControlKind {
        &self.kind
    }

    pub fn state(&self) -> &StateBag {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StateBag {
        &mut self.state
    }

    pub fn children(&self) -> &[ControlId] {
        &self.children
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_naming_container(&self) -> bool {
        self.naming_container
    }

    pub fn set_naming_container(
        &mut self,
        naming_container: bool,
    ) {
        self.naming_container = naming_container;
    }

    pub fn set_visible(
        &mut self,
        visible: bool,
    ) {
        self.visible = visible;
    }

    /// Disabling a validator also resets it to valid: a disabled
    /// validator is almost never meant to fail the page for that
    /// round trip.
    pub fn set_enabled(
        &mut self,
        enabled: bool,
    ) {
        self.enabled = enabled;
        if !enabled {
            if let ControlKind::Validator(v) = &mut self.kind {
                v.is_valid = true;
            }
        }
    }

    /// Text property shared by the text-bearing kinds, held in the
    /// state bag so it round-trips.
    pub fn text(&self) -> &str {
        self.state.get_str("Text").unwrap_or_default()
    }

    pub fn set_text(
        &mut self,
        text: impl Into<String>,
    ) {
        self.state.set("Text", text.into());
    }

    /// Whether this node participates in the postback-data/event phases.
    /// These phases are driven by a registry of such nodes rather than a
    /// full-tree traversal.
    pub fn is_postback_aware(&self) -> bool {
        matches!(self.kind, ControlKind::TextBox | ControlKind::Button)
    }

    pub fn validator(&self) -> Option<&ValidatorState> {
        match &self.kind {
            ControlKind::Validator(v) => Some(v),
            _ => None,
        }
    }

    pub fn validator_mut(&mut self) -> Option<&mut ValidatorState> {
        match &mut self.kind {
            ControlKind::Validator(v) => Some(v),
            _ => None,
        }
    }

    // Validator declarative properties live in the state bag, like the
    // rest of the round-tripped control state.

    pub fn control_to_validate(&self) -> &str {
        self.state.get_str("ControlToValidate").unwrap_or_default()
    }

    pub fn set_control_to_validate(
        &mut self,
        name: impl Into<String>,
    ) {
        self.state.set("ControlToValidate", name.into());
    }

    pub fn error_message(&self) -> &str {
        self.state.get_str("ErrorMessage").unwrap_or_default()
    }

    pub fn set_error_message(
        &mut self,
        message: impl Into<String>,
    ) {
        self.state.set("ErrorMessage", message.into());
    }

    pub fn validation_group(&self) -> &str {
        self.state.get_str("ValidationGroup").unwrap_or_default()
    }

    pub fn set_validation_group(
        &mut self,
        group: impl Into<String>,
    ) {
        self.state.set("ValidationGroup", group.into());
    }
}
