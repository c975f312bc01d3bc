use std::collections::HashMap;

use regex::Regex;

use crate::Control;

/// How a validator occupies layout space in the rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidatorDisplay {
    /// Never displayed inline
    None,
    /// Space reserved even when valid
    #[default]
    Static,
    /// Space taken only when invalid
    Dynamic,
}

impl ValidatorDisplay {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidatorDisplay::None => "none",
            ValidatorDisplay::Static => "static",
            ValidatorDisplay::Dynamic => "dynamic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Some(ValidatorDisplay::None),
            "static" => Some(ValidatorDisplay::Static),
            "dynamic" => Some(ValidatorDisplay::Dynamic),
            _ => None,
        }
    }
}

/// Display mode of a validator control, read from its state bag.
pub fn display_of(control: &Control) -> ValidatorDisplay {
    control
        .state()
        .get_str("Display")
        .and_then(ValidatorDisplay::parse)
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
}

impl CompareOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOperator::Equal => "equal",
            CompareOperator::NotEqual => "notequal",
            CompareOperator::GreaterThan => "greaterthan",
            CompareOperator::GreaterThanEqual => "greaterthanequal",
            CompareOperator::LessThan => "lessthan",
            CompareOperator::LessThanEqual => "lessthanequal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "equal" => Some(CompareOperator::Equal),
            "notequal" => Some(CompareOperator::NotEqual),
            "greaterthan" => Some(CompareOperator::GreaterThan),
            "greaterthanequal" => Some(CompareOperator::GreaterThanEqual),
            "lessthan" => Some(CompareOperator::LessThan),
            "lessthanequal" => Some(CompareOperator::LessThanEqual),
            _ => None,
        }
    }
}

/// What a compare validator compares the target value against.
#[derive(Debug, Clone, PartialEq)]
pub enum CompareTarget {
    /// A constant operand
    Value(String),
    /// Another control's validation value, resolved in the same
    /// naming container at evaluation time
    Control(String),
}

/// Validator variants. Each evaluation is a pure function of the
/// resolved target value (plus the compare operand where applicable).
#[derive(Debug, Clone)]
pub enum ValidatorRule {
    Required { initial_value: String },
    Range { min: f64, max: f64 },
    Compare { against: CompareTarget, operator: CompareOperator },
    Pattern { expr: Regex },
    Custom { callback: String },
}

impl ValidatorRule {
    /// Short name used in client-echo attributes and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ValidatorRule::Required { .. } => "required",
            ValidatorRule::Range { .. } => "range",
            ValidatorRule::Compare { .. } => "compare",
            ValidatorRule::Pattern { .. } => "pattern",
            ValidatorRule::Custom { .. } => "custom",
        }
    }
}

/// Per-validator evaluation state carried on the control node.
#[derive(Debug, Clone)]
pub struct ValidatorState {
    pub rule: ValidatorRule,
    pub is_valid: bool,
    /// Declared: emit client-echo attributes when the page allows it
    pub client_echo: bool,
    /// Computed during PreRender: this round trip renders uplevel
    pub uplevel: bool,
}

impl ValidatorState {
    pub fn new(rule: ValidatorRule) -> Self {
        Self {
            rule,
            is_valid: true,
            client_echo: true,
            uplevel: false,
        }
    }
}

/// Named callbacks backing `ValidatorRule::Custom`.
pub type CustomCallback = Box<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Default)]
pub struct ValidatorCallbacks {
    map: HashMap<String, CustomCallback>,
}

impl ValidatorCallbacks {
    pub fn register(
        &mut self,
        name: impl Into<String>,
        callback: CustomCallback,
    ) {
        self.map.insert(name.into(), callback);
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&CustomCallback> {
        self.map.get(name)
    }
}

// ===== Pure evaluation functions =====
//
// Legacy semantics: an empty target value is valid for every rule except
// Required, so optional fields only fail the rules they actually violate.

pub(crate) fn evaluate_required(
    value: &str,
    initial_value: &str,
) -> bool {
    value.trim() != initial_value.trim()
}

pub(crate) fn evaluate_range(
    value: &str,
    min: f64,
    max: f64,
) -> bool {
    if value.is_empty() {
        return true;
    }
    match value.trim().parse::<f64>() {
        Ok(v) => v >= min && v <= max,
        Err(_) => false,
    }
}

pub(crate) fn evaluate_compare(
    value: &str,
    against: &str,
    operator: CompareOperator,
) -> bool {
    if value.is_empty() {
        return true;
    }

    let ordering = match (value.trim().parse::<f64>(), against.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b),
        _ => Some(value.cmp(against)),
    };

    let Some(ordering) = ordering else {
        return false; // NaN never compares
    };

    match operator {
        CompareOperator::Equal => ordering.is_eq(),
        CompareOperator::NotEqual => ordering.is_ne(),
        CompareOperator::GreaterThan => ordering.is_gt(),
        CompareOperator::GreaterThanEqual => ordering.is_ge(),
        CompareOperator::LessThan => ordering.is_lt(),
        CompareOperator::LessThanEqual => ordering.is_le(),
    }
}

pub(crate) fn evaluate_pattern(
    value: &str,
    expr: &Regex,
) -> bool {
    if value.is_empty() {
        return true;
    }
    // Anchored like the legacy engine: the whole value must match.
    expr.find(value).is_some_and(|m| m.start() == 0 && m.end() == value.len())
}
