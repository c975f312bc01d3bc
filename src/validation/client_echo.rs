//! Declarative attribute emission for uplevel validators.
//!
//! Each attribute mirrors one server-side evaluation input so a client
//! script can repeat the check before submitting. The server re-runs
//! every rule on postback regardless; the echo only saves a round trip.

use super::display_of;
use super::CompareTarget;
use super::ValidatorRule;
use crate::ControlId;
use crate::Page;

/// Attribute set for one validator, each name carrying the configured
/// unobtrusive prefix. Callers are expected to gate on the validator's
/// computed uplevel flag.
pub fn client_attributes(
    page: &Page,
    vid: ControlId,
) -> Vec<(String, String)> {
    let Some(control) = page.get(vid) else {
        return Vec::new();
    };
    let Some(state) = control.validator() else {
        return Vec::new();
    };
    let prefix = &page.config().unobtrusive_prefix;
    let mut attrs = Vec::new();
    let mut push = |name: &str, value: String| {
        attrs.push((format!("{prefix}{name}"), value));
    };

    push("evaluationfunction", state.rule.kind_name().to_string());
    push(
        "controltovalidate",
        resolve_client_id(page, vid, control.control_to_validate()),
    );
    push("errormessage", control.error_message().to_string());
    push("display", display_of(control).as_str().to_string());
    push("isvalid", state.is_valid.to_string());
    let group = control.validation_group();
    if !group.is_empty() {
        push("validationgroup", group.to_string());
    }

    match &state.rule {
        ValidatorRule::Required { initial_value } => {
            push("initialvalue", initial_value.clone());
        }
        ValidatorRule::Range { min, max } => {
            push("minimumvalue", min.to_string());
            push("maximumvalue", max.to_string());
        }
        ValidatorRule::Compare { against, operator } => {
            match against {
                CompareTarget::Value(v) => push("valuetocompare", v.clone()),
                CompareTarget::Control(name) => {
                    push("controltocompare", resolve_client_id(page, vid, name));
                }
            }
            push("operator", operator.as_str().to_string());
        }
        ValidatorRule::Pattern { expr } => {
            push("validationexpression", expr.as_str().to_string());
        }
        ValidatorRule::Custom { callback } => {
            push("clientvalidationfunction", callback.clone());
        }
    }

    attrs
}

/// Client id of a name resolved in the validator's naming container,
/// falling back to the raw name when unresolvable so the markup still
/// carries the declared intent.
fn resolve_client_id(
    page: &Page,
    vid: ControlId,
    name: &str,
) -> String {
    let scope = page.naming_container_of(vid);
    page.find_control(scope, name)
        .and_then(|id| page.client_id(id))
        .unwrap_or_else(|| name.to_string())
}
