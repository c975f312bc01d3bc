use tracing::debug;
use tracing::warn;

use super::evaluate_compare;
use super::evaluate_pattern;
use super::evaluate_range;
use super::evaluate_required;
use super::CompareTarget;
use super::ValidatorRule;
use crate::ControlId;
use crate::Error;
use crate::Page;
use crate::Result;
use crate::ValidationError;

impl Page {
    /// Runs every validator in `group` (the empty group matches all
    /// validators) in registration order, committing each validator's
    /// flag as it is evaluated.
    ///
    /// Disabled or effectively-invisible validators are reset to valid
    /// and skipped. A resolution failure (blank or missing target,
    /// non-validatable target, unknown callback) aborts the remainder of
    /// the group: flags committed so far stay committed, the page is
    /// marked invalid, and the error propagates.
    pub fn validate(
        &mut self,
        group: &str,
    ) -> Result<bool> {
        for vid in self.validators().to_vec() {
            let Some(control) = self.get(vid) else { continue };
            if !group.is_empty() && control.validation_group() != group {
                continue;
            }
            if !control.is_enabled() || !self.is_effectively_visible(vid) {
                if let Some(state) = self.get_mut(vid).and_then(|c| c.validator_mut()) {
                    state.is_valid = true;
                }
                continue;
            }

            match self.evaluate_validator(vid) {
                Ok(valid) => {
                    if !valid {
                        debug!(
                            "validator '{}' failed",
                            self.unique_id(vid).unwrap_or_default()
                        );
                    }
                    if let Some(state) = self.get_mut(vid).and_then(|c| c.validator_mut()) {
                        state.is_valid = valid;
                    }
                }
                Err(e) => {
                    warn!("validation aborted: {}", e);
                    self.set_page_valid(false);
                    return Err(e);
                }
            }
        }

        let aggregate = self
            .validators()
            .iter()
            .filter_map(|vid| self.get(*vid))
            .filter_map(|c| c.validator())
            .all(|state| state.is_valid);
        self.set_page_valid(aggregate);
        Ok(aggregate)
    }

    fn evaluate_validator(
        &self,
        vid: ControlId,
    ) -> Result<bool> {
        let control = self
            .get(vid)
            .ok_or_else(|| Error::Fatal(format!("validator {:?} vanished mid-run", vid)))?;
        let validator_name = self.unique_id(vid).unwrap_or_else(|| control.id().to_string());

        let target = self.resolve_target(vid, control.control_to_validate(), &validator_name)?;
        let value = self
            .sources()
            .resolve(target)
            .ok_or_else(|| ValidationError::PropertyNotFound {
                target: target.id().to_string(),
                validator: validator_name.clone(),
            })?;

        let state = control
            .validator()
            .ok_or_else(|| Error::Fatal(format!("'{}' is not a validator", validator_name)))?;

        let valid = match &state.rule {
            ValidatorRule::Required { initial_value } => {
                evaluate_required(&value, initial_value)
            }
            ValidatorRule::Range { min, max } => evaluate_range(&value, *min, *max),
            ValidatorRule::Compare { against, operator } => {
                let operand = match against {
                    CompareTarget::Value(v) => v.clone(),
                    CompareTarget::Control(name) => {
                        let other = self.resolve_target(vid, name, &validator_name)?;
                        self.sources().resolve(other).ok_or_else(|| {
                            ValidationError::PropertyNotFound {
                                target: other.id().to_string(),
                                validator: validator_name.clone(),
                            }
                        })?
                    }
                };
                evaluate_compare(&value, &operand, *operator)
            }
            ValidatorRule::Pattern { expr } => evaluate_pattern(&value, expr),
            ValidatorRule::Custom { callback } => {
                let f = self.callbacks().get(callback).ok_or_else(|| {
                    ValidationError::CallbackNotFound {
                        validator: validator_name.clone(),
                        callback: callback.clone(),
                    }
                })?;
                f(&value)
            }
        };
        Ok(valid)
    }

    /// Resolves a validator's target by name inside the validator's own
    /// naming container.
    fn resolve_target(
        &self,
        vid: ControlId,
        name: &str,
        validator_name: &str,
    ) -> Result<&crate::Control> {
        if name.is_empty() {
            return Err(ValidationError::TargetBlank {
                validator: validator_name.to_string(),
            }
            .into());
        }
        let scope = self.naming_container_of(vid);
        let target_id = self.find_control(scope, name).ok_or_else(|| {
            ValidationError::TargetNotFound {
                target: name.to_string(),
                validator: validator_name.to_string(),
            }
        })?;
        self.get(target_id)
            .ok_or_else(|| Error::Fatal(format!("resolved control {:?} vanished", target_id)))
    }
}
