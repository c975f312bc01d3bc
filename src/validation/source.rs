use std::collections::HashMap;

use crate::Control;

/// Capability: "has a validatable value".
///
/// The legacy engine discovered this by reflecting over a property
/// attribute; here control kinds implement the capability explicitly and
/// the engine resolves it by registry lookup.
pub trait ValidationSource: Send + Sync {
    fn validation_value(
        &self,
        control: &Control,
    ) -> Option<String>;
}

/// Source for text-bearing controls: the round-tripped `Text` entry.
pub struct TextValueSource;

impl ValidationSource for TextValueSource {
    fn validation_value(
        &self,
        control: &Control,
    ) -> Option<String> {
        Some(control.text().to_string())
    }
}

/// Registry mapping a control kind key to its validation-value source.
/// Kinds without an entry have no validatable value; targeting them is a
/// validator misconfiguration.
pub struct ValidationSourceRegistry {
    map: HashMap<String, Box<dyn ValidationSource>>,
}

impl Default for ValidationSourceRegistry {
    fn default() -> Self {
        let mut registry = Self { map: HashMap::new() };
        registry.register("textbox", Box::new(TextValueSource));
        registry
    }
}

impl ValidationSourceRegistry {
    pub fn register(
        &mut self,
        kind_key: impl Into<String>,
        source: Box<dyn ValidationSource>,
    ) {
        self.map.insert(kind_key.into(), source);
    }

    /// The validatable value of `control`, or `None` when its kind
    /// exposes no such capability.
    pub fn resolve(
        &self,
        control: &Control,
    ) -> Option<String> {
        self.map
            .get(control.kind().source_key())
            .and_then(|source| source.validation_value(control))
    }
}
