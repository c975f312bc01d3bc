use serde::Deserialize;
use serde::Serialize;

use super::StateValue;
use crate::Result;

/// Positional per-node persisted state.
///
/// `bag: None` is the "unchanged" sentinel: a node with no dirty entries
/// contributes nothing to the payload. Children are addressed by position
/// within their parent, so only children carrying state appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NodeState {
    pub bag: Option<Vec<(String, StateValue)>>,
    pub children: Vec<(usize, NodeState)>,
}

impl NodeState {
    pub fn is_empty(&self) -> bool {
        self.bag.is_none() && self.children.is_empty()
    }

    /// Serializes for the host's state store (hidden field, cache entry).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
