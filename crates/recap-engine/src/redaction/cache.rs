use recap_common::Identity;
use std::collections::HashMap;

/// Per-identity "skip redaction" decisions. A decision, once made, holds for
/// the rest of the record's life even if later observations arrive with a
/// different context URL.
#[derive(Debug, Default, Clone)]
pub struct DecisionCache {
    decisions: HashMap<Identity, bool>,
}

impl DecisionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decide(&mut self, identity: &Identity, compute: impl FnOnce() -> bool) -> bool {
        if let Some(&skip) = self.decisions.get(identity) {
            return skip;
        }
        let skip = compute();
        self.decisions.insert(identity.clone(), skip);
        skip
    }

    pub fn get(&self, identity: &Identity) -> Option<bool> {
        self.decisions.get(identity).copied()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}
