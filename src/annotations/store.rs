//! Block property storage provided by the host document

use std::collections::HashMap;

/// Where the host keeps the annotation string of each image block
pub trait BlockPropertyStore {
    fn get(&self, block_id: &str) -> Option<String>;
    fn set(&mut self, block_id: &str, value: String);
}

/// In-memory store keyed by block id
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything stored for a block that has been deleted
    pub fn forget(&mut self, block_id: &str) {
        self.values.remove(block_id);
    }
}

impl BlockPropertyStore for MemoryStore {
    fn get(&self, block_id: &str) -> Option<String> {
        self.values.get(block_id).cloned()
    }

    fn set(&mut self, block_id: &str, value: String) {
        self.values.insert(block_id.to_string(), value);
    }
}
