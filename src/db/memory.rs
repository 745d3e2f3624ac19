use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{DocumentStore, Slot, StoreResult};

/// In-process store used by tests in place of the files on disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<Slot, Vec<u8>>>,
    writes: Mutex<Vec<Slot>>,
}

impl MemoryStore {
    pub fn get(&self, slot: Slot) -> Option<Vec<u8>> {
        self.slots.lock().unwrap().get(&slot).cloned()
    }

    pub fn put(&self, slot: Slot, contents: Vec<u8>) {
        self.slots.lock().unwrap().insert(slot, contents);
    }

    /// Slots written so far, in write order.
    pub fn writes(&self) -> Vec<Slot> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, slot: Slot) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.get(slot))
    }

    async fn write(&self, slot: Slot, contents: Vec<u8>) -> StoreResult<()> {
        self.put(slot, contents);
        self.writes.lock().unwrap().push(slot);
        Ok(())
    }
}
