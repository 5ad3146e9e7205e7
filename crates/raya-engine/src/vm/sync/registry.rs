//! Global registry for all mutexes

use crate::vm::sync::{Mutex, MutexId};
use dashmap::DashMap;
use std::sync::Arc;

/// Global registry of all mutexes
///
/// This registry allows looking up mutexes by ID from anywhere in the VM.
/// It's used by the LOCK/UNLOCK opcodes to find the mutex to operate on.
pub struct MutexRegistry {
    /// Map of mutex ID to mutex instance
    mutexes: DashMap<MutexId, Arc<Mutex>>,
}

impl MutexRegistry {
    /// Create a new empty mutex registry
    pub fn new() -> Self {
        Self {
            mutexes: DashMap::new(),
        }
    }

    /// Create a new mutex and register it
    ///
    /// Returns the mutex ID and a reference to the mutex
    pub fn create_mutex(&self) -> (MutexId, Arc<Mutex>) {
        let id = MutexId::new();
        let mutex = Arc::new(Mutex::new(id));
        self.mutexes.insert(id, mutex.clone());
        (id, mutex)
    }

    /// Get a mutex by ID
    pub fn get(&self, id: MutexId) -> Option<Arc<Mutex>> {
        self.mutexes.get(&id).map(|entry| entry.clone())
    }

    /// Remove a mutex from the registry (when dropped)
    pub fn remove(&self, id: MutexId) -> Option<Arc<Mutex>> {
        self.mutexes.remove(&id).map(|(_, mutex)| mutex)
    }

    /// Get the number of registered mutexes
    pub fn count(&self) -> usize {
        self.mutexes.len()
    }

    /// Clear all mutexes (for shutdown)
    pub fn clear(&self) {
        self.mutexes.clear();
    }

    /// Get all mutex IDs (for snapshotting)
    pub fn all_ids(&self) -> Vec<MutexId> {
        self.mutexes.iter().map(|entry| *entry.key()).collect()
    }

    /// Register an existing mutex (for snapshot restoration)
    pub fn register(&self, mutex: Arc<Mutex>) {
        self.mutexes.insert(mutex.id(), mutex);
    }
}

impl Default for MutexRegistry {
    fn default() -> Self {
        Self::new()
    }
}
