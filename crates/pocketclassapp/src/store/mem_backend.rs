use super::backend::StorageBackend;
use crate::error::{ClassroomError, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since the store is single-threaded.
/// This allows the `StorageBackend` trait to use `&self` for all methods.
#[derive(Default)]
pub struct MemBackend {
    items: RefCell<BTreeMap<String, String>>,
    simulate_write_error: RefCell<bool>,
    failing_key: RefCell<Option<String>>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write and removal fail.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Make writes and removals of a single key fail, leaving the rest working.
    pub fn set_failing_key(&self, key: Option<&str>) {
        *self.failing_key.borrow_mut() = key.map(str::to_string);
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        let key_fails = self.failing_key.borrow().as_deref() == Some(key);
        if *self.simulate_write_error.borrow() || key_fails {
            return Err(ClassroomError::StorageFailure(format!(
                "Simulated write error for {}",
                key
            )));
        }
        Ok(())
    }
}

impl StorageBackend for MemBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable(key)?;
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.check_writable(key)?;
        self.items.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items.borrow().keys().cloned().collect())
    }
}
