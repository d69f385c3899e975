// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `localStorage`-backed [`Store`].

use web_sys::Storage;

use spotlight_core::persist::{Store, StoreError};

use crate::describe;

/// Snapshot storage in the page's `localStorage`.
///
/// Private browsing modes may deny storage entirely; every operation then
/// fails with [`StoreError::Unavailable`] and the controller carries on
/// without persistence.
pub struct LocalStore {
    storage: Option<Storage>,
}

impl LocalStore {
    /// Opens the window's `localStorage`.
    #[must_use]
    pub fn open() -> Self {
        let storage = match web_sys::window().map(|w| w.local_storage()) {
            Some(Ok(Some(storage))) => Some(storage),
            Some(Err(err)) => {
                tracing::warn!(error = %describe(&err), "localStorage is blocked");
                None
            }
            _ => {
                tracing::warn!("localStorage is unavailable");
                None
            }
        };
        Self { storage }
    }

    fn storage(&self) -> Result<&Storage, StoreError> {
        self.storage
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("localStorage is unavailable".into()))
    }
}

impl Store for LocalStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage()?
            .get_item(key)
            .map_err(|err| StoreError::Unavailable(describe(&err)))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|err| StoreError::Write(describe(&err)))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage()?
            .remove_item(key)
            .map_err(|err| StoreError::Write(describe(&err)))
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("available", &self.storage.is_some())
            .finish()
    }
}
