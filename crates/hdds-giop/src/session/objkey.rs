// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Object key → interface id registry.
//!
//! Requests only carry an opaque object key; the interface it belongs to is
//! learned from object references seen earlier (typically the reply to a
//! naming service `resolve`) or loaded from a file of stringified IORs.

use std::collections::HashMap;
use std::path::Path;

use crate::ior::{parse_stringified_ior, IorError};

/// Where a registry entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    ObservedOnWire,
    LoadedFromFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKeyEntry {
    pub interface_id: String,
    pub provenance: Provenance,
}

/// Object keys compared byte-wise. Inserting an existing key overwrites it.
#[derive(Debug, Default, Clone)]
pub struct ObjectKeyRegistry {
    entries: HashMap<Vec<u8>, ObjectKeyEntry>,
}

impl ObjectKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &[u8], interface_id: &str, provenance: Provenance) {
        log::debug!(
            "[giop] object key {} -> {} ({:?})",
            hex::encode(key),
            interface_id,
            provenance
        );
        self.entries.insert(
            key.to_vec(),
            ObjectKeyEntry {
                interface_id: interface_id.to_owned(),
                provenance,
            },
        );
    }

    pub fn lookup(&self, key: &[u8]) -> Option<&ObjectKeyEntry> {
        self.entries.get(key)
    }

    /// Interface id recorded for `key`.
    pub fn interface_id(&self, key: &[u8]) -> Option<&str> {
        self.lookup(key).map(|e| e.interface_id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Load stringified IORs, one per line.
    ///
    /// Blank lines and lines starting with `#` are ignored; lines that do not
    /// parse are logged and skipped. Returns the number of keys stored.
    pub fn load_ior_strings(&mut self, text: &str) -> usize {
        let mut stored = 0;
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_stringified_ior(line) {
                Ok(reference) => stored += reference.register(self, Provenance::LoadedFromFile),
                Err(e) => log::warn!("[giop] skipping IOR on line {}: {}", index + 1, e),
            }
        }
        stored
    }

    /// Load a file of stringified IORs. See [`load_ior_strings`](Self::load_ior_strings).
    pub fn load_ior_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, IorError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let stored = self.load_ior_strings(&content);
        log::debug!(
            "[giop] loaded {} object keys from {}",
            stored,
            path.as_ref().display()
        );
        Ok(stored)
    }
}
