// Copyright 2025 calcrpc Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use calcrpc_common::protocol::error::Result;
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Why an insert was not admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The entry alone serializes to more than the bound
    EntryTooLarge { size: usize },
    /// Evicting the oldest entry did not free enough room
    StoreFull,
}

/// Outcome of [`CacheStore::put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The entry fit without evicting anything
    Admitted,
    /// The oldest entry was evicted to make room
    AdmittedAfterEviction { evicted: String },
    /// The store was left unchanged
    Rejected(Rejection),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        !matches!(self, Admission::Rejected(_))
    }
}

/// Bounded, insertion-ordered, file-backed cache of command results.
///
/// The bound applies to the serialized size of the backing file, which is
/// written as JSON indented by four spaces with one top-level key per
/// command. A single entry is measured on one line as `{"key": value}`.
#[derive(Debug)]
pub struct CacheStore {
    path: PathBuf,
    max_bytes: usize,
    entries: Map<String, Value>,
}

impl CacheStore {
    /// Loads a store from its backing file.
    ///
    /// A missing, unreadable or corrupt file yields an empty store; the file
    /// is only (re)written by the next admitted insert.
    pub fn load(path: impl Into<PathBuf>, max_bytes: usize) -> Self {
        let path = path.into();

        let entries = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Map<String, Value>>(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Ignoring corrupt cache file {}: {}", path.display(), e);
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                tracing::warn!("Failed to read cache file {}: {}", path.display(), e);
                Map::new()
            }
        };

        tracing::debug!(
            "Loaded {} cache entries from {}",
            entries.len(),
            path.display()
        );

        Self {
            path,
            max_bytes,
            entries,
        }
    }

    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Attempts to store `value` under `key`.
    ///
    /// 1. Rejects the entry outright if `{key: value}` alone is over the bound.
    /// 2. Admits it if the store including it fits.
    /// 3. Otherwise evicts the oldest entry once and admits if that is enough.
    /// 4. Otherwise rejects, leaving memory and file untouched.
    ///
    /// An admitted insert is written to disk before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be written. The in-memory
    /// store is only updated after a successful write.
    pub fn put(&mut self, key: &str, value: Value) -> Result<Admission> {
        let mut single = Map::new();
        single.insert(key.to_string(), value.clone());
        let single_size = serialize_inline(&single)?.len();
        if single_size > self.max_bytes {
            tracing::warn!(
                "Entry '{}' is too large for the cache ({} bytes, limit {} bytes)",
                key,
                single_size,
                self.max_bytes
            );
            return Ok(Admission::Rejected(Rejection::EntryTooLarge { size: single_size }));
        }

        let mut merged = self.entries.clone();
        merged.insert(key.to_string(), value.clone());
        let bytes = serialize(&merged)?;
        if bytes.len() <= self.max_bytes {
            self.persist(&bytes)?;
            self.entries = merged;
            return Ok(Admission::Admitted);
        }

        // One eviction only, never a loop
        if let Some(oldest) = self.entries.keys().next().cloned() {
            let mut reduced = self.entries.clone();
            reduced.shift_remove(&oldest);
            reduced.insert(key.to_string(), value);
            let bytes = serialize(&reduced)?;
            if bytes.len() <= self.max_bytes {
                self.persist(&bytes)?;
                self.entries = reduced;
                tracing::debug!("Evicted '{}' to admit '{}'", oldest, key);
                return Ok(Admission::AdmittedAfterEviction { evicted: oldest });
            }
        }

        tracing::warn!(
            "Not enough room to add '{}' to the cache ({} bytes max)",
            key,
            self.max_bytes
        );
        Ok(Admission::Rejected(Rejection::StoreFull))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order, oldest first.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes the store currently serializes to.
    pub fn serialized_size(&self) -> Result<usize> {
        Ok(serialize(&self.entries)?.len())
    }

    fn persist(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }
}

/// Lays the store out as `{\n    "key": value,\n ...}`.
fn serialize(entries: &Map<String, Value>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    entries.serialize(&mut ser)?;
    Ok(buf)
}

fn serialize_inline(entries: &Map<String, Value>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, InlineFormatter);
    entries.serialize(&mut ser)?;
    Ok(buf)
}

/// One-line JSON with a space after every `,` and `:`.
struct InlineFormatter;

impl Formatter for InlineFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
