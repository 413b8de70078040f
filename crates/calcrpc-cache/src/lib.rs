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

//! calcrpc Result Cache
//!
//! This crate provides [`CacheStore`], the bounded key/value store that every
//! operation server keeps its results in and that clients fall back to when a
//! server is unreachable.
//!
//! # Model
//!
//! - **Keys** are exact command strings (`"sum 2 3"`) or bare opcodes (`"news"`)
//! - **Values** are results in their natural JSON form
//! - **Order** is insertion order; eviction removes the oldest-inserted entry
//! - **Bound** is the serialized size of the whole backing file, in bytes
//!
//! # Admission
//!
//! An insert is admitted if the store still fits after adding it, possibly
//! after evicting the single oldest entry. At most one entry is evicted per
//! insert: if one eviction is not enough the insert is rejected and the store
//! is left untouched. An entry that alone exceeds the bound is never admitted.
//!
//! # Persistence
//!
//! Every admitted insert rewrites the whole backing file before `put`
//! returns. A missing or corrupt file loads as an empty store.
//!
//! # Usage Example
//!
//! ```rust
//! use calcrpc_cache::CacheStore;
//! use serde_json::json;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut store = CacheStore::load(dir.path().join("cache.json"), 1024);
//!
//! let admission = store.put("sum 2 3", json!(5.0)).unwrap();
//! assert!(admission.is_admitted());
//! assert_eq!(store.get("sum 2 3"), Some(&json!(5.0)));
//! ```
//!
//! # Thread Safety
//!
//! `CacheStore` is a plain value. Servers that serve connections concurrently
//! wrap it in a single mutex so the check-evict-commit sequence of `put` runs
//! as one step.

mod store;

pub use store::{Admission, CacheStore, Rejection};
