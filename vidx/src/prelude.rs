// Copyright 2026 vidx Project Authors
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

pub use vidx_common::{
    code::Value,
    error::{Error, ErrorKind, Result},
    event::{Event, EventListener},
    metrics::{Metrics, RegistryOps},
};

pub use crate::{
    builder::IndexBuilder,
    index::{Index, IndexConfig, IndexEntry},
    indexer::{avl::AvlIndexer, sentry::Sentry, Indexer},
    key::{compare, Probe, PROBE_INLINE_THRESHOLD},
    record::Record,
    tree::{AvlTree, Iter, Keyed},
};
