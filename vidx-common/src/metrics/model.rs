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

use std::borrow::Cow;

use super::{BoxedCounter, BoxedGauge, CounterVecOps, GaugeVecOps, RegistryOps};

trait Boxer {
    fn boxed(self) -> Box<Self>
    where
        Self: Sized,
    {
        Box::new(self)
    }
}
impl<T> Boxer for T {}

/// Metrics of an index instance, labelled by the index name.
#[derive(Debug)]
pub struct Metrics {
    /// Successful insertions.
    pub index_insert: BoxedCounter,
    /// Insertions rejected for a duplicate key or an allocation failure.
    pub index_insert_failed: BoxedCounter,
    /// Lookups that found an entry.
    pub index_hit: BoxedCounter,
    /// Lookups that found nothing.
    pub index_miss: BoxedCounter,
    /// Entries detached by remove or clear.
    pub index_remove: BoxedCounter,
    /// Entries handed back to the value lifecycle owner.
    pub index_release: BoxedCounter,

    /// Entries currently indexed.
    pub index_entries: BoxedGauge,
}

impl Metrics {
    /// Create a new metrics instance with the given name and registry.
    pub fn new<R>(name: impl Into<Cow<'static, str>>, registry: &R) -> Self
    where
        R: RegistryOps,
    {
        let name = name.into();

        let op_total = registry.register_counter_vec("vidx_index_op_total", "vidx index operations", &["name", "op"]);
        let index_insert = op_total.counter(&[name.clone(), "insert".into()]).boxed();
        let index_insert_failed = op_total.counter(&[name.clone(), "insert_failed".into()]).boxed();
        let index_hit = op_total.counter(&[name.clone(), "hit".into()]).boxed();
        let index_miss = op_total.counter(&[name.clone(), "miss".into()]).boxed();
        let index_remove = op_total.counter(&[name.clone(), "remove".into()]).boxed();
        let index_release = op_total.counter(&[name.clone(), "release".into()]).boxed();

        let entries = registry.register_gauge_vec("vidx_index_entries", "vidx indexed entries", &["name"]);
        let index_entries = entries.gauge(&[name]).boxed();

        Self {
            index_insert,
            index_insert_failed,
            index_hit,
            index_miss,
            index_remove,
            index_release,
            index_entries,
        }
    }
}
