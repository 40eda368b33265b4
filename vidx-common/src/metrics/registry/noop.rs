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

use crate::metrics::{CounterOps, CounterVecOps, GaugeOps, GaugeVecOps, RegistryOps};

/// Registry that drops every record. Used when no registry is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetricsRegistry;

/// Counters, gauges and their vectors handed out by [`NoopMetricsRegistry`].
#[derive(Debug, Clone, Copy)]
struct Discard;

impl CounterOps for Discard {
    fn increase(&self, _: u64) {}
}

impl GaugeOps for Discard {
    fn increase(&self, _: u64) {}
    fn decrease(&self, _: u64) {}
    fn absolute(&self, _: u64) {}
}

impl CounterVecOps for Discard {
    fn counter(&self, _: &[Cow<'static, str>]) -> impl CounterOps + 'static {
        Discard
    }
}

impl GaugeVecOps for Discard {
    fn gauge(&self, _: &[Cow<'static, str>]) -> impl GaugeOps + 'static {
        Discard
    }
}

impl RegistryOps for NoopMetricsRegistry {
    fn register_counter_vec(&self, _: &'static str, _: &'static str, _: &'static [&'static str]) -> impl CounterVecOps + 'static {
        Discard
    }

    fn register_gauge_vec(&self, _: &'static str, _: &'static str, _: &'static [&'static str]) -> impl GaugeVecOps + 'static {
        Discard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;

    #[test]
    fn test_noop_metrics() {
        let metrics = Metrics::new("noop", &NoopMetricsRegistry);
        metrics.index_insert.increase(1);
        metrics.index_entries.increase(2);
        metrics.index_entries.decrease(1);
        metrics.index_entries.absolute(0);
    }
}
