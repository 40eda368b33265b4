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

/// Scoped extensions.
///
/// Mostly used to run a closure against a lock guard, so the critical section is visibly bounded by the
/// closure body and the guard is dropped as soon as the closure returns.
pub trait Scope {
    /// Run `f` with the ownership of `self`.
    fn with<F, R>(self, f: F) -> R
    where
        Self: Sized,
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}
impl<T> Scope for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_with() {
        let v = vec![1, 2, 3].with(|mut v| {
            v.push(4);
            v
        });
        assert_eq!(v, vec![1, 2, 3, 4]);
    }
}
