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

use std::{collections::TryReserveError, fmt::Display};

/// Kinds of failures reported by the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A tree node, an owned key copy, an oversized probe key or the arena reservation cannot be allocated.
    ///
    /// The operation is aborted without any state change.
    AllocationFailure,
    /// An entry with an equal key is already indexed. The index never overwrites.
    DuplicateKey,
    /// No entry with the key is indexed.
    ///
    /// Only removal reports it. Absence on lookup is not an error.
    NotFound,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::AllocationFailure => "Allocation failure",
            ErrorKind::DuplicateKey => "Duplicate key",
            ErrorKind::NotFound => "Not found",
        };
        f.write_str(s)
    }
}

/// Error returned by vidx operations.
///
/// Printed in a single line as `<kind> (<context>): <message>[: <source>]`, e.g.:
///
/// ```shell
/// Duplicate key (key_len: 2): key already indexed
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
    context: Vec<(&'static str, usize)>,
    source: Option<anyhow::Error>,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        for (i, (k, v)) in self.context.iter().enumerate() {
            let sep = if i == 0 { " (" } else { ", " };
            write!(f, "{sep}{k}: {v}")?;
        }
        if !self.context.is_empty() {
            write!(f, ")")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| {
            let e: &(dyn std::error::Error + 'static) = e.as_ref();
            e
        })
    }
}

impl Error {
    /// Create an error of the kind with a static message.
    pub fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self {
            kind,
            message,
            context: vec![],
            source: None,
        }
    }

    /// Attach a named size to the error, usually a key length or an allocation request.
    pub fn with_context(mut self, key: &'static str, value: usize) -> Self {
        self.context.push((key, value));
        self
    }

    /// Set the underlying failure.
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "the source error has been set");
        self.source = Some(source.into());
        self
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Downcast the underlying failure to a concrete error type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Display + std::fmt::Debug + Send + Sync + 'static,
    {
        self.source.as_ref().and_then(|e| e.downcast_ref::<E>())
    }

    /// Failed fallible reservation of `requested` elements for `what`.
    pub fn alloc(what: &'static str, requested: usize, source: TryReserveError) -> Self {
        Error::new(ErrorKind::AllocationFailure, what)
            .with_context("requested", requested)
            .with_source(source)
    }

    /// An entry with an equal key is already indexed.
    pub fn duplicate_key(key_len: usize) -> Self {
        Error::new(ErrorKind::DuplicateKey, "key already indexed").with_context("key_len", key_len)
    }

    /// No entry with the key is indexed.
    pub fn not_found(key_len: usize) -> Self {
        Error::new(ErrorKind::NotFound, "no entry with the given key in the index").with_context("key_len", key_len)
    }

    /// Returns `true` if the error is an [`ErrorKind::AllocationFailure`].
    pub fn is_alloc_failure(&self) -> bool {
        self.kind == ErrorKind::AllocationFailure
    }

    /// Returns `true` if the error is an [`ErrorKind::DuplicateKey`].
    pub fn is_duplicate_key(&self) -> bool {
        self.kind == ErrorKind::DuplicateKey
    }

    /// Returns `true` if the error is an [`ErrorKind::NotFound`].
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

/// Result type for vidx.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn is_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn test_send_sync_static() {
        is_send_sync_static::<Error>();
    }

    #[test]
    fn test_error_display() {
        let err = Error::duplicate_key(2).with_context("depth", 3);
        assert_eq!(err.to_string(), "Duplicate key (key_len: 2, depth: 3): key already indexed");
        assert!(err.is_duplicate_key());
        assert!(!err.is_not_found());

        let err = Error::new(ErrorKind::NotFound, "gone");
        assert_eq!(err.to_string(), "Not found: gone");
    }

    #[test]
    fn test_alloc_error_source() {
        let mut v: Vec<u8> = Vec::new();
        let source = v.try_reserve_exact(usize::MAX).unwrap_err();
        let err = Error::alloc("probe", usize::MAX, source);

        assert!(err.is_alloc_failure());
        assert_eq!(err.kind(), ErrorKind::AllocationFailure);
        assert!(err.downcast_ref::<TryReserveError>().is_some());
        assert!(std::error::Error::source(&err).is_some());
        assert!(err
            .to_string()
            .starts_with(&format!("Allocation failure (requested: {}): probe: ", usize::MAX)));
    }
}
