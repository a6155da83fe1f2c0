//! Shared context store.
//!
//! The [`SharedContext`] is the substrate agents use to communicate
//! indirectly within a single run: a mutable map from string keys to
//! [`serde_json::Value`]s. One agent writes a key, every later agent in the
//! same run can read it. Nothing is reset between turns.
//!
//! Single-writer-per-key is a convention of agent design, not something the
//! container enforces. The context is owned by the
//! [`GroupChat`](crate::GroupChat) for the lifetime of a run and handed to
//! agents by mutable reference, one turn at a time, so no agent can retain
//! access beyond its own turn.
//!
//! # Example
//!
//! ```rust
//! use chorus::SharedContext;
//!
//! let mut ctx = SharedContext::new();
//! ctx.set("url", "https://example.com");
//! ctx.set("attempts", 3);
//!
//! assert_eq!(ctx.get_str("url"), Some("https://example.com"));
//! assert!(ctx.get("missing").is_none());
//!
//! let frozen = ctx.snapshot();
//! ctx.set("url", "https://other.example");
//! assert_eq!(frozen.get_str("url"), Some("https://example.com"));
//! ```

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Mutable keyed store of values visible to every agent in a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SharedContext {
    values: HashMap<String, serde_json::Value>,
}

impl SharedContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Look up a value by key and borrow it as a string, if it is one.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    /// Insert or overwrite a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the context holds no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Take an immutable copy of the current state.
    ///
    /// Snapshots are cheap to clone (the map is behind an `Arc`) and are
    /// what [`TurnRecord`](crate::TurnRecord)s reference, so a run record
    /// can show the context as it stood after each turn's writes committed.
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            values: Arc::new(self.values.clone()),
        }
    }
}

/// An immutable copy of a [`SharedContext`] at a point in time.
#[derive(Debug, Clone)]
pub struct ContextSnapshot {
    values: Arc<HashMap<String, serde_json::Value>>,
}

impl ContextSnapshot {
    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Look up a value by key and borrow it as a string, if it is one.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    /// Number of keys captured in the snapshot.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the snapshot captured an empty context.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for ContextSnapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.values.as_ref().serialize(serializer)
    }
}
