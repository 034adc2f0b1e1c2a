// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message-id generation, abstracted behind a trait so tests can supply
//! deterministic ids instead of the production random generator.

use parking_lot::Mutex;
use uuid::Uuid;

/// Generates a 128-bit hex identifier for a newly constructed envelope.
pub trait IdGen: Send + Sync {
    fn next_id(&self) -> String;
}

/// Production id generator: a random v4 UUID rendered as a 32-char hex string
/// (no dashes), matching the original `uuid.uuid4().hex` convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Test id generator that returns a fixed id, or a caller-supplied sequence
/// cycling on exhaustion.
pub struct FixedIdGen {
    ids: Mutex<Vec<String>>,
    cursor: Mutex<usize>,
}

impl FixedIdGen {
    pub fn new(id: impl Into<String>) -> Self {
        Self::from_sequence([id.into()])
    }

    pub fn from_sequence(ids: impl IntoIterator<Item = String>) -> Self {
        let ids: Vec<String> = ids.into_iter().collect();
        assert!(!ids.is_empty(), "FixedIdGen requires at least one id");
        Self { ids: Mutex::new(ids), cursor: Mutex::new(0) }
    }
}

impl IdGen for FixedIdGen {
    fn next_id(&self) -> String {
        let ids = self.ids.lock();
        let mut cursor = self.cursor.lock();
        let id = ids[*cursor % ids.len()].clone();
        *cursor += 1;
        id
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
