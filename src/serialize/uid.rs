//! Deterministic identifiers for marked elements and extracted resources

use std::collections::HashSet;

use sha2::{Digest, Sha256};

/// Generates short ids from a seed and a running counter.
///
/// Ids start with `_` so they are valid as the first character of a CSS
/// identifier. A capture and all of its nested frame captures share one
/// generator, which keeps ids unique across the whole snapshot while staying
/// identical between runs over the same document. Ids taken over from the
/// document itself are claimed so they are never generated again.
#[derive(Debug, Clone)]
pub struct UidGenerator {
    seed: String,
    counter: u64,
    issued: HashSet<String>,
}

impl UidGenerator {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            counter: 0,
            issued: HashSet::new(),
        }
    }

    pub fn next_uid(&mut self) -> String {
        loop {
            self.counter += 1;
            let mut hasher = Sha256::new();
            hasher.update(self.seed.as_bytes());
            hasher.update(self.counter.to_be_bytes());
            let digest = hex::encode(hasher.finalize());
            let uid = format!("_{}", &digest[..9]);
            if self.issued.insert(uid.clone()) {
                return uid;
            }
        }
    }

    /// Reserve an id that already exists. Returns `false` when it was issued
    /// or claimed before.
    pub fn claim(&mut self, uid: &str) -> bool {
        self.issued.insert(uid.to_string())
    }
}
