//! Unique signal names for generated registers.

use std::collections::HashSet;

/// Hands out identifiers that collide neither with the module's ports nor
/// with each other.
#[derive(Debug, Clone, Default)]
pub struct Namer {
    taken: HashSet<String>,
}

impl Namer {
    /// Creates a namer that never returns any of `reserved`.
    pub fn new<'a>(reserved: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            taken: reserved.into_iter().map(str::to_string).collect(),
        }
    }

    /// Returns `base`, or `base_1`, `base_2`, ... if it is taken.
    pub fn fresh(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut n = 1;
        while self.taken.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}
