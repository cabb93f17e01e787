// names.rs — Symbol naming authority
//
// Hands out collision-free symbol names for one graph's lifetime. Every node
// obtains its result name here at construction time, so a single pool per
// graph is the uniqueness boundary.
//
// Preconditions: none.
// Postconditions: every name ever returned by `unique` is distinct.
// Failure modes: none (pure in-memory bookkeeping).
// Side effects: mutates the issued-name set and the suffix counter.

use std::collections::BTreeSet;
use std::fmt::Write as _;

/// Registry of issued symbol names plus a monotonically increasing suffix
/// counter. Base names are first-come-first-served: the first request for a
/// base gets the base itself, later requests get `<base>_<n>` variants.
#[derive(Debug, Default)]
pub struct NamePool {
    issued: BTreeSet<String>,
    version: u64,
}

impl NamePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a unique name for `base`.
    ///
    /// Returns `base` itself on first request. On a repeat request the name
    /// is disambiguated with the counter, skipping suffixed forms a caller
    /// already claimed as bases in their own right.
    pub fn unique(&mut self, base: &str) -> String {
        if self.issued.insert(base.to_string()) {
            return base.to_string();
        }
        loop {
            let candidate = format!("{}_{}", base, self.version);
            self.version += 1;
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Write one `float <name>;` declaration per issued name, in set order.
    ///
    /// Optional path for target dialects that do not implicitly declare
    /// locals; the default generation path does not use it.
    pub fn emit_global_declarations(&self, out: &mut String) {
        for name in &self.issued {
            let _ = writeln!(out, "float {};", name);
        }
    }

    /// Iterate over all issued names, in set order.
    pub fn issued(&self) -> impl Iterator<Item = &str> {
        self.issued.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}
