use crate::core::models::ids::TypeId;
use itertools::Itertools;
use std::collections::HashMap;

/// Symmetric map from unordered type pairs to "overlap checks enabled".
///
/// Keys are canonicalized as `(min, max)`, so `set(a, b, v)` and `set(b, a, v)` write the same
/// entry. Pairs never set are enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlapMatrix {
    entries: HashMap<(TypeId, TypeId), bool>,
}

#[inline]
fn canonical(a: TypeId, b: TypeId) -> (TypeId, TypeId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl OverlapMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, a: TypeId, b: TypeId, enabled: bool) {
        self.entries.insert(canonical(a, b), enabled);
    }

    pub fn get(&self, a: TypeId, b: TypeId) -> bool {
        self.entries.get(&canonical(a, b)).copied().unwrap_or(true)
    }

    /// Forgets an explicit setting so the pair falls back to enabled.
    pub fn reset(&mut self, a: TypeId, b: TypeId) {
        self.entries.remove(&canonical(a, b));
    }

    /// Explicitly set entries in canonical order, sorted.
    pub fn entries(&self) -> Vec<((TypeId, TypeId), bool)> {
        self.entries
            .iter()
            .map(|(&k, &v)| (k, v))
            .sorted_unstable()
            .collect()
    }

    /// Dense lookup table for the first `num_types` types.
    pub fn table(&self, num_types: usize) -> InteractionTable {
        let mut enabled = vec![true; num_types * num_types];
        for (&(a, b), &value) in &self.entries {
            if a < num_types && b < num_types {
                enabled[a * num_types + b] = value;
                enabled[b * num_types + a] = value;
            }
        }
        InteractionTable { num_types, enabled }
    }
}

/// Read-only dense copy of an [`OverlapMatrix`], indexed directly during sweeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionTable {
    num_types: usize,
    enabled: Vec<bool>,
}

impl InteractionTable {
    /// Types outside the table are treated as enabled.
    #[inline]
    pub fn enabled(&self, a: TypeId, b: TypeId) -> bool {
        if a >= self.num_types || b >= self.num_types {
            return true;
        }
        self.enabled[a * self.num_types + b]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_pairs_default_to_enabled() {
        let matrix = OverlapMatrix::new();
        assert!(matrix.get(0, 0));
        assert!(matrix.get(3, 7));
    }

    #[test]
    fn get_is_symmetric_after_mixed_sets() {
        let mut matrix = OverlapMatrix::new();
        let ops = [
            (0, 1, false),
            (1, 0, true),
            (2, 1, false),
            (1, 2, false),
            (3, 0, false),
            (0, 3, true),
            (2, 2, false),
        ];
        for (a, b, v) in ops {
            matrix.set(a, b, v);
            for i in 0..4 {
                for j in 0..4 {
                    assert_eq!(matrix.get(i, j), matrix.get(j, i));
                }
            }
        }
        assert!(matrix.get(0, 1));
        assert!(!matrix.get(1, 2));
        assert!(matrix.get(3, 0));
        assert!(!matrix.get(2, 2));
    }

    #[test]
    fn reversed_set_overwrites_same_entry() {
        let mut matrix = OverlapMatrix::new();
        matrix.set(4, 1, false);
        matrix.set(1, 4, true);
        assert_eq!(matrix.entries(), vec![((1, 4), true)]);
    }

    #[test]
    fn reset_restores_default() {
        let mut matrix = OverlapMatrix::new();
        matrix.set(0, 1, false);
        matrix.reset(1, 0);
        assert!(matrix.get(0, 1));
    }

    #[test]
    fn table_mirrors_matrix() {
        let mut matrix = OverlapMatrix::new();
        matrix.set(1, 0, false);
        matrix.set(5, 0, false);
        let table = matrix.table(2);
        assert!(!table.enabled(0, 1));
        assert!(!table.enabled(1, 0));
        assert!(table.enabled(1, 1));
        assert!(table.enabled(0, 5));
    }
}
