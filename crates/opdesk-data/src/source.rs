//! Current-value data cells.
//!
//! No reactive framework: the flow is explicit. A [`DataCell`] holds the
//! latest value of one
//! external table and bumps a version on every push. Owners (the
//! sessions) remember the version they last consumed and recompute when
//! it moved — recomputation is a deliberate call, never a hidden
//! side-effect of assignment. Single-writer discipline: cells are not
//! synchronized and belong to one driving thread.

/// Latest value of an externally supplied table.
#[derive(Debug)]
pub struct DataCell<T> {
    value: T,
    version: u64,
}

impl<T> DataCell<T> {
    pub fn new(value: T) -> Self {
        Self { value, version: 0 }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Push a new value, invalidating consumers.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.version += 1;
    }

    /// Monotonic change counter; equal versions mean an unchanged value.
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Consumer-side bookmark for one cell.
#[derive(Debug, Default, Clone, Copy)]
pub struct Watermark {
    seen: Option<u64>,
}

impl Watermark {
    /// True when the cell changed since the last call; advances the
    /// bookmark. The first call always reports a change.
    pub fn changed<T>(&mut self, cell: &DataCell<T>) -> bool {
        let current = cell.version();
        let changed = self.seen != Some(current);
        self.seen = Some(current);
        changed
    }
}
