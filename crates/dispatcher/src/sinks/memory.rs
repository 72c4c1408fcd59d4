//! MemorySink - keeps rows in memory

use std::sync::{Arc, Mutex, MutexGuard};

use contracts::{ContractError, MergedRow, RowSink};

/// Collects rows into a shared vector
///
/// Clones share the same storage, so a clone kept by the caller sees the
/// rows written through a boxed copy.
#[derive(Debug, Clone)]
pub struct MemorySink {
    name: String,
    rows: Arc<Mutex<Vec<MergedRow>>>,
    discards: Arc<Mutex<u64>>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Arc::default(),
            discards: Arc::default(),
        }
    }

    /// Copy of the rows currently held
    pub fn rows(&self) -> Vec<MergedRow> {
        lock(&self.rows).clone()
    }

    /// Number of discards seen
    pub fn discards(&self) -> u64 {
        *lock(&self.discards)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RowSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, row: &MergedRow) -> Result<(), ContractError> {
        lock(&self.rows).push(*row);
        Ok(())
    }

    fn discard(&mut self) -> Result<(), ContractError> {
        lock(&self.rows).clear();
        *lock(&self.discards) += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_rows() {
        let sink = MemorySink::new("mem");
        let mut boxed: Box<dyn RowSink> = Box::new(sink.clone());
        let row = MergedRow {
            cycle: 1,
            bif_trigger: None,
            ahcal_trigger: Some(1),
            bif_time: 0,
            dwc: None,
        };

        boxed.write(&row).unwrap();
        boxed.write(&row).unwrap();
        assert_eq!(sink.rows().len(), 2);

        boxed.discard().unwrap();
        boxed.write(&row).unwrap();
        assert_eq!(sink.rows(), vec![row]);
        assert_eq!(sink.discards(), 1);
    }
}
