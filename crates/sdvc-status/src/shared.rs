use std::sync::{Arc, RwLock};

use crate::error::{StatusError, StatusResult};
use crate::list::StatusList;
use crate::types::StatusType;

/// Cloneable handle to a status list shared between tasks.
///
/// Writers take the lock exclusively, since updating a sub-byte entry is a
/// read-modify-write of the containing byte.
#[derive(Debug, Clone)]
pub struct SharedStatusList {
    inner: Arc<RwLock<StatusList>>,
}

impl SharedStatusList {
    pub fn new(list: StatusList) -> Self {
        Self {
            inner: Arc::new(RwLock::new(list)),
        }
    }

    pub fn get(&self, index: usize) -> StatusResult<u8> {
        let list = self.inner.read().map_err(|_| StatusError::LockPoisoned)?;
        list.get(index)
    }

    pub fn status(&self, index: usize) -> StatusResult<StatusType> {
        let list = self.inner.read().map_err(|_| StatusError::LockPoisoned)?;
        Ok(StatusType::from_value(list.get(index)?, list.bits()))
    }

    pub fn set(&self, index: usize, value: u8) -> StatusResult<()> {
        let mut list = self.inner.write().map_err(|_| StatusError::LockPoisoned)?;
        list.set(index, value)?;
        tracing::debug!(index, value, "status entry updated");
        Ok(())
    }

    pub fn encode(&self) -> StatusResult<String> {
        let list = self.inner.read().map_err(|_| StatusError::LockPoisoned)?;
        list.encode()
    }

    /// Copy of the current list contents.
    pub fn snapshot(&self) -> StatusResult<StatusList> {
        let list = self.inner.read().map_err(|_| StatusError::LockPoisoned)?;
        Ok(list.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::BitsPerStatus;
    use std::thread;

    #[test]
    fn test_concurrent_writers_to_same_byte() {
        // Four 2-bit entries share byte 0; every write must survive.
        let shared = SharedStatusList::new(StatusList::filled(4, BitsPerStatus::Two, 3).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let s = shared.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        s.set(i, (i % 3) as u8).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..4 {
            assert_eq!(shared.get(i).unwrap(), (i % 3) as u8);
        }
    }

    #[test]
    fn test_status_and_snapshot() {
        let shared = SharedStatusList::new(StatusList::filled(10, BitsPerStatus::Two, 0).unwrap());
        shared.set(2, 1).unwrap();
        assert_eq!(shared.status(2).unwrap(), StatusType::Suspended);
        assert_eq!(shared.snapshot().unwrap().get(2).unwrap(), 1);
        assert!(shared.set(10, 0).is_err());
    }
}
