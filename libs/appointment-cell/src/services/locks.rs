use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-doctor booking locks. The slot ledger's read-check-then-write must
/// be serialized per doctor (two concurrent bookings for the same slot
/// would otherwise both pass the availability check); holding the doctor's
/// mutex across the check and the ledger write closes that race. Locks are
/// created lazily and shared by the booking and lifecycle services.
#[derive(Clone, Default)]
pub struct DoctorSlotLocks {
    locks: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl DoctorSlotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, doctor_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(doctor_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
