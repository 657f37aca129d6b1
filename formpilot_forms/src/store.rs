//! Per-company form state with an undo stack.
//!
//! Each company gets its own slot, created lazily by its first generation.
//! Edits and undos on a company that was never generated fail without
//! allocating anything. Writers
//! serialize on the slot's async mutex; readers see the last published
//! snapshot without waiting for writers. State lives for the lifetime of the
//! process.

use chrono::{DateTime, Utc};
use formpilot_core::{CanonicalForm, content_digest};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::error::StoreError;

/// An immutable, shareable form version.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    form: Arc<CanonicalForm>,
    version: String,
    taken_at: DateTime<Utc>,
}

impl Snapshot {
    #[must_use]
    pub fn new(form: CanonicalForm) -> Self {
        let digest = content_digest(&form.to_json());
        Self {
            form: Arc::new(form),
            version: digest.chars().take(12).collect(),
            taken_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn form(&self) -> &CanonicalForm {
        &self.form
    }

    /// Short content digest of the form.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub const fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }
}

#[derive(Debug, Default)]
struct EntityState {
    current: Option<Snapshot>,
    history: Vec<Snapshot>,
}

#[derive(Debug, Default)]
struct EntitySlot {
    state: Arc<AsyncMutex<EntityState>>,
    published: RwLock<Option<Snapshot>>,
}

impl EntitySlot {
    fn publish(&self, snapshot: Snapshot) {
        *self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    fn published(&self) -> Option<Snapshot> {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Exclusive access to one company's state.
///
/// Held across a whole read-modify-write cycle, including any engine call in
/// between, so concurrent edits to the same company queue up. Dropping the
/// guard without writing leaves the state as it was.
pub struct EntityGuard {
    entity_id: String,
    slot: Arc<EntitySlot>,
    state: OwnedMutexGuard<EntityState>,
}

impl EntityGuard {
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn current(&self) -> Result<Snapshot, StoreError> {
        self.state
            .current
            .clone()
            .ok_or_else(|| StoreError::NoCurrentState(self.entity_id.clone()))
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.state.history.len()
    }

    /// Replace the current form and clear the history.
    pub fn generate(&mut self, form: CanonicalForm) -> Snapshot {
        let snapshot = Snapshot::new(form);
        self.state.history.clear();
        self.state.current = Some(snapshot.clone());
        self.slot.publish(snapshot.clone());
        info!(
            "Generated form for company {} (version {})",
            self.entity_id,
            snapshot.version()
        );
        snapshot
    }

    /// Push the current form onto the history and make `form` current.
    pub fn apply_edit(&mut self, form: CanonicalForm) -> Result<Snapshot, StoreError> {
        let previous = self.current()?;
        let snapshot = Snapshot::new(form);
        self.state.history.push(previous);
        self.state.current = Some(snapshot.clone());
        self.slot.publish(snapshot.clone());
        debug!(
            "Edited form for company {}: version {}, history depth {}",
            self.entity_id,
            snapshot.version(),
            self.state.history.len()
        );
        Ok(snapshot)
    }

    /// Pop the most recent prior version back into current. There is no redo.
    pub fn undo(&mut self) -> Result<Snapshot, StoreError> {
        let previous = self
            .state
            .history
            .pop()
            .ok_or_else(|| StoreError::EmptyHistory(self.entity_id.clone()))?;
        self.state.current = Some(previous.clone());
        self.slot.publish(previous.clone());
        debug!(
            "Undid edit for company {}: back to version {}",
            self.entity_id,
            previous.version()
        );
        Ok(previous)
    }
}

#[derive(Debug, Default)]
pub struct FormStore {
    slots: Mutex<HashMap<String, Arc<EntitySlot>>>,
}

impl FormStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, entity_id: &str) -> Arc<EntitySlot> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(entity_id.to_string()).or_default())
    }

    fn existing_slot(&self, entity_id: &str) -> Option<Arc<EntitySlot>> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity_id)
            .cloned()
    }

    async fn guard(entity_id: &str, slot: Arc<EntitySlot>) -> EntityGuard {
        let state = Arc::clone(&slot.state).lock_owned().await;
        EntityGuard {
            entity_id: entity_id.to_string(),
            slot,
            state,
        }
    }

    /// Wait for exclusive access to one company's state, creating its slot.
    ///
    /// Only generation goes through here.
    pub async fn lock_or_create(&self, entity_id: &str) -> EntityGuard {
        Self::guard(entity_id, self.slot(entity_id)).await
    }

    /// Wait for exclusive access to a company that already has a slot.
    pub async fn lock(&self, entity_id: &str) -> Option<EntityGuard> {
        match self.existing_slot(entity_id) {
            Some(slot) => Some(Self::guard(entity_id, slot).await),
            None => None,
        }
    }

    pub async fn generate(&self, entity_id: &str, form: CanonicalForm) -> Snapshot {
        self.lock_or_create(entity_id).await.generate(form)
    }

    /// Last published snapshot; never waits on a writer.
    pub fn get_current(&self, entity_id: &str) -> Result<Snapshot, StoreError> {
        self.existing_slot(entity_id)
            .and_then(|slot| slot.published())
            .ok_or_else(|| StoreError::NotFound(entity_id.to_string()))
    }

    pub async fn apply_edit(
        &self,
        entity_id: &str,
        form: CanonicalForm,
    ) -> Result<Snapshot, StoreError> {
        self.lock(entity_id)
            .await
            .ok_or_else(|| StoreError::NoCurrentState(entity_id.to_string()))?
            .apply_edit(form)
    }

    pub async fn undo(&self, entity_id: &str) -> Result<Snapshot, StoreError> {
        self.lock(entity_id)
            .await
            .ok_or_else(|| StoreError::EmptyHistory(entity_id.to_string()))?
            .undo()
    }

    pub async fn history_len(&self, entity_id: &str) -> usize {
        match self.existing_slot(entity_id) {
            Some(slot) => slot.state.lock().await.history.len(),
            None => 0,
        }
    }

    /// Number of company slots, including ones whose generation failed
    /// after the slot was created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Companies with a current form, sorted.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<String> {
        let mut ids = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, slot)| slot.published().is_some())
            .map(|(id, _)| id.clone())
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }
}
