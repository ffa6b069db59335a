//! Call registry
//!
//! Tracks active call records, the room name index and the historical call
//! log on top of a [`KeyValueStore`]:
//! - `call:{id}` holds the active record, removed on terminal status
//! - `room:{name}` maps a room back to its call id
//! - `log:{id}` mirrors the latest state of every call and is never deleted
//! - `session:{room}` holds direct room joins
//!
//! Reads go straight to the store. Every read-modify-write runs under one
//! async mutex so concurrent webhooks for the same call cannot interleave.

use carebridge_core::models::{CallRecord, CallStatus, RoomSession, StatusUpdate};
use carebridge_core::traits::KeyValueStore;
use carebridge_core::{AppError, AppResult};
use carebridge_store::keys;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Registry of call records
pub struct CallRegistry {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl CallRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Register a new record and index its room
    ///
    /// # Errors
    ///
    /// `AppError::Conflict` when the call id is already active or logged;
    /// existing records only change through status transitions.
    #[instrument(skip(self, record), fields(call_id = %record.call_id, room_name = %record.room_name))]
    pub async fn put(&self, record: CallRecord) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        if self.store.get(&keys::log_key(&record.call_id)).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Call {} is already registered",
                record.call_id
            )));
        }
        self.write_active(&record).await?;
        self.store
            .put(
                &keys::room_key(&record.room_name),
                Value::String(record.call_id.clone()),
            )
            .await?;
        debug!(status = %record.status, "Call record stored");
        Ok(())
    }

    /// Active record by call id
    pub async fn get(&self, call_id: &str) -> AppResult<Option<CallRecord>> {
        self.load(&keys::call_key(call_id)).await
    }

    /// Latest log entry of a call, active or finished
    pub async fn logged(&self, call_id: &str) -> AppResult<Option<CallRecord>> {
        self.load(&keys::log_key(call_id)).await
    }

    /// Apply a status transition
    ///
    /// Transitions that do not move forward are ignored and the current
    /// record is returned unchanged. A terminal status removes the record
    /// from the active index; its log entry keeps the terminal state.
    ///
    /// # Errors
    ///
    /// `AppError::NotFound` when the call is not active, which includes a
    /// repeated terminal callback after cleanup.
    #[instrument(skip(self, update), fields(call_id = %call_id, status = %update.status))]
    pub async fn update_status(&self, call_id: &str, update: StatusUpdate) -> AppResult<CallRecord> {
        let _guard = self.write_lock.lock().await;

        let mut record = self.require(call_id).await?;
        let previous = record.status;

        if !record.apply(&update) {
            warn!(
                current = %previous,
                requested = %update.status,
                "Ignoring status update that does not move the call forward"
            );
            return Ok(record);
        }

        if record.status.is_terminal() {
            self.store.delete(&keys::call_key(call_id)).await?;
            self.store.delete(&keys::room_key(&record.room_name)).await?;
            self.write_log(&record).await?;
            info!(
                room_name = %record.room_name,
                duration_secs = ?record.duration_secs,
                "Call finished with status {}",
                record.status
            );
        } else {
            self.write_active(&record).await?;
            debug!(from = %previous, "Call status updated");
        }

        Ok(record)
    }

    /// Assign a pending inbound call to a provider
    ///
    /// # Errors
    ///
    /// `AppError::NotFound` when the call is unknown and `AppError::Conflict`
    /// when it is no longer waiting for a provider. Nothing is modified in
    /// either case.
    #[instrument(skip(self), fields(call_id = %call_id, provider_id = %provider_id))]
    pub async fn answer(&self, call_id: &str, provider_id: &str) -> AppResult<CallRecord> {
        let _guard = self.write_lock.lock().await;

        let mut record = self.require(call_id).await?;
        if !record.is_pending_inbound() {
            return Err(AppError::Conflict(format!(
                "Call {} is {} and cannot be answered",
                call_id, record.status
            )));
        }

        record.apply(&StatusUpdate::new(CallStatus::Answered).with_provider(provider_id));
        self.write_active(&record).await?;

        info!(room_name = %record.room_name, "Call answered");
        Ok(record)
    }

    /// Drop a record from the active index; the log entry is kept
    pub async fn remove(&self, call_id: &str) -> AppResult<Option<CallRecord>> {
        let _guard = self.write_lock.lock().await;

        let record: Option<CallRecord> = self.load(&keys::call_key(call_id)).await?;
        if let Some(record) = &record {
            self.store.delete(&keys::call_key(call_id)).await?;
            self.store.delete(&keys::room_key(&record.room_name)).await?;
        }
        Ok(record)
    }

    /// Active call owning a room
    pub async fn find_by_room(&self, room_name: &str) -> AppResult<Option<CallRecord>> {
        match self.store.get(&keys::room_key(room_name)).await? {
            Some(Value::String(call_id)) => self.get(&call_id).await,
            _ => Ok(None),
        }
    }

    /// All active calls, most recent first
    pub async fn list_all(&self) -> AppResult<Vec<CallRecord>> {
        let mut records: Vec<CallRecord> = self.scan(keys::CALL_PREFIX).await?;
        sort_recent_first(&mut records);
        Ok(records)
    }

    /// Active calls handled by a provider
    pub async fn list_by_provider(&self, provider_id: &str) -> AppResult<Vec<CallRecord>> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|r| r.provider_id.as_deref() == Some(provider_id))
            .collect())
    }

    /// Inbound calls still waiting for a provider, oldest first
    pub async fn list_pending_inbound(&self) -> AppResult<Vec<CallRecord>> {
        let mut pending: Vec<CallRecord> = self
            .list_all()
            .await?
            .into_iter()
            .filter(CallRecord::is_pending_inbound)
            .collect();
        pending.reverse();
        Ok(pending)
    }

    /// Call log, most recent first, at most `limit` entries
    pub async fn call_log(&self, limit: usize) -> AppResult<Vec<CallRecord>> {
        let mut records: Vec<CallRecord> = self.scan(keys::LOG_PREFIX).await?;
        sort_recent_first(&mut records);
        records.truncate(limit);
        Ok(records)
    }

    /// Call log entries of one patient, most recent first
    pub async fn call_log_for_patient(&self, patient: &str) -> AppResult<Vec<CallRecord>> {
        let mut records: Vec<CallRecord> = self
            .scan::<CallRecord>(keys::LOG_PREFIX)
            .await?
            .into_iter()
            .filter(|r| r.belongs_to_patient(patient))
            .collect();
        sort_recent_first(&mut records);
        Ok(records)
    }

    /// Remember that a provider joined a room directly
    pub async fn record_room_session(&self, session: RoomSession) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        self.store
            .put(
                &keys::session_key(&session.room_name),
                serde_json::to_value(&session)?,
            )
            .await
    }

    /// Direct room sessions, most recent first
    pub async fn room_sessions(&self) -> AppResult<Vec<RoomSession>> {
        let mut sessions: Vec<RoomSession> = self.scan(keys::SESSION_PREFIX).await?;
        sessions.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));
        Ok(sessions)
    }

    async fn require(&self, call_id: &str) -> AppResult<CallRecord> {
        self.load(&keys::call_key(call_id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Call {} not found", call_id)))
    }

    async fn write_active(&self, record: &CallRecord) -> AppResult<()> {
        let value = serde_json::to_value(record)?;
        self.store
            .put(&keys::call_key(&record.call_id), value.clone())
            .await?;
        self.store.put(&keys::log_key(&record.call_id), value).await
    }

    async fn write_log(&self, record: &CallRecord) -> AppResult<()> {
        self.store
            .put(&keys::log_key(&record.call_id), serde_json::to_value(record)?)
            .await
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        self.store
            .get(key)
            .await?
            .map(|value| serde_json::from_value(value).map_err(AppError::from))
            .transpose()
    }

    async fn scan<T: DeserializeOwned>(&self, prefix: &str) -> AppResult<Vec<T>> {
        self.store
            .scan(&keys::namespace(prefix))
            .await?
            .into_iter()
            .map(|(_, value)| serde_json::from_value(value).map_err(AppError::from))
            .collect()
    }
}

fn sort_recent_first(records: &mut [CallRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

impl std::fmt::Debug for CallRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallRegistry").finish_non_exhaustive()
    }
}
