use crate::error::{ClinicError, Result};
use crate::types::{Slot, SlotStatus};
use chrono::{NaiveDate, NaiveTime};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// JSON-backed ledger of clinic slots, keyed by date and start time.
///
/// Every mutation loads the whole file, applies the change and writes the
/// file back. That is plenty for a ledger of this size and keeps the file
/// trivially inspectable by hand.
#[derive(Debug, Clone)]
pub struct BookingStore {
    path: PathBuf,
}

impl BookingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Vec<Slot>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(|error| {
            ClinicError::Store(format!("failed to read {}: {error}", self.path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|error| {
            ClinicError::Store(format!("failed to parse {}: {error}", self.path.display()))
        })
    }

    fn persist(&self, slots: &[Slot]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                ClinicError::Store(format!("failed to create {}: {error}", parent.display()))
            })?;
        }
        let raw = serde_json::to_string_pretty(slots).map_err(|error| {
            ClinicError::Store(format!("failed to serialize slots: {error}"))
        })?;
        fs::write(&self.path, raw).map_err(|error| {
            ClinicError::Store(format!("failed to write {}: {error}", self.path.display()))
        })?;
        debug!("Persisted {} slots to {}", slots.len(), self.path.display());
        Ok(())
    }

    /// Returns slots matching the filters, ordered by date and time.
    pub fn list(&self, date: Option<NaiveDate>, status: Option<SlotStatus>) -> Result<Vec<Slot>> {
        let mut slots = self.load()?;
        if let Some(date) = date {
            slots.retain(|slot| slot.date == date);
        }
        if let Some(status) = status {
            slots.retain(|slot| slot.status == status);
        }
        slots.sort_by_key(|slot| (slot.date, slot.time));
        Ok(slots)
    }

    pub fn find(&self, date: NaiveDate, time: NaiveTime) -> Result<Option<Slot>> {
        Ok(self
            .load()?
            .into_iter()
            .find(|slot| slot.date == date && slot.time == time))
    }

    /// Adds a new slot. The (date, time) key must be free.
    pub fn insert(&self, slot: Slot) -> Result<()> {
        let mut slots = self.load()?;
        if slots
            .iter()
            .any(|existing| existing.date == slot.date && existing.time == slot.time)
        {
            return Err(ClinicError::DuplicateSlot(format!(
                "a slot already exists for {} at {}",
                slot.date,
                slot.time.format("%H:%M")
            )));
        }
        slots.push(slot);
        self.persist(&slots)
    }

    /// Applies `mutate` to the slot under (date, time) and persists the
    /// result. Returns the slot as written.
    pub fn update<F>(&self, date: NaiveDate, time: NaiveTime, mutate: F) -> Result<Slot>
    where
        F: FnOnce(&mut Slot),
    {
        let mut slots = self.load()?;
        let slot = slots
            .iter_mut()
            .find(|slot| slot.date == date && slot.time == time)
            .ok_or_else(|| ClinicError::NotFound(no_slot_message(date, time)))?;
        mutate(slot);
        let updated = slot.clone();
        self.persist(&slots)?;
        Ok(updated)
    }

    /// Removes and returns the slot under (date, time).
    pub fn remove(&self, date: NaiveDate, time: NaiveTime) -> Result<Slot> {
        let mut slots = self.load()?;
        let index = slots
            .iter()
            .position(|slot| slot.date == date && slot.time == time)
            .ok_or_else(|| ClinicError::NotFound(no_slot_message(date, time)))?;
        let removed = slots.remove(index);
        self.persist(&slots)?;
        Ok(removed)
    }
}

fn no_slot_message(date: NaiveDate, time: NaiveTime) -> String {
    format!("no slot for {} at {}", date, time.format("%H:%M"))
}
