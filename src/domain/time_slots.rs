use crate::domain::models::{TimeRange, TimeSlot};
use crate::domain::shift_time::{minutes_to_time, time_to_minutes};
use std::collections::HashSet;

const DEFAULT_FIRST_HOUR: u32 = 6;
const DEFAULT_LAST_HOUR: u32 = 23;

/// Ordered, immutable list of bookable intervals forming the scheduling grid.
///
/// The catalog is built once (from configuration or [`TimeSlotCatalog::default`])
/// and shared by reference; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlotCatalog {
    slots: Vec<TimeSlot>,
}

impl TimeSlotCatalog {
    pub fn new(slots: Vec<TimeSlot>) -> Result<Self, String> {
        let mut seen = HashSet::new();
        for slot in &slots {
            slot.validate()?;
            if !seen.insert(slot.id.as_str()) {
                return Err(format!("duplicate time slot id: {}", slot.id));
            }
        }
        Ok(Self { slots })
    }

    /// One slot per hour starting at each hour in `first_hour..last_hour`,
    /// with ids of the form `slot-HH`.
    pub fn hourly(first_hour: u32, last_hour: u32) -> Self {
        let slots = (first_hour..last_hour)
            .map(|hour| {
                let start = minutes_to_time(hour * 60);
                let end = minutes_to_time((hour + 1) * 60);
                TimeSlot {
                    id: format!("slot-{hour:02}"),
                    label: format!("{start}-{end}"),
                    start,
                    end,
                }
            })
            .collect();
        Self { slots }
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeSlot> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot_id: &str) -> Option<&TimeSlot> {
        self.slots.iter().find(|slot| slot.id == slot_id)
    }

    /// Bounds of a catalog entry, or an empty range for unknown ids.
    pub fn time_range_from_slot_id(&self, slot_id: &str) -> TimeRange {
        self.get(slot_id)
            .map(|slot| TimeRange::new(slot.start.clone(), slot.end.clone()))
            .unwrap_or_else(TimeRange::empty)
    }

    /// Catalog entries lying entirely inside `[start_time, end_time)`, in
    /// catalog order.
    pub fn slots_within(&self, start_time: &str, end_time: &str) -> Vec<&TimeSlot> {
        let (Some(start), Some(end)) = (time_to_minutes(start_time), time_to_minutes(end_time))
        else {
            return Vec::new();
        };
        self.slots
            .iter()
            .filter(|slot| {
                match (time_to_minutes(&slot.start), time_to_minutes(&slot.end)) {
                    (Some(slot_start), Some(slot_end)) => slot_start >= start && slot_end <= end,
                    _ => false,
                }
            })
            .collect()
    }

    pub fn slot_ids_within(&self, start_time: &str, end_time: &str) -> Vec<String> {
        self.slots_within(start_time, end_time)
            .into_iter()
            .map(|slot| slot.id.clone())
            .collect()
    }

    /// Ids of catalog entries sharing any time with `[start_time, end_time)`.
    /// Entries that only touch a bound are not included.
    pub fn slot_ids_overlapping(&self, start_time: &str, end_time: &str) -> Vec<String> {
        let (Some(start), Some(end)) = (time_to_minutes(start_time), time_to_minutes(end_time))
        else {
            return Vec::new();
        };
        self.slots
            .iter()
            .filter(|slot| {
                match (time_to_minutes(&slot.start), time_to_minutes(&slot.end)) {
                    (Some(slot_start), Some(slot_end)) => slot_start < end && start < slot_end,
                    _ => false,
                }
            })
            .map(|slot| slot.id.clone())
            .collect()
    }
}

impl Default for TimeSlotCatalog {
    fn default() -> Self {
        Self::hourly(DEFAULT_FIRST_HOUR, DEFAULT_LAST_HOUR)
    }
}
