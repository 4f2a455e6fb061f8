use std::fmt;

use serde::{Deserialize, Serialize};

/// ID used for a partition when nothing numeric was observed.
pub const ID_FLOOR: u64 = 0;

/// ID counter bucket. VQs draw from their own sequence; every other entity
/// class shares the second one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Vq,
    Other,
}

impl Partition {
    pub fn for_class(entity_class: &str) -> Self {
        if entity_class.trim().eq_ignore_ascii_case("vq") {
            Self::Vq
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vq => write!(f, "vq"),
            Self::Other => write!(f, "other"),
        }
    }
}

// ---------------------------------------------------------------------------
// Seed
// ---------------------------------------------------------------------------

/// Highest IDs observed per partition. `None` means nothing numeric seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSeed {
    pub vq: Option<u64>,
    pub other: Option<u64>,
}

impl IdSeed {
    pub fn new(vq: u64, other: u64) -> Self {
        Self { vq: Some(vq), other: Some(other) }
    }

    pub fn get(&self, partition: Partition) -> Option<u64> {
        match partition {
            Partition::Vq => self.vq,
            Partition::Other => self.other,
        }
    }

    /// Record a raw ID. Only all-digit values count; returns whether the
    /// value was numeric.
    pub fn observe(&mut self, partition: Partition, raw: &str) -> bool {
        let raw = raw.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        match raw.parse::<u64>() {
            Ok(id) => {
                self.observe_id(partition, id);
                true
            }
            Err(_) => false,
        }
    }

    pub fn observe_id(&mut self, partition: Partition, id: u64) {
        let slot = match partition {
            Partition::Vq => &mut self.vq,
            Partition::Other => &mut self.other,
        };
        *slot = Some(slot.map_or(id, |current| current.max(id)));
    }

    pub fn merge(&mut self, other: &IdSeed) {
        if let Some(id) = other.vq {
            self.observe_id(Partition::Vq, id);
        }
        if let Some(id) = other.other {
            self.observe_id(Partition::Other, id);
        }
    }
}

// ---------------------------------------------------------------------------
// Allocator
// ---------------------------------------------------------------------------

/// Monotonic per-partition counters for one load/compare session.
///
/// Not synchronised; wrap in a [`crate::Session`] when shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next_vq: u64,
    next_other: u64,
}

impl IdAllocator {
    /// Continue after the highest observed IDs.
    pub fn from_seed(seed: &IdSeed) -> Self {
        let next = |max: Option<u64>| max.unwrap_or(ID_FLOOR).saturating_add(1);
        Self { next_vq: next(seed.vq), next_other: next(seed.other) }
    }

    /// Start each partition at an explicit next ID.
    pub fn starting_at(vq_next: u64, other_next: u64) -> Self {
        Self { next_vq: vq_next, next_other: other_next }
    }

    pub fn next(&mut self, partition: Partition) -> u64 {
        let slot = match partition {
            Partition::Vq => &mut self.next_vq,
            Partition::Other => &mut self.next_other,
        };
        let id = *slot;
        *slot = slot.saturating_add(1);
        log::debug!("allocated {partition} id {id}");
        id
    }

    /// The ID `next` would return, without allocating it.
    pub fn peek(&self, partition: Partition) -> u64 {
        match partition {
            Partition::Vq => self.next_vq,
            Partition::Other => self.next_other,
        }
    }
}
