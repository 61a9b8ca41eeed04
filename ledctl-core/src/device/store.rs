//! Bounded device store
//!
//! A fixed arena of [`MAX_DEVICES`] slots. Each slot has its own guard, a
//! critical-section mutex around a `RefCell`, so taking it never suspends
//! and is safe from interrupt context. Records in different slots never
//! contend.
//!
//! Devices are addressed by [`DeviceId`]: slot index plus a generation that
//! changes every time the slot is reused. An id kept after teardown
//! resolves to [`ControlError::NoDevice`] instead of reaching whatever
//! record took the slot next.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;

use super::record::DeviceRecord;
use crate::error::ControlError;

/// Maximum number of devices handled at once
pub const MAX_DEVICES: usize = 8;

/// Stable handle to a registered device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId {
    index: u8,
    generation: u16,
}

impl DeviceId {
    /// Slot index (0..MAX_DEVICES), also used as the link address
    pub fn index(&self) -> usize {
        usize::from(self.index)
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }
}

struct Slot<L, P> {
    generation: u16,
    record: Option<DeviceRecord<L, P>>,
}

type Guard<T> = Mutex<CriticalSectionRawMutex, RefCell<T>>;

/// Owner of all device records
pub struct DeviceStore<L, P> {
    slots: [Guard<Slot<L, P>>; MAX_DEVICES],
}

impl<L, P> Default for DeviceStore<L, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L, P> DeviceStore<L, P> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| {
                Mutex::new(RefCell::new(Slot {
                    generation: 0,
                    record: None,
                }))
            }),
        }
    }

    /// Run `f` on the record behind `id` while holding its guard
    ///
    /// `f` must not call back into the store for the same device.
    pub fn with<R>(
        &self,
        id: DeviceId,
        f: impl FnOnce(&mut DeviceRecord<L, P>) -> R,
    ) -> Result<R, ControlError> {
        let guard = self.slots.get(id.index()).ok_or(ControlError::NoDevice)?;
        guard.lock(|cell| {
            let mut slot = cell.borrow_mut();
            if slot.generation != id.generation {
                return Err(ControlError::NoDevice);
            }
            slot.record.as_mut().map(f).ok_or(ControlError::NoDevice)
        })
    }

    /// Id of the device currently occupying slot `index`
    pub fn id_at(&self, index: usize) -> Option<DeviceId> {
        let guard = self.slots.get(index)?;
        guard.lock(|cell| {
            let slot = cell.borrow();
            slot.record.as_ref().map(|_| DeviceId {
                index: index as u8,
                generation: slot.generation,
            })
        })
    }

    /// Ids of all registered devices, in slot order
    pub fn ids(&self) -> Vec<DeviceId, MAX_DEVICES> {
        let mut ids = Vec::new();
        for index in 0..MAX_DEVICES {
            if let Some(id) = self.id_at(index) {
                // At most MAX_DEVICES slots
                let _ = ids.push(id);
            }
        }
        ids
    }

    /// Number of registered devices
    pub fn len(&self) -> usize {
        (0..MAX_DEVICES).filter(|&i| self.id_at(i).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Place a record in the first free slot
    ///
    /// Hands the record back if every slot is taken.
    pub(crate) fn insert(
        &self,
        record: DeviceRecord<L, P>,
    ) -> Result<DeviceId, DeviceRecord<L, P>> {
        let mut record = record;
        for (index, guard) in self.slots.iter().enumerate() {
            let placed = guard.lock(|cell| {
                let mut slot = cell.borrow_mut();
                if slot.record.is_some() {
                    return Err(record);
                }
                slot.generation = slot.generation.wrapping_add(1);
                slot.record = Some(record);
                Ok(DeviceId {
                    index: index as u8,
                    generation: slot.generation,
                })
            });
            match placed {
                Ok(id) => return Ok(id),
                Err(back) => record = back,
            }
        }
        Err(record)
    }

    /// Run `f` on the record and take it out of its slot, all under one
    /// hold of the guard
    pub(crate) fn remove_with(
        &self,
        id: DeviceId,
        f: impl FnOnce(&mut DeviceRecord<L, P>),
    ) -> Result<DeviceRecord<L, P>, ControlError> {
        let guard = self.slots.get(id.index()).ok_or(ControlError::NoDevice)?;
        guard.lock(|cell| {
            let mut slot = cell.borrow_mut();
            if slot.generation != id.generation {
                return Err(ControlError::NoDevice);
            }
            let mut record = slot.record.take().ok_or(ControlError::NoDevice)?;
            f(&mut record);
            Ok(record)
        })
    }
}
