//! Deferred command execution
//!
//! The radio receive interrupt must return quickly, so downlink command
//! packets are not dispatched in interrupt context: the ISR copies the
//! packet into a single-slot buffer and the main loop drains it on its next
//! iteration.
//!
//! The slot is a single-producer/single-consumer channel of capacity one
//! with an explicit overwrite-on-full policy: at most one packet is in
//! flight, and a second arrival before the first is drained replaces it.
//! That is the intended behavior of the link (the transport retries), not a
//! bug to work around.

use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Remote packet buffer size
pub const REMOTE_BUF_SIZE: usize = 64;

/// Response channel: called exactly once per processed packet
pub type ResponseFn = fn(&[u8]);

struct Slot {
    buf: [u8; REMOTE_BUF_SIZE],
    len: usize,
    response: Option<ResponseFn>,
    pending: bool,
}

/// One-slot handoff between the receive interrupt and the main loop
pub struct DeferredSlot {
    slot: Mutex<CriticalSectionRawMutex, RefCell<Slot>>,
}

impl DeferredSlot {
    /// Create an empty slot (const: usable in a `static`)
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(Slot {
                buf: [0; REMOTE_BUF_SIZE],
                len: 0,
                response: None,
                pending: false,
            })),
        }
    }

    /// Defer a received packet for main-loop processing (ISR side)
    ///
    /// Overwrites any packet still waiting. Returns false if the packet does
    /// not fit the slot; nothing is stored in that case.
    pub fn defer(&self, bytes: &[u8], response: ResponseFn) -> bool {
        if bytes.len() > REMOTE_BUF_SIZE {
            return false;
        }

        let overwrote = self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            let overwrote = slot.pending;
            slot.buf[..bytes.len()].copy_from_slice(bytes);
            slot.len = bytes.len();
            slot.response = Some(response);
            slot.pending = true;
            overwrote
        });

        if overwrote {
            crate::log_warn!("deferred packet overwritten before processing");
        }
        true
    }

    /// Drain the slot (main-loop side)
    ///
    /// Clears the pending flag *before* handing out the bytes: a packet
    /// arriving while the previous one is still being processed re-raises
    /// the flag and is picked up on the next poll instead of being lost.
    pub fn take(&self, out: &mut [u8; REMOTE_BUF_SIZE]) -> Option<(usize, ResponseFn)> {
        self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            if !slot.pending {
                return None;
            }
            slot.pending = false;
            out[..slot.len].copy_from_slice(&slot.buf[..slot.len]);
            slot.response.map(|response| (slot.len, response))
        })
    }

    /// True if a packet is waiting
    pub fn is_pending(&self) -> bool {
        self.slot.lock(|slot| slot.borrow().pending)
    }
}

impl Default for DeferredSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn respond_noop(_: &[u8]) {}

    #[test]
    fn test_defer_and_take() {
        let slot = DeferredSlot::new();
        assert!(!slot.is_pending());

        assert!(slot.defer(&[1, 2, 3], respond_noop));
        assert!(slot.is_pending());

        let mut buf = [0u8; REMOTE_BUF_SIZE];
        let (len, _respond) = slot.take(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[1, 2, 3]);

        // flag cleared by take
        assert!(!slot.is_pending());
        assert!(slot.take(&mut buf).is_none());
    }

    #[test]
    fn test_second_arrival_overwrites() {
        let slot = DeferredSlot::new();
        slot.defer(&[0xAA; 4], respond_noop);
        slot.defer(&[0xBB; 2], respond_noop);

        let mut buf = [0u8; REMOTE_BUF_SIZE];
        let (len, _) = slot.take(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[0xBB, 0xBB]);
    }

    #[test]
    fn test_oversize_packet_rejected() {
        let slot = DeferredSlot::new();
        assert!(!slot.defer(&[0u8; REMOTE_BUF_SIZE + 1], respond_noop));
        assert!(!slot.is_pending());
    }

    #[test]
    fn test_arrival_during_processing_is_seen_on_next_poll() {
        let slot = DeferredSlot::new();
        slot.defer(&[1], respond_noop);

        let mut buf = [0u8; REMOTE_BUF_SIZE];
        let _ = slot.take(&mut buf).unwrap();

        // new packet lands while the first is still "being processed"
        slot.defer(&[2], respond_noop);
        assert!(slot.is_pending());
        let (len, _) = slot.take(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[2]);
    }
}
