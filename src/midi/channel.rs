//! Event hand-off from the input context to the render context
//!
//! [`EventQueue`] is the allocation-free core: a fixed array of message
//! slots threaded on an idle list and a pending list. [`EventChannel`]
//! guards it so that a producer's allocate+push is never observed half-done
//! by the renderer:
//!
//! - producers take the lock for exactly one allocate+encode+push;
//! - the renderer only ever `try_lock`s, moves every pending message into a
//!   pre-sized [`EventBatch`], recycles the slots and releases the lock
//!   before dispatching. If a producer holds the lock at that moment the
//!   block simply renders without new events.

use super::message::{Event, MidiMessage};
use crate::config::EVENT_QUEUE_CAPACITY;
use crate::pool::{IndexList, Link};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Exclusive handle to one queue slot
///
/// Not `Clone`: whoever holds it owns the slot until it is pushed or
/// recycled.
#[derive(Debug, PartialEq, Eq)]
pub struct EventSlot(usize);

/// Fixed-capacity queue of encoded messages
pub struct EventQueue<const N: usize> {
    messages: [MidiMessage; N],
    links: [Link; N],
    idle: IndexList,
    pending: IndexList,
}

impl<const N: usize> EventQueue<N> {
    /// Create a queue with every slot idle
    pub fn new() -> Self {
        let mut queue = Self {
            messages: [MidiMessage::default(); N],
            links: [None; N],
            idle: IndexList::new(),
            pending: IndexList::new(),
        };
        for i in 0..N {
            queue.idle.push_back(&mut queue.links, i);
        }
        queue
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        N
    }

    /// Take an idle slot, `None` when all slots are in use
    pub fn allocate(&mut self) -> Option<EventSlot> {
        self.idle.pop_front(&mut self.links).map(EventSlot)
    }

    /// Message stored in `slot`
    pub fn message(&self, slot: &EventSlot) -> MidiMessage {
        self.messages[slot.0]
    }

    /// Mutable access to the message stored in `slot`
    pub fn message_mut(&mut self, slot: &EventSlot) -> &mut MidiMessage {
        &mut self.messages[slot.0]
    }

    /// Append `slot` to the pending list
    pub fn push(&mut self, slot: EventSlot) {
        self.pending.push_back(&mut self.links, slot.0);
    }

    /// Detach the oldest pending slot
    pub fn next(&mut self) -> Option<EventSlot> {
        self.pending.pop_front(&mut self.links).map(EventSlot)
    }

    /// Clear `slot` and return it to the idle list
    pub fn recycle(&mut self, slot: EventSlot) {
        self.messages[slot.0].clear();
        self.idle.push_back(&mut self.links, slot.0);
    }

    /// Number of messages waiting to be consumed
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of free slots
    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Messages moved out of the queue in one drain
pub struct EventBatch<const N: usize> {
    messages: [MidiMessage; N],
    len: usize,
}

impl<const N: usize> EventBatch<N> {
    /// Create an empty batch
    pub fn new() -> Self {
        Self {
            messages: [MidiMessage::default(); N],
            len: 0,
        }
    }

    /// Number of messages held
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Messages in arrival order
    pub fn messages(&self) -> &[MidiMessage] {
        &self.messages[..self.len]
    }

    fn clear(&mut self) {
        self.len = 0;
    }

    fn push(&mut self, message: MidiMessage) {
        self.messages[self.len] = message;
        self.len += 1;
    }
}

impl<const N: usize> Default for EventBatch<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock-guarded [`EventQueue`] shared by producers and the renderer
pub struct EventChannel<const N: usize = EVENT_QUEUE_CAPACITY> {
    queue: Mutex<EventQueue<N>>,
    dropped: AtomicUsize,
}

impl<const N: usize> EventChannel<N> {
    /// Create a channel with `N` slots
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(EventQueue::new()),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Encode and enqueue `event`. Returns `false` if the event was dropped
    /// because every slot is in use.
    pub fn send(&self, channel: u8, event: Event) -> bool {
        self.send_message(MidiMessage::encode(channel, event))
    }

    /// Enqueue an already encoded message
    pub fn send_message(&self, message: MidiMessage) -> bool {
        let mut queue = self.queue.lock();
        match queue.allocate() {
            Some(slot) => {
                *queue.message_mut(&slot) = message;
                queue.push(slot);
                true
            }
            None => {
                drop(queue);
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::trace!("Event queue full, dropping {:?}", message);
                false
            }
        }
    }

    /// Move all pending messages into `batch` without blocking.
    ///
    /// Returns the number of messages moved. Zero either means nothing was
    /// pending or a producer was mid-submission; its message is picked up by
    /// the next drain.
    pub fn drain(&self, batch: &mut EventBatch<N>) -> usize {
        batch.clear();
        let Some(mut queue) = self.queue.try_lock() else {
            return 0;
        };
        while let Some(slot) = queue.next() {
            batch.push(queue.message(&slot));
            queue.recycle(slot);
        }
        batch.len()
    }

    /// Number of messages waiting (takes the lock)
    pub fn pending(&self) -> usize {
        self.queue.lock().pending_len()
    }

    /// Total events dropped on a full queue since creation
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Default for EventChannel<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable producer handle for an [`EventChannel`]
///
/// Channel numbers are carried in the encoded word but the engine listens
/// in omni mode.
#[derive(Clone)]
pub struct EventSender<const N: usize = EVENT_QUEUE_CAPACITY> {
    channel: Arc<EventChannel<N>>,
}

impl<const N: usize> EventSender<N> {
    /// Wrap a shared channel
    pub fn new(channel: Arc<EventChannel<N>>) -> Self {
        Self { channel }
    }

    /// Submit a note-on
    pub fn note_on(&self, channel: u8, note: u8, velocity: u8) -> bool {
        self.channel.send(channel, Event::NoteOn { note, velocity })
    }

    /// Submit a note-off
    pub fn note_off(&self, channel: u8, note: u8, velocity: u8) -> bool {
        self.channel.send(channel, Event::NoteOff { note, velocity })
    }

    /// Submit a control change
    pub fn control_change(&self, channel: u8, controller: u8, value: u8) -> bool {
        self.channel
            .send(channel, Event::ControlChange { controller, value })
    }

    /// Submit a 14-bit pitch bend
    pub fn pitch_bend(&self, channel: u8, value: u16) -> bool {
        self.channel.send(channel, Event::PitchBend { value })
    }

    /// Submit a pre-encoded message
    pub fn send(&self, message: MidiMessage) -> bool {
        self.channel.send_message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_allocate_until_exhausted() {
        let mut queue: EventQueue<4> = EventQueue::new();
        let slots: Vec<_> = (0..4).filter_map(|_| queue.allocate()).collect();
        assert_eq!(slots.len(), 4);
        assert!(queue.allocate().is_none());
        assert_eq!(queue.idle_len(), 0);

        for slot in slots {
            queue.recycle(slot);
        }
        assert_eq!(queue.idle_len(), 4);
    }

    #[test]
    fn test_pending_is_fifo() {
        let mut queue: EventQueue<8> = EventQueue::new();
        for note in 60..63 {
            let slot = queue.allocate().unwrap();
            *queue.message_mut(&slot) = MidiMessage::note_on(note, 100);
            queue.push(slot);
        }
        assert_eq!(queue.pending_len(), 3);

        let mut notes = Vec::new();
        while let Some(slot) = queue.next() {
            if let Some(Event::NoteOn { note, .. }) = queue.message(&slot).decode() {
                notes.push(note);
            }
            queue.recycle(slot);
        }
        assert_eq!(notes, vec![60, 61, 62]);
        assert_eq!(queue.idle_len(), 8);
    }

    #[test]
    fn test_recycle_clears_message() {
        let mut queue: EventQueue<1> = EventQueue::new();
        let slot = queue.allocate().unwrap();
        *queue.message_mut(&slot) = MidiMessage::note_on(1, 1);
        queue.recycle(slot);
        let slot = queue.allocate().unwrap();
        assert_eq!(queue.message(&slot), MidiMessage::default());
    }

    #[test]
    fn test_channel_drops_on_overflow() {
        let channel: EventChannel<2> = EventChannel::new();
        assert!(channel.send(0, Event::PitchBend { value: 0 }));
        assert!(channel.send(0, Event::PitchBend { value: 1 }));
        assert!(!channel.send(0, Event::PitchBend { value: 2 }));
        assert_eq!(channel.dropped(), 1);

        let mut batch = EventBatch::new();
        assert_eq!(channel.drain(&mut batch), 2);
        assert_eq!(
            batch.messages()[1].decode(),
            Some(Event::PitchBend { value: 1 })
        );

        // Slots are free again
        assert!(channel.send(0, Event::PitchBend { value: 3 }));
    }

    #[test]
    fn test_drain_skips_while_producer_holds_lock() {
        let channel: EventChannel<4> = EventChannel::new();
        channel.send(0, Event::NoteOn { note: 1, velocity: 1 });

        let guard = channel.queue.lock();
        let mut batch = EventBatch::new();
        assert_eq!(channel.drain(&mut batch), 0);
        drop(guard);

        assert_eq!(channel.drain(&mut batch), 1);
    }

    #[test]
    fn test_concurrent_producers_never_lose_accepted_events() {
        let channel = Arc::new(EventChannel::<64>::new());
        let mut handles = Vec::new();
        for t in 0..4u8 {
            let sender = EventSender::new(channel.clone());
            handles.push(thread::spawn(move || {
                let mut accepted = 0usize;
                for note in 0..100u8 {
                    if sender.note_on(t, note, 1) {
                        accepted += 1;
                    }
                }
                accepted
            }));
        }

        let mut batch = EventBatch::new();
        let mut received = 0usize;
        let mut accepted = 0usize;
        for handle in handles {
            while !handle.is_finished() {
                received += channel.drain(&mut batch);
            }
            accepted += handle.join().unwrap();
        }
        while channel.pending() > 0 {
            received += channel.drain(&mut batch);
        }

        assert_eq!(received, accepted);
        assert_eq!(accepted + channel.dropped(), 400);
    }
}
