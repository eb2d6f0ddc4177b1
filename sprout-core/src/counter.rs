//! Debounced per-channel event counting
//!
//! Counters are written from interrupt context and read from the main loop.
//! Every scalar lives in its own atomic so a read is one indivisible load;
//! two fields read back to back are not guaranteed to be consistent with
//! each other. Resets from the main loop run inside a critical section so
//! they cannot interleave with an edge being counted.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::CounterConfig;
use crate::error::InvalidChannel;

/// Index into the counter table
pub type ChannelId = u8;

/// Result of feeding one edge to the counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeOutcome {
    /// Edge counted; carries the new count
    Accepted { count: u32 },
    /// Edge fell inside the debounce window and was dropped
    Debounced,
}

struct Channel {
    count: AtomicU32,
    last_event_ms: AtomicU32,
    /// False until the first accepted edge, so an edge at t=0 is not
    /// mistaken for a bounce of a phantom edge at t=0
    primed: AtomicBool,
}

impl Channel {
    const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
            last_event_ms: AtomicU32::new(0),
            primed: AtomicBool::new(false),
        }
    }
}

/// Fixed table of debounced counters
pub struct EventCounter<const N: usize> {
    channels: [Channel; N],
    debounce_ms: u32,
}

impl<const N: usize> EventCounter<N> {
    /// Create a zeroed counter table
    ///
    /// `const` so the table can live in a `static` shared with interrupt
    /// handlers.
    pub const fn new(config: CounterConfig) -> Self {
        Self {
            channels: [const { Channel::new() }; N],
            debounce_ms: config.debounce_ms,
        }
    }

    /// Number of channels
    pub const fn channels(&self) -> usize {
        N
    }

    /// Debounce window in milliseconds
    pub const fn debounce_ms(&self) -> u32 {
        self.debounce_ms
    }

    fn channel(&self, id: ChannelId) -> Result<&Channel, InvalidChannel> {
        self.channels.get(id as usize).ok_or(InvalidChannel)
    }

    /// Feed one edge observed at `now_ms`
    ///
    /// Called from interrupt context; O(1) and non-blocking. An edge closer
    /// than the debounce window to the previous accepted edge on the same
    /// channel is dropped. Time differences use wrapping arithmetic, so the
    /// window stays correct across the u32 millisecond rollover.
    pub fn on_edge(&self, id: ChannelId, now_ms: u32) -> Result<EdgeOutcome, InvalidChannel> {
        let ch = self.channel(id)?;

        if ch.primed.load(Ordering::Acquire) {
            let last = ch.last_event_ms.load(Ordering::Relaxed);
            if now_ms.wrapping_sub(last) < self.debounce_ms {
                return Ok(EdgeOutcome::Debounced);
            }
        }

        ch.last_event_ms.store(now_ms, Ordering::Relaxed);
        ch.primed.store(true, Ordering::Release);
        let count = ch.count.fetch_add(1, Ordering::Relaxed).wrapping_add(1);

        Ok(EdgeOutcome::Accepted { count })
    }

    /// Current count of one channel
    pub fn get_count(&self, id: ChannelId) -> Result<u32, InvalidChannel> {
        Ok(self.channel(id)?.count.load(Ordering::Relaxed))
    }

    /// Count of one channel, 0 for an unknown channel
    pub fn count_or_zero(&self, id: ChannelId) -> u32 {
        self.get_count(id).unwrap_or(0)
    }

    /// Timestamp of the last accepted edge, `None` before the first one
    pub fn last_event_ms(&self, id: ChannelId) -> Result<Option<u32>, InvalidChannel> {
        let ch = self.channel(id)?;
        if ch.primed.load(Ordering::Acquire) {
            Ok(Some(ch.last_event_ms.load(Ordering::Relaxed)))
        } else {
            Ok(None)
        }
    }

    /// Zero one channel's count
    ///
    /// Debounce history is kept, so a bounce arriving right after a reset
    /// is still filtered.
    pub fn reset(&self, id: ChannelId) -> Result<(), InvalidChannel> {
        let ch = self.channel(id)?;
        critical_section::with(|_| ch.count.store(0, Ordering::Relaxed));
        Ok(())
    }

    /// Zero every channel in one critical section
    pub fn reset_all(&self) {
        critical_section::with(|_| {
            for ch in &self.channels {
                ch.count.store(0, Ordering::Relaxed);
            }
        });
    }

    /// Sum of all channel counts
    ///
    /// Each channel is loaded once; the sum is not an atomic snapshot across
    /// channels.
    pub fn total(&self) -> u32 {
        self.channels
            .iter()
            .fold(0u32, |acc, ch| acc.wrapping_add(ch.count.load(Ordering::Relaxed)))
    }

    /// Copy all counts for display
    pub fn snapshot(&self) -> CountSnapshot<N> {
        let counts = core::array::from_fn(|i| self.channels[i].count.load(Ordering::Relaxed));
        CountSnapshot { counts }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CountSnapshot<const N: usize> {
    pub counts: [u32; N],
}

impl<const N: usize> CountSnapshot<N> {
    /// Sum of the copied counts
    pub fn total(&self) -> u32 {
        self.counts.iter().fold(0u32, |acc, c| acc.wrapping_add(*c))
    }
}
