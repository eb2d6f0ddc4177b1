//! Beam-break sensor input
//!
//! Glue between the interrupt dispatcher and the event counter: maps a
//! hardware line to a channel, timestamps the edge, counts it, and reports
//! accepted events with the pin level sampled after the edge.

use sprout_hal::{Clock, InputPin};

use crate::counter::{ChannelId, EdgeOutcome, EventCounter};
use crate::dispatch::{InterruptDispatcher, LineHandler};
use crate::error::DispatchError;

/// Hook called for every accepted event
///
/// Runs in interrupt context, so the same rules as [`LineHandler`] apply.
pub trait EventObserver: Sync {
    /// `level` is the input level read right after the edge
    fn on_event(&self, channel: ChannelId, level: bool);
}

/// Sensor channels fed by external interrupt lines
///
/// Channel `i` is wired to line `lines[i]` and sampled through `pins[i]`.
pub struct SensorInput<'a, C, P, const N: usize> {
    counter: &'a EventCounter<N>,
    clock: C,
    lines: [u8; N],
    pins: [P; N],
    observer: Option<&'a dyn EventObserver>,
}

impl<'a, C, P, const N: usize> SensorInput<'a, C, P, N>
where
    C: Clock + Sync,
    P: InputPin + Sync,
{
    pub fn new(counter: &'a EventCounter<N>, clock: C, lines: [u8; N], pins: [P; N]) -> Self {
        Self {
            counter,
            clock,
            lines,
            pins,
            observer: None,
        }
    }

    /// Attach an event observer
    pub fn with_observer(mut self, observer: &'a dyn EventObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Channel wired to a line, if any
    pub fn channel_for_line(&self, line: u8) -> Option<ChannelId> {
        self.lines
            .iter()
            .position(|&l| l == line)
            .map(|i| i as ChannelId)
    }

    /// Bind every sensor line to this input
    ///
    /// All or nothing: if any line is rejected, the lines bound before it
    /// are released again.
    pub fn register<const LINES: usize>(
        &'a self,
        dispatcher: &mut InterruptDispatcher<'a, LINES>,
        priority: u8,
    ) -> Result<(), DispatchError> {
        for (i, &line) in self.lines.iter().enumerate() {
            if let Err(e) = dispatcher.register(line, priority, self) {
                for &bound in &self.lines[..i] {
                    dispatcher.unbind(bound);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Lines this input listens on, in channel order
    pub fn lines(&self) -> &[u8; N] {
        &self.lines
    }
}

impl<C, P, const N: usize> LineHandler for SensorInput<'_, C, P, N>
where
    C: Clock + Sync,
    P: InputPin + Sync,
{
    fn on_interrupt(&self, line: u8) {
        let Some(channel) = self.channel_for_line(line) else {
            return;
        };

        let now = self.clock.now_ms();
        if let Ok(EdgeOutcome::Accepted { .. }) = self.counter.on_edge(channel, now) {
            if let Some(observer) = self.observer {
                let level = self.pins[channel as usize].is_high();
                observer.on_event(channel, level);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CounterConfig;
    use portable_atomic::{AtomicBool, AtomicU32, Ordering};

    struct ManualClock(AtomicU32);

    impl ManualClock {
        fn set(&self, ms: u32) {
            self.0.store(ms, Ordering::Relaxed);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u32 {
            self.0.load(Ordering::Relaxed)
        }
    }

    struct MockPin(AtomicBool);

    impl InputPin for MockPin {
        fn is_high(&self) -> bool {
            self.0.load(Ordering::Relaxed)
        }
    }

    /// Remembers the last event as (channel + 1) << 1 | level
    struct LastEvent(AtomicU32);

    impl EventObserver for LastEvent {
        fn on_event(&self, channel: ChannelId, level: bool) {
            self.0
                .store(((channel as u32 + 1) << 1) | level as u32, Ordering::Relaxed);
        }
    }

    fn pins() -> [MockPin; 3] {
        [
            MockPin(AtomicBool::new(false)),
            MockPin(AtomicBool::new(true)),
            MockPin(AtomicBool::new(false)),
        ]
    }

    #[test]
    fn test_dispatch_counts_mapped_lines() {
        let counter: EventCounter<3> = EventCounter::new(CounterConfig { debounce_ms: 3 });
        let clock = ManualClock(AtomicU32::new(0));
        let input = SensorInput::new(&counter, &clock, [0, 1, 2], pins());

        let mut dispatcher: InterruptDispatcher<'_, 16> = InterruptDispatcher::new();
        input.register(&mut dispatcher, 10).unwrap();

        dispatcher.dispatch(0);
        dispatcher.dispatch(1);
        clock.set(1);
        dispatcher.dispatch(0); // bounce
        clock.set(5);
        dispatcher.dispatch(0);
        dispatcher.dispatch(4); // not a sensor line

        assert_eq!(counter.get_count(0), Ok(2));
        assert_eq!(counter.get_count(1), Ok(1));
        assert_eq!(counter.get_count(2), Ok(0));
    }

    #[test]
    fn test_observer_sees_accepted_events_only() {
        let counter: EventCounter<3> = EventCounter::new(CounterConfig::default());
        let clock = ManualClock(AtomicU32::new(100));
        let observer = LastEvent(AtomicU32::new(0));
        let input =
            SensorInput::new(&counter, &clock, [0, 1, 2], pins()).with_observer(&observer);

        input.on_interrupt(1);
        assert_eq!(observer.0.load(Ordering::Relaxed), (2 << 1) | 1);

        observer.0.store(0, Ordering::Relaxed);
        input.on_interrupt(1); // same tick, debounced
        assert_eq!(observer.0.load(Ordering::Relaxed), 0);

        input.on_interrupt(2);
        assert_eq!(observer.0.load(Ordering::Relaxed), 3 << 1);
    }

    #[test]
    fn test_custom_line_map() {
        let counter: EventCounter<3> = EventCounter::new(CounterConfig::default());
        let clock = ManualClock(AtomicU32::new(0));
        let input = SensorInput::new(&counter, &clock, [5, 6, 12], pins());

        assert_eq!(input.channel_for_line(12), Some(2));
        assert_eq!(input.channel_for_line(0), None);

        let mut dispatcher: InterruptDispatcher<'_, 16> = InterruptDispatcher::new();
        input.register(&mut dispatcher, 10).unwrap();
        dispatcher.dispatch_pending((1 << 5) | (1 << 12));

        assert_eq!(counter.snapshot().counts, [1, 0, 1]);
    }

    #[test]
    fn test_register_conflict() {
        let counter: EventCounter<3> = EventCounter::new(CounterConfig::default());
        let clock = ManualClock(AtomicU32::new(0));
        let input = SensorInput::new(&counter, &clock, [0, 1, 2], pins());
        let other = SensorInput::new(&counter, &clock, [2, 3, 4], pins());

        let mut dispatcher: InterruptDispatcher<'_, 16> = InterruptDispatcher::new();
        input.register(&mut dispatcher, 10).unwrap();
        assert_eq!(
            other.register(&mut dispatcher, 10),
            Err(DispatchError::AlreadyBound)
        );
    }

    #[test]
    fn test_failed_register_releases_earlier_lines() {
        let counter: EventCounter<3> = EventCounter::new(CounterConfig::default());
        let clock = ManualClock(AtomicU32::new(0));
        let input = SensorInput::new(&counter, &clock, [2, 5, 6], pins());
        let other = SensorInput::new(&counter, &clock, [3, 4, 2], pins());

        let mut dispatcher: InterruptDispatcher<'_, 16> = InterruptDispatcher::new();
        input.register(&mut dispatcher, 10).unwrap();
        assert_eq!(
            other.register(&mut dispatcher, 12),
            Err(DispatchError::AlreadyBound)
        );

        assert!(dispatcher.binding(3).is_none());
        assert!(dispatcher.binding(4).is_none());
        assert_eq!(dispatcher.binding(2).map(|b| b.priority), Some(10));
        assert_eq!(dispatcher.bindings().count(), 3);

        // Line 3 no longer reaches the rejected input
        dispatcher.dispatch(3);
        assert_eq!(counter.total(), 0);

        // The lines are free for a later registration
        let retry = SensorInput::new(&counter, &clock, [3, 4, 7], pins());
        assert_eq!(retry.register(&mut dispatcher, 12), Ok(()));
    }
}
