//! Status LED heartbeat.

use embassy_time::{Duration, Instant};
use embedded_hal::digital::OutputPin;
use platform::config::HEARTBEAT_PERIOD_MS;

use crate::scheduler::Task;

/// Toggles an LED every period while the run loop is alive.
///
/// A stalled loop freezes the LED, which is the point.
pub struct HeartbeatTask<P: OutputPin> {
    pin: P,
    period: Duration,
    next: Instant,
    lit: bool,
    pin_faults: u32,
}

impl<P: OutputPin> HeartbeatTask<P> {
    /// Blink at [`HEARTBEAT_PERIOD_MS`].
    pub fn new(pin: P) -> Self {
        Self::with_period(pin, Duration::from_millis(HEARTBEAT_PERIOD_MS))
    }

    /// Blink at a custom period.
    pub fn with_period(pin: P, period: Duration) -> Self {
        Self {
            pin,
            period,
            next: Instant::now(),
            lit: false,
            pin_faults: 0,
        }
    }

    /// Whether the LED is currently driven high.
    pub fn is_lit(&self) -> bool {
        self.lit
    }

    /// Pin writes that returned an error.
    pub fn pin_faults(&self) -> u32 {
        self.pin_faults
    }

    /// Give the pin back.
    pub fn release(self) -> P {
        self.pin
    }

    fn drive(&mut self, high: bool) -> bool {
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if result.is_err() {
            self.pin_faults = self.pin_faults.saturating_add(1);
            return false;
        }
        self.lit = high;
        true
    }
}

impl<P: OutputPin> Task for HeartbeatTask<P> {
    fn label(&self) -> &'static str {
        "heartbeat"
    }

    fn init(&mut self) {
        self.drive(false);
        self.next = deadline(Instant::now(), self.period);
    }

    /// Flash once so a dead LED line shows up before the run loop starts.
    fn self_test(&mut self) -> bool {
        let ok = self.drive(true) & self.drive(false);
        if !ok {
            warn!("heartbeat LED not responding");
        }
        ok
    }

    fn poll(&mut self) {
        let now = Instant::now();
        if now < self.next {
            return;
        }
        self.drive(!self.lit);
        self.next = deadline(now, self.period);
    }
}

fn deadline(from: Instant, period: Duration) -> Instant {
    from.checked_add(period).unwrap_or(Instant::MAX)
}
