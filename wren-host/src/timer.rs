use crate::Event;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Rate at which the frame vector is evaluated
pub const FRAME_RATE_HZ: u32 = 60;

/// The periodic tick producer
///
/// A background thread sends [`Event::Tick`] at a fixed rate until stopped
/// or until every receiver hangs up.
pub struct Timer {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Timer {
    /// Starts a tick thread firing `hz` times per second
    ///
    /// # Panics
    /// If `hz` is zero
    pub fn spawn(hz: u32, tx: Sender<Event>) -> Self {
        assert_ne!(hz, 0, "tick rate must be nonzero");
        let stop = Arc::new(AtomicBool::new(false));
        let thread = std::thread::spawn({
            let stop = Arc::clone(&stop);
            move || {
                let period = Duration::from_micros(1_000_000 / u64::from(hz));
                while !stop.load(Ordering::Relaxed) {
                    std::thread::sleep(period);
                    if tx.send(Event::Tick).is_err() {
                        break;
                    }
                }
            }
        });
        Self {
            stop,
            thread: Some(thread),
        }
    }

    /// Stops the tick thread and waits for it to exit
    ///
    /// After this returns, no further tick can be delivered.
    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.halt();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    #[test]
    fn ticks_arrive_and_stop_is_final() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let timer = Timer::spawn(200, tx);
        for _ in 0..2 {
            rx.recv_timeout(Duration::from_secs(1))
                .expect("expected a tick");
        }
        timer.stop();
        // The sender lived on the tick thread, so the channel is now closed
        while let Ok(e) = rx.recv() {
            assert_eq!(e, Event::Tick);
        }
        assert!(rx.recv().is_err());
    }
}
