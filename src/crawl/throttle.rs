// src/crawl/throttle.rs
// Spaces out request starts so the crawled site isn't hit too hard.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

pub struct Throttle {
    delay: Duration,
    // Earliest moment the next request may start
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(None),
        }
    }

    // Waits until at least `delay` has passed since the previous caller was
    // let through. Callers are served one at a time, in lock order.
    pub async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }

        let mut next_slot = self.next_slot.lock().await;
        if let Some(slot) = *next_slot {
            if slot > Instant::now() {
                sleep_until(slot).await;
            }
        }
        *next_slot = Some(Instant::now() + self.delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_wait_is_immediate() {
        let throttle = Throttle::new(Duration::from_secs(5));
        let start = Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_waits_are_spaced() {
        let throttle = Throttle::new(Duration::from_millis(30));
        let start = Instant::now();
        for _ in 0..3 {
            throttle.wait().await;
        }
        // Three requests -> two gaps
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_zero_delay_never_sleeps() {
        let throttle = Throttle::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..100 {
            throttle.wait().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
