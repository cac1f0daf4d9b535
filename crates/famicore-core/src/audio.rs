//! Audio plumbing between the core thread and the playback callback.
//!
//! The core produces one mono f32 sample per 44.1 kHz period, tracked by a
//! fractional CPU-cycle accumulator and smoothed by a one-pole low-pass.
//! Samples cross threads through a lock-free single-producer/
//! single-consumer ring: acquire/release ordering on the two indices is
//! the entire synchronization story. On overrun the writer drops the
//! sample (back-pressure toward real time); on underrun the reader fades
//! the last sample toward zero to avoid pops.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared ring storage. Samples are stored as `f32` bit patterns so the
/// buffer itself needs no unsafe code.
struct Ring {
    slots: Box<[AtomicU32]>,
    read: AtomicUsize,
    write: AtomicUsize,
}

impl Ring {
    fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// Core-side handle: pushes samples, drops on a full ring.
pub struct AudioProducer {
    ring: Arc<Ring>,
}

impl AudioProducer {
    /// Push one sample. Returns `false` when the ring was full and the
    /// sample was dropped.
    pub fn push(&self, sample: f32) -> bool {
        let write = self.ring.write.load(Ordering::Relaxed);
        let read = self.ring.read.load(Ordering::Acquire);
        if write.wrapping_sub(read) >= self.ring.capacity() {
            return false;
        }
        self.ring.slots[write % self.ring.capacity()].store(sample.to_bits(), Ordering::Relaxed);
        self.ring.write.store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Samples currently buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        let write = self.ring.write.load(Ordering::Relaxed);
        let read = self.ring.read.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// True when nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Callback-side handle: pops samples, fading out on an empty ring.
pub struct AudioConsumer {
    ring: Arc<Ring>,
    last: f32,
}

impl AudioConsumer {
    /// Pop one sample. An empty ring yields the previous sample decayed
    /// toward zero.
    pub fn pop(&mut self) -> f32 {
        let read = self.ring.read.load(Ordering::Relaxed);
        let write = self.ring.write.load(Ordering::Acquire);
        if read == write {
            self.last *= 0.9;
            return self.last;
        }
        let sample =
            f32::from_bits(self.ring.slots[read % self.ring.capacity()].load(Ordering::Relaxed));
        self.ring.read.store(read.wrapping_add(1), Ordering::Release);
        self.last = sample;
        sample
    }

    /// Fill a callback buffer.
    pub fn fill(&mut self, out: &mut [f32]) {
        for slot in out {
            *slot = self.pop();
        }
    }
}

/// Build a connected producer/consumer pair over `capacity` samples.
#[must_use]
pub fn audio_channel(capacity: usize) -> (AudioProducer, AudioConsumer) {
    let slots: Vec<AtomicU32> = (0..capacity.max(1)).map(|_| AtomicU32::new(0)).collect();
    let ring = Arc::new(Ring {
        slots: slots.into_boxed_slice(),
        read: AtomicUsize::new(0),
        write: AtomicUsize::new(0),
    });
    (
        AudioProducer {
            ring: Arc::clone(&ring),
        },
        AudioConsumer { ring, last: 0.0 },
    )
}

/// Downsamples the APU's per-CPU-cycle output to the host sample rate,
/// low-pass filtering each emitted sample.
pub struct Resampler {
    cycles_per_sample: f64,
    accumulator: f64,
    filtered: f32,
    alpha: f32,
}

impl Resampler {
    /// Build for a CPU clock and host sample rate.
    #[must_use]
    pub fn new(cpu_hz: f64, sample_hz: f64) -> Self {
        Self {
            cycles_per_sample: cpu_hz / sample_hz,
            accumulator: 0.0,
            filtered: 0.0,
            alpha: 0.4,
        }
    }

    /// Feed one CPU cycle's raw output; returns a sample when one is due.
    pub fn push(&mut self, raw: f32) -> Option<f32> {
        self.accumulator += 1.0;
        if self.accumulator < self.cycles_per_sample {
            return None;
        }
        self.accumulator -= self.cycles_per_sample;
        self.filtered += self.alpha * (raw - self.filtered);
        Some(self.filtered)
    }

    /// Drop accumulated state (console reset).
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.filtered = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_round_trip_in_order() {
        let (tx, mut rx) = audio_channel(8);
        assert!(tx.push(0.1));
        assert!(tx.push(0.2));
        assert!((rx.pop() - 0.1).abs() < f32::EPSILON);
        assert!((rx.pop() - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn overrun_drops_new_samples() {
        let (tx, mut rx) = audio_channel(2);
        assert!(tx.push(1.0));
        assert!(tx.push(2.0));
        assert!(!tx.push(3.0), "full ring must drop");
        assert!((rx.pop() - 1.0).abs() < f32::EPSILON);
        assert!(tx.push(4.0));
    }

    #[test]
    fn underrun_fades_out() {
        let (tx, mut rx) = audio_channel(4);
        tx.push(1.0);
        assert!((rx.pop() - 1.0).abs() < f32::EPSILON);
        let a = rx.pop();
        let b = rx.pop();
        assert!(a < 1.0 && b < a, "fade toward zero");
        assert!(b > 0.0);
    }

    #[test]
    fn producer_and_consumer_work_across_threads() {
        let (tx, mut rx) = audio_channel(1024);
        let writer = std::thread::spawn(move || {
            for i in 1..=1000 {
                while !tx.push(i as f32) {
                    std::thread::yield_now();
                }
            }
        });
        // Fade-out samples are never exact integers in this sequence, so
        // matching on the expected value filters them out.
        let mut expected = 1.0f32;
        while expected <= 1000.0 {
            let sample = rx.pop();
            if (sample - expected).abs() < f32::EPSILON {
                expected += 1.0;
            }
        }
        writer.join().unwrap();
    }

    #[test]
    fn resampler_rate() {
        let mut resampler = Resampler::new(1_789_773.0, 44_100.0);
        let mut samples = 0;
        for _ in 0..1_789_773 {
            if resampler.push(0.5).is_some() {
                samples += 1;
            }
        }
        // One second of CPU time: within one sample of 44100.
        assert!((samples - 44_100i32).abs() <= 1, "got {samples}");
    }

    #[test]
    fn resampler_filter_converges() {
        let mut resampler = Resampler::new(2.0, 1.0);
        let mut last = 0.0;
        for _ in 0..200 {
            if let Some(s) = resampler.push(1.0) {
                last = s;
            }
        }
        assert!((last - 1.0).abs() < 1e-3);
    }
}
