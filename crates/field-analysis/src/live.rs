//! Lock-free stereo tap between the audio callback and the analysis tick.
//!
//! The audio thread pushes interleaved `(left, right)` pairs into a SPSC ring
//! buffer and never blocks; when the buffer is full the excess is dropped and
//! counted. The tick thread drains a bounded number of pairs per call into
//! de-interleaved buffers for [`AnalysisSession`](crate::AnalysisSession).

use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Scratch size used when draining the ring buffer.
const DRAIN_CHUNK: usize = 1024;

/// Audio-thread side of the tap.
pub struct TapProducer {
    producer: HeapProd<(f32, f32)>,
    dropped: Arc<AtomicU64>,
}

impl TapProducer {
    /// Push a stereo block. `right == None` duplicates `left`.
    ///
    /// Returns the number of pairs that fit; the rest are counted as dropped.
    pub fn push_block(&mut self, left: &[f32], right: Option<&[f32]>) -> usize {
        let right = right.unwrap_or(left);
        let len = left.len().min(right.len());

        let mut pushed = 0;
        for (&l, &r) in left[..len].iter().zip(&right[..len]) {
            if self.producer.try_push((l, r)).is_err() {
                break;
            }
            pushed += 1;
        }

        if pushed < len {
            self.dropped
                .fetch_add((len - pushed) as u64, Ordering::Relaxed);
        }
        pushed
    }

    #[inline]
    pub fn free_len(&self) -> usize {
        self.producer.vacant_len()
    }
}

/// Tick-thread side of the tap.
pub struct TapConsumer {
    consumer: HeapCons<(f32, f32)>,
    dropped: Arc<AtomicU64>,
    scratch: Vec<(f32, f32)>,
}

impl TapConsumer {
    /// Pairs waiting to be pulled.
    #[inline]
    pub fn available(&self) -> usize {
        self.consumer.occupied_len()
    }

    /// Move up to `max` pairs into `left`/`right` (both cleared first).
    ///
    /// Returns the number of pairs pulled.
    pub fn pull(&mut self, max: usize, left: &mut Vec<f32>, right: &mut Vec<f32>) -> usize {
        left.clear();
        right.clear();

        let mut remaining = max.min(self.consumer.occupied_len());
        while remaining > 0 {
            let chunk = remaining.min(DRAIN_CHUNK);
            let read = self.consumer.pop_slice(&mut self.scratch[..chunk]);
            if read == 0 {
                break;
            }
            for &(l, r) in &self.scratch[..read] {
                left.push(l);
                right.push(r);
            }
            remaining -= read;
        }

        left.len()
    }

    /// Pairs the producer had to discard since the last [`clear`](Self::clear).
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Discard everything queued and reset the drop counter.
    pub fn clear(&mut self) {
        while self.consumer.try_pop().is_some() {}
        self.dropped.store(0, Ordering::Relaxed);
    }
}

/// Create a tap holding at most `capacity` stereo pairs.
pub fn analysis_tap(capacity: usize) -> (TapProducer, TapConsumer) {
    let rb = HeapRb::<(f32, f32)>::new(capacity.max(1));
    let (producer, consumer) = rb.split();
    let dropped = Arc::new(AtomicU64::new(0));

    (
        TapProducer {
            producer,
            dropped: Arc::clone(&dropped),
        },
        TapConsumer {
            consumer,
            dropped,
            scratch: vec![(0.0, 0.0); DRAIN_CHUNK],
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_pull_deinterleaves() {
        let (mut producer, mut consumer) = analysis_tap(16);
        producer.push_block(&[1.0, 2.0, 3.0], Some(&[-1.0, -2.0, -3.0]));

        let (mut left, mut right) = (Vec::new(), Vec::new());
        assert_eq!(consumer.pull(usize::MAX, &mut left, &mut right), 3);
        assert_eq!(left, vec![1.0, 2.0, 3.0]);
        assert_eq!(right, vec![-1.0, -2.0, -3.0]);
        assert_eq!(consumer.available(), 0);
    }

    #[test]
    fn test_pull_respects_cap() {
        let (mut producer, mut consumer) = analysis_tap(8192);
        let block = vec![0.25f32; 5000];
        producer.push_block(&block, None);

        let (mut left, mut right) = (Vec::new(), Vec::new());
        assert_eq!(consumer.pull(4096, &mut left, &mut right), 4096);
        assert_eq!(right.len(), 4096);
        assert_eq!(consumer.available(), 904);

        assert_eq!(consumer.pull(4096, &mut left, &mut right), 904);
    }

    #[test]
    fn test_overflow_counts_drops() {
        let (mut producer, mut consumer) = analysis_tap(4);
        let pushed = producer.push_block(&[0.0; 10], None);

        assert_eq!(pushed, 4);
        assert_eq!(consumer.dropped(), 6);
        assert_eq!(producer.free_len(), 0);

        consumer.clear();
        assert_eq!(consumer.dropped(), 0);
        assert_eq!(consumer.available(), 0);
    }

    #[test]
    fn test_cross_thread() {
        let (mut producer, mut consumer) = analysis_tap(48000);
        let handle = std::thread::spawn(move || {
            for _ in 0..10 {
                producer.push_block(&[0.5; 480], None);
            }
        });
        handle.join().unwrap();

        let (mut left, mut right) = (Vec::new(), Vec::new());
        assert_eq!(consumer.pull(usize::MAX, &mut left, &mut right), 4800);
    }
}
