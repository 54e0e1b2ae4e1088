//! Audio thread -> UI thread packet hand-off
//!
//! A bounded single-producer/single-consumer queue. The audio thread never
//! blocks on it: when the UI falls behind, the oldest undelivered packet is
//! discarded and counted, and its buffer carries the new packet. Delivered
//! buffers travel back over a second queue, so once the queue has been
//! filled once the producer stops allocating.

use crate::visualiser::VisualiserContext;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Default queue depth: a little over two redraws' worth of packets at 60 fps
pub const DEFAULT_HANDOFF_CAPACITY: usize = 8;

struct QueuedPacket {
    samples: Vec<f32>,
    channels: u16,
}

/// Create a hand-off queue holding up to `capacity` packets (minimum 1)
pub fn packet_channel(capacity: usize) -> (PacketSender, PacketReceiver) {
    let capacity = capacity.max(1);
    let (queue_tx, queue_rx) = bounded::<QueuedPacket>(capacity);
    let (recycle_tx, recycle_rx) = bounded::<Vec<f32>>(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    let closed = Arc::new(AtomicBool::new(false));

    let sender = PacketSender {
        queue: queue_tx,
        oldest: queue_rx.clone(),
        recycled: recycle_rx,
        dropped: Arc::clone(&dropped),
        closed: Arc::clone(&closed),
    };
    let receiver = PacketReceiver {
        queue: queue_rx,
        recycle: recycle_tx,
        dropped,
        closed,
    };
    (sender, receiver)
}

/// Audio-thread end of the hand-off
pub struct PacketSender {
    queue: Sender<QueuedPacket>,
    /// Lets the producer evict the oldest packet on overflow
    oldest: Receiver<QueuedPacket>,
    recycled: Receiver<Vec<f32>>,
    dropped: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl PacketSender {
    /// Queue a copy of `samples` for the visualiser without blocking
    ///
    /// Returns `false` if the packet was not queued because the receiver is gone.
    pub fn send(&self, samples: &[f32], channels: u16) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }

        // On overflow the evicted packet's buffer is reused for the new one,
        // so neither a full queue nor a slow UI makes this path allocate.
        let mut buffer = if self.queue.is_full() {
            match self.oldest.try_recv() {
                Ok(evicted) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    evicted.samples
                }
                Err(_) => self.spare_buffer(),
            }
        } else {
            self.spare_buffer()
        };
        buffer.clear();
        buffer.extend_from_slice(samples);
        let mut packet = QueuedPacket {
            samples: buffer,
            channels,
        };

        // Only the receiver vanishing between the eviction and the send can
        // make the second attempt fail.
        for _ in 0..2 {
            match self.queue.try_send(packet) {
                Ok(()) => return true,
                Err(TrySendError::Full(back)) => {
                    packet = back;
                    if self.oldest.try_recv().is_ok() {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }

        self.dropped.fetch_add(1, Ordering::Relaxed);
        false
    }

    fn spare_buffer(&self) -> Vec<f32> {
        self.recycled.try_recv().unwrap_or_default()
    }

    /// Packets discarded because the UI thread fell behind
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// True once the receiving end has been dropped
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for PacketSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketSender")
            .field("queued", &self.queue.len())
            .field("dropped", &self.dropped())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// UI-thread end of the hand-off
pub struct PacketReceiver {
    queue: Receiver<QueuedPacket>,
    recycle: Sender<Vec<f32>>,
    dropped: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl PacketReceiver {
    /// Packets waiting to be drained
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Packets discarded on overflow so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Deliver every queued packet to `visualiser`, oldest first
    ///
    /// Returns the number of packets accumulated. Packets the visualiser
    /// rejects are logged and skipped.
    pub fn drain_into(&self, visualiser: &mut VisualiserContext) -> usize {
        let mut delivered = 0;
        loop {
            let packet = match self.queue.try_recv() {
                Ok(packet) => packet,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            };

            match visualiser.accumulate(&packet.samples, packet.channels) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!("Visualiser rejected packet: {}", e),
            }

            // Full means the producer already has spares
            let _ = self.recycle.try_send(packet.samples);
        }
        delivered
    }
}

impl Drop for PacketReceiver {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl std::fmt::Debug for PacketReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketReceiver")
            .field("pending", &self.pending())
            .field("dropped", &self.dropped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waveform_core::SampleRate;

    #[test]
    fn test_delivers_in_order() {
        let (tx, rx) = packet_channel(4);
        let mut ctx = VisualiserContext::new(2, SampleRate::DVD_QUALITY).unwrap();

        assert!(tx.send(&[0.1, 0.1], 1));
        assert!(tx.send(&[0.2, 0.2], 1));
        assert_eq!(rx.pending(), 2);

        assert_eq!(rx.drain_into(&mut ctx), 2);
        assert_eq!(ctx.populated(), 2);
        assert_eq!(rx.pending(), 0);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let (tx, rx) = packet_channel(2);
        for value in [1.0, 2.0, 3.0, 4.0] {
            assert!(tx.send(&[value], 1));
        }

        assert_eq!(tx.dropped(), 2);
        assert_eq!(rx.dropped(), 2);

        let kept: Vec<f32> = rx.queue.try_iter().map(|p| p.samples[0]).collect();
        assert_eq!(kept, vec![3.0, 4.0]);
    }

    #[test]
    fn test_overflow_reuses_evicted_buffers() {
        let (tx, rx) = packet_channel(2);
        let samples = [0.0f32; 64];

        // Allocate the working set, then hand it back through the recycle queue
        tx.send(&samples, 1);
        tx.send(&samples, 1);
        let initial: Vec<usize> = rx
            .queue
            .try_iter()
            .map(|packet| {
                let address = packet.samples.as_ptr() as usize;
                rx.recycle.try_send(packet.samples).unwrap();
                address
            })
            .collect();
        assert_eq!(initial.len(), 2);

        tx.send(&samples, 1);
        tx.send(&samples, 1);
        for round in 0..20 {
            let value = [round as f32; 64];
            assert!(tx.send(&value, 1));
        }
        assert_eq!(tx.dropped(), 20);

        let queued: Vec<QueuedPacket> = rx.queue.try_iter().collect();
        assert_eq!(queued.len(), 2);
        for packet in &queued {
            assert!(initial.contains(&(packet.samples.as_ptr() as usize)));
        }
        assert_eq!(queued[0].samples[0], 18.0);
        assert_eq!(queued[1].samples[0], 19.0);
    }

    #[test]
    fn test_buffers_are_recycled() {
        let (tx, rx) = packet_channel(2);
        let mut ctx = VisualiserContext::new(4, SampleRate::DVD_QUALITY).unwrap();

        tx.send(&[0.0; 4], 1);
        rx.drain_into(&mut ctx);
        assert_eq!(tx.recycled.len(), 1);

        tx.send(&[0.0; 4], 1);
        assert_eq!(tx.recycled.len(), 0);
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (tx, rx) = packet_channel(2);
        drop(rx);

        assert!(tx.is_closed());
        assert!(!tx.send(&[0.5; 4], 2));
        assert_eq!(tx.dropped(), 0);
    }

    #[test]
    fn test_rejected_packets_are_skipped() {
        let (tx, rx) = packet_channel(4);
        let mut ctx = VisualiserContext::new(4, SampleRate::DVD_QUALITY).unwrap();

        tx.send(&[0.0; 3], 1);
        tx.send(&[0.0; 4], 1);
        assert_eq!(rx.drain_into(&mut ctx), 1);
        assert_eq!(ctx.populated(), 1);
    }
}
