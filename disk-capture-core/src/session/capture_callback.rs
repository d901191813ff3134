//! Producer side of the pipeline, run on the engine's real-time thread.

use std::sync::Arc;

use crate::models::config::SAMPLE_UNIT_BYTES;
use crate::processing::ring_buffer::RingProducer;
use crate::session::context::CaptureContext;
use crate::traits::audio_engine::ProcessHandler;

/// Process handler registered with the engine at arm time.
///
/// Owns the ring's producer half; everything it touches was allocated
/// before it was registered.
pub struct CaptureCallback {
    context: Arc<CaptureContext>,
    producer: RingProducer,
}

impl CaptureCallback {
    pub fn new(context: Arc<CaptureContext>, producer: RingProducer) -> Self {
        Self { context, producer }
    }
}

impl ProcessHandler for CaptureCallback {
    fn process(&mut self, inputs: &[&[f32]], nframes: usize) {
        capture_cycle(&self.context, &mut self.producer, inputs, nframes);
    }
}

/// Copy one cycle of per-channel input buffers into the ring, interleaved.
///
/// Does nothing unless the session is active. A frame is admitted only if
/// the ring has room for all of its channels, so the ring never holds a
/// partial frame; every sample unit that is not written counts as one
/// overrun. Ends with a single non-blocking wake-up of the disk writer.
///
/// Missing channel buffers, or buffers shorter than `nframes`, are read as
/// silence so frames stay aligned.
pub fn capture_cycle(
    context: &CaptureContext,
    producer: &mut RingProducer,
    inputs: &[&[f32]],
    nframes: usize,
) {
    if !context.is_active() {
        return;
    }

    let channels = context.channels();
    let bytes_per_frame = context.bytes_per_frame();
    let mut dropped = 0u64;

    for frame in 0..nframes {
        if producer.write_space() < bytes_per_frame {
            dropped += channels as u64;
            continue;
        }
        for channel in 0..channels {
            let sample = inputs
                .get(channel)
                .and_then(|buffer| buffer.get(frame))
                .copied()
                .unwrap_or(0.0);
            if producer.write(&sample.to_ne_bytes()) < SAMPLE_UNIT_BYTES {
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        context.add_overruns(dropped);
    }
    context.handoff().try_notify();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::state::CaptureStatus;
    use crate::processing::ring_buffer::{RingBuffer, RingConsumer};
    use crate::processing::sample_format::decode_units;

    fn setup(
        channels: usize,
        ring_frames: usize,
    ) -> (Arc<CaptureContext>, CaptureCallback, RingConsumer) {
        let context = Arc::new(CaptureContext::new(channels, u64::MAX));
        let ring = RingBuffer::new(channels * SAMPLE_UNIT_BYTES * ring_frames);
        let (producer, consumer) = ring.split();
        let callback = CaptureCallback::new(Arc::clone(&context), producer);
        (context, callback, consumer)
    }

    fn drain(consumer: &mut RingConsumer) -> Vec<f32> {
        let mut bytes = vec![0u8; consumer.read_space()];
        consumer.read(&mut bytes);
        let mut samples = Vec::new();
        decode_units(&bytes, &mut samples);
        samples
    }

    #[test]
    fn inactive_session_writes_nothing() {
        let (context, mut callback, consumer) = setup(2, 16);
        let left = [0.5f32; 8];
        let right = [-0.5f32; 8];

        for status in [CaptureStatus::Uninitialized, CaptureStatus::Armed, CaptureStatus::Closed] {
            context.set_status(status);
            callback.process(&[&left[..], &right[..]], 8);
            assert_eq!(consumer.read_space(), 0);
        }
        assert_eq!(context.overruns(), 0);
        assert_eq!(context.handoff().signals_sent(), 0);
    }

    #[test]
    fn interleaves_channels_in_registration_order() {
        let (context, mut callback, mut consumer) = setup(2, 16);
        context.set_status(CaptureStatus::Active);

        callback.process(&[&[1.0, 2.0, 3.0][..], &[-1.0, -2.0, -3.0][..]], 3);

        assert_eq!(drain(&mut consumer), vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
        assert_eq!(context.handoff().signals_sent(), 1);
    }

    #[test]
    fn burst_overrun_counts_every_dropped_unit() {
        let (context, mut callback, mut consumer) = setup(2, 8);
        context.set_status(CaptureStatus::Active);

        let left: Vec<f32> = (0..1000).map(|i| i as f32).collect();
        let right: Vec<f32> = (0..1000).map(|i| -(i as f32)).collect();
        callback.process(&[&left[..], &right[..]], 1000);

        // 8 frames fit; each of the remaining 992 frames drops both units.
        assert_eq!(context.overruns(), 992 * 2);

        let buffered = drain(&mut consumer);
        let expected: Vec<f32> = (0..8).flat_map(|i| [i as f32, -(i as f32)]).collect();
        assert_eq!(buffered, expected);
    }

    #[test]
    fn delivered_plus_dropped_equals_written() {
        let (context, mut callback, mut consumer) = setup(3, 5);
        context.set_status(CaptureStatus::Active);

        let buffer = [0.25f32; 4];
        let mut delivered = 0usize;
        let mut written = 0u64;
        for cycle in 0..50 {
            callback.process(&[&buffer[..], &buffer[..], &buffer[..]], 4);
            written += 4 * 3;
            if cycle % 3 == 0 {
                delivered += drain(&mut consumer).len();
            }
        }
        delivered += drain(&mut consumer).len();

        assert_eq!(delivered as u64 + context.overruns(), written);
    }

    #[test]
    fn missing_inputs_are_silence() {
        let (context, mut callback, mut consumer) = setup(2, 4);
        context.set_status(CaptureStatus::Active);

        callback.process(&[&[0.75, 0.5][..]], 2);
        assert_eq!(drain(&mut consumer), vec![0.75, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn signal_is_skipped_while_writer_drains() {
        let (context, mut callback, _consumer) = setup(1, 4);
        context.set_status(CaptureStatus::Active);

        {
            let _drain = context.handoff().lock();
            callback.process(&[&[0.1][..]], 1);
        }
        assert_eq!(context.handoff().signals_skipped(), 1);
        assert_eq!(context.handoff().signals_sent(), 0);
    }
}
