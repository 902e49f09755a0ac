// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture detectors.
//!
//! Seven independent state machines read the [`MotionFilter`] after every
//! frame and open, update, end or discard registry instances. They run in a
//! fixed order: drag, pinch, rotate, their window variants, then tap.

mod combo;
mod drag;
mod radial;
mod tap;

use tactile_frame::FrameRef;

use crate::{MotionFilter, Registry};
use combo::Combo;
use radial::{PINCH, ROTATE};
use tap::Tapping;

/// State of every detector.
#[derive(Clone, Debug, Default)]
pub(crate) struct Recognizer {
    drag: Combo,
    pinch: Combo,
    rotate: Combo,
    win_drag: Combo,
    win_pinch: Combo,
    win_rotate: Combo,
    tap: Tapping,
}

impl Recognizer {
    pub(crate) fn recognize(
        &mut self,
        motion: &MotionFilter,
        registry: &mut Registry,
        frame: FrameRef<'_>,
    ) {
        drag::direct(&mut self.drag, motion, registry, &frame);
        radial::direct(&PINCH, &mut self.pinch, motion, registry, &frame);
        radial::direct(&ROTATE, &mut self.rotate, motion, registry, &frame);
        drag::window(&mut self.win_drag, motion, registry, &frame);
        radial::window(&PINCH, &mut self.win_pinch, motion, registry, &frame);
        radial::window(&ROTATE, &mut self.win_rotate, motion, registry, &frame);
        self.tap.update(motion, registry, frame);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A small rig driving frames through motion, detectors and registry.

    use alloc::vec::Vec;

    use kurbo::{Point, Rect};
    use tactile_bits::RingBuffer;
    use tactile_frame::{
        ContactAxis, FrameConfig, FrameEngine, InputEvent, SlotSet, Surface,
    };

    use super::Recognizer;
    use crate::{
        ClientId, ClientInfo, GestureClient, GestureEvent, GestureMask, MotionConfig,
        MotionFilter, Registry,
    };

    #[derive(Debug)]
    pub(crate) struct Everyone;

    impl GestureClient for Everyone {
        fn get_clients(
            &self,
            _positions: &[Point],
            _types: GestureMask,
            _span: SlotSet,
            out: &mut Vec<ClientInfo>,
        ) {
            out.push(ClientInfo {
                id: ClientId::default(),
                mask: GestureMask::ALL_GESTURES,
            });
        }

        fn gesture(&mut self, _event: &GestureEvent) {}

        fn raw_event(&mut self, _event: &InputEvent) {}
    }

    pub(crate) struct Rig {
        pub(crate) frames: FrameEngine,
        pub(crate) motion: MotionFilter,
        pub(crate) recognizer: Recognizer,
        pub(crate) registry: Registry,
        pub(crate) out: RingBuffer<GestureEvent>,
    }

    impl Rig {
        pub(crate) fn new() -> Self {
            let range = Rect::new(0.0, 0.0, 1000.0, 1000.0);
            Self {
                frames: FrameEngine::new(FrameConfig::default(), Surface::new(range)).unwrap(),
                motion: MotionFilter::new(&MotionConfig::default(), range),
                recognizer: Recognizer::default(),
                registry: Registry::new(64).unwrap(),
                out: RingBuffer::with_capacity(256),
            }
        }

        /// Reports `touches` in slots 0.., commits at `time` and runs one
        /// recognition pass. Returns the events that came out.
        pub(crate) fn step(&mut self, time: u64, touches: &[(f64, f64)]) -> Vec<GestureEvent> {
            for slot in 0..6 {
                self.frames.pump(&InputEvent::Slot(slot));
                match touches.get(slot as usize) {
                    Some(&(x, y)) => {
                        self.frames.pump(&InputEvent::TrackingId(slot + 100));
                        self.frames
                            .pump(&InputEvent::Axis(ContactAxis::PositionX, x as i32));
                        self.frames
                            .pump(&InputEvent::Axis(ContactAxis::PositionY, y as i32));
                    }
                    None => {
                        self.frames.pump(&InputEvent::TrackingId(-1));
                    }
                }
            }
            if let Some(frame) = self.frames.pump(&InputEvent::Report { time_ms: time }) {
                self.registry.frame_begin(frame);
                self.motion.update(frame);
                self.recognizer
                    .recognize(&self.motion, &mut self.registry, frame);
                self.registry.frame_end(&frame, &Everyone, &mut self.out);
            }
            self.out.drain().collect()
        }
    }
}
