// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end behaviour of the gesture engine on synthetic input streams.

use kurbo::{Point, Rect};
use tactile_frame::{ContactAxis, DigitizerKey, InputEvent, SlotSet, Surface, SurfaceFlags};
use tactile_gesture::{
    ClientId, ClientInfo, EngineConfig, GestureClient, GestureEngine, GestureEvent, GestureMask,
    GestureType, Status, prop,
};

struct Recorder {
    mask: GestureMask,
    gestures: Vec<GestureEvent>,
    raw: Vec<InputEvent>,
}

impl Recorder {
    fn new(mask: GestureMask) -> Self {
        Self {
            mask,
            gestures: Vec::new(),
            raw: Vec::new(),
        }
    }
}

impl GestureClient for Recorder {
    fn get_clients(
        &self,
        _positions: &[Point],
        _types: GestureMask,
        _span: SlotSet,
        out: &mut Vec<ClientInfo>,
    ) {
        out.push(ClientInfo {
            id: ClientId {
                client: 1,
                target: 7,
            },
            mask: self.mask,
        });
    }

    fn gesture(&mut self, event: &GestureEvent) {
        self.gestures.push(event.clone());
    }

    fn raw_event(&mut self, event: &InputEvent) {
        self.raw.push(*event);
    }
}

fn engine(mask: GestureMask) -> GestureEngine<Recorder> {
    let surface = Surface::new(Rect::new(0.0, 0.0, 1000.0, 1000.0));
    GestureEngine::new(surface, &EngineConfig::default(), Recorder::new(mask)).unwrap()
}

/// Reports `touches` in slots 0.. and lifts the slots after them.
fn touch(engine: &mut GestureEngine<Recorder>, time_ms: u64, touches: &[(i32, i32)]) {
    for slot in 0..4_i32 {
        engine.pump(&InputEvent::Slot(slot));
        match touches.get(slot as usize) {
            Some(&(x, y)) => {
                engine.pump(&InputEvent::TrackingId(slot + 10));
                engine.pump(&InputEvent::Axis(ContactAxis::PositionX, x));
                engine.pump(&InputEvent::Axis(ContactAxis::PositionY, y));
            }
            None => engine.pump(&InputEvent::TrackingId(-1)),
        }
    }
    engine.pump(&InputEvent::Report { time_ms });
}

#[test]
fn idle_input_passes_straight_through() {
    let mut engine = engine(GestureMask::ALL_GESTURES);
    let click = InputEvent::Button {
        code: 272,
        pressed: true,
    };
    engine.pump(&click);
    assert!(engine.client().raw.is_empty(), "raw events wait for a sync");
    engine.pump(&InputEvent::Report { time_ms: 5 });
    assert_eq!(
        engine.client().raw,
        [click, InputEvent::Report { time_ms: 5 }]
    );
}

#[test]
fn quick_touch_is_a_tap_and_swallows_raw_input() {
    let mut engine = engine(GestureMask::ALL_GESTURES);
    touch(&mut engine, 1000, &[(100, 200)]);
    assert!(engine.client().raw.is_empty());
    touch(&mut engine, 1100, &[]);

    let client = engine.into_client();
    assert!(client.raw.is_empty(), "touch data is stripped: {:?}", client.raw);
    assert_eq!(client.gestures.len(), 1);
    let tap = &client.gestures[0];
    assert_eq!(tap.gesture_type, GestureType::Tap1);
    assert_eq!(tap.status, Status::Update);
    assert_eq!(tap.client.target, 7);
    assert_eq!(tap.touches, 1);
    assert_eq!(tap.pos, Point::new(100.0, 200.0));
    assert_eq!(tap.props[prop::tap::DT], 100.0);
    assert_eq!(tap.props[prop::tap::touch(0)], 10.0);
}

#[test]
fn long_press_replays_raw_input() {
    let mut engine = engine(GestureMask::ALL_GESTURES);
    touch(&mut engine, 1000, &[(100, 200)]);
    touch(&mut engine, 2000, &[]);

    let client = engine.into_client();
    assert!(client.gestures.is_empty());
    // Per report: four slot selections and four tracking ids. The touching
    // slot adds two position writes.
    assert_eq!(client.raw.len(), 2 * 4 * 2 + 2 + 2);
    assert_eq!(client.raw[0], InputEvent::Slot(0));
    assert_eq!(
        client.raw.last(),
        Some(&InputEvent::Report { time_ms: 2000 })
    );
}

#[test]
fn filtered_replay_drops_absolute_events() {
    let mut engine = engine(GestureMask::ALL_GESTURES);
    engine.filter_abs_events(true);
    touch(&mut engine, 1000, &[(100, 200)]);
    touch(&mut engine, 2000, &[]);
    assert_eq!(
        engine.client().raw,
        [
            InputEvent::Report { time_ms: 1000 },
            InputEvent::Report { time_ms: 2000 },
        ]
    );
}

#[test]
fn drag_is_delivered_with_surviving_raw_events() {
    let mut engine = engine(GestureMask::ALL_GESTURES);
    touch(&mut engine, 1000, &[(100, 100)]);
    let click = InputEvent::Button {
        code: 272,
        pressed: true,
    };
    engine.pump(&click);
    touch(&mut engine, 1100, &[(200, 100)]);

    assert_eq!(
        engine.client().raw,
        [click, InputEvent::Report { time_ms: 1100 }]
    );
    let drags = &engine.client().gestures;
    assert_eq!(drags.len(), 1);
    assert_eq!(drags[0].gesture_type, GestureType::Drag1);
    assert_eq!(drags[0].status, Status::Begin);
    assert_eq!(drags[0].props[prop::drag::DX], 100.0);

    touch(&mut engine, 1120, &[]);
    let last = engine.client().gestures.last().unwrap();
    assert_eq!(last.gesture_type, GestureType::Drag1);
    assert_eq!(last.status, Status::End);
}

#[test]
fn unsubscribed_gestures_fall_back_to_raw_input() {
    let mut engine = engine(GestureMask::from(GestureType::Pinch2));
    touch(&mut engine, 1000, &[(100, 100)]);
    touch(&mut engine, 1100, &[(200, 100)]);
    touch(&mut engine, 1120, &[]);
    let client = engine.into_client();
    assert!(client.gestures.is_empty());
    assert!(!client.raw.is_empty());
}

#[test]
fn resting_finger_gives_up_after_the_hold_time() {
    let mut engine = engine(GestureMask::ALL_GESTURES);
    touch(&mut engine, 1000, &[(100, 100)]);
    assert!(engine.client().raw.is_empty());
    // A barely moving finger times out every detector.
    touch(&mut engine, 1400, &[(101, 100)]);
    let replayed = engine.client().raw.len();
    assert!(replayed > 0);

    // Still down, but now passed through as it arrives.
    engine.pump(&InputEvent::Report { time_ms: 1500 });
    assert_eq!(engine.client().raw.len(), replayed + 1);
    assert!(engine.client().gestures.is_empty());
}

#[test]
fn output_box_maps_gesture_positions() {
    let mut engine = engine(GestureMask::ALL_GESTURES);
    engine.set_output_bbox(Rect::new(0.0, 0.0, 500.0, 250.0));
    touch(&mut engine, 1000, &[(100, 200)]);
    touch(&mut engine, 1050, &[]);
    let tap = &engine.client().gestures[0];
    assert_eq!(tap.pos, Point::new(50.0, 50.0));
    assert_eq!(tap.props[prop::tap::X], 50.0);
    assert_eq!(tap.props[prop::tap::Y], 50.0);
}

#[test]
fn semi_mt_tool_keys_stand_in_for_unreported_fingers() {
    for (key, gesture_type, touches) in [
        (DigitizerKey::ToolTripleTap, GestureType::Tap3, 3),
        (DigitizerKey::ToolQuadTap, GestureType::Tap4, 4),
    ] {
        let surface = Surface::new(Rect::new(0.0, 0.0, 1000.0, 1000.0))
            .with_flags(SurfaceFlags::SEMI_MT | SurfaceFlags::DIRECT);
        let client = Recorder::new(GestureMask::ALL_GESTURES);
        let mut engine = GestureEngine::new(surface, &EngineConfig::default(), client).unwrap();

        // The device only tracks the two extreme fingers; the tool key says
        // how many are down.
        for ev in [
            InputEvent::Slot(0),
            InputEvent::TrackingId(20),
            InputEvent::Axis(ContactAxis::PositionX, 400),
            InputEvent::Axis(ContactAxis::PositionY, 500),
            InputEvent::Slot(1),
            InputEvent::TrackingId(21),
            InputEvent::Axis(ContactAxis::PositionX, 600),
            InputEvent::Axis(ContactAxis::PositionY, 500),
            InputEvent::Digitizer(DigitizerKey::Touch, true),
            InputEvent::Digitizer(key, true),
            InputEvent::Report { time_ms: 1000 },
        ] {
            engine.pump(&ev);
        }
        assert_eq!(engine.contacts().len(), touches, "{key:?}");

        for ev in [
            InputEvent::Slot(0),
            InputEvent::TrackingId(-1),
            InputEvent::Slot(1),
            InputEvent::TrackingId(-1),
            InputEvent::Digitizer(key, false),
            InputEvent::Digitizer(DigitizerKey::Touch, false),
            InputEvent::Report { time_ms: 1080 },
        ] {
            engine.pump(&ev);
        }

        let client = engine.into_client();
        assert_eq!(client.gestures.len(), 1, "{key:?}");
        let tap = &client.gestures[0];
        assert_eq!(tap.gesture_type, gesture_type);
        assert_eq!(tap.touches, touches);
        assert_eq!(tap.pos, Point::new(500.0, 500.0));
        assert_eq!(tap.props[prop::tap::touch(0)], 20.0);
        assert_eq!(tap.props[prop::tap::touch(1)], 21.0);
        assert!(
            !client
                .raw
                .iter()
                .any(|ev| matches!(ev, InputEvent::Digitizer(..))),
            "tool keys belong to the gesture"
        );
    }
}
