// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The gesture instance registry.
//!
//! Detectors open instances with [`Registry::begin`] and feed them events.
//! Events wait in a per-instance queue until [`Registry::frame_end`]
//! arbitrates between everything live:
//!
//! 1. Fresh instances are matched against interested clients, with one
//!    client query covering all of them.
//! 2. `hold` is the highest priority among instances with clients, `discard`
//!    the highest among those that are mid-gesture (status
//!    [`Status::Update`]).
//! 3. Instances without clients, or below `discard`, are dropped.
//! 4. Instances at or above `hold` flush their queue; the rest wait.
//! 5. Finished instances are released.

use alloc::collections::TryReserveError;
use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::Point;
use smallvec::SmallVec;
use tactile_bits::{BitSet, RingBuffer};
use tactile_frame::{Frame, FrameRef, SlotSet};
use tracing::{debug, warn};

use crate::event::QueuedEvent;
use crate::prop::Props;
use crate::{
    ClientId, ClientInfo, CoordMap, GestureClient, GestureEvent, GestureId, GestureMask,
    GestureType, Priority, Status,
};

/// Number of instances that can be live at once.
pub const POOL_SIZE: usize = 32;

type PoolSet = BitSet<1>;

#[derive(Debug)]
struct Instance {
    gesture_type: GestureType,
    priority: Priority,
    id: GestureId,
    status: Status,
    clients: SmallVec<[ClientId; 4]>,
    span: SlotSet,
    queue: RingBuffer<QueuedEvent>,
}

impl Instance {
    fn enqueue(&mut self, event: QueuedEvent) {
        if self.queue.push(event).is_some() {
            warn!(id = %self.id, "gesture queue full, oldest event dropped");
        }
    }
}

/// Bounded pool of live gesture instances.
#[derive(Debug)]
pub struct Registry {
    pool: Vec<Instance>,
    used: PoolSet,
    fresh: PoolSet,
    by_id: HashMap<GestureId, usize>,
    next_id: u16,
    grab: Option<u32>,
    time: u64,
    map: CoordMap,
    candidates: Vec<ClientInfo>,
}

impl Registry {
    /// Creates a registry whose instances queue up to `queue_capacity`
    /// events each (rounded up to a power of two).
    pub fn new(queue_capacity: usize) -> Result<Self, TryReserveError> {
        let mut pool = Vec::new();
        pool.try_reserve_exact(POOL_SIZE)?;
        for _ in 0..POOL_SIZE {
            pool.push(Instance {
                gesture_type: GestureType::Drag1,
                priority: Priority::Pointer,
                id: GestureId(0),
                status: Status::End,
                clients: SmallVec::new(),
                span: SlotSet::new(),
                queue: RingBuffer::try_with_capacity(queue_capacity)?,
            });
        }
        let mut candidates = Vec::new();
        candidates.try_reserve(POOL_SIZE)?;
        Ok(Self {
            pool,
            used: PoolSet::new(),
            fresh: PoolSet::new(),
            by_id: HashMap::with_capacity(POOL_SIZE),
            next_id: 0,
            grab: None,
            time: 0,
            map: CoordMap::IDENTITY,
            candidates,
        })
    }

    /// The mapping from frame to output coordinates.
    #[must_use]
    pub fn map(&self) -> &CoordMap {
        &self.map
    }

    /// Replaces the output mapping.
    pub fn set_map(&mut self, map: CoordMap) {
        self.map = map;
    }

    /// Number of live instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// Returns `true` if no instance is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Status of a live instance.
    #[must_use]
    pub fn status(&self, id: GestureId) -> Option<Status> {
        self.live(id).map(|inst| inst.status)
    }

    /// Clients matched to a live instance.
    #[must_use]
    pub fn clients(&self, id: GestureId) -> Option<&[ClientId]> {
        self.live(id).map(|inst| inst.clients.as_slice())
    }

    /// Client holding the exclusive grab for the current touch sequence.
    #[must_use]
    pub fn grab(&self) -> Option<u32> {
        self.grab
    }

    fn live(&self, id: GestureId) -> Option<&Instance> {
        self.by_id.get(&id).map(|&i| &self.pool[i])
    }

    fn live_mut(&mut self, id: GestureId) -> Option<&mut Instance> {
        self.by_id.get(&id).map(|&i| &mut self.pool[i])
    }

    /// Opens an instance of `gesture_type` spanning the active slots of
    /// `frame`.
    ///
    /// Returns `None` when the pool is exhausted; the gesture is then simply
    /// not reported.
    pub fn begin(
        &mut self,
        gesture_type: GestureType,
        priority: Priority,
        frame: &Frame,
    ) -> Option<GestureId> {
        let Some(index) = self.used.first_vacant(POOL_SIZE) else {
            warn!(?gesture_type, "gesture pool exhausted");
            return None;
        };
        let id = loop {
            let id = GestureId(self.next_id & GestureId::MAX);
            self.next_id = self.next_id.wrapping_add(1);
            if !self.by_id.contains_key(&id) {
                break id;
            }
        };
        let inst = &mut self.pool[index];
        inst.gesture_type = gesture_type;
        inst.priority = priority;
        inst.id = id;
        inst.status = Status::Begin;
        inst.clients.clear();
        inst.span = frame.active_set();
        inst.queue.clear();
        self.used.insert(index);
        self.fresh.insert(index);
        self.by_id.insert(id, index);
        debug!(%id, ?gesture_type, ?priority, "gesture begin");
        Some(id)
    }

    /// Queues an event for `id`.
    ///
    /// A transient event is the only one its instance produces: it carries
    /// [`Status::Update`] and finishes the instance. Otherwise the event
    /// carries the instance status, which then moves from begin to update.
    /// Unknown ids are ignored.
    pub fn event(
        &mut self,
        id: GestureId,
        pos: Point,
        touches: usize,
        props: &[f64],
        transient: bool,
    ) {
        let time = self.time;
        let Some(inst) = self.live_mut(id) else {
            return;
        };
        let status = if transient {
            Status::Update
        } else {
            inst.status
        };
        inst.enqueue(QueuedEvent {
            status,
            touches,
            pos,
            time,
            props: Props::from_slice(props),
        });
        if transient {
            inst.status = Status::End;
        } else if inst.status == Status::Begin {
            inst.status = Status::Update;
        }
    }

    /// Finishes `id`, queueing a final event unless nothing was reported yet.
    /// Unknown ids are ignored.
    pub fn end(&mut self, id: GestureId, pos: Point, touches: usize, props: &[f64]) {
        let time = self.time;
        let Some(inst) = self.live_mut(id) else {
            return;
        };
        if inst.status != Status::Begin {
            inst.enqueue(QueuedEvent {
                status: Status::End,
                touches,
                pos,
                time,
                props: Props::from_slice(props),
            });
        }
        inst.status = Status::End;
        debug!(%id, "gesture end");
    }

    /// Drops `id` and its queued events without reporting anything.
    /// Unknown ids are ignored.
    pub fn discard(&mut self, id: GestureId) {
        let Some(index) = self.by_id.remove(&id) else {
            return;
        };
        let inst = &mut self.pool[index];
        inst.queue.clear();
        inst.status = Status::End;
        self.used.remove(index);
        self.fresh.remove(index);
        debug!(%id, gesture_type = ?inst.gesture_type, "gesture discarded");
    }

    /// Starts a frame. A touch-down releases any exclusive grab.
    pub fn frame_begin(&mut self, frame: FrameRef<'_>) {
        self.time = frame.time;
        if frame.is_touch_start() {
            self.grab = None;
        }
    }

    /// Arbitrates between live instances and moves surviving events into
    /// `out`, one copy per client.
    pub fn frame_end<C>(&mut self, frame: &Frame, client: &C, out: &mut RingBuffer<GestureEvent>)
    where
        C: GestureClient + ?Sized,
    {
        self.match_clients(frame, client);

        let mut hold = None;
        let mut discard = None;
        for i in &self.used {
            let inst = &self.pool[i];
            if inst.clients.is_empty() {
                continue;
            }
            hold = hold.max(Some(inst.priority));
            if inst.status == Status::Update {
                discard = discard.max(Some(inst.priority));
            }
        }

        for i in &self.used {
            let inst = &self.pool[i];
            if inst.clients.is_empty() || Some(inst.priority) < discard {
                let id = inst.id;
                self.discard(id);
            }
        }

        let map = self.map;
        for i in &self.used {
            let inst = &mut self.pool[i];
            if Some(inst.priority) < hold {
                continue;
            }
            for ev in inst.queue.drain() {
                let pos = map.point(ev.pos);
                for &client in &inst.clients {
                    let evicted = out.push(GestureEvent {
                        gesture_type: inst.gesture_type,
                        id: inst.id,
                        client,
                        status: ev.status,
                        touches: ev.touches,
                        pos,
                        time: ev.time,
                        props: ev.props.clone(),
                    });
                    if evicted.is_some() {
                        warn!(id = %inst.id, "gesture outbox full, oldest event dropped");
                    }
                }
            }
        }

        for i in &self.used {
            let inst = &self.pool[i];
            if inst.status == Status::End {
                let id = inst.id;
                self.discard(id);
            }
        }
    }

    /// Offers fresh instances to the clients interested in them.
    fn match_clients<C>(&mut self, frame: &Frame, client: &C)
    where
        C: GestureClient + ?Sized,
    {
        if self.fresh.is_empty() {
            return;
        }
        let mut types = GestureMask::EMPTY;
        let mut span = SlotSet::new();
        for i in &self.fresh {
            let inst = &self.pool[i];
            types.insert(inst.gesture_type);
            span.union_with(&inst.span);
        }
        let positions: SmallVec<[Point; 8]> = span
            .iter()
            .filter_map(|slot| frame.slot(slot))
            .map(|c| self.map.point(c.pos))
            .collect();
        self.candidates.clear();
        client.get_clients(&positions, types, span, &mut self.candidates);

        for i in &self.fresh {
            let inst = &mut self.pool[i];
            inst.clients.clear();
            for info in &self.candidates {
                if !info.mask.contains(inst.gesture_type) {
                    continue;
                }
                if self.grab.is_some_and(|grab| grab != info.id.client) {
                    continue;
                }
                if info.mask.contains(GestureType::SysFlag1) {
                    self.grab = Some(info.id.client);
                }
                inst.clients.push(info.id);
            }
            if inst.clients.is_empty() {
                debug!(id = %inst.id, gesture_type = ?inst.gesture_type, "no interested clients");
            }
        }
        self.fresh.clear();
    }
}
