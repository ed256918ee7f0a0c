//! Camera synchronization between the two viewports of a pair.
//!
//! Every settle event on one viewport produces at most one corrective
//! write on its sibling. Writes never re-enter the handler: a host's
//! `set_view` only queues a settle event, and the camera written to a
//! sibling is remembered so that event is swallowed instead of being
//! propagated back. Events from both viewports share one [`EventClock`]
//! and are handled in arrival order.

use std::cell::Cell;
use std::rc::Rc;

use log::{debug, trace, warn};

use crate::viewport::{Camera, EventClock, LatLng, MapViewport, QueuedEvent, Side, ViewOptions};

/// Cameras closer than this are considered settled.
pub const SYNC_TOLERANCE: f64 = 1e-9;

/// Shared on/off switch for propagation.
///
/// Cloning yields another handle to the same flag.
#[derive(Debug, Clone)]
pub struct SyncFlag(Rc<Cell<bool>>);

impl SyncFlag {
    pub fn new(enabled: bool) -> Self {
        Self(Rc::new(Cell::new(enabled)))
    }

    pub fn get(&self) -> bool {
        self.0.get()
    }

    pub fn set(&self, enabled: bool) {
        self.0.set(enabled);
    }

    /// Disables propagation until the returned guard is dropped, at which
    /// point the previous value is restored.
    pub fn suspend(&self) -> SyncSuspension {
        let previous = self.0.replace(false);
        SyncSuspension {
            flag: self.clone(),
            previous,
        }
    }
}

/// Guard returned by [`SyncFlag::suspend`].
#[derive(Debug)]
pub struct SyncSuspension {
    flag: SyncFlag,
    previous: bool,
}

impl SyncSuspension {
    /// Value that will be restored on drop.
    pub fn previous(&self) -> bool {
        self.previous
    }
}

impl Drop for SyncSuspension {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

/// Debug snapshot of the pair, taken from the primary viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncState {
    pub syncing: bool,
    pub center: Option<LatLng>,
    pub zoom: Option<f64>,
}

/// Two viewports plus the switch that keeps their cameras together.
///
/// Either viewport may be absent while the host is still constructing it;
/// every operation touching an absent viewport is a no-op.
#[derive(Debug)]
pub struct ViewportPair<V: MapViewport> {
    viewports: [Option<V>; 2],
    syncing: SyncFlag,
    clock: EventClock,
    pending_echo: [Option<Camera>; 2],
}

impl<V: MapViewport> ViewportPair<V> {
    pub fn new(mut primary: V, mut secondary: V, syncing: bool) -> Self {
        let clock = EventClock::new();
        primary.set_event_clock(clock.clone());
        secondary.set_event_clock(clock.clone());
        Self {
            viewports: [Some(primary), Some(secondary)],
            syncing: SyncFlag::new(syncing),
            clock,
            pending_echo: [None, None],
        }
    }

    /// A pair whose viewports have not been attached yet.
    pub fn detached(syncing: bool) -> Self {
        Self {
            viewports: [None, None],
            syncing: SyncFlag::new(syncing),
            clock: EventClock::new(),
            pending_echo: [None, None],
        }
    }

    pub fn attach(&mut self, side: Side, mut viewport: V) {
        viewport.set_event_clock(self.clock.clone());
        self.pending_echo[side.index()] = None;
        self.viewports[side.index()] = Some(viewport);
    }

    pub fn detach(&mut self, side: Side) -> Option<V> {
        self.pending_echo[side.index()] = None;
        self.viewports[side.index()].take()
    }

    pub fn get(&self, side: Side) -> Option<&V> {
        self.viewports[side.index()].as_ref()
    }

    pub fn get_mut(&mut self, side: Side) -> Option<&mut V> {
        self.viewports[side.index()].as_mut()
    }

    pub fn primary(&self) -> Option<&V> {
        self.get(Side::Primary)
    }

    pub fn secondary(&self) -> Option<&V> {
        self.get(Side::Secondary)
    }

    /// Both viewports mutably, if both exist.
    pub fn both_mut(&mut self) -> Option<(&mut V, &mut V)> {
        match &mut self.viewports {
            [Some(primary), Some(secondary)] => Some((primary, secondary)),
            _ => None,
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.get()
    }

    /// Handle to the shared flag, for collaborators that suspend sync.
    pub fn sync_flag(&self) -> SyncFlag {
        self.syncing.clone()
    }

    /// Flips propagation on or off and returns the new state. Cameras are
    /// left where they are; a desynchronized pair catches up on the next
    /// move.
    pub fn toggle_sync(&mut self) -> bool {
        let enabled = !self.syncing.get();
        self.syncing.set(enabled);
        debug!("viewport sync {}", if enabled { "enabled" } else { "disabled" });
        enabled
    }

    /// Copies the camera of `source` onto its sibling.
    ///
    /// Returns `true` when a write happened. Nothing is written while sync
    /// is off, when either viewport is missing, when the source camera is
    /// not finite, or when the sibling already shows the same camera.
    pub fn on_viewport_changed(&mut self, source: Side) -> bool {
        if !self.syncing.get() {
            return false;
        }
        let camera = match self.get(source) {
            Some(vp) => vp.camera(),
            None => return false,
        };
        if !camera.is_finite() {
            warn!("{} camera is not finite, not propagating", source);
            return false;
        }
        let sibling_side = source.other();
        let Some(sibling) = self.viewports[sibling_side.index()].as_mut() else {
            return false;
        };
        if sibling.camera().approx_eq(&camera, SYNC_TOLERANCE) {
            return false;
        }

        self.pending_echo[sibling_side.index()] = write_view(sibling, camera.center, camera.zoom);
        trace!("propagated {} camera to {}", source, sibling_side);
        true
    }

    /// Drains queued settle events from both viewports and propagates
    /// each genuine one. Returns the number of corrective writes.
    ///
    /// Events are handled oldest first across both viewports. A move is
    /// skipped when the sibling has a later genuine move queued, so the
    /// most recent user gesture wins. The loop runs until neither viewport
    /// has anything queued.
    pub fn dispatch(&mut self) -> usize {
        let mut writes = 0;
        loop {
            let mut batch: Vec<(Side, QueuedEvent)> = Vec::new();
            for side in [Side::Primary, Side::Secondary] {
                if let Some(vp) = self.get_mut(side) {
                    batch.extend(vp.take_events().into_iter().map(|e| (side, e)));
                }
            }
            if batch.is_empty() {
                break;
            }
            batch.sort_by_key(|(_, queued)| queued.seq);

            for (idx, (side, queued)) in batch.iter().enumerate() {
                if self.is_echo(*side, &queued.event.camera()) {
                    self.pending_echo[side.index()] = None;
                    trace!("swallowed echo on {}", side);
                    continue;
                }
                let superseded = batch[idx + 1..]
                    .iter()
                    .any(|(later, e)| *later == side.other() && !self.is_echo(*later, &e.event.camera()));
                if superseded {
                    trace!("{} move superseded by a later {} move", side, side.other());
                    continue;
                }
                if self.on_viewport_changed(*side) {
                    writes += 1;
                }
            }
        }
        writes
    }

    fn is_echo(&self, side: Side, camera: &Camera) -> bool {
        self.pending_echo[side.index()].is_some_and(|c| c.approx_eq(camera, SYNC_TOLERANCE))
    }

    /// Drops every queued settle event without propagating it.
    pub fn discard_events(&mut self) {
        for side in [Side::Primary, Side::Secondary] {
            if let Some(vp) = self.get_mut(side) {
                vp.take_events();
            }
            self.pending_echo[side.index()] = None;
        }
    }

    /// Applies `zoom` to both viewports directly, each keeping its own
    /// center.
    pub fn set_zoom(&mut self, zoom: f64) {
        if !zoom.is_finite() {
            warn!("ignoring non-finite zoom {}", zoom);
            return;
        }
        for side in [Side::Primary, Side::Secondary] {
            if let Some(vp) = self.viewports[side.index()].as_mut() {
                let center = vp.center();
                self.pending_echo[side.index()] = write_view(vp, center, zoom);
            }
        }
    }

    /// Moves both viewports to the same camera directly.
    pub fn set_view(&mut self, center: LatLng, zoom: f64) {
        if !Camera::new(center, zoom).is_finite() {
            warn!("ignoring non-finite camera {} z{}", center, zoom);
            return;
        }
        for side in [Side::Primary, Side::Secondary] {
            if let Some(vp) = self.viewports[side.index()].as_mut() {
                self.pending_echo[side.index()] = write_view(vp, center, zoom);
            }
        }
    }

    pub fn sync_state(&self) -> SyncState {
        let primary = self.primary();
        SyncState {
            syncing: self.is_syncing(),
            center: primary.map(|vp| vp.center()),
            zoom: primary.map(|vp| vp.zoom()),
        }
    }
}

/// Writes a camera and returns the echo to expect: what the viewport
/// actually settled on (it may clamp), or `None` when nothing changed.
fn write_view<V: MapViewport>(vp: &mut V, center: LatLng, zoom: f64) -> Option<Camera> {
    let before = vp.camera();
    vp.set_view(center, zoom, ViewOptions::instant());
    let after = vp.camera();
    (!after.approx_eq(&before, SYNC_TOLERANCE)).then_some(after)
}
