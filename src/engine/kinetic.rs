//! Kinetic (inertial) panning: `Idle -> Dragging -> (Idle | Coasting) -> Idle`.
//!
//! While dragging, the viewport scroll follows the pointer one-to-one and a
//! pointer velocity estimate is kept up to date. On release the scroll keeps
//! coasting in the drag direction, decayed by exponential friction each
//! frame, until the velocity falls under the stop threshold.

use crate::model::Viewport;

/// Velocity retained per 60 Hz frame while coasting.
const FRICTION_PER_FRAME: f32 = 0.95;
/// Coasting stops once speed drops below this, in px/s.
const STOP_SPEED: f32 = 8.0;
/// Frame length the friction constant is calibrated against, seconds.
const REFERENCE_FRAME: f32 = 1.0 / 60.0;
/// Blend factor for the exponential velocity estimate (weight of the newest
/// sample).
const VELOCITY_BLEND: f32 = 0.8;

#[derive(Debug, Clone)]
struct DragAnchor {
    pointer_x: f32,
    scroll_px: f32,
    last_x: f32,
    last_time: f64,
    /// Estimated pointer velocity in px/s.
    velocity: f32,
}

#[derive(Debug, Clone)]
enum State {
    Idle,
    Dragging(DragAnchor),
    Coasting { velocity: f32 },
}

/// Drag-to-scroll with post-release inertia for one viewport.
#[derive(Debug, Clone)]
pub struct KineticPan {
    state: State,
}

impl Default for KineticPan {
    fn default() -> Self {
        Self { state: State::Idle }
    }
}

impl KineticPan {
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, State::Dragging(_))
    }

    pub fn is_coasting(&self) -> bool {
        matches!(self.state, State::Coasting { .. })
    }

    /// Start a drag gesture. Cancels any in-flight coast so only one physics
    /// loop ever runs for the viewport.
    pub fn begin_drag(&mut self, pointer_x: f32, now: f64, view: &Viewport) {
        self.state = State::Dragging(DragAnchor {
            pointer_x,
            scroll_px: view.scroll_px,
            last_x: pointer_x,
            last_time: now,
            velocity: 0.0,
        });
    }

    /// Follow the pointer: the scroll offset tracks the total displacement
    /// from the anchor, and the velocity estimate absorbs the newest sample.
    pub fn drag_to(&mut self, pointer_x: f32, now: f64, view: &mut Viewport) {
        let State::Dragging(anchor) = &mut self.state else {
            return;
        };
        view.scroll_px = anchor.scroll_px - (pointer_x - anchor.pointer_x);

        let dt = (now - anchor.last_time) as f32;
        // Two events in the same frame would divide by zero; skip the sample.
        if dt > 0.0 {
            let instant = (pointer_x - anchor.last_x) / dt;
            anchor.velocity = VELOCITY_BLEND * instant + (1.0 - VELOCITY_BLEND) * anchor.velocity;
            anchor.last_x = pointer_x;
            anchor.last_time = now;
        }
    }

    /// End the drag. Fast releases transition to coasting, slow ones settle
    /// straight back to idle.
    pub fn release(&mut self) {
        let State::Dragging(anchor) = &self.state else {
            return;
        };
        let velocity = anchor.velocity;
        self.state = if velocity.abs() > STOP_SPEED {
            State::Coasting { velocity }
        } else {
            State::Idle
        };
    }

    /// Advance the coast by `dt` seconds. Returns `true` while another frame
    /// is needed, `false` once settled back to idle.
    pub fn tick(&mut self, dt: f32, view: &mut Viewport) -> bool {
        let State::Coasting { velocity } = &mut self.state else {
            return false;
        };
        view.scroll_px -= *velocity * dt;
        let frames = (dt / REFERENCE_FRAME).max(0.0);
        *velocity *= FRICTION_PER_FRAME.powf(frames);
        if velocity.abs() < STOP_SPEED {
            self.state = State::Idle;
            return false;
        }
        true
    }

    /// Hard stop, used on viewport teardown and when a conflicting gesture
    /// (bar drag) captures the pointer.
    pub fn stop(&mut self) {
        self.state = State::Idle;
    }
}
