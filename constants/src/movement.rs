/// Tuning values consumed by the first-person movement integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementProfile {
    /// Acceleration toward the target speed, m/s².
    pub acceleration: f32,
    /// Exponential damping factor applied while no key is held.
    pub damping: f32,
    /// Walking speed cap, m/s.
    pub max_speed: f32,
    /// Speed-cap multiplier while sprint is held.
    pub sprint_multiplier: f32,
}

/// Default walking profile.
pub const WALK: MovementProfile = MovementProfile {
    acceleration: 30.0,
    damping: 8.0,
    max_speed: 5.0,
    sprint_multiplier: 1.8,
};

/// Gentler profile swapped in when the host reports reduced motion.
/// Same integrator, different constants.
pub const REDUCED_MOTION: MovementProfile = MovementProfile {
    acceleration: 12.0,
    damping: 4.0,
    max_speed: 3.5,
    sprint_multiplier: 1.3,
};

/// Pointer-delta (pixels) to radians factor for look input.
pub const LOOK_SENSITIVITY: f32 = 0.0022;

/// Velocities below this magnitude snap to exactly zero while damping.
pub const VELOCITY_EPSILON: f32 = 0.01;

/// Upper bound applied to the raw frame delta before integration; a
/// backgrounded tab can report multi-second deltas.
pub const MAX_FRAME_DELTA: f32 = 0.1;
