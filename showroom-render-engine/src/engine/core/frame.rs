use bevy::prelude::*;

use constants::movement::MAX_FRAME_DELTA;

/// Per-frame timestep shared by every simulation system. The delta is
/// clamped so a backgrounded tab does not integrate one huge step on
/// resume.
#[derive(Resource, Default)]
pub struct FrameStep {
    pub dt: f32,
}

pub fn begin_frame(time: Res<Time>, mut step: ResMut<FrameStep>) {
    step.dt = time.delta_secs().min(MAX_FRAME_DELTA);
}
