use bevy::math::EulerRot;
use bevy::prelude::*;

use constants::movement::{
    LOOK_SENSITIVITY, MovementProfile, REDUCED_MOTION, VELOCITY_EPSILON, WALK,
};
use constants::world::{
    EYE_HEIGHT, LOT_MAX_X, LOT_MAX_Z, LOT_MIN_X, LOT_MIN_Z, START_POSITION,
};

use crate::engine::core::frame::FrameStep;
use crate::engine::input::InputSampler;
use crate::engine::render::outline_postprocessing::OutlineSettings;

/// First-person movement state, carried on the yaw entity.
///
/// Position and yaw live on this entity's transform; pitch lives on the
/// child pitch entity; the camera hangs under the pitch entity. Keeping
/// pitch on its own node means horizontal movement is derived from yaw
/// alone and can never tilt into the floor.
#[derive(Component)]
pub struct ViewerRig {
    pub velocity: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

/// Marker for the pitch node between the rig and the camera.
#[derive(Component)]
pub struct RigPitch;

/// Host-reported accessibility flag; swaps the movement tuning profile.
#[derive(Resource, Default)]
pub struct ReducedMotion(pub bool);

pub fn spawn_viewer_rig(mut commands: Commands) {
    commands
        .spawn((
            ViewerRig {
                velocity: Vec3::ZERO,
                yaw: 0.0,
                pitch: 0.0,
            },
            Transform::from_translation(START_POSITION),
            Visibility::default(),
        ))
        .with_children(|rig| {
            rig.spawn((RigPitch, Transform::IDENTITY, Visibility::default()))
                .with_children(|pitch| {
                    pitch.spawn((
                        Camera3d::default(),
                        OutlineSettings::default(),
                        Transform::IDENTITY,
                    ));
                });
        });
}

/// Apply the accumulated look delta immediately, ahead of the physics step,
/// reassembling both rotations from the clamped Euler angles.
pub fn apply_look(
    mut sampler: ResMut<InputSampler>,
    mut rigs: Query<(&mut Transform, &mut ViewerRig)>,
    mut pitches: Query<&mut Transform, (With<RigPitch>, Without<ViewerRig>)>,
) {
    let delta = sampler.take_pointer_delta();
    if delta == Vec2::ZERO {
        return;
    }
    let Ok((mut yaw_transform, mut rig)) = rigs.single_mut() else {
        return;
    };

    rig.yaw -= delta.x * LOOK_SENSITIVITY;
    rig.pitch = clamp_pitch(rig.pitch - delta.y * LOOK_SENSITIVITY);

    yaw_transform.rotation = Quat::from_euler(EulerRot::YXZ, rig.yaw, 0.0, 0.0);
    if let Ok(mut pitch_transform) = pitches.single_mut() {
        pitch_transform.rotation = Quat::from_euler(EulerRot::YXZ, 0.0, rig.pitch, 0.0);
    }
}

/// Advance the rig by one clamped frame step: accelerate or damp the
/// velocity, integrate, and clamp to the lot bounds.
pub fn update_movement(
    step: Res<FrameStep>,
    sampler: Res<InputSampler>,
    reduced: Res<ReducedMotion>,
    mut rigs: Query<(&mut Transform, &mut ViewerRig)>,
) {
    let Ok((mut transform, mut rig)) = rigs.single_mut() else {
        return;
    };
    let profile = if reduced.0 { REDUCED_MOTION } else { WALK };
    let input = MoveInput::from_sampler(&sampler);

    rig.velocity = integrate_velocity(rig.velocity, &input, rig.yaw, &profile, step.dt);
    transform.translation = integrate_position(transform.translation, rig.velocity, step.dt);
}

/// Key flags relevant to the movement integrator.
#[derive(Debug, Default, Clone, Copy)]
pub struct MoveInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
}

impl MoveInput {
    fn from_sampler(sampler: &InputSampler) -> Self {
        Self {
            forward: sampler.forward,
            backward: sampler.backward,
            left: sampler.left,
            right: sampler.right,
            sprint: sampler.sprint,
        }
    }
}

/// Pitch is confined to straight-down/straight-up so the camera can't flip.
pub fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(-std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2)
}

/// Accelerate toward the capped target speed, or damp toward rest when no
/// key is held. Movement stays in the world XZ plane.
pub fn integrate_velocity(
    velocity: Vec3,
    input: &MoveInput,
    yaw: f32,
    profile: &MovementProfile,
    dt: f32,
) -> Vec3 {
    let local = Vec3::new(
        input.right as i32 as f32 - input.left as i32 as f32,
        0.0,
        input.backward as i32 as f32 - input.forward as i32 as f32,
    );

    if local == Vec3::ZERO {
        let damped = velocity * (1.0 - profile.damping * dt).max(0.0);
        return if damped.length() < VELOCITY_EPSILON {
            Vec3::ZERO
        } else {
            damped
        };
    }

    let direction = (Quat::from_rotation_y(yaw) * local).normalize();
    let cap = profile.max_speed
        * if input.sprint {
            profile.sprint_multiplier
        } else {
            1.0
        };

    let next = velocity + direction * profile.acceleration * dt;
    if next.length() > cap {
        next.normalize() * cap
    } else {
        next
    }
}

/// Integrate and hard-clamp x/z independently to the lot's walkable
/// rectangle; height stays pinned to eye level.
pub fn integrate_position(position: Vec3, velocity: Vec3, dt: f32) -> Vec3 {
    let next = position + velocity * dt;
    Vec3::new(
        next.x.clamp(LOT_MIN_X, LOT_MAX_X),
        EYE_HEIGHT,
        next.z.clamp(LOT_MIN_Z, LOT_MAX_Z),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn held(forward: bool, sprint: bool) -> MoveInput {
        MoveInput {
            forward,
            sprint,
            ..Default::default()
        }
    }

    #[test]
    fn speed_never_exceeds_cap() {
        let mut velocity = Vec3::ZERO;
        let input = held(true, false);
        for _ in 0..600 {
            velocity = integrate_velocity(velocity, &input, 0.3, &WALK, DT);
            assert!(velocity.length() <= WALK.max_speed + 1e-4);
        }
    }

    #[test]
    fn sprint_raises_the_cap_but_still_caps() {
        let mut velocity = Vec3::ZERO;
        let input = held(true, true);
        for _ in 0..600 {
            velocity = integrate_velocity(velocity, &input, 0.0, &WALK, DT);
        }
        let cap = WALK.max_speed * WALK.sprint_multiplier;
        assert!(velocity.length() <= cap + 1e-4);
        assert!(velocity.length() > WALK.max_speed);
    }

    #[test]
    fn damping_settles_to_exact_zero() {
        let mut velocity = Vec3::new(3.0, 0.0, -2.0);
        let idle = MoveInput::default();
        for _ in 0..600 {
            velocity = integrate_velocity(velocity, &idle, 0.0, &WALK, DT);
        }
        assert_eq!(velocity, Vec3::ZERO);
    }

    #[test]
    fn position_stays_inside_lot_bounds() {
        let mut position = START_POSITION;
        // Deliberately absurd velocity; the clamp is hard, not a bounce.
        let velocity = Vec3::new(1.0e4, 0.0, -1.0e4);
        for _ in 0..10 {
            position = integrate_position(position, velocity, DT);
            assert!(position.x >= LOT_MIN_X && position.x <= LOT_MAX_X);
            assert!(position.z >= LOT_MIN_Z && position.z <= LOT_MAX_Z);
        }
        assert_eq!(position.y, EYE_HEIGHT);
    }

    #[test]
    fn pitch_clamps_for_any_delta_sequence() {
        let mut pitch = 0.0;
        for delta in [-10.0, 500.0, -0.01, 3.2, -7.9_f32] {
            pitch = clamp_pitch(pitch - delta * LOOK_SENSITIVITY);
            assert!(pitch.abs() <= std::f32::consts::FRAC_PI_2);
        }
    }

    #[test]
    fn one_second_from_rest_ramps_below_top_speed() {
        let mut velocity = Vec3::ZERO;
        let mut position = START_POSITION;
        let input = held(true, false);
        for _ in 0..60 {
            velocity = integrate_velocity(velocity, &input, 0.0, &WALK, DT);
            position = integrate_position(position, velocity, DT);
        }
        let displacement = (position - START_POSITION).length();
        assert!(displacement > 0.0);
        assert!(displacement < WALK.max_speed * 1.0);
    }

    #[test]
    fn reduced_motion_ramps_more_gently() {
        let input = held(true, false);
        let walk = integrate_velocity(Vec3::ZERO, &input, 0.0, &WALK, DT);
        let reduced = integrate_velocity(Vec3::ZERO, &input, 0.0, &REDUCED_MOTION, DT);
        assert!(reduced.length() < walk.length());
    }
}
