use bevy::math::Vec3;

/// Walkable rectangle of the showroom lot, in metres.
pub const LOT_MIN_X: f32 = -28.0;
pub const LOT_MAX_X: f32 = 28.0;
pub const LOT_MIN_Z: f32 = -28.0;
pub const LOT_MAX_Z: f32 = 28.0;

/// Eye height of the viewer rig above the floor.
pub const EYE_HEIGHT: f32 = 1.7;

/// Pose the viewer rig spawns at.
pub const START_POSITION: Vec3 = Vec3::new(0.0, EYE_HEIGHT, 14.0);

/// Distance under which a car slot's container attaches and its model
/// fetch begins.
pub const STREAMING_RADIUS: f32 = 18.0;

/// Nominal half extents of a display car before per-slot scaling.
/// Used for hit-testing containers and for sizing placeholder boxes.
pub const CAR_HALF_EXTENTS: Vec3 = Vec3::new(1.1, 0.8, 2.4);

/// Side length of the square floor plane.
pub const GROUND_SIZE: f32 = 64.0;
