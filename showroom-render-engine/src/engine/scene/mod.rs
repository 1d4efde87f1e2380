use bevy::math::EulerRot;
use bevy::prelude::*;

use constants::path::GROUND_TEXTURE_PATH;
use constants::world::GROUND_SIZE;

/// Marker for the showroom floor plane.
#[derive(Component)]
pub struct GroundPlane;

/// Marker for the shadow-casting key light.
#[derive(Component)]
pub struct ShowroomLight;

/// Handle to the floor texture, kept so the quality switch can rewrite its
/// sampler without re-fetching.
#[derive(Resource)]
pub struct GroundTexture(pub Handle<Image>);

pub fn spawn_showroom_floor(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let ground_texture: Handle<Image> = asset_server.load(GROUND_TEXTURE_PATH);

    commands.spawn((
        GroundPlane,
        Mesh3d(meshes.add(Plane3d::default().mesh().size(GROUND_SIZE, GROUND_SIZE))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color_texture: Some(ground_texture.clone()),
            perceptual_roughness: 0.95,
            ..default()
        })),
        Transform::IDENTITY,
    ));
    commands.insert_resource(GroundTexture(ground_texture));

    commands.spawn((
        ShowroomLight,
        DirectionalLight {
            shadows_enabled: true,
            illuminance: 12_000.0,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            0.8,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}
