use std::collections::HashMap;

use bevy::asset::LoadState;
use bevy::gltf::GltfAssetLabel;
use bevy::math::EulerRot;
use bevy::prelude::*;

use constants::world::{CAR_HALF_EXTENTS, STREAMING_RADIUS};

use crate::engine::assets::catalog::{CarSlot, CatalogSnapshot};
use crate::engine::camera::first_person::ViewerRig;
use crate::engine::loading::progress::LoadingProgress;

/// Runtime wrapper around one catalog slot. The entity is the container
/// group, pre-posed from the slot; the loaded model (or its placeholder)
/// spawns underneath it. Instances are never destroyed mid-session.
#[derive(Component)]
pub struct CarInstance {
    pub slot: CarSlot,
    /// Flips false→true the first time the viewer comes into range;
    /// never flips back.
    pub attached: bool,
    /// True once the model fetch settled, with real geometry or a
    /// placeholder. Settled instances are never refetched.
    pub loaded: bool,
}

/// In-flight glTF scene fetch for one instance.
#[derive(Component)]
pub struct PendingModel(pub Handle<Scene>);

/// Owned map from container entity to slot id, populated at container
/// creation, so a raycast hit resolves by lookup instead of a parent walk
/// through arbitrarily deep model hierarchies.
#[derive(Resource, Default)]
pub struct ContainerIndex {
    by_entity: HashMap<Entity, String>,
}

impl ContainerIndex {
    pub fn insert(&mut self, entity: Entity, id: String) {
        self.by_entity.insert(entity, id);
    }

    pub fn resolve(&self, entity: Entity) -> Option<&str> {
        self.by_entity.get(&entity).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.by_entity.clear();
    }
}

/// Eagerly create one hidden, pre-posed container per slot. Containers only
/// become visible (and hit-testable) once the viewer comes into range.
pub fn spawn_car_containers(
    catalog: Option<Res<CatalogSnapshot>>,
    existing: Query<(), With<CarInstance>>,
    mut index: ResMut<ContainerIndex>,
    mut commands: Commands,
) {
    let Some(catalog) = catalog else {
        return;
    };
    if !existing.is_empty() {
        return;
    }

    for slot in catalog.slots() {
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            slot.rotation.y,
            slot.rotation.x,
            slot.rotation.z,
        );
        let entity = commands
            .spawn((
                CarInstance {
                    slot: slot.clone(),
                    attached: false,
                    loaded: false,
                },
                Transform::from_translation(slot.position).with_rotation(rotation),
                Visibility::Hidden,
            ))
            .id();
        index.insert(entity, slot.id.clone());
    }
    info!("Spawned {} car containers", catalog.len());
}

/// True once the slot is close enough to stream in.
pub fn in_streaming_range(viewer: Vec3, slot_position: Vec3) -> bool {
    viewer.distance_squared(slot_position) < STREAMING_RADIUS * STREAMING_RADIUS
}

/// Attach gate for one instance on one tick.
pub fn should_attach(attached: bool, viewer: Vec3, slot_position: Vec3) -> bool {
    !attached && in_streaming_range(viewer, slot_position)
}

/// Attach containers whose slot entered range and kick off their model
/// fetch. Both happen exactly once per instance for the whole session: the
/// kick is bound to the false→true attach transition, so overlapping
/// frames cannot double-fetch.
pub fn streaming_tick(
    viewers: Query<&Transform, With<ViewerRig>>,
    mut instances: Query<(Entity, &mut CarInstance, &mut Visibility)>,
    asset_server: Res<AssetServer>,
    mut commands: Commands,
) {
    let Ok(viewer) = viewers.single() else {
        return;
    };

    for (entity, mut instance, mut visibility) in &mut instances {
        if !should_attach(instance.attached, viewer.translation, instance.slot.position) {
            continue;
        }

        *visibility = Visibility::Visible;
        instance.attached = true;

        let handle = asset_server
            .load(GltfAssetLabel::Scene(0).from_asset(instance.slot.model_path.clone()));
        commands.entity(entity).insert(PendingModel(handle));
        info!("Streaming in car slot '{}'", instance.slot.id);
    }
}

/// Drain finished model fetches at the top of the frame tick. A failed
/// fetch substitutes a placeholder box, logs, and is never retried; it is
/// not surfaced to the user beyond the visual.
pub fn poll_model_loads(
    mut pending: Query<(Entity, &mut CarInstance, &PendingModel)>,
    asset_server: Res<AssetServer>,
    mut progress: ResMut<LoadingProgress>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut commands: Commands,
) {
    for (entity, mut instance, model) in &mut pending {
        match asset_server.get_load_state(model.0.id()) {
            Some(LoadState::Loaded) => {
                let scale = Vec3::splat(instance.slot.target_scale);
                let scene = model.0.clone();
                commands.entity(entity).with_children(|container| {
                    container.spawn((SceneRoot(scene), Transform::from_scale(scale)));
                });
                instance.loaded = true;
                commands.entity(entity).remove::<PendingModel>();
                progress.mark_settled();
            }
            Some(LoadState::Failed(err)) => {
                warn!(
                    "Model load failed for '{}', substituting placeholder: {err}",
                    instance.slot.id
                );
                spawn_placeholder(
                    &mut commands,
                    entity,
                    instance.slot.target_scale,
                    &mut meshes,
                    &mut materials,
                );
                instance.loaded = true;
                commands.entity(entity).remove::<PendingModel>();
                progress.mark_settled();
            }
            // NotLoaded/Loading: still in flight.
            _ => {}
        }
    }
}

/// Flat grey box with the nominal car footprint, standing in for a model
/// that never arrived. Still selectable through the container.
fn spawn_placeholder(
    commands: &mut Commands,
    container: Entity,
    target_scale: f32,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) {
    let extents = CAR_HALF_EXTENTS * 2.0 * target_scale;
    let mesh = meshes.add(Cuboid::new(extents.x, extents.y, extents.z));
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.35, 0.35, 0.38),
        perceptual_roughness: 0.9,
        ..default()
    });
    commands.entity(container).with_children(|c| {
        c.spawn((
            Mesh3d(mesh),
            MeshMaterial3d(material),
            Transform::from_xyz(0.0, CAR_HALF_EXTENTS.y * target_scale, 0.0),
        ));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_check_uses_euclidean_distance() {
        let slot = Vec3::new(10.0, 0.0, 0.0);
        assert!(in_streaming_range(Vec3::new(10.0, 1.7, 1.0), slot));
        assert!(!in_streaming_range(
            Vec3::new(10.0 + STREAMING_RADIUS + 0.1, 0.0, 0.0),
            slot
        ));
    }

    #[test]
    fn attach_fires_at_most_once_per_instance() {
        let slot = Vec3::ZERO;
        let mut attached = false;
        let mut transitions = 0;

        // Walk in, linger, walk out, and return; the flag latches.
        let path = [
            Vec3::new(40.0, 1.7, 0.0),
            Vec3::new(25.0, 1.7, 0.0),
            Vec3::new(10.0, 1.7, 0.0),
            Vec3::new(10.0, 1.7, 0.0),
            Vec3::new(40.0, 1.7, 0.0),
            Vec3::new(5.0, 1.7, 0.0),
        ];
        for viewer in path {
            if should_attach(attached, viewer, slot) {
                attached = true;
                transitions += 1;
            }
        }
        assert_eq!(transitions, 1);
        assert!(attached);
    }

    #[test]
    fn out_of_range_instances_never_attach() {
        let slot = Vec3::new(100.0, 0.0, 100.0);
        let mut attached = false;
        for step in 0..50 {
            let viewer = Vec3::new(step as f32, 1.7, 0.0);
            if should_attach(attached, viewer, slot) {
                attached = true;
            }
        }
        assert!(!attached);
    }

    #[test]
    fn container_index_resolves_inserted_entities_only() {
        let mut index = ContainerIndex::default();
        let known = Entity::from_raw(7);
        let unknown = Entity::from_raw(8);
        index.insert(known, "roadster".to_string());

        assert_eq!(index.resolve(known), Some("roadster"));
        assert_eq!(index.resolve(unknown), None);

        index.clear();
        assert_eq!(index.resolve(known), None);
    }
}
