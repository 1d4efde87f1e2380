use bevy::prelude::*;
use bevy::window::WindowCloseRequested;

use crate::engine::assets::catalog::CatalogSnapshot;
use crate::engine::camera::ViewerRig;
use crate::engine::scene::{GroundPlane, ShowroomLight};
use crate::engine::streaming::{CarInstance, ContainerIndex};
use crate::tools::selection::HighlightTargets;

/// Lifecycle of the showroom core. `Loading` covers catalog fetch and
/// container spawning; `Running` is the interactive loop; `Disposed` is
/// terminal and re-entry requires a fresh app.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    #[default]
    Loading,
    Running,
    Disposed,
}

/// Enter the interactive loop once the catalog has settled and every slot
/// has its container in the world.
pub fn transition_to_running(
    snapshot: Option<Res<CatalogSnapshot>>,
    containers: Query<(), With<CarInstance>>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    let Some(snapshot) = snapshot else {
        return;
    };
    if containers.is_empty() {
        return;
    }

    info!("Showroom running with {} car slots", snapshot.len());
    next_state.set(AppState::Running);
}

/// Window close is the dispose trigger; the state transition does the
/// actual teardown.
pub fn request_dispose(
    mut close_requests: EventReader<WindowCloseRequested>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if close_requests.read().next().is_some() {
        next_state.set(AppState::Disposed);
    }
}

/// Tear down scene content and stale lookups, then exit. Runs once on
/// entering `Disposed`.
pub fn dispose_scene(
    mut commands: Commands,
    scene_entities: Query<
        Entity,
        Or<(
            With<CarInstance>,
            With<ViewerRig>,
            With<GroundPlane>,
            With<ShowroomLight>,
        )>,
    >,
    mut index: ResMut<ContainerIndex>,
    mut targets: ResMut<HighlightTargets>,
    mut exit: EventWriter<AppExit>,
) {
    for entity in &scene_entities {
        commands.entity(entity).despawn();
    }
    index.clear();
    targets.0.clear();

    info!("Scene disposed");
    exit.write(AppExit::Success);
}
