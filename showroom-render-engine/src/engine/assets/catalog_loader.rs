use bevy::asset::LoadState;
use bevy::prelude::*;

use constants::path::RELATIVE_CATALOG_PATH;

use super::catalog::{CarCatalog, CarSlot, CatalogSnapshot, build_catalog, builtin_slots};
use crate::engine::loading::progress::LoadingProgress;

/// Tracks the single runtime catalog fetch.
#[derive(Resource, Default)]
pub struct CatalogLoader {
    handle: Option<Handle<CarCatalog>>,
    settled: bool,
}

pub fn start_catalog_fetch(mut loader: ResMut<CatalogLoader>, asset_server: Res<AssetServer>) {
    loader.handle = Some(asset_server.load(RELATIVE_CATALOG_PATH));
}

/// Resolve the catalog fetch: merge on success, degrade to the built-in lot
/// on failure. Either way the snapshot is built exactly once and the
/// progress denominator is fixed from here on.
pub fn settle_catalog(
    mut loader: ResMut<CatalogLoader>,
    mut progress: ResMut<LoadingProgress>,
    asset_server: Res<AssetServer>,
    catalogs: Res<Assets<CarCatalog>>,
    mut commands: Commands,
) {
    if loader.settled {
        return;
    }
    let Some(handle) = loader.handle.clone() else {
        return;
    };

    let dynamic: Vec<CarSlot> = if let Some(catalog) = catalogs.get(&handle) {
        catalog.cars.iter().cloned().map(CarSlot::from).collect()
    } else {
        match asset_server.get_load_state(handle.id()) {
            Some(LoadState::Failed(err)) => {
                warn!("Catalog fetch failed, rendering built-in lot only: {err}");
                Vec::new()
            }
            // Still in flight.
            _ => return,
        }
    };

    let snapshot = build_catalog(builtin_slots(), dynamic);
    info!("Catalog settled with {} car slots", snapshot.len());
    progress.begin(snapshot.len());
    commands.insert_resource(snapshot);
    loader.settled = true;
}
