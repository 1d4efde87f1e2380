use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use bevy::window::ExitCondition;
use bevy_common_assets::json::JsonAssetPlugin;

use crate::engine::assets::catalog::CarCatalog;
use crate::engine::assets::catalog_loader::{CatalogLoader, settle_catalog, start_catalog_fetch};
use crate::engine::camera::ReducedMotion;
use crate::engine::camera::first_person::{apply_look, spawn_viewer_rig, update_movement};
use crate::engine::core::app_state::{
    AppState, dispose_scene, request_dispose, transition_to_running,
};
use crate::engine::core::frame::{FrameStep, begin_frame};
use crate::engine::core::window_config::create_window_config;
use crate::engine::input::{
    InputSampler, grab_pointer_on_click, release_pointer_on_escape, sample_keyboard,
    sample_pointer,
};
use crate::engine::loading::progress::{LoadingProgress, publish_progress};
use crate::engine::quality::{
    ActiveQuality, QualityTierChanged, apply_quality, quality_keyboard_shortcuts,
};
use crate::engine::render::outline_postprocessing::OutlinePostProcessPlugin;
use crate::engine::scene::spawn_showroom_floor;
use crate::engine::streaming::{
    ContainerIndex, poll_model_loads, spawn_car_containers, streaming_tick,
};
use crate::rpc::web_rpc::WebRpcPlugin;
use crate::tools::selection::{
    DeselectRequested, HighlightTargets, SelectionChanged, SelectionState, handle_car_click,
    handle_deselect, sync_highlight_targets, update_outline_uniforms,
};

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .init_state::<AppState>()
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        // Registers CarCatalog as a loadable asset type from JSON files.
        .add_plugins(JsonAssetPlugin::<CarCatalog>::new(&["json"]))
        .add_plugins(OutlinePostProcessPlugin)
        .add_plugins(WebRpcPlugin);

    app.init_resource::<FrameStep>()
        .init_resource::<InputSampler>()
        .init_resource::<ReducedMotion>()
        .init_resource::<CatalogLoader>()
        .init_resource::<LoadingProgress>()
        .init_resource::<ContainerIndex>()
        .init_resource::<SelectionState>()
        .init_resource::<HighlightTargets>()
        .init_resource::<ActiveQuality>()
        .add_event::<SelectionChanged>()
        .add_event::<DeselectRequested>()
        .add_event::<QualityTierChanged>();

    app.add_systems(
        Startup,
        (spawn_showroom_floor, spawn_viewer_rig, start_catalog_fetch),
    )
    .add_systems(
        Update,
        (settle_catalog, spawn_car_containers, transition_to_running)
            .chain()
            .run_if(in_state(AppState::Loading)),
    );

    // The interactive frame: input, movement, streaming, selection and
    // quality run in a fixed order so each stage sees the stage before it.
    app.add_systems(
        Update,
        (
            begin_frame,
            sample_keyboard,
            sample_pointer,
            grab_pointer_on_click,
            release_pointer_on_escape,
            apply_look,
            update_movement,
            streaming_tick,
            poll_model_loads,
            publish_progress,
            handle_car_click,
            handle_deselect,
            quality_keyboard_shortcuts,
            apply_quality,
            sync_highlight_targets,
            update_outline_uniforms,
        )
            .chain()
            .run_if(in_state(AppState::Running)),
    );

    app.add_systems(Update, request_dispose)
        .add_systems(OnEnter(AppState::Disposed), dispose_scene);

    app
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        // The dispose path owns app exit; closing the window only requests it.
        exit_condition: ExitCondition::DontExit,
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}
