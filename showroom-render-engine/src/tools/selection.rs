use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use constants::world::CAR_HALF_EXTENTS;

use super::ray::ray_hits_obb;
use crate::engine::input::InputSampler;
use crate::engine::render::outline_postprocessing::OutlineSettings;
use crate::engine::streaming::{CarInstance, ContainerIndex};
use crate::rpc::web_rpc::WebRpcInterface;

/// The single currently selected car id, if any. Mutated only by a
/// successful raycast hit and by the explicit deselect action; a missed
/// click changes nothing.
#[derive(Resource, Default)]
pub struct SelectionState {
    pub selected: Option<String>,
}

/// Value notification mirrored to the UI layer on every change.
#[derive(Event, Clone)]
pub struct SelectionChanged(pub Option<String>);

/// Explicit deselect request from the UI layer.
#[derive(Event)]
pub struct DeselectRequested;

/// Outline targets: zero or one container entities (single selection only).
#[derive(Resource, Default)]
pub struct HighlightTargets(pub Vec<Entity>);

/// One attached container in hit-test form.
pub struct HitCandidate {
    pub entity: Entity,
    pub transform: GlobalTransform,
    pub half_extents: Vec3,
}

/// Raycast a left click against every attached container and resolve the
/// nearest hit to its slot id through the container index. Instances still
/// streaming in are not hit-testable; nothing of theirs is visible yet.
pub fn handle_car_click(
    buttons: Res<ButtonInput<MouseButton>>,
    sampler: Res<InputSampler>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    containers: Query<(Entity, &GlobalTransform, &CarInstance)>,
    index: Res<ContainerIndex>,
    mut selection: ResMut<SelectionState>,
    mut changed: EventWriter<SelectionChanged>,
    mut rpc: ResMut<WebRpcInterface>,
) {
    if !buttons.just_pressed(MouseButton::Left) {
        return;
    }
    let Ok(window) = windows.single() else {
        return;
    };
    let Ok((camera, cam_xf)) = cameras.single() else {
        return;
    };

    // While pointer-locked the cursor is captured; rays go through centre.
    // The click that engaged the lock this frame still has a real cursor
    // position and uses it.
    let point = if use_window_center(sampler.pointer_locked, sampler.just_locked) {
        Vec2::new(window.width() * 0.5, window.height() * 0.5)
    } else {
        let Some(cursor) = window.cursor_position() else {
            return;
        };
        cursor
    };

    let Ok(ray) = camera.viewport_to_world(cam_xf, point) else {
        return;
    };

    let candidates: Vec<HitCandidate> = containers
        .iter()
        .filter(|(_, _, instance)| instance.attached)
        .map(|(entity, xf, instance)| HitCandidate {
            entity,
            transform: *xf,
            half_extents: CAR_HALF_EXTENTS * instance.slot.target_scale,
        })
        .collect();

    let Some(hit) = pick_nearest(ray.origin, ray.direction.as_vec3(), &candidates) else {
        // Click-through: a miss never deselects.
        return;
    };
    let Some(id) = index.resolve(hit) else {
        return;
    };
    if selection.selected.as_deref() == Some(id) {
        return;
    }

    selection.selected = Some(id.to_string());
    info!("Selected car '{id}'");
    notify_selection(&selection, &mut changed, &mut rpc);
}

/// Centre-ray substitution applies only once the lock predates the click.
pub fn use_window_center(pointer_locked: bool, just_locked: bool) -> bool {
    pointer_locked && !just_locked
}

/// Nearest positive ray hit among the candidates.
pub fn pick_nearest(origin: Vec3, dir: Vec3, candidates: &[HitCandidate]) -> Option<Entity> {
    let mut best: Option<(Entity, f32)> = None;
    for candidate in candidates {
        if let Some(t) = ray_hits_obb(origin, dir, &candidate.transform, candidate.half_extents) {
            if t > 0.0 && best.is_none_or(|(_, best_t)| t < best_t) {
                best = Some((candidate.entity, t));
            }
        }
    }
    best.map(|(entity, _)| entity)
}

pub fn handle_deselect(
    mut requests: EventReader<DeselectRequested>,
    mut selection: ResMut<SelectionState>,
    mut changed: EventWriter<SelectionChanged>,
    mut rpc: ResMut<WebRpcInterface>,
) {
    if requests.read().next().is_none() {
        return;
    }
    if selection.selected.is_none() {
        return;
    }
    selection.selected = None;
    notify_selection(&selection, &mut changed, &mut rpc);
}

fn notify_selection(
    selection: &SelectionState,
    changed: &mut EventWriter<SelectionChanged>,
    rpc: &mut WebRpcInterface,
) {
    changed.write(SelectionChanged(selection.selected.clone()));
    rpc.send_notification(
        "selection_changed",
        serde_json::json!({ "id": selection.selected }),
    );
}

/// Keep the outline target list synced to the selection. An instance that
/// is missing or not attached yields an empty list (teardown race) — a
/// defensive no-op, not an error.
pub fn sync_highlight_targets(
    selection: Res<SelectionState>,
    containers: Query<(Entity, &CarInstance)>,
    mut targets: ResMut<HighlightTargets>,
) {
    let next = selection.selected.as_deref().and_then(|id| {
        containers
            .iter()
            .find(|(_, instance)| instance.slot.id == id && instance.attached)
            .map(|(entity, _)| entity)
    });
    targets.0 = next.into_iter().collect();
}

/// Project the highlighted container's box to a screen-space focus rect
/// for the outline pass. Cheap per-frame re-check; no raycast involved.
pub fn update_outline_uniforms(
    targets: Res<HighlightTargets>,
    containers: Query<(&GlobalTransform, &CarInstance)>,
    mut cameras: Query<(&Camera, &GlobalTransform, &mut OutlineSettings), With<Camera3d>>,
) {
    let Ok((camera, cam_xf, mut outline)) = cameras.single_mut() else {
        return;
    };

    let Some(&target) = targets.0.first() else {
        outline.enabled = 0.0;
        return;
    };
    let Ok((xf, instance)) = containers.get(target) else {
        outline.enabled = 0.0;
        return;
    };

    let half = CAR_HALF_EXTENTS * instance.slot.target_scale;
    let projected: Vec<Vec3> = box_corners(half)
        .iter()
        .filter_map(|corner| camera.world_to_ndc(cam_xf, xf.transform_point(*corner)))
        .collect();

    let Some((min, max)) = focus_rect(&projected) else {
        outline.enabled = 0.0;
        return;
    };

    // Small margin so the glow is not clipped at the silhouette.
    let margin = Vec2::splat(0.01);
    outline.focus_min = (min - margin).clamp(Vec2::ZERO, Vec2::ONE);
    outline.focus_max = (max + margin).clamp(Vec2::ZERO, Vec2::ONE);
    outline.enabled = 1.0;
}

/// UV-space bounds of the on-screen corners. Corners whose NDC depth falls
/// outside [0, 1] are behind the near plane and project to mirrored
/// coordinates; folding them in would blow the rect up, so they are
/// skipped. All corners off screen means no rect.
fn focus_rect(ndc_corners: &[Vec3]) -> Option<(Vec2, Vec2)> {
    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    let mut visible = 0;

    for ndc in ndc_corners {
        if !(0.0..=1.0).contains(&ndc.z) {
            continue;
        }
        // NDC y points up; UV y points down.
        let uv = Vec2::new((ndc.x + 1.0) * 0.5, (1.0 - ndc.y) * 0.5);
        min = min.min(uv);
        max = max.max(uv);
        visible += 1;
    }

    (visible > 0).then_some((min, max))
}

fn box_corners(half: Vec3) -> [Vec3; 8] {
    [
        Vec3::new(-half.x, 0.0, -half.z),
        Vec3::new(half.x, 0.0, -half.z),
        Vec3::new(-half.x, 0.0, half.z),
        Vec3::new(half.x, 0.0, half.z),
        Vec3::new(-half.x, half.y * 2.0, -half.z),
        Vec3::new(half.x, half.y * 2.0, -half.z),
        Vec3::new(-half.x, half.y * 2.0, half.z),
        Vec3::new(half.x, half.y * 2.0, half.z),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::streaming::ContainerIndex;

    fn candidate(entity: Entity, z: f32, scale: f32) -> HitCandidate {
        HitCandidate {
            entity,
            transform: GlobalTransform::from(Transform::from_xyz(0.0, 0.0, z)),
            half_extents: CAR_HALF_EXTENTS * scale,
        }
    }

    #[test]
    fn nearest_of_two_overlapping_candidates_wins() {
        let near = Entity::from_raw(1);
        let far = Entity::from_raw(2);
        let candidates = vec![candidate(far, -20.0, 1.0), candidate(near, -10.0, 1.0)];

        let hit = pick_nearest(Vec3::new(0.0, 0.0, 0.0), Vec3::NEG_Z, &candidates);
        assert_eq!(hit, Some(near));
    }

    #[test]
    fn a_miss_yields_no_hit() {
        let candidates = vec![candidate(Entity::from_raw(1), -10.0, 1.0)];
        let hit = pick_nearest(Vec3::new(50.0, 0.0, 0.0), Vec3::NEG_Z, &candidates);
        assert_eq!(hit, None);
    }

    #[test]
    fn empty_candidate_set_yields_no_hit() {
        assert_eq!(pick_nearest(Vec3::ZERO, Vec3::NEG_Z, &[]), None);
    }

    #[test]
    fn lock_engaging_click_keeps_its_cursor_coordinates() {
        // The click that grabs the pointer is still a real aimed click;
        // only clicks made under a pre-existing lock go through centre.
        assert!(!use_window_center(true, true));
        assert!(use_window_center(true, false));
        assert!(!use_window_center(false, false));
    }

    #[test]
    fn corners_behind_the_near_plane_do_not_inflate_the_focus_rect() {
        let on_screen = [
            Vec3::new(-0.2, -0.2, 0.5),
            Vec3::new(0.2, 0.2, 0.5),
            // Mirrored projection of a corner behind the viewer.
            Vec3::new(-8.0, 6.0, 1.7),
        ];
        let (min, max) = focus_rect(&on_screen).expect("two corners are on screen");
        assert!(min.x >= 0.0 && min.y >= 0.0);
        assert!(max.x <= 1.0 && max.y <= 1.0);
    }

    #[test]
    fn fully_behind_boxes_yield_no_focus_rect() {
        let behind = [Vec3::new(-8.0, 6.0, 1.7), Vec3::new(9.0, -4.0, -0.3)];
        assert_eq!(focus_rect(&behind), None);
    }

    #[test]
    fn placeholder_only_instance_still_resolves_to_its_slot_id() {
        // Hit resolution goes through the container index; whether the
        // model or a placeholder hangs under the container is irrelevant.
        let container = Entity::from_raw(3);
        let mut index = ContainerIndex::default();
        index.insert(container, "hatchback".to_string());

        let candidates = vec![candidate(container, -8.0, 0.9)];
        let hit = pick_nearest(Vec3::new(0.0, 0.4, 0.0), Vec3::NEG_Z, &candidates)
            .expect("placeholder box should be hit");
        assert_eq!(index.resolve(hit), Some("hatchback"));
    }
}
