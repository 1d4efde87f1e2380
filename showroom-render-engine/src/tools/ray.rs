use bevy::prelude::*;

/// Distance along the ray to an oriented box centred on the transform, if
/// hit. The ray is moved into box-local space and slab-tested there, so
/// rotated and scaled containers work unchanged.
pub fn ray_hits_obb(
    origin: Vec3,
    dir: Vec3,
    xf: &GlobalTransform,
    half_extents: Vec3,
) -> Option<f32> {
    let inv = xf.compute_matrix().inverse();
    let local_origin = inv.transform_point3(origin);
    let local_dir = inv.transform_vector3(dir);
    ray_aabb_hit_t(local_origin, local_dir, -half_extents, half_extents)
}

/// Slab-method ray/AABB test returning the nearest non-negative hit
/// distance, or the exit distance when the origin is inside the box.
pub fn ray_aabb_hit_t(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        if d.abs() < f32::EPSILON {
            // Parallel ray: hit only possible if already between the slabs.
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }

        let mut t0 = (min[axis] - o) / d;
        let mut t1 = (max[axis] - o) / d;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }

    if t_far < 0.0 {
        return None;
    }
    Some(if t_near >= 0.0 { t_near } else { t_far })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF: Vec3 = Vec3::new(1.0, 1.0, 1.0);

    #[test]
    fn straight_on_hit_reports_entry_distance() {
        let t = ray_aabb_hit_t(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, -HALF, HALF);
        assert_eq!(t, Some(4.0));
    }

    #[test]
    fn offset_ray_misses() {
        let t = ray_aabb_hit_t(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z, -HALF, HALF);
        assert_eq!(t, None);
    }

    #[test]
    fn box_behind_the_origin_is_not_hit() {
        let t = ray_aabb_hit_t(Vec3::new(0.0, 0.0, 5.0), Vec3::Z, -HALF, HALF);
        assert_eq!(t, None);
    }

    #[test]
    fn origin_inside_reports_exit_distance() {
        let t = ray_aabb_hit_t(Vec3::ZERO, Vec3::NEG_Z, -HALF, HALF);
        assert_eq!(t, Some(1.0));
    }

    #[test]
    fn parallel_ray_outside_the_slab_misses() {
        let t = ray_aabb_hit_t(Vec3::new(0.0, 2.0, 5.0), Vec3::NEG_Z, -HALF, HALF);
        assert_eq!(t, None);
    }

    #[test]
    fn rotated_container_is_hit_through_its_transform() {
        // Box yawed 45 degrees: its corner reaches out along +Z.
        let xf = GlobalTransform::from(
            Transform::from_xyz(0.0, 0.0, 0.0)
                .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4)),
        );
        let t = ray_hits_obb(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, &xf, HALF);
        let t = t.expect("rotated box should be hit");
        assert!(t < 4.0, "corner-on entry is closer than the axis-aligned face");
    }
}
