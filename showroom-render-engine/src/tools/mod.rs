/// Ray intersection utilities for container hit-testing.
///
/// Slab method raycast against transformed AABBs in container-local space.
pub mod ray;

/// Pointer-click selection pipeline and highlight synchronisation.
pub mod selection;
