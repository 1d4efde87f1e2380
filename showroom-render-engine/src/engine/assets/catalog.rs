use bevy::prelude::*;
use serde::Deserialize;

/// One display position in the lot. Immutable once the catalog is built.
#[derive(Debug, Clone, PartialEq)]
pub struct CarSlot {
    pub id: String,
    pub name: String,
    pub model_path: String,
    pub position: Vec3,
    /// Euler rotation of the container, radians.
    pub rotation: Vec3,
    pub target_scale: f32,
}

/// Runtime-fetched catalog document:
/// `{ "cars": [ { id, name, modelPath, position, rotation, targetScale } ] }`.
#[derive(Deserialize, Asset, TypePath, Clone)]
pub struct CarCatalog {
    pub cars: Vec<CatalogEntry>,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub model_path: String,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub target_scale: f32,
}

impl From<CatalogEntry> for CarSlot {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            model_path: entry.model_path,
            position: Vec3::from_array(entry.position),
            rotation: Vec3::from_array(entry.rotation),
            target_scale: entry.target_scale,
        }
    }
}

/// Immutable snapshot of every slot in the lot, built exactly once at
/// startup and threaded into the streaming manager.
#[derive(Resource, Debug, Clone)]
pub struct CatalogSnapshot {
    slots: Vec<CarSlot>,
}

impl CatalogSnapshot {
    pub fn slots(&self) -> &[CarSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Built-in lot that always renders, independent of the runtime catalog.
pub fn builtin_slots() -> Vec<CarSlot> {
    vec![
        slot("roadster", "Aurora Roadster", "models/roadster.glb", (-8.0, -6.0), 0.5, 1.0),
        slot("coupe", "Vesper Coupe", "models/coupe.glb", (8.0, -6.0), -0.5, 1.0),
        slot("suv", "Torrent SUV", "models/suv.glb", (-8.0, 6.0), 1.1, 1.15),
        slot("hatchback", "Pico Hatchback", "models/hatchback.glb", (8.0, 6.0), -1.1, 0.9),
    ]
}

fn slot(id: &str, name: &str, model_path: &str, (x, z): (f32, f32), yaw: f32, scale: f32) -> CarSlot {
    CarSlot {
        id: id.to_string(),
        name: name.to_string(),
        model_path: model_path.to_string(),
        position: Vec3::new(x, 0.0, z),
        rotation: Vec3::new(0.0, yaw, 0.0),
        target_scale: scale,
    }
}

/// Merge the built-in lot with runtime entries. A colliding id gets a
/// deterministic numeric suffix so both entries stay independently
/// selectable.
pub fn build_catalog(static_slots: Vec<CarSlot>, dynamic_slots: Vec<CarSlot>) -> CatalogSnapshot {
    let mut slots = static_slots;
    for mut dynamic in dynamic_slots {
        if slots.iter().any(|s| s.id == dynamic.id) {
            let renamed = next_free_id(&dynamic.id, &slots);
            warn!("Catalog id '{}' collides, renaming to '{renamed}'", dynamic.id);
            dynamic.id = renamed;
        }
        slots.push(dynamic);
    }
    CatalogSnapshot { slots }
}

fn next_free_id(id: &str, slots: &[CarSlot]) -> String {
    let mut suffix = 1;
    loop {
        let candidate = format!("{id}-{suffix}");
        if !slots.iter().any(|s| s.id == candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic(id: &str) -> CarSlot {
        CarSlot {
            id: id.to_string(),
            name: "Dynamic".to_string(),
            model_path: "models/dynamic.glb".to_string(),
            position: Vec3::new(0.0, 0.0, -12.0),
            rotation: Vec3::ZERO,
            target_scale: 1.0,
        }
    }

    #[test]
    fn collision_renames_dynamic_entry_with_suffix() {
        let snapshot = build_catalog(builtin_slots(), vec![dynamic("roadster")]);
        let ids: Vec<&str> = snapshot.slots().iter().map(|s| s.id.as_str()).collect();
        assert!(ids.contains(&"roadster"));
        assert!(ids.contains(&"roadster-1"));
        assert_eq!(snapshot.len(), builtin_slots().len() + 1);
    }

    #[test]
    fn repeated_collisions_take_the_next_free_suffix() {
        let snapshot = build_catalog(
            builtin_slots(),
            vec![dynamic("coupe"), dynamic("coupe"), dynamic("coupe")],
        );
        let ids: Vec<&str> = snapshot.slots().iter().map(|s| s.id.as_str()).collect();
        assert!(ids.contains(&"coupe"));
        assert!(ids.contains(&"coupe-1"));
        assert!(ids.contains(&"coupe-2"));
        assert!(ids.contains(&"coupe-3"));
    }

    #[test]
    fn non_colliding_ids_are_untouched() {
        let snapshot = build_catalog(builtin_slots(), vec![dynamic("estate")]);
        assert!(snapshot.slots().iter().any(|s| s.id == "estate"));
    }

    #[test]
    fn empty_dynamic_set_keeps_the_builtin_lot() {
        let snapshot = build_catalog(builtin_slots(), Vec::new());
        assert_eq!(snapshot.len(), builtin_slots().len());
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn catalog_entry_converts_camel_case_document() {
        let json = r#"{
            "cars": [{
                "id": "estate",
                "name": "Largo Estate",
                "modelPath": "models/estate.glb",
                "position": [0.0, 0.0, -12.0],
                "rotation": [0.0, 1.57, 0.0],
                "targetScale": 1.2
            }]
        }"#;
        let catalog: CarCatalog = serde_json::from_str(json).expect("parse catalog");
        let slot = CarSlot::from(catalog.cars[0].clone());
        assert_eq!(slot.model_path, "models/estate.glb");
        assert_eq!(slot.target_scale, 1.2);
        assert_eq!(slot.position, Vec3::new(0.0, 0.0, -12.0));
    }
}
