/// Well-known relative path of the runtime-fetched catalog document.
pub const RELATIVE_CATALOG_PATH: &str = "catalog/showroom.json";

/// Tiling texture applied to the floor plane.
pub const GROUND_TEXTURE_PATH: &str = "textures/lot_asphalt.png";
