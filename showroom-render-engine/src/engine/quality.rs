use bevy::image::{ImageAddressMode, ImageSampler, ImageSamplerDescriptor};
use bevy::pbr::DirectionalLightShadowMap;
use bevy::prelude::*;

use constants::quality::{DEVICE_MAX_ANISOTROPY, QualityTier, settings_for};

use crate::engine::render::outline_postprocessing::OutlineSettings;
use crate::engine::scene::GroundTexture;

/// Tier currently applied to the renderer.
#[derive(Resource)]
pub struct ActiveQuality {
    pub tier: QualityTier,
    /// Ground-sampler anisotropy still owed to the image asset. Set on
    /// every tier change (and at startup for the default tier) and kept
    /// until the texture exists to take it, so a switch that lands before
    /// the texture settles is completed instead of half-applied.
    pub pending_anisotropy: Option<u16>,
}

impl Default for ActiveQuality {
    fn default() -> Self {
        Self {
            tier: QualityTier::High,
            pending_anisotropy: Some(anisotropy_for(
                settings_for(QualityTier::High).anisotropy_multiplier,
            )),
        }
    }
}

/// UI-requested tier change.
#[derive(Event, Clone, Copy)]
pub struct QualityTierChanged(pub QualityTier);

/// Apply the whole settings bag: shadow-map resolution (the shadow atlas is
/// rebuilt at the new size on the next frame), the outline uniforms, and
/// floor anisotropy, the last deferred until the texture asset exists. The
/// scene stays up throughout.
pub fn apply_quality(
    mut events: EventReader<QualityTierChanged>,
    mut active: ResMut<ActiveQuality>,
    ground: Option<Res<GroundTexture>>,
    mut images: ResMut<Assets<Image>>,
    mut outlines: Query<&mut OutlineSettings>,
    mut commands: Commands,
) {
    // Only the last requested tier matters.
    if let Some(&QualityTierChanged(tier)) = events.read().last() {
        let settings = settings_for(tier);

        commands.insert_resource(DirectionalLightShadowMap {
            size: settings.shadow_map_size,
        });

        for mut outline in &mut outlines {
            outline.edge_strength = settings.outline_edge_strength;
            outline.edge_glow = settings.outline_edge_glow;
        }

        active.tier = tier;
        active.pending_anisotropy = Some(anisotropy_for(settings.anisotropy_multiplier));
        info!("Applied quality tier {}", tier.to_string());
    }

    // The anisotropy leg waits for the ground texture to exist; the bag is
    // only complete once this lands.
    reconcile_ground_sampler(&mut active, ground.as_deref(), &mut images);
}

/// Write the owed anisotropy into the ground image sampler once the asset
/// is actually present. Runs every frame; a no-op when nothing is owed.
pub fn reconcile_ground_sampler(
    active: &mut ActiveQuality,
    ground: Option<&GroundTexture>,
    images: &mut Assets<Image>,
) {
    let Some(anisotropy) = active.pending_anisotropy else {
        return;
    };
    let Some(image) = ground.and_then(|ground| images.get_mut(&ground.0)) else {
        return;
    };

    image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
        address_mode_u: ImageAddressMode::Repeat,
        address_mode_v: ImageAddressMode::Repeat,
        anisotropy_clamp: anisotropy,
        ..ImageSamplerDescriptor::linear()
    });
    active.pending_anisotropy = None;
}

/// Effective sampler anisotropy for a tier multiplier, never below 1.
pub fn anisotropy_for(multiplier: f32) -> u16 {
    ((DEVICE_MAX_ANISOTROPY as f32 * multiplier) as u16).max(1)
}

/// Native convenience shortcuts beside the RPC surface.
#[cfg(not(target_arch = "wasm32"))]
pub fn quality_keyboard_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut events: EventWriter<QualityTierChanged>,
) {
    if keyboard.just_pressed(KeyCode::KeyH) {
        events.write(QualityTierChanged(QualityTier::High));
    }
    if keyboard.just_pressed(KeyCode::KeyL) {
        events.write(QualityTierChanged(QualityTier::Low));
    }
}

/// Tier selection is RPC-only in the browser.
#[cfg(target_arch = "wasm32")]
pub fn quality_keyboard_shortcuts() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anisotropy_scales_from_the_device_ceiling() {
        assert_eq!(anisotropy_for(1.0), DEVICE_MAX_ANISOTROPY);
        assert_eq!(anisotropy_for(0.25), DEVICE_MAX_ANISOTROPY / 4);
    }

    #[test]
    fn anisotropy_never_drops_below_one() {
        assert_eq!(anisotropy_for(0.0), 1);
    }

    fn sampler_anisotropy(images: &Assets<Image>, handle: &Handle<Image>) -> Option<u16> {
        match &images.get(handle)?.sampler {
            ImageSampler::Descriptor(descriptor) => Some(descriptor.anisotropy_clamp),
            ImageSampler::Default => None,
        }
    }

    #[test]
    fn tier_switch_before_the_texture_loads_is_completed_later() {
        let mut images = Assets::<Image>::default();
        let handle: Handle<Image> = Handle::default();
        let ground = GroundTexture(handle);
        let mut active = ActiveQuality {
            tier: QualityTier::Low,
            pending_anisotropy: Some(anisotropy_for(
                settings_for(QualityTier::Low).anisotropy_multiplier,
            )),
        };

        // Texture still in flight: the owed write stays pending.
        reconcile_ground_sampler(&mut active, Some(&ground), &mut images);
        assert!(active.pending_anisotropy.is_some());

        // Texture settles; the next pass completes the bag.
        let handle = images.add(Image::default());
        let ground = GroundTexture(handle.clone());
        reconcile_ground_sampler(&mut active, Some(&ground), &mut images);
        assert_eq!(active.pending_anisotropy, None);
        assert_eq!(
            sampler_anisotropy(&images, &handle),
            Some(DEVICE_MAX_ANISOTROPY / 4)
        );
    }

    #[test]
    fn nothing_owed_leaves_the_sampler_alone() {
        let mut images = Assets::<Image>::default();
        let handle = images.add(Image::default());
        let ground = GroundTexture(handle.clone());
        let mut active = ActiveQuality {
            tier: QualityTier::High,
            pending_anisotropy: None,
        };

        reconcile_ground_sampler(&mut active, Some(&ground), &mut images);
        assert_eq!(sampler_anisotropy(&images, &handle), None);
    }

    #[test]
    fn default_tier_owes_its_anisotropy_to_the_first_loaded_texture() {
        let active = ActiveQuality::default();
        assert_eq!(active.pending_anisotropy, Some(DEVICE_MAX_ANISOTROPY));
    }
}
