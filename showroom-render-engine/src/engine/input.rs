use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

/// Raw pointer and key state for the current frame. Knows nothing about 3D.
/// The accumulated pointer delta is consumed (and zeroed) by the look
/// handler in the same frame it was sampled.
#[derive(Resource, Default)]
pub struct InputSampler {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
    pub pointer_delta: Vec2,
    pub pointer_locked: bool,
    /// True only on the frame whose click engaged the lock. That click
    /// still carries real cursor coordinates; only later clicks are
    /// centre-locked.
    pub just_locked: bool,
}

impl InputSampler {
    /// Take the accumulated pointer delta, leaving zero behind.
    pub fn take_pointer_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.pointer_delta)
    }
}

pub fn sample_keyboard(keyboard: Res<ButtonInput<KeyCode>>, mut sampler: ResMut<InputSampler>) {
    sampler.forward = keyboard.pressed(KeyCode::KeyW);
    sampler.backward = keyboard.pressed(KeyCode::KeyS);
    sampler.left = keyboard.pressed(KeyCode::KeyA);
    sampler.right = keyboard.pressed(KeyCode::KeyD);
    sampler.sprint = keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
}

/// Accumulate relative pointer motion, but only while pointer lock is
/// engaged; unlocked motion is discarded.
pub fn sample_pointer(mut motion: EventReader<MouseMotion>, mut sampler: ResMut<InputSampler>) {
    if sampler.pointer_locked {
        sampler.pointer_delta += motion.read().map(|m| m.delta).sum::<Vec2>();
    } else {
        motion.clear();
    }
}

/// Request pointer lock on a click inside the scene window.
pub fn grab_pointer_on_click(
    buttons: Res<ButtonInput<MouseButton>>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut sampler: ResMut<InputSampler>,
) {
    sampler.just_locked = false;
    if sampler.pointer_locked || !buttons.just_pressed(MouseButton::Left) {
        return;
    }
    let Ok(mut window) = windows.single_mut() else {
        return;
    };

    window.cursor_options.grab_mode = CursorGrabMode::Locked;
    window.cursor_options.visible = false;
    sampler.pointer_locked = true;
    sampler.just_locked = true;
}

/// Release pointer lock on Escape. Escape never touches the selection;
/// deselection is a separate explicit action from the UI layer.
pub fn release_pointer_on_escape(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut sampler: ResMut<InputSampler>,
) {
    if !sampler.pointer_locked || !keyboard.just_pressed(KeyCode::Escape) {
        return;
    }
    let Ok(mut window) = windows.single_mut() else {
        return;
    };

    window.cursor_options.grab_mode = CursorGrabMode::None;
    window.cursor_options.visible = true;
    sampler.pointer_locked = false;
}
