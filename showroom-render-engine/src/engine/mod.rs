pub mod assets;
pub mod camera;
pub mod core;
pub mod input;
pub mod loading;
pub mod quality;
pub mod render;
pub mod scene;
pub mod streaming;
