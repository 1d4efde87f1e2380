pub mod movement;
pub mod path;
pub mod quality;
pub mod world;
