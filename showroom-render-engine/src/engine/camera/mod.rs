pub mod first_person;

pub use first_person::{ReducedMotion, ViewerRig};
