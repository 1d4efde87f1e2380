pub mod catalog;
pub mod catalog_loader;
