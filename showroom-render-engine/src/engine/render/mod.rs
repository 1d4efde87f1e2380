pub mod outline_postprocessing;
