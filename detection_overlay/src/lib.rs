pub mod geometry;
pub mod prediction;
pub mod session;
pub mod sorting;
pub mod uploader;
