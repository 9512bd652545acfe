//! Shape category catalog.

pub mod model;

pub use model::ShapeCategory;
