//! Part/mobility annotation entities.

pub mod filter;
pub mod motion;
pub mod part;
pub mod record;

pub use filter::{AnnotationFilter, CategoryFilter, FlagFilter};
pub use motion::{AttachedPart, JointAxis, JointData, JointKind, JointLimit, MotionNode};
pub use part::PartNode;
pub use record::{AnnotationFlags, AnnotationRecord, MobilityDocument};
