//! Direct manipulation: hit testing, move with alignment snapping, anchor-preserving resize.

pub mod engine;
pub mod handle;
pub mod hit;
pub mod snap;

pub use engine::{CursorHint, Gesture, ManipulationEngine};
pub use handle::Handle;
pub use hit::{HitTarget, hit_test};
pub use snap::{Guide, GuideAxis};
