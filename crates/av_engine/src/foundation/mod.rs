//! Foundation utilities: math, value types, timing, and logging

pub mod color;
pub mod logging;
pub mod math;
pub mod pose;
pub mod time;

pub use color::Color;
pub use pose::{Lens, Pose, Viewpoint};
