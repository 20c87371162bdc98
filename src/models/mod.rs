pub mod ec_level;
pub mod matrix;
pub mod point;
pub mod rect;
pub mod shape;

pub use ec_level::EcLevel;
pub use matrix::BitMatrix;
pub use point::{Point, Size};
pub use rect::Rect;
pub use shape::{CornerArc, FillRule, Path, PathCommand, Shape};
