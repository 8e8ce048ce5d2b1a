#![forbid(unsafe_code)]

//! Typed coordinate spaces.
//!
//! Canvas space grows downward from the top-left corner of the drawing surface; world space is the
//! 3D room (Y up, floor at `y = 0`). Rack units stay plain `f64` until projected into one of them.

/// 2D canvas pixels, Y down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSpace;

/// 3D room coordinates, Y up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldSpace;

pub type CanvasRect = euclid::Rect<f64, CanvasSpace>;
pub type WorldPoint = euclid::Point3D<f64, WorldSpace>;
pub type WorldVector = euclid::Vector3D<f64, WorldSpace>;
pub type WorldBox = euclid::Box3D<f64, WorldSpace>;

pub fn canvas_rect(x: f64, y: f64, width: f64, height: f64) -> CanvasRect {
    euclid::rect(x, y, width, height)
}

pub fn world_point(x: f64, y: f64, z: f64) -> WorldPoint {
    euclid::point3(x, y, z)
}

pub fn world_vector(x: f64, y: f64, z: f64) -> WorldVector {
    euclid::vec3(x, y, z)
}
