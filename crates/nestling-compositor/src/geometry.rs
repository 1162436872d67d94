//! Geometry sync between host windows and the client's view of them.
//!
//! Host windows are measured in device pixels. The client sees logical
//! units: device pixels divided by the output's integer scale factor.
//! Division rounds half away from zero.

use nestling_common::types::{Point, Rect, Size};

/// Position and size of an output as reported to the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalGeometry {
    pub position: Point,
    pub size: Size,
}

/// Map a window rectangle to the logical geometry published for its output.
pub fn logical_geometry(window: Rect, scale: i32) -> LogicalGeometry {
    LogicalGeometry {
        position: to_logical_point(window.top_left(), scale),
        size: to_logical_size(window.size(), scale),
    }
}

pub fn to_logical_point(point: Point, scale: i32) -> Point {
    let scale = scale.max(1);
    Point::new(div_round(point.x, scale), div_round(point.y, scale))
}

pub fn to_logical_size(size: Size, scale: i32) -> Size {
    let scale = scale.max(1);
    Size::new(div_round(size.width, scale), div_round(size.height, scale))
}

/// Inverse mapping: a client-reported logical point in window device pixels.
pub fn to_window_point(point: Point, scale: i32) -> Point {
    let scale = scale.max(1);
    Point::new(point.x.saturating_mul(scale), point.y.saturating_mul(scale))
}

/// Inverse mapping: a client-reported logical size in window device pixels.
pub fn to_window_size(size: Size, scale: i32) -> Size {
    let scale = scale.max(1);
    Size::new(
        size.width.saturating_mul(scale),
        size.height.saturating_mul(scale),
    )
}

/// Integer scale factor for a device pixel ratio (its integer part, at least 1).
pub fn scale_factor(device_pixel_ratio: f64) -> i32 {
    if !device_pixel_ratio.is_finite() {
        return 1;
    }
    (device_pixel_ratio.trunc() as i32).max(1)
}

/// The rectangle a client surface wants shown: its explicit window geometry
/// when that is valid, otherwise its whole content at the origin.
pub fn client_rect(window_geometry: Option<Rect>, destination_size: Size) -> Rect {
    match window_geometry {
        Some(geometry) if geometry.is_valid() => geometry,
        _ => Rect::from_parts(Point::default(), destination_size),
    }
}

/// Offset for the embedded content so the client's geometry origin lands at
/// the window's (0, 0) regardless of client-side padding.
pub fn content_offset(client: Rect, scale: i32) -> Point {
    -to_window_point(client.top_left(), scale)
}

fn div_round(value: i32, scale: i32) -> i32 {
    (f64::from(value) / f64::from(scale)).round() as i32
}
