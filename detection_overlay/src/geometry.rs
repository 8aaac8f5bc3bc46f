use crate::prediction::BoundingBox;

/// Measured pixel size of the rendered image. Only constructible from a
/// real measurement: degenerate or non-finite dimensions are rejected, so a
/// `DisplaySize` in hand is always safe to scale against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    width: f32,
    height: f32,
}

impl DisplaySize {
    pub fn new(width: f32, height: f32) -> Option<Self> {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            Some(Self { width, height })
        } else {
            None
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }
}

/// An absolute-positioned overlay rectangle in display pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Scales a relative bounding box against the measured display size. An
/// unmeasured display produces no rectangle, never one pinned at 0,0.
pub fn project(bbox: &BoundingBox, display: Option<DisplaySize>) -> Option<PixelRect> {
    let display = display?;
    Some(PixelRect {
        left: bbox.left * display.width,
        top: bbox.top * display.height,
        width: bbox.width * display.width,
        height: bbox.height * display.height,
    })
}
