//! Host viewport sizing.
//!
//! The visualization is sized from the host's content box in logical pixels.
//! The drawing buffer is that box multiplied by the pixel ratio, which is the
//! window scale factor clamped to a configured maximum.

/// Minimum surface dimension (prevents zero-size panics).
pub const MIN_SURFACE_DIMENSION: u32 = 1;

/// Pixel dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height. Zero height is treated as one pixel.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(MIN_SURFACE_DIMENSION) as f32
    }
}

/// Produced when the content box or pixel ratio actually changed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportResizeEvent {
    /// Content box in logical pixels.
    pub logical: PixelSize,
    /// Drawing buffer in physical pixels.
    pub drawing_buffer: PixelSize,
    pub pixel_ratio: f64,
}

/// Tracks the host content box and derives the drawing-buffer size.
///
/// Repeated resizes to the same dimensions produce no event and change nothing.
#[derive(Clone, Debug)]
pub struct Viewport {
    logical: PixelSize,
    scale_factor: f64,
    max_pixel_ratio: f64,
}

impl Viewport {
    /// Returns `None` for a zero-sized host; there is nothing to attach to.
    pub fn new(
        logical_width: u32,
        logical_height: u32,
        scale_factor: f64,
        max_pixel_ratio: f64,
    ) -> Option<Self> {
        if logical_width == 0 || logical_height == 0 {
            return None;
        }
        Some(Self {
            logical: PixelSize::new(logical_width, logical_height),
            scale_factor,
            max_pixel_ratio,
        })
    }

    /// Convert a physical window size to logical content-box pixels.
    pub fn logical_from_physical(width: u32, height: u32, scale_factor: f64) -> PixelSize {
        PixelSize::new(
            (width as f64 / scale_factor).round() as u32,
            (height as f64 / scale_factor).round() as u32,
        )
    }

    /// Handle a content-box change. Zero dimensions are clamped to one pixel.
    pub fn handle_resize(
        &mut self,
        logical_width: u32,
        logical_height: u32,
    ) -> Option<ViewportResizeEvent> {
        let next = PixelSize::new(
            logical_width.max(MIN_SURFACE_DIMENSION),
            logical_height.max(MIN_SURFACE_DIMENSION),
        );
        if next == self.logical {
            return None;
        }
        self.logical = next;
        Some(self.event())
    }

    /// Handle a display scale change (window moved between monitors).
    pub fn handle_scale_factor_changed(
        &mut self,
        scale_factor: f64,
    ) -> Option<ViewportResizeEvent> {
        let before = self.pixel_ratio();
        self.scale_factor = scale_factor;
        if (self.pixel_ratio() - before).abs() < f64::EPSILON {
            return None;
        }
        Some(self.event())
    }

    fn event(&self) -> ViewportResizeEvent {
        ViewportResizeEvent {
            logical: self.logical,
            drawing_buffer: self.drawing_buffer_size(),
            pixel_ratio: self.pixel_ratio(),
        }
    }

    /// Content box in logical pixels.
    pub fn logical_size(&self) -> PixelSize {
        self.logical
    }

    /// Scale factor clamped to the configured maximum.
    pub fn pixel_ratio(&self) -> f64 {
        self.scale_factor.min(self.max_pixel_ratio).max(f64::MIN_POSITIVE)
    }

    /// Drawing-buffer size: content box times pixel ratio.
    pub fn drawing_buffer_size(&self) -> PixelSize {
        let ratio = self.pixel_ratio();
        PixelSize::new(
            ((self.logical.width as f64 * ratio).round() as u32).max(MIN_SURFACE_DIMENSION),
            ((self.logical.height as f64 * ratio).round() as u32).max(MIN_SURFACE_DIMENSION),
        )
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.logical.aspect_ratio()
    }
}
