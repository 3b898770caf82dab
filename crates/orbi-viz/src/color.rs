//! Packed hex colors to linear RGB.

/// Decode `0xRRGGBB` into linear RGB in [0, 1].
///
/// Hex colors are authored in sRGB; the render target is an sRGB surface, so
/// shading happens in linear space.
pub fn hex_to_linear(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    [channel(16), channel(8), channel(0)]
}

/// Standard sRGB electro-optical transfer function.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
