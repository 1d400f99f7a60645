//! Pixel-level building blocks shared by the surface and the rasterizers
//!
//! Packed pixel formats, the depth buffer, blending and the polygon stipple
//! mask live here; none of them know about primitives.

pub mod blend;
pub mod color;
pub mod stipple;
pub mod zbuffer;

pub use blend::{BlendEquation, BlendFactor, BlendState};
pub use color::{ColorOps, PixelFormat, PixelMode, Rgb24, Rgb565, Xrgb8888};
pub use stipple::StipplePattern;
pub use zbuffer::DepthBuffer;
