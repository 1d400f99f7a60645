//! Point, line and triangle rasterizers
//!
//! The drawing entry points live on [`Surface`]. Each reads the render state
//! once, picks the specialized rasterizer from the tables in [`dispatch`] and
//! grows the dirty rectangle by the primitive's bounding box.
//!
//! All points must already be clipped to the surface.

pub mod dispatch;
pub(crate) mod fragment;
pub mod line;
pub mod plot;
pub mod shader;
pub mod triangle;

use crate::dirty::DirtyRect;
use crate::graphics::PixelFormat;
use crate::point::ScreenPoint;
use crate::surface::Surface;
use dispatch::{LineDispatch, TriangleDispatch};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Triangle shading family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shading {
    /// One color from the last submitted vertex
    Flat,
    /// Gouraud
    Smooth,
    /// Affine texture mapping, unlit
    Mapping,
    /// Perspective-correct texture mapping, lit by the vertex colors
    Textured,
}

impl Shading {
    pub const ALL: [Shading; 4] = [
        Shading::Flat,
        Shading::Smooth,
        Shading::Mapping,
        Shading::Textured,
    ];

    pub fn needs_texture(self) -> bool {
        matches!(self, Shading::Mapping | Shading::Textured)
    }
}

impl fmt::Display for Shading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shading::Flat => "flat",
            Shading::Smooth => "smooth",
            Shading::Mapping => "mapping",
            Shading::Textured => "textured",
        };
        f.write_str(name)
    }
}

fn bounds(points: &[&ScreenPoint], width: u32, height: u32) -> Option<DirtyRect> {
    let (mut x0, mut y0) = (i32::MAX, i32::MAX);
    let (mut x1, mut y1) = (i32::MIN, i32::MIN);
    for p in points {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }
    DirtyRect::clipped(x0, y0, x1, y1, width, height)
}

impl<P: PixelFormat> Surface<P> {
    /// Draw a square point of `point_size` pixels centred on `p`
    pub fn plot_point(&mut self, p: &ScreenPoint) {
        plot::plot_point(self, p);
    }

    /// Draw a line between two points
    ///
    /// Colors are interpolated only when the endpoints pack to different
    /// pixel words.
    pub fn draw_line(&mut self, p1: &ScreenPoint, p2: &ScreenPoint) {
        let interpolate = P::from_rgb16(p1.r, p1.g, p1.b) != P::from_rgb16(p2.r, p2.g, p2.b);
        let state = self.state();
        let line = LineDispatch::<P>::select(
            interpolate,
            state.blend.enabled,
            state.depth_test,
            state.depth_write,
        );
        line(self, p1, p2);
        if let Some(rect) = bounds(&[p1, p2], self.width(), self.height()) {
            self.mark_dirty(rect);
        }
    }

    /// Fill a triangle with the given shading
    ///
    /// Zero-area triangles draw nothing. Textured families draw nothing
    /// while no texture is bound.
    pub fn fill_triangle(
        &mut self,
        shading: Shading,
        p0: &ScreenPoint,
        p1: &ScreenPoint,
        p2: &ScreenPoint,
    ) {
        let state = self.state();
        let fill = TriangleDispatch::<P>::select(
            shading,
            state.blend.enabled,
            state.stipple.is_some(),
            state.depth_test,
            state.depth_write,
        );
        fill(self, p0, p1, p2);

        if triangle::signed_area(p0, p1, p2) == 0 || (shading.needs_texture() && self.texture().is_none()) {
            return;
        }
        if let Some(rect) = bounds(&[p0, p1, p2], self.width(), self.height()) {
            self.mark_dirty(rect);
        }
    }

    pub fn fill_triangle_flat(&mut self, p0: &ScreenPoint, p1: &ScreenPoint, p2: &ScreenPoint) {
        self.fill_triangle(Shading::Flat, p0, p1, p2);
    }

    pub fn fill_triangle_smooth(&mut self, p0: &ScreenPoint, p1: &ScreenPoint, p2: &ScreenPoint) {
        self.fill_triangle(Shading::Smooth, p0, p1, p2);
    }

    pub fn fill_triangle_mapping(&mut self, p0: &ScreenPoint, p1: &ScreenPoint, p2: &ScreenPoint) {
        self.fill_triangle(Shading::Mapping, p0, p1, p2);
    }

    pub fn fill_triangle_textured(&mut self, p0: &ScreenPoint, p1: &ScreenPoint, p2: &ScreenPoint) {
        self.fill_triangle(Shading::Textured, p0, p1, p2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{BlendState, PixelMode, Xrgb8888};

    fn surface(w: u32, h: u32) -> Surface<Xrgb8888> {
        let mut s = Surface::<Xrgb8888>::open(w, h, PixelMode::Rgba32, None).unwrap();
        s.clear(Some(0), Some(0));
        s.take_dirty();
        s
    }

    #[test]
    fn test_shading_serde_names() {
        assert_eq!(serde_json::to_string(&Shading::Textured).unwrap(), "\"textured\"");
        let parsed: Shading = serde_json::from_str("\"mapping\"").unwrap();
        assert_eq!(parsed, Shading::Mapping);
        assert_eq!(Shading::Smooth.to_string(), "smooth");
    }

    #[test]
    fn test_plot_point_depth() {
        let mut s = surface(8, 8);
        s.state_mut().depth_test = true;
        let near = ScreenPoint::with_depth16(3, 3, 200).with_rgb8(255, 0, 0);
        let far = ScreenPoint::with_depth16(3, 3, 100).with_rgb8(0, 255, 0);
        s.plot_point(&near);
        s.plot_point(&far);
        assert_eq!(s.pixel(3, 3), Some(0xFF0000));
        assert_eq!(s.depth_at(3, 3), Some(200));

        // Equal depth passes
        let equal = ScreenPoint::with_depth16(3, 3, 200).with_rgb8(0, 0, 255);
        s.plot_point(&equal);
        assert_eq!(s.pixel(3, 3), Some(0x0000FF));
    }

    #[test]
    fn test_plot_point_depth_test_and_write_are_independent() {
        let mut s = surface(8, 8);
        s.clear(Some(0x8000), None);

        // Test off: a farther point still draws and its depth is stored
        s.state_mut().depth_test = false;
        s.plot_point(&ScreenPoint::with_depth16(1, 1, 0x1000).with_rgb8(255, 0, 0));
        assert_eq!(s.pixel(1, 1), Some(0xFF0000));
        assert_eq!(s.depth_at(1, 1), Some(0x1000));

        // Write off: a nearer point draws and leaves the buffer alone
        s.state_mut().depth_test = true;
        s.state_mut().depth_write = false;
        s.plot_point(&ScreenPoint::with_depth16(2, 2, 0x9000).with_rgb8(0, 255, 0));
        assert_eq!(s.pixel(2, 2), Some(0x00FF00));
        assert_eq!(s.depth_at(2, 2), Some(0x8000));
        s.plot_point(&ScreenPoint::with_depth16(2, 2, 0x7000).with_rgb8(0, 0, 255));
        assert_eq!(s.pixel(2, 2), Some(0x00FF00));
    }

    #[test]
    fn test_plot_point_size_and_blend() {
        let mut s = surface(8, 8);
        s.state_mut().point_size = 3;
        s.state_mut().blend = BlendState::additive();
        let p = ScreenPoint::new(4, 4, 0).with_rgb8(0x10, 0, 0);
        s.plot_point(&p);
        s.plot_point(&p);
        for y in 3..=5 {
            for x in 3..=5 {
                assert_eq!(s.pixel(x, y), Some(0x200000));
            }
        }
        assert_eq!(s.pixel(2, 4), Some(0));
        let dirty = s.take_dirty().unwrap();
        assert_eq!((dirty.x_min, dirty.y_min, dirty.x_max, dirty.y_max), (3, 3, 5, 5));
    }

    #[test]
    fn test_draw_line_picks_flat_when_colors_match() {
        let mut s = surface(16, 4);
        let a = ScreenPoint::new(0, 1, 0).with_rgb8(10, 20, 30);
        // Differs only below 8-bit precision
        let mut b = ScreenPoint::new(15, 1, 0).with_rgb8(10, 20, 30);
        b.r += 3;
        s.draw_line(&a, &b);
        let expected = Xrgb8888::from_rgb8(10, 20, 30);
        assert!((0..16).all(|x| s.pixel(x, 1) == Some(expected)));
        let dirty = s.take_dirty().unwrap();
        assert_eq!((dirty.x_min, dirty.x_max, dirty.y_min, dirty.y_max), (0, 15, 1, 1));
    }

    #[test]
    fn test_degenerate_triangle_marks_nothing() {
        let mut s = surface(16, 16);
        let a = ScreenPoint::new(1, 1, 0);
        let b = ScreenPoint::new(5, 5, 0);
        let c = ScreenPoint::new(9, 9, 0);
        for shading in Shading::ALL {
            s.fill_triangle(shading, &a, &b, &c);
        }
        assert!(s.take_dirty().is_none());
        assert!(s.row(5).iter().all(|&px| px == 0));
    }

    #[test]
    fn test_textured_without_texture_draws_nothing() {
        let mut s = surface(16, 16);
        let a = ScreenPoint::new(0, 0, 1 << 20);
        let b = ScreenPoint::new(15, 0, 1 << 20);
        let c = ScreenPoint::new(0, 15, 1 << 20);
        s.fill_triangle_textured(&a, &b, &c);
        s.fill_triangle_mapping(&a, &b, &c);
        assert!(s.take_dirty().is_none());
        assert!((0..16).all(|y| s.row(y).iter().all(|&px| px == 0)));
    }

    #[test]
    fn test_flat_triangle_uses_last_vertex_color() {
        let mut s = surface(16, 16);
        let a = ScreenPoint::new(0, 0, 0).with_rgb8(255, 0, 0);
        let b = ScreenPoint::new(15, 0, 0).with_rgb8(0, 255, 0);
        let c = ScreenPoint::new(0, 15, 0).with_rgb8(0, 0, 255);
        s.fill_triangle_flat(&a, &b, &c);
        assert_eq!(s.pixel(2, 2), Some(0x0000FF));
        assert_eq!(s.pixel(15, 15), Some(0));
        let dirty = s.take_dirty().unwrap();
        assert_eq!(dirty, DirtyRect::full(16, 16));
    }
}
