//! JSON scene description rendered by the CLI

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use softraster_core::graphics::{BlendState, ColorOps, StipplePattern};
use softraster_core::{PixelMode, RenderState, Renderer, ScreenPoint, Shading};
use std::fs;
use std::path::Path;

/// A vertex in friendly units
///
/// `depth` is the 16-bit stored depth (larger is nearer), `color` is
/// ARGB8888, `s`/`t` are normalized texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vertex {
    pub x: i32,
    pub y: i32,
    pub depth: u16,
    pub color: u32,
    pub s: f32,
    pub t: f32,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            depth: 0x8000,
            color: 0xFFFF_FFFF,
            s: 0.0,
            t: 0.0,
        }
    }
}

impl Vertex {
    fn at(x: i32, y: i32, depth: u16, color: u32) -> Self {
        Self {
            x,
            y,
            depth,
            color,
            ..Self::default()
        }
    }

    fn with_st(mut self, s: f32, t: f32) -> Self {
        self.s = s;
        self.t = t;
        self
    }

    fn to_point(self) -> ScreenPoint {
        ScreenPoint::with_depth16(self.x, self.y, self.depth)
            .with_color(self.color)
            .with_texcoord(self.s, self.t)
    }
}

/// Checkerboard texture generated at load time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSpec {
    pub size: u32,
    pub cell: u32,
    pub even: u32,
    pub odd: u32,
}

impl Default for TextureSpec {
    fn default() -> Self {
        Self {
            size: 64,
            cell: 8,
            even: 0xFFFF_FFFF,
            odd: 0xFF30_30C0,
        }
    }
}

impl TextureSpec {
    /// Tightly packed RGB888 texels
    fn rgb(&self) -> Vec<u8> {
        let cell = self.cell.max(1);
        let mut out = Vec::with_capacity((self.size * self.size * 3) as usize);
        for v in 0..self.size {
            for u in 0..self.size {
                let color = if ((u / cell) + (v / cell)) % 2 == 0 {
                    self.even
                } else {
                    self.odd
                };
                out.extend_from_slice(&[
                    ColorOps::red(color),
                    ColorOps::green(color),
                    ColorOps::blue(color),
                ]);
            }
        }
        out
    }
}

/// One scene command, drawn in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    Point { at: Vertex },
    Line { from: Vertex, to: Vertex },
    Triangle { shading: Shading, vertices: [Vertex; 3] },
    /// Replace the render state for the following commands
    State { state: RenderState },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub mode: PixelMode,
    /// ARGB8888
    pub clear_color: u32,
    pub clear_depth: u16,
    pub state: RenderState,
    pub texture: Option<TextureSpec>,
    pub commands: Vec<Command>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            mode: PixelMode::Rgba32,
            clear_color: 0xFF10_1018,
            clear_depth: 0,
            state: RenderState::default(),
            texture: None,
            commands: Vec::new(),
        }
    }
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse scene {}", path.display()))
    }

    /// Built-in scene exercising every primitive and shading family
    pub fn demo() -> Self {
        let (w, h) = (320, 240);
        let mut state = RenderState::default();
        state.depth_test = true;

        let quad = |shading, x0, y0, x1, y1, depth, colors: [u32; 4]| {
            let v = [
                Vertex::at(x0, y0, depth, colors[0]).with_st(0.0, 0.0),
                Vertex::at(x1, y0, depth, colors[1]).with_st(0.99, 0.0),
                Vertex::at(x1, y1, depth, colors[2]).with_st(0.99, 0.99),
                Vertex::at(x0, y1, depth, colors[3]).with_st(0.0, 0.99),
            ];
            [
                Command::Triangle {
                    shading,
                    vertices: [v[0], v[1], v[3]],
                },
                Command::Triangle {
                    shading,
                    vertices: [v[1], v[2], v[3]],
                },
            ]
        };

        let mut commands = Vec::new();
        // Gouraud backdrop, farthest
        commands.extend(quad(
            Shading::Smooth,
            0,
            0,
            w - 1,
            h - 1,
            0x1000,
            [0xFF20_2060, 0xFF60_2020, 0xFF20_6020, 0xFF10_1010],
        ));
        // Perspective floor: near edge at the bottom
        let floor = |x, y, depth, s, t| Vertex::at(x, y, depth, 0xFFFF_FFFF).with_st(s, t);
        commands.push(Command::Triangle {
            shading: Shading::Textured,
            vertices: [
                floor(100, 120, 0x4000, 0.0, 0.0),
                floor(220, 120, 0x4000, 0.99, 0.0),
                floor(10, 230, 0xC000, 0.0, 0.99),
            ],
        });
        commands.push(Command::Triangle {
            shading: Shading::Textured,
            vertices: [
                floor(220, 120, 0x4000, 0.99, 0.0),
                floor(310, 230, 0xC000, 0.99, 0.99),
                floor(10, 230, 0xC000, 0.0, 0.99),
            ],
        });
        // Affine-mapped sign and a flat triangle in front of it
        commands.extend(quad(
            Shading::Mapping,
            20,
            20,
            84,
            84,
            0x6000,
            [0xFFFF_FFFF; 4],
        ));
        commands.push(Command::Triangle {
            shading: Shading::Flat,
            vertices: [
                Vertex::at(60, 40, 0x7000, 0xFFFF_FFFF),
                Vertex::at(120, 60, 0x7000, 0xFFFF_FFFF),
                Vertex::at(70, 100, 0x7000, 0xFFE0_A020),
            ],
        });
        // Additive stippled overlay
        let mut overlay = state.clone();
        overlay.blend = BlendState::additive();
        overlay.stipple = Some(StipplePattern::checkerboard(2));
        commands.push(Command::State { state: overlay });
        commands.extend(quad(
            Shading::Flat,
            200,
            20,
            300,
            90,
            0xF000,
            [0xFF40_4040; 4],
        ));
        commands.push(Command::State { state: state.clone() });
        // Lines and points on top
        for i in 0..8 {
            commands.push(Command::Line {
                from: Vertex::at(160, 10, 0xFFFF, 0xFFFF_0000),
                to: Vertex::at(130 + i * 10, 110, 0xFFFF, 0xFF00_00FF),
            });
        }
        for i in 0..5 {
            commands.push(Command::State {
                state: RenderState {
                    point_size: 1 + i as u32,
                    ..state.clone()
                },
            });
            commands.push(Command::Point {
                at: Vertex::at(240 + i * 14, 110, 0xFFFF, 0xFFFF_FF00),
            });
        }

        Self {
            width: w as u32,
            height: h as u32,
            mode: PixelMode::Rgba32,
            state,
            texture: Some(TextureSpec::default()),
            commands,
            ..Self::default()
        }
    }

    /// Every vertex must already lie on the surface
    pub fn validate(&self) -> Result<()> {
        let inside = |v: &Vertex| {
            v.x >= 0 && v.y >= 0 && (v.x as u32) < (self.width & !3) && (v.y as u32) < self.height
        };
        for (i, command) in self.commands.iter().enumerate() {
            let vertices: Vec<Vertex> = match command {
                Command::Point { at } => vec![*at],
                Command::Line { from, to } => vec![*from, *to],
                Command::Triangle { vertices, .. } => vertices.to_vec(),
                Command::State { .. } => Vec::new(),
            };
            if let Some(v) = vertices.iter().find(|v| !inside(v)) {
                bail!(
                    "Command {}: vertex ({}, {}) lies outside the {}x{} surface",
                    i,
                    v.x,
                    v.y,
                    self.width & !3,
                    self.height
                );
            }
            if let Command::Triangle { shading, .. } = command {
                if shading.needs_texture() && self.texture.is_none() {
                    bail!("Command {}: {} triangle but the scene has no texture", i, shading);
                }
            }
        }
        Ok(())
    }

    /// Clear, bind the texture and run every command
    pub fn render(&self, renderer: &mut dyn Renderer) -> Result<()> {
        self.validate()?;
        *renderer.state_mut() = self.state.clone();
        renderer.clear(Some(self.clear_depth), Some(self.clear_color));
        if let Some(texture) = &self.texture {
            renderer
                .bind_rgb_texture(texture.size, texture.size, &texture.rgb())
                .context("Failed to build scene texture")?;
        }

        for command in &self.commands {
            match command {
                Command::Point { at } => renderer.plot_point(&at.to_point()),
                Command::Line { from, to } => renderer.draw_line(&from.to_point(), &to.to_point()),
                Command::Triangle { shading, vertices } => {
                    let [a, b, c] = vertices.map(Vertex::to_point);
                    renderer.fill_triangle(*shading, &a, &b, &c);
                }
                Command::State { state } => *renderer.state_mut() = state.clone(),
            }
        }
        let dirty = renderer.take_dirty();
        log::debug!("Rendered {} commands, dirty {:?}", self.commands.len(), dirty);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use softraster_core::open_renderer;

    #[test]
    fn test_demo_scene_renders() {
        let scene = Scene::demo();
        scene.validate().unwrap();
        let mut renderer = open_renderer(scene.mode, scene.width, scene.height).unwrap();
        scene.render(renderer.as_mut()).unwrap();

        let mut rgb = vec![0u8; (scene.width * scene.height * 3) as usize];
        renderer.read_rgb24(&mut rgb);
        // Backdrop covers everything, so no pixel keeps the clear color
        let clear = [0x10u8, 0x10, 0x18];
        assert!(rgb.chunks_exact(3).all(|px| px != clear));
    }

    #[test]
    fn test_scene_json_round_trip() {
        let scene = Scene::demo();
        let json = serde_json::to_string_pretty(&scene).unwrap();
        let parsed: Scene = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, scene);
    }

    #[test]
    fn test_minimal_scene_uses_defaults() {
        let json = r#"{
            "width": 16,
            "height": 8,
            "mode": "rgb565",
            "commands": [
                { "kind": "point", "at": { "x": 3, "y": 4 } },
                { "kind": "triangle", "shading": "flat",
                  "vertices": [{ "x": 0, "y": 0 }, { "x": 15, "y": 0 }, { "x": 0, "y": 7 }] }
            ]
        }"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        assert_eq!(scene.mode, PixelMode::Rgb565);
        assert_eq!(scene.commands.len(), 2);
        assert_eq!(scene.state, RenderState::default());

        let mut renderer = open_renderer(scene.mode, scene.width, scene.height).unwrap();
        scene.render(renderer.as_mut()).unwrap();
        let mut rgb = vec![0u8; 16 * 8 * 3];
        renderer.read_rgb24(&mut rgb);
        assert_eq!(&rgb[0..3], &[255, 255, 255]);
    }

    #[test]
    fn test_validate_rejects_bad_scenes() {
        let mut scene = Scene {
            width: 18,
            height: 8,
            ..Scene::default()
        };
        // Width rounds down to 16
        scene.commands.push(Command::Point {
            at: Vertex::at(16, 0, 0, 0),
        });
        assert!(scene.validate().is_err());

        scene.commands = vec![Command::Triangle {
            shading: Shading::Textured,
            vertices: [Vertex::at(0, 0, 1, 0), Vertex::at(8, 0, 1, 0), Vertex::at(0, 7, 1, 0)],
        }];
        let err = scene.validate().unwrap_err();
        assert!(err.to_string().contains("no texture"));

        scene.texture = Some(TextureSpec::default());
        assert!(scene.validate().is_ok());
    }
}
