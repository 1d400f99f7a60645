use softraster_core::{open_renderer, PixelMode, ScreenPoint, Shading};
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    let mode: PixelMode = match args.get(1).map(|s| s.parse()) {
        Some(Ok(mode)) => mode,
        Some(Err(err)) => {
            eprintln!("{}", err);
            return;
        }
        None => PixelMode::Rgba32,
    };

    let mut renderer = match open_renderer(mode, 64, 64) {
        Ok(renderer) => renderer,
        Err(err) => {
            eprintln!("{}", err);
            return;
        }
    };
    renderer.clear(Some(0), Some(0xFF000000));
    renderer.fill_triangle(
        Shading::Smooth,
        &ScreenPoint::new(0, 0, 0).with_rgb8(255, 0, 0),
        &ScreenPoint::new(63, 0, 0).with_rgb8(0, 255, 0),
        &ScreenPoint::new(0, 63, 0).with_rgb8(0, 0, 255),
    );

    let mut rgb = vec![0u8; 64 * 64 * 3];
    renderer.read_rgb24(&mut rgb);
    let checksum = rgb.iter().fold(0u32, |acc, &b| acc.rotate_left(5) ^ b as u32);
    println!("Headless {} frame: 64x64, checksum {:08X}", renderer.name(), checksum);
    println!("{}", renderer.debug_state());
}
