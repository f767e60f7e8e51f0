//! PNG export of zones.

use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::ascii::{cell_char, glyph_color};
use crate::error::ZoneResult;
use crate::tilemap::Coord;
use crate::zone::Zone;

/// Background color of fogged cells.
const FOG_COLOR: [u8; 3] = [12, 12, 16];

/// Color of one zone cell, following the ASCII glyph precedence.
pub fn cell_color(zone: &Zone, c: Coord, fog: bool) -> [u8; 3] {
    match cell_char(zone, c, fog) {
        ' ' => FOG_COLOR,
        ch => {
            let (r, g, b) = glyph_color(ch);
            [r, g, b]
        }
    }
}

/// Render a zone to an image, `scale` pixels per tile.
pub fn render_zone_image(zone: &Zone, scale: u32, fog: bool) -> RgbImage {
    let scale = scale.max(1);
    let width = zone.width() as u32 * scale;
    let height = zone.height() as u32 * scale;
    let mut img: RgbImage = ImageBuffer::new(width, height);

    for y in 0..zone.height() {
        for x in 0..zone.width() {
            let color = Rgb(cell_color(zone, Coord::new(x, y), fog));
            for dy in 0..scale {
                for dx in 0..scale {
                    img.put_pixel(x as u32 * scale + dx, y as u32 * scale + dy, color);
                }
            }
        }
    }

    img
}

/// Export the full (unfogged) zone as a PNG.
pub fn export_zone_png<P: AsRef<Path>>(zone: &Zone, path: P, scale: u32) -> ZoneResult<()> {
    render_zone_image(zone, scale, false).save(path)?;
    Ok(())
}
