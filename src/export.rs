use std::fs;
use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::error::{OvermapError, Result};
use crate::overmap::{Overmap, OMAPX, OMAPY};

fn check_level(om: &Overmap, z: i32) -> Result<()> {
    match om.layer(z) {
        Some(_) => Ok(()),
        None => Err(OvermapError::InvalidLevel(z)),
    }
}

/// One symbol per tile, one line per row.
pub fn render_ascii(om: &Overmap, z: i32) -> Result<String> {
    check_level(om, z)?;
    let mut out = String::with_capacity(((OMAPX + 1) * OMAPY) as usize);
    for y in 0..OMAPY {
        out.extend((0..OMAPX).map(|x| om.ter(x, y, z).symbol()));
        out.push('\n');
    }
    Ok(out)
}

pub fn export_ascii(om: &Overmap, z: i32, path: &Path) -> Result<()> {
    let text = render_ascii(om, z)?;
    fs::write(path, text).map_err(|e| OvermapError::io(path, e))
}

/// Paint one level as `scale`x`scale` blocks of terrain colour.
pub fn render_level(om: &Overmap, z: i32, scale: u32) -> Result<RgbImage> {
    check_level(om, z)?;
    let scale = scale.max(1);
    let mut img: RgbImage = ImageBuffer::new(OMAPX as u32 * scale, OMAPY as u32 * scale);
    paint(&mut img, om, z, scale, (0, 0));
    Ok(img)
}

fn paint(img: &mut RgbImage, om: &Overmap, z: i32, scale: u32, origin: (u32, u32)) {
    for y in 0..OMAPY {
        for x in 0..OMAPX {
            let color = Rgb(om.ter(x, y, z).rgb());
            let px = origin.0 + x as u32 * scale;
            let py = origin.1 + y as u32 * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    img.put_pixel(px + dx, py + dy, color);
                }
            }
        }
    }
}

pub fn export_png(om: &Overmap, z: i32, path: &Path, scale: u32) -> Result<()> {
    let img = render_level(om, z, scale)?;
    img.save(path)?;
    Ok(())
}

/// Lay several regions out by grid coordinate into one image. Missing
/// regions in the bounding box stay black.
pub fn render_mosaic(regions: &[&Overmap], z: i32, scale: u32) -> Result<RgbImage> {
    let scale = scale.max(1);
    let Some(first) = regions.first() else {
        return Ok(ImageBuffer::new(1, 1));
    };
    check_level(first, z)?;

    let (mut min, mut max) = (first.loc(), first.loc());
    for om in regions {
        let (x, y) = om.loc();
        min = (min.0.min(x), min.1.min(y));
        max = (max.0.max(x), max.1.max(y));
    }
    let cols = (max.0 - min.0 + 1) as u32;
    let rows = (max.1 - min.1 + 1) as u32;
    let (tile_w, tile_h) = (OMAPX as u32 * scale, OMAPY as u32 * scale);
    let mut img: RgbImage = ImageBuffer::new(cols * tile_w, rows * tile_h);

    for om in regions {
        let (x, y) = om.loc();
        let origin = ((x - min.0) as u32 * tile_w, (y - min.1) as u32 * tile_h);
        paint(&mut img, om, z, scale, origin);
    }
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::Terrain;

    #[test]
    fn test_ascii_has_one_line_per_row() {
        let mut om = Overmap::new(0, 0);
        om.set_ter(2, 1, 0, Terrain::Forest);
        let text = render_ascii(&om, 0).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), OMAPY as usize);
        assert!(lines.iter().all(|l| l.chars().count() == OMAPX as usize));
        assert_eq!(lines[1].chars().nth(2), Some(Terrain::Forest.symbol()));
    }

    #[test]
    fn test_level_outside_overmap_is_rejected() {
        let om = Overmap::new(0, 0);
        assert!(matches!(render_ascii(&om, 40), Err(OvermapError::InvalidLevel(40))));
        assert!(render_level(&om, -40, 1).is_err());
    }

    #[test]
    fn test_scaled_image_uses_terrain_colours() {
        let mut om = Overmap::new(0, 0);
        om.set_ter(1, 0, 0, Terrain::Forest);
        let img = render_level(&om, 0, 2).unwrap();
        assert_eq!(img.dimensions(), (OMAPX as u32 * 2, OMAPY as u32 * 2));
        assert_eq!(img.get_pixel(3, 1).0, Terrain::Forest.rgb());
        assert_eq!(img.get_pixel(0, 0).0, Terrain::Field.rgb());
    }

    #[test]
    fn test_exports_write_files() {
        let dir = std::env::temp_dir().join(format!("overmap_export_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let om = Overmap::new(0, 0);
        let png = dir.join("surface.png");
        let txt = dir.join("surface.txt");
        export_png(&om, 0, &png, 1).unwrap();
        export_ascii(&om, 0, &txt).unwrap();
        assert_eq!(image::open(&png).unwrap().width(), OMAPX as u32);
        assert_eq!(fs::read_to_string(&txt).unwrap().lines().count(), OMAPY as usize);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_mosaic_places_regions_by_location() {
        let a = Overmap::new(-1, 0);
        let mut b = Overmap::new(0, 0);
        b.set_ter(0, 0, 0, Terrain::Forest);
        let img = render_mosaic(&[&a, &b], 0, 1).unwrap();
        assert_eq!(img.dimensions(), (OMAPX as u32 * 2, OMAPY as u32));
        assert_eq!(img.get_pixel(OMAPX as u32, 0).0, Terrain::Forest.rgb());
    }
}
