use base::defs::{Error, ErrorKind::*, Result};

use crate::sampling::{CoverageMask, PixelCoord};

/// Rasterizes a convex polygon into a raster-shaped coverage mask.
///
/// A pixel (x, y) is covered iff the lattice point (x, y) lies inside
/// the polygon or on its boundary, regardless of winding. Corners
/// outside the raster are tolerated: the fill region is the polygon's
/// bounding box clipped to raster bounds. All arithmetic is exact, so
/// coverage is reproducible across runs.
pub fn coverage_mask(
    polygon: &[PixelCoord],
    width: u32,
    height: u32,
) -> Result<CoverageMask> {
    if polygon.len() < 3 {
        return Err(Error::new(
            MalformedGeometry,
            format!("polygon with {} corners", polygon.len()),
        ));
    }
    if signed_area_doubled(polygon) == 0 {
        return Err(Error::new(
            MalformedGeometry,
            "degenerate polygon with zero area".to_string(),
        ));
    }

    let mut mask =
        CoverageMask::from_element(height as usize, width as usize, false);

    let min_x = polygon.iter().map(|c| c[0]).min().unwrap().max(0);
    let max_x = polygon
        .iter()
        .map(|c| c[0])
        .max()
        .unwrap()
        .min(width as i64 - 1);
    let min_y = polygon.iter().map(|c| c[1]).min().unwrap().max(0);
    let max_y = polygon
        .iter()
        .map(|c| c[1])
        .max()
        .unwrap()
        .min(height as i64 - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if covers(polygon, [x, y]) {
                mask[(y as usize, x as usize)] = true;
            }
        }
    }

    Ok(mask)
}

fn signed_area_doubled(polygon: &[PixelCoord]) -> i128 {
    let mut sum = 0i128;
    for (i, a) in polygon.iter().enumerate() {
        let b = &polygon[(i + 1) % polygon.len()];
        sum += a[0] as i128 * b[1] as i128 - b[0] as i128 * a[1] as i128;
    }
    sum
}

// A point is inside a convex polygon iff its edge functions do not
// change sign; zeros keep the boundary included.
fn covers(polygon: &[PixelCoord], p: PixelCoord) -> bool {
    let mut pos = false;
    let mut neg = false;
    for (i, a) in polygon.iter().enumerate() {
        let b = &polygon[(i + 1) % polygon.len()];
        let cross = (b[0] as i128 - a[0] as i128)
            * (p[1] as i128 - a[1] as i128)
            - (b[1] as i128 - a[1] as i128) * (p[0] as i128 - a[0] as i128);
        if cross > 0 {
            pos = true;
        }
        if cross < 0 {
            neg = true;
        }
    }
    !(pos && neg)
}
