use base::defs::{Error, ErrorKind::*, Result};

use crate::mesh::Vector2;
use crate::sampling::PixelCoord;

/// Maps a normalized UV coordinate onto the pixel grid of a texture
/// with the given dimensions. UV v=0 denotes the texture's bottom edge
/// while raster row 0 is the top one, hence the vertical flip.
/// Out-of-range results are passed through and dealt with during
/// rasterization, clamped only to ±PIXEL_COORD_LIMIT so that the
/// rasterizer's integer differences and cross products stay exact.
pub fn uv_to_pixel(uv: Vector2, width: u32, height: u32) -> Result<PixelCoord> {
    if !uv[0].is_finite() || !uv[1].is_finite() {
        return Err(Error::new(
            MalformedGeometry,
            format!("non-finite texture coordinate ({}, {})", uv[0], uv[1]),
        ));
    }

    let px = clamp_coord((uv[0] * width as f64).floor());
    let py = height as i64 - clamp_coord((uv[1] * height as f64).floor());
    Ok([px, py])
}

// Still far outside any raster, but small enough that coordinate
// differences and their i128 cross products cannot overflow.
const PIXEL_COORD_LIMIT: f64 = (1i64 << 40) as f64;

fn clamp_coord(val: f64) -> i64 {
    val.clamp(-PIXEL_COORD_LIMIT, PIXEL_COORD_LIMIT) as i64
}

pub fn face_pixel_polygon(
    uvs: &[Vector2],
    width: u32,
    height: u32,
) -> Result<Vec<PixelCoord>> {
    uvs.iter()
        .map(|&uv| uv_to_pixel(uv, width, height))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base::defs::ErrorKind;

    #[test]
    fn test_corner_mapping() {
        assert_eq!(uv_to_pixel(Vector2::new(0.0, 0.0), 4, 4).unwrap(), [0, 4]);
        assert_eq!(uv_to_pixel(Vector2::new(1.0, 0.0), 4, 4).unwrap(), [4, 4]);
        assert_eq!(uv_to_pixel(Vector2::new(0.5, 0.25), 4, 4).unwrap(), [2, 3]);
    }

    #[test]
    fn test_top_edge_maps_to_row_zero() {
        // height - floor(1.0 * height) must yield a valid row.
        assert_eq!(uv_to_pixel(Vector2::new(0.0, 1.0), 4, 4).unwrap(), [0, 0]);
        assert_eq!(
            uv_to_pixel(Vector2::new(0.0, 1.0), 640, 480).unwrap(),
            [0, 0]
        );
    }

    #[test]
    fn test_out_of_range_passthrough() {
        assert_eq!(
            uv_to_pixel(Vector2::new(-0.5, 2.0), 4, 4).unwrap(),
            [-2, -4]
        );
    }

    #[test]
    fn test_extreme_finite_uv_clamped() {
        // f32::MIN is storable in a PLY float property and must map to
        // a far but representable coordinate, not overflow.
        let coord =
            uv_to_pixel(Vector2::new(0.0, f32::MIN as f64), 4, 4).unwrap();
        assert_eq!(coord[0], 0);
        assert_eq!(coord[1], 4 + (1i64 << 40));

        let coord = uv_to_pixel(
            Vector2::new(f32::MAX as f64, f32::MAX as f64),
            4,
            4,
        )
        .unwrap();
        assert_eq!(coord[0], 1i64 << 40);
        assert_eq!(coord[1], 4 - (1i64 << 40));
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = uv_to_pixel(Vector2::new(f64::NAN, 0.0), 4, 4).err().unwrap();
        assert_eq!(err.kind, ErrorKind::MalformedGeometry);
    }
}
