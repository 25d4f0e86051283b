use image::RgbImage;

use base::fpx::FacePixels;

use crate::sampling::CoverageMask;

/// Collects the texture's pixel values at every mask-true coordinate.
/// Traversal is row-major so the stored sequence is reproducible;
/// consumers treat the collection as unordered.
pub fn masked_pixels(texture: &RgbImage, mask: &CoverageMask) -> FacePixels {
    let (width, height) = texture.dimensions();
    debug_assert_eq!(mask.nrows(), height as usize);
    debug_assert_eq!(mask.ncols(), width as usize);

    let mut pixels = FacePixels::new();
    for y in 0..height {
        for x in 0..width {
            if mask[(y as usize, x as usize)] {
                pixels.push(texture.get_pixel(x, y).0);
            }
        }
    }
    pixels
}
