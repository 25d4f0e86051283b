mod extract;
mod map;
mod pipeline;
mod rasterize;

use nalgebra::{Dynamic, OMatrix};

pub use crate::sampling::{extract::*, map::*, pipeline::*, rasterize::*};

/// Boolean raster-shaped grid marking which pixels a face covers.
/// Indexed as (row, column).
pub type CoverageMask = OMatrix<bool, Dynamic, Dynamic>;

/// Integer pixel-space coordinate, (x, y) with row 0 at the top.
pub type PixelCoord = [i64; 2];
