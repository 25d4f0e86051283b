use std::sync::atomic::{AtomicBool, Ordering};

use log::warn;
use rayon::prelude::*;

use base::defs::{Error, ErrorKind::*, Result};
use base::fpx::FacePixels;

use crate::mesh::{Face, Mesh};
use crate::sampling::{coverage_mask, face_pixel_polygon, masked_pixels};
use crate::texture_store::TextureStore;

pub struct Extraction {
    /// One entry per processed face, in mesh order. Skipped faces
    /// leave no entry.
    pub face_pixels: Vec<FacePixels>,
    pub num_skipped: usize,
    pub cancelled: bool,
}

enum FaceOutcome {
    Pixels(FacePixels),
    Skipped,
    Cancelled,
}

/// Runs the map-rasterize-extract chain over every face of the mesh.
/// Faces are independent pure computations over the immutable mesh and
/// texture store, so they are fanned out across the rayon pool and
/// reassembled in mesh order. A face that fails to resolve its texture
/// or has malformed geometry is skipped with a warning carrying its
/// index. Raising the cancel flag abandons the faces not yet started;
/// the partial result is still returned in order.
pub fn process_mesh(
    mesh: &Mesh,
    store: &TextureStore,
    cancel: &AtomicBool,
) -> Extraction {
    let outcomes: Vec<FaceOutcome> = mesh
        .faces
        .par_iter()
        .enumerate()
        .map(|(face_idx, face)| {
            if cancel.load(Ordering::Relaxed) {
                return FaceOutcome::Cancelled;
            }
            match face_pixels(face, store) {
                Ok(pixels) => FaceOutcome::Pixels(pixels),
                Err(err) => {
                    warn!("skipping face {}: {}", face_idx, err);
                    FaceOutcome::Skipped
                }
            }
        })
        .collect();

    let mut extraction = Extraction {
        face_pixels: Vec::with_capacity(outcomes.len()),
        num_skipped: 0,
        cancelled: false,
    };
    for outcome in outcomes {
        match outcome {
            FaceOutcome::Pixels(pixels) => extraction.face_pixels.push(pixels),
            FaceOutcome::Skipped => extraction.num_skipped += 1,
            FaceOutcome::Cancelled => extraction.cancelled = true,
        }
    }
    extraction
}

fn face_pixels(face: &Face, store: &TextureStore) -> Result<FacePixels> {
    let texture = match &face.texture {
        Some(texture) => store.resolve(texture)?,
        None => {
            return Err(Error::new(
                MissingResource,
                "no material assigned".to_string(),
            ))
        }
    };

    if face.uvs.is_empty() {
        return Err(Error::new(
            MalformedGeometry,
            "no texture coordinates".to_string(),
        ));
    }
    if face.uvs.len() != face.vertices.len() {
        return Err(Error::new(
            MalformedGeometry,
            format!(
                "{} texture coordinates for {} corners",
                face.uvs.len(),
                face.vertices.len()
            ),
        ));
    }

    let (width, height) = texture.dimensions();
    let polygon = face_pixel_polygon(&face.uvs, width, height)?;
    let mask = coverage_mask(&polygon, width, height)?;
    Ok(masked_pixels(texture, &mask))
}

#[cfg(test)]
mod tests {
    use arrayvec::ArrayVec;
    use image::{Rgb, RgbImage};

    use super::*;
    use crate::mesh::{TextureRef, Vector2};

    fn new_face(uvs: &[(f64, f64)], texture: Option<TextureRef>) -> Face {
        let mut face = Face {
            vertices: ArrayVec::new(),
            uvs: ArrayVec::new(),
            texture,
        };
        for (i, &(u, v)) in uvs.iter().enumerate() {
            face.vertices.push(i);
            face.uvs.push(Vector2::new(u, v));
        }
        face
    }

    fn solid_store(colors: &[[u8; 3]]) -> TextureStore {
        let mut store = TextureStore::new();
        for &color in colors {
            store.insert_indexed(RgbImage::from_pixel(10, 10, Rgb(color)));
        }
        store
    }

    #[test]
    fn test_solid_triangle_scenario() {
        // The UV triangle (0,0), (0.5,0), (0,0.5) covers 15 pixels of
        // a 10x10 texture after the vertical flip.
        let store = solid_store(&[[255, 0, 0]]);
        let mesh = Mesh {
            vertices: vec![],
            faces: vec![new_face(
                &[(0.0, 0.0), (0.5, 0.0), (0.0, 0.5)],
                Some(TextureRef::Index(0)),
            )],
        };

        let extraction =
            process_mesh(&mesh, &store, &AtomicBool::new(false));
        assert_eq!(extraction.face_pixels.len(), 1);
        assert_eq!(extraction.face_pixels[0].len(), 15);
        assert!(extraction.face_pixels[0]
            .iter()
            .all(|&sample| sample == [255, 0, 0]));
        assert_eq!(extraction.num_skipped, 0);
        assert!(!extraction.cancelled);
    }

    #[test]
    fn test_skips_preserve_order() {
        let store = solid_store(&[[255, 0, 0], [0, 255, 0]]);
        let triangle = [(0.0, 0.0), (0.5, 0.0), (0.0, 0.5)];
        let mesh = Mesh {
            vertices: vec![],
            faces: vec![
                new_face(&triangle, Some(TextureRef::Index(0))),
                new_face(
                    &triangle,
                    Some(TextureRef::Material("missing".to_string())),
                ),
                new_face(&triangle, Some(TextureRef::Index(1))),
            ],
        };

        let extraction =
            process_mesh(&mesh, &store, &AtomicBool::new(false));
        assert_eq!(extraction.face_pixels.len(), 2);
        assert_eq!(extraction.num_skipped, 1);
        assert_eq!(extraction.face_pixels[0][0], [255, 0, 0]);
        assert_eq!(extraction.face_pixels[1][0], [0, 255, 0]);
    }

    #[test]
    fn test_skip_face_without_uvs() {
        let store = solid_store(&[[255, 0, 0]]);
        let mut face = new_face(&[], Some(TextureRef::Index(0)));
        face.vertices.push(0);
        face.vertices.push(1);
        face.vertices.push(2);
        let mesh = Mesh {
            vertices: vec![],
            faces: vec![face],
        };

        let extraction =
            process_mesh(&mesh, &store, &AtomicBool::new(false));
        assert!(extraction.face_pixels.is_empty());
        assert_eq!(extraction.num_skipped, 1);
    }

    #[test]
    fn test_skip_face_with_mismatched_uvs() {
        let store = solid_store(&[[255, 0, 0]]);
        let mut face = new_face(
            &[(0.0, 0.0), (0.5, 0.0)],
            Some(TextureRef::Index(0)),
        );
        face.vertices.push(2);
        let mesh = Mesh {
            vertices: vec![],
            faces: vec![face],
        };

        let extraction =
            process_mesh(&mesh, &store, &AtomicBool::new(false));
        assert!(extraction.face_pixels.is_empty());
        assert_eq!(extraction.num_skipped, 1);
    }

    #[test]
    fn test_skip_face_without_material() {
        let store = solid_store(&[[255, 0, 0]]);
        let mesh = Mesh {
            vertices: vec![],
            faces: vec![new_face(&[(0.0, 0.0), (0.5, 0.0), (0.0, 0.5)], None)],
        };

        let extraction =
            process_mesh(&mesh, &store, &AtomicBool::new(false));
        assert!(extraction.face_pixels.is_empty());
        assert_eq!(extraction.num_skipped, 1);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let store = solid_store(&[[255, 0, 0], [0, 255, 0]]);
        let mesh = Mesh {
            vertices: vec![],
            faces: vec![
                new_face(
                    &[(0.0, 0.0), (0.7, 0.1), (0.2, 0.9)],
                    Some(TextureRef::Index(0)),
                ),
                new_face(
                    &[(0.1, 0.1), (0.9, 0.3), (0.4, 0.8)],
                    Some(TextureRef::Index(1)),
                ),
            ],
        };

        let first = process_mesh(&mesh, &store, &AtomicBool::new(false));
        let second = process_mesh(&mesh, &store, &AtomicBool::new(false));
        assert_eq!(first.face_pixels, second.face_pixels);
    }

    #[test]
    fn test_cancellation_flushes_partial_result() {
        let store = solid_store(&[[255, 0, 0]]);
        let mesh = Mesh {
            vertices: vec![],
            faces: vec![new_face(
                &[(0.0, 0.0), (0.5, 0.0), (0.0, 0.5)],
                Some(TextureRef::Index(0)),
            )],
        };

        let extraction = process_mesh(&mesh, &store, &AtomicBool::new(true));
        assert!(extraction.face_pixels.is_empty());
        assert_eq!(extraction.num_skipped, 0);
        assert!(extraction.cancelled);
    }
}
