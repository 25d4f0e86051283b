use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use log::{debug, info};

use base::defs::{Error, ErrorKind::*, Result};
use base::fpx;
use base::fpx::Write as _;
use base::util::fs;

use crate::import_obj::import_obj;
use crate::import_ply::import_ply;
use crate::mesh::Mesh;
use crate::sampling::process_mesh;
use crate::texture_store::TextureStore;

/// Suffix appended to the mesh base name for the output .fpx file.
pub const OUTPUT_SUFFIX: &str = "_pixels_test";

pub const MESH_EXTENSIONS: [&str; 2] = ["obj", "ply"];

pub fn check_dir_exists(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(Error::new(
            MissingResource,
            format!("directory '{}' does not exist", path.display()),
        ));
    }
    Ok(())
}

pub fn mesh_file_extension(path: &Path) -> String {
    path.extension()
        .and_then(OsStr::to_str)
        .unwrap_or_default()
        .to_lowercase()
}

/// Loads the given mesh file, extracts the texture pixels covered by
/// its faces and writes them into '{base_name}_pixels_test.fpx' inside
/// the output directory. Returns the output path.
pub fn extract_mesh_file(
    mesh_path: &Path,
    textures: &[PathBuf],
    out_dir: &Path,
    writer_params: &fpx::WriterParams,
) -> Result<PathBuf> {
    let (mesh, store) = load_scene(mesh_path, textures)?;
    debug!(
        "loaded '{}' with {} faces and {} textures",
        mesh_path.display(),
        mesh.faces.len(),
        store.num_textures()
    );

    let extraction = process_mesh(&mesh, &store, &AtomicBool::new(false));

    let stem = mesh_path
        .file_stem()
        .and_then(OsStr::to_str)
        .ok_or_else(|| {
            Error::new(
                MalformedData,
                format!("bad mesh file name '{}'", mesh_path.display()),
            )
        })?;
    let out_path = out_dir.join(format!("{}{}.fpx", stem, OUTPUT_SUFFIX));

    let file = fs::create_file(&out_path)?;
    let mut writer = fpx::Writer::new(file, writer_params)?;
    for face in &extraction.face_pixels {
        writer.write_face(face)?;
    }
    writer.into_inner().map_err(|(_, err)| err)?;

    info!(
        "extracted pixels of {} faces ({} skipped) from '{}' into '{}'",
        extraction.face_pixels.len(),
        extraction.num_skipped,
        mesh_path.display(),
        out_path.display()
    );

    Ok(out_path)
}

fn load_scene(
    mesh_path: &Path,
    textures: &[PathBuf],
) -> Result<(Mesh, TextureStore)> {
    match mesh_file_extension(mesh_path).as_str() {
        "ply" => {
            let mesh = import_ply(fs::open_file(mesh_path)?)?;
            Ok((mesh, TextureStore::from_paths(textures)))
        }
        "obj" => {
            let dir = mesh_path.parent().unwrap_or_else(|| Path::new("."));
            let file = fs::open_file(mesh_path)?;
            let scene = import_obj(file, |path| fs::read_file(path), dir)?;
            let store = TextureStore::from_materials(&scene.material_textures);
            Ok((scene.mesh, store))
        }
        ext => Err(Error::new(
            UnsupportedFeature,
            format!("unsupported mesh file extension '{}'", ext),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base::defs::ErrorKind;

    #[test]
    fn test_unsupported_extension() {
        let err = extract_mesh_file(
            Path::new("scan.stl"),
            &[],
            Path::new("."),
            &fpx::WriterParams::default(),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind, ErrorKind::UnsupportedFeature);
        assert_eq!(&err.description, "unsupported mesh file extension 'stl'");
    }

    #[test]
    fn test_missing_directory() {
        let err = check_dir_exists(Path::new("/nonexistent/facetex-out"))
            .err()
            .unwrap();
        assert_eq!(err.kind, ErrorKind::MissingResource);
    }
}
