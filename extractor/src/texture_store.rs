use std::path::{Path, PathBuf};

use image::RgbImage;
use indexmap::IndexMap;
use log::warn;

use base::defs::{Error, ErrorKind::*, Result};

use crate::mesh::TextureRef;

/// Decoded texture rasters, addressable by position (PLY `texnumber`)
/// or by material name (OBJ path). A slot holding None marks a texture
/// that failed to decode, so that dependent faces can be skipped
/// instead of aborting the whole mesh.
#[derive(Default)]
pub struct TextureStore {
    slots: Vec<Option<RgbImage>>,
    materials: IndexMap<String, usize>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_paths(paths: &[PathBuf]) -> Self {
        let mut store = Self::new();
        for path in paths {
            store.slots.push(load_texture(path));
        }
        store
    }

    pub fn from_materials(materials: &IndexMap<String, PathBuf>) -> Self {
        let mut store = Self::new();
        for (name, path) in materials {
            store.insert_material(name.clone(), load_texture(path));
        }
        store
    }

    pub fn insert_indexed(&mut self, image: RgbImage) -> usize {
        self.slots.push(Some(image));
        self.slots.len() - 1
    }

    pub fn insert_material(&mut self, name: String, image: Option<RgbImage>) {
        self.slots.push(image);
        self.materials.insert(name, self.slots.len() - 1);
    }

    pub fn num_textures(&self) -> usize {
        self.slots.len()
    }

    pub fn resolve(&self, texture: &TextureRef) -> Result<&RgbImage> {
        match texture {
            TextureRef::Index(idx) => match self.slots.get(*idx) {
                Some(Some(image)) => Ok(image),
                Some(None) => Err(Error::new(
                    MissingResource,
                    format!("texture {} failed to load", idx),
                )),
                None => Err(Error::new(
                    MissingResource,
                    format!("texture index {} out of range", idx),
                )),
            },
            TextureRef::Material(name) => match self.materials.get(name) {
                Some(&idx) => self.slots[idx].as_ref().ok_or_else(|| {
                    Error::new(
                        MissingResource,
                        format!("texture for material '{}' failed to load", name),
                    )
                }),
                None => Err(Error::new(
                    MissingResource,
                    format!("unknown material '{}'", name),
                )),
            },
        }
    }
}

fn load_texture(path: &Path) -> Option<RgbImage> {
    match image::open(path) {
        Ok(image) => Some(image.into_rgb8()),
        Err(err) => {
            warn!("failed to load texture '{}': {}", path.display(), err);
            None
        }
    }
}
