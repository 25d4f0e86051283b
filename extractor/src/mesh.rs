use arrayvec::ArrayVec;

pub type Point3 = nalgebra::Point3<f64>;
pub type Vector2 = nalgebra::Vector2<f64>;

pub const MAX_FACE_CORNERS: usize = 10;

/// Reference binding a face to its texture: a positional index into a
/// texture list (PLY `texnumber`) or a material name (OBJ `usemtl`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TextureRef {
    Index(usize),
    Material(String),
}

#[derive(Clone, Debug)]
pub struct Face {
    pub vertices: ArrayVec<usize, MAX_FACE_CORNERS>,
    // One UV pair per corner; loaders resolve shared-table indices
    // into explicit coordinates.
    pub uvs: ArrayVec<Vector2, MAX_FACE_CORNERS>,
    pub texture: Option<TextureRef>,
}

#[derive(Default)]
pub struct Mesh {
    pub vertices: Vec<Point3>,
    pub faces: Vec<Face>,
}
