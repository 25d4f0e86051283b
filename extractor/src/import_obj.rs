use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use arrayvec::ArrayVec;
use indexmap::IndexMap;

use base::defs::{Error, ErrorKind::*, IntoResult, Result};

use crate::mesh::{Face, Mesh, Point3, TextureRef, Vector2, MAX_FACE_CORNERS};

pub struct ObjScene {
    pub mesh: Mesh,
    /// Material name to texture path, as declared by MTL map_Kd
    /// statements, resolved relative to the texture directory.
    pub material_textures: IndexMap<String, PathBuf>,
}

pub fn import_obj<R: Read, F: Fn(&Path) -> Result<Vec<u8>>>(
    obj_reader: R,
    read_file: F,
    mtl_dir: &Path,
) -> Result<ObjScene> {
    let mut state = ImportState::default();

    for line_res in BufReader::new(obj_reader).lines() {
        let line =
            line_res.res(|| "failed to read OBJ data".to_string())?;
        state.line += 1;

        let parts: Vec<&str> = line.trim().split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "f" => import_f(&mut state, &parts)?,
            "mtllib" => import_mtllib(&read_file, mtl_dir, &mut state, &parts)?,
            "usemtl" => import_usemtl(&mut state, &parts)?,
            "v" => import_v(&mut state, &parts)?,
            "vt" => import_vt(&mut state, &parts)?,
            _ => (),
        }
    }

    resolve_faces(state)
}

#[derive(Default)]
struct ImportState {
    line: usize,
    mtl_line: usize,
    vertices: Vec<Point3>,
    tex_coords: Vec<Vector2>,
    faces: Vec<RawFace>,
    current_material: Option<String>,
    mtl_material: Option<String>,
    material_textures: IndexMap<String, PathBuf>,
}

struct RawFace {
    // 1-based (vertex, texture) index pairs; texture 0 means the
    // corner came without a texture point.
    corners: ArrayVec<(u32, u32), MAX_FACE_CORNERS>,
    material: Option<String>,
}

fn import_f(state: &mut ImportState, parts: &[&str]) -> Result<()> {
    let num_vertices_err_res = |kind, prop| {
        let msg = "number of vertices in f-statement at line";
        Err(Error::new(kind, format!("{} {} {}", prop, msg, state.line)))
    };
    if parts.len() < 4 {
        return num_vertices_err_res(MalformedData, "bad");
    } else if parts.len() - 1 > MAX_FACE_CORNERS {
        return num_vertices_err_res(UnsupportedFeature, "unsupported");
    }

    let mut corners = ArrayVec::new();

    for (i, part) in parts[1..].iter().enumerate() {
        let mut iter = part.split('/');
        let vertex = parse_f_component(state.line, &mut iter, i + 1, false)?;
        let texture = parse_f_component(state.line, &mut iter, i + 1, true)?;
        // The normal index is irrelevant here, but still has to be
        // well-formed when present.
        if let Some(normal) = iter.next() {
            if !normal.is_empty() && normal.parse::<u32>().is_err() {
                let desc = format!(
                    "malformed vertex {} in f-statement at line {}",
                    i + 1,
                    state.line
                );
                return Err(Error::new(MalformedData, desc));
            }
        }
        if iter.next().is_some() {
            let desc = format!(
                "malformed vertex {} in f-statement at line {}",
                i + 1,
                state.line
            );
            return Err(Error::new(MalformedData, desc));
        }
        corners.push((vertex, texture));
    }

    state.faces.push(RawFace {
        corners,
        material: state.current_material.clone(),
    });

    Ok(())
}

fn parse_f_component(
    line: usize,
    iter: &mut std::str::Split<char>,
    vnum: usize,
    tex: bool,
) -> Result<u32> {
    let component: &str = iter.next().unwrap_or_default();
    if component.is_empty() && tex {
        return Ok(0);
    }

    let num = component.parse::<u32>().unwrap_or_default();
    if num != 0 {
        Ok(num)
    } else {
        let desc = format!(
            "malformed vertex {} in f-statement at line {}",
            vnum, line
        );
        Err(Error::new(MalformedData, desc))
    }
}

fn import_mtllib<F: Fn(&Path) -> Result<Vec<u8>>>(
    read_file: &F,
    mtl_dir: &Path,
    state: &mut ImportState,
    parts: &[&str],
) -> Result<()> {
    let num_filenames_err_res = |kind, prop| {
        let msg = "number of filenames in mtllib-statement at line";
        Err(Error::new(kind, format!("{} {} {}", prop, msg, state.line)))
    };
    if parts.len() < 2 {
        return num_filenames_err_res(MalformedData, "bad");
    } else if parts.len() > 2 {
        return num_filenames_err_res(UnsupportedFeature, "unsupported");
    }

    let mtl_data = read_file(&mtl_dir.join(parts[1]))?;
    state.mtl_line = 0;

    for line_res in BufReader::new(mtl_data.as_slice()).lines() {
        let line =
            line_res.res(|| "failed to read MTL data".to_string())?;
        state.mtl_line += 1;

        let parts: Vec<&str> = line.trim().split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "map_Kd" => import_mtl_map_kd(mtl_dir, state, &parts)?,
            "newmtl" => import_mtl_newmtl(state, &parts)?,
            _ => (),
        }
    }

    Ok(())
}

fn import_usemtl(state: &mut ImportState, parts: &[&str]) -> Result<()> {
    if parts.len() != 2 {
        let desc = format!("malformed usemtl-statement at line {}", state.line);
        return Err(Error::new(MalformedData, desc));
    }

    // An unknown material is allowed here; the face fails texture
    // resolution later and is skipped rather than aborting the file.
    state.current_material = Some(parts[1].to_string());

    Ok(())
}

fn import_mtl_newmtl(state: &mut ImportState, parts: &[&str]) -> Result<()> {
    if parts.len() != 2 {
        let desc =
            format!("malformed newmtl-statement at line {}", state.mtl_line);
        return Err(Error::new(MalformedData, desc));
    }
    state.mtl_material = Some(parts[1].to_string());
    Ok(())
}

fn import_mtl_map_kd(
    mtl_dir: &Path,
    state: &mut ImportState,
    parts: &[&str],
) -> Result<()> {
    if parts.len() != 2 {
        let desc =
            format!("malformed map_Kd-statement at line {}", state.mtl_line);
        return Err(Error::new(MalformedData, desc));
    }

    let material = state.mtl_material.clone().ok_or_else(|| {
        Error::new(
            MalformedData,
            format!(
                "map_Kd-statement without newmtl at line {}",
                state.mtl_line
            ),
        )
    })?;

    state
        .material_textures
        .insert(material, mtl_dir.join(parts[1]));

    Ok(())
}

fn import_v(state: &mut ImportState, parts: &[&str]) -> Result<()> {
    if parts.len() < 4 || parts.len() > 5 {
        return Err(Error::new(
            MalformedData,
            format!("malformed v-statement at line {}", state.line),
        ));
    }

    let x = parse_coord("x-coordinate of v-statement", state.line, parts[1])?;
    let y = parse_coord("y-coordinate of v-statement", state.line, parts[2])?;
    let z = parse_coord("z-coordinate of v-statement", state.line, parts[3])?;

    state.vertices.push(Point3::new(x, y, z));

    Ok(())
}

fn import_vt(state: &mut ImportState, parts: &[&str]) -> Result<()> {
    if parts.len() < 3 || parts.len() > 4 {
        return Err(Error::new(
            MalformedData,
            format!("malformed vt-statement at line {}", state.line),
        ));
    }

    let u = parse_coord("u-coordinate of vt-statement", state.line, parts[1])?;
    let v = parse_coord("v-coordinate of vt-statement", state.line, parts[2])?;

    state.tex_coords.push(Vector2::new(u, v));

    Ok(())
}

fn parse_coord(what: &str, line: usize, str: &str) -> Result<f64> {
    match str.parse::<f64>() {
        Ok(val) => Ok(val),
        Err(_) => Err(Error::new(
            MalformedData,
            format!("failed to parse {} at line {}", what, line),
        )),
    }
}

fn resolve_faces(state: ImportState) -> Result<ObjScene> {
    let ImportState {
        vertices,
        tex_coords,
        faces,
        material_textures,
        ..
    } = state;

    let mut mesh = Mesh {
        vertices,
        ..Default::default()
    };

    for (face_idx, raw) in faces.into_iter().enumerate() {
        let mut face = Face {
            vertices: ArrayVec::new(),
            uvs: ArrayVec::new(),
            texture: raw.material.map(TextureRef::Material),
        };

        for (vertex, texture) in raw.corners {
            let vi = (vertex - 1) as usize;
            if vi >= mesh.vertices.len() {
                return Err(Error::new(
                    MalformedData,
                    format!(
                        "reference to unknown vertex {} in face {}",
                        vertex, face_idx
                    ),
                ));
            }
            face.vertices.push(vi);

            if texture != 0 {
                let ti = (texture - 1) as usize;
                let uv = tex_coords.get(ti).ok_or_else(|| {
                    Error::new(
                        MalformedData,
                        format!(
                            "reference to unknown texture point {} in face {}",
                            texture, face_idx
                        ),
                    )
                })?;
                face.uvs.push(*uv);
            }
        }

        mesh.faces.push(face);
    }

    Ok(ObjScene {
        mesh,
        material_textures,
    })
}
