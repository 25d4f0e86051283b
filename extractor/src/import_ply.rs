use std::io::{BufRead, BufReader, Read};

use arrayvec::ArrayVec;

use base::defs::{Error, ErrorKind::*, IntoResult, Result};

use crate::mesh::{Face, Mesh, Point3, TextureRef, Vector2, MAX_FACE_CORNERS};

/// Imports a PLY mesh in ascii or binary_little_endian form.
///
/// The vertex element must carry scalar x-, y- and z-properties and the
/// face element a vertex_indices list. A texcoord list supplies two
/// coordinates per face corner, and a texnumber scalar selects the
/// texture; faces default to texture 0 when the property is absent.
/// Elements other than vertex and face are skipped.
pub fn import_ply<R: Read>(reader: R) -> Result<Mesh> {
    let mut reader = BufReader::new(reader);
    let mut line = 0;
    let header = read_header(&mut reader, &mut line)?;

    let mut mesh = Mesh::default();
    for element in &header.elements {
        match element.name.as_str() {
            "vertex" => {
                read_vertices(&mut reader, &mut line, header.format, element, &mut mesh)?
            }
            "face" => {
                read_faces(&mut reader, &mut line, header.format, element, &mut mesh)?
            }
            _ => skip_element(&mut reader, &mut line, header.format, element)?,
        }
    }

    Ok(mesh)
}

#[derive(Clone, Copy)]
enum Format {
    Ascii,
    BinaryLittleEndian,
}

#[derive(Clone, Copy)]
enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    fn parse(str: &str, line: usize) -> Result<Self> {
        match str {
            "char" | "int8" => Ok(ScalarType::I8),
            "uchar" | "uint8" => Ok(ScalarType::U8),
            "short" | "int16" => Ok(ScalarType::I16),
            "ushort" | "uint16" => Ok(ScalarType::U16),
            "int" | "int32" => Ok(ScalarType::I32),
            "uint" | "uint32" => Ok(ScalarType::U32),
            "float" | "float32" => Ok(ScalarType::F32),
            "double" | "float64" => Ok(ScalarType::F64),
            _ => Err(Error::new(
                MalformedData,
                format!("unknown PLY scalar type '{}' at line {}", str, line),
            )),
        }
    }

    fn size(self) -> usize {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::F64 => 8,
        }
    }

    // Float count types are rejected at header parse.
    fn max_int(self) -> f64 {
        match self {
            ScalarType::I8 => i8::MAX as f64,
            ScalarType::U8 => u8::MAX as f64,
            ScalarType::I16 => i16::MAX as f64,
            ScalarType::U16 => u16::MAX as f64,
            ScalarType::I32 => i32::MAX as f64,
            ScalarType::U32 => u32::MAX as f64,
            ScalarType::F32 | ScalarType::F64 => 0.0,
        }
    }
}

#[derive(Clone, Copy)]
enum PropertyKind {
    Scalar(ScalarType),
    List { count: ScalarType, item: ScalarType },
}

struct PropertyDecl {
    name: String,
    kind: PropertyKind,
}

struct ElementDecl {
    name: String,
    count: usize,
    properties: Vec<PropertyDecl>,
}

struct Header {
    format: Format,
    elements: Vec<ElementDecl>,
}

// Every scalar is widened to f64 on read. Integers of all supported
// PLY types fit without rounding.
enum Value {
    Scalar(f64),
    List(Vec<f64>),
}

impl Value {
    fn into_scalar(self, element: &str) -> Result<f64> {
        match self {
            Value::Scalar(val) => Ok(val),
            Value::List(_) => Err(Error::new(
                MalformedData,
                format!("unexpected list value in {} data", element),
            )),
        }
    }

    fn into_list(self, element: &str) -> Result<Vec<f64>> {
        match self {
            Value::List(items) => Ok(items),
            Value::Scalar(_) => Err(Error::new(
                MalformedData,
                format!("unexpected scalar value in {} data", element),
            )),
        }
    }
}

fn read_header_line(
    reader: &mut impl BufRead,
    line: &mut usize,
) -> Result<String> {
    let mut buf = Vec::new();
    let len = reader
        .read_until(b'\n', &mut buf)
        .res(|| "failed to read PLY header".to_string())?;
    if len == 0 {
        return Err(Error::new(
            MalformedData,
            "unexpected end of PLY header".to_string(),
        ));
    }
    *line += 1;

    let text = String::from_utf8(buf).map_err(|_| {
        Error::new(
            MalformedData,
            format!("malformed PLY header at line {}", line),
        )
    })?;
    Ok(text.trim().to_string())
}

fn read_header(reader: &mut impl BufRead, line: &mut usize) -> Result<Header> {
    if read_header_line(reader, line)? != "ply" {
        return Err(Error::new(MalformedData, "not a PLY file".to_string()));
    }

    let mut format = None;
    let mut elements: Vec<ElementDecl> = Vec::new();

    loop {
        let text = read_header_line(reader, line)?;
        let parts: Vec<&str> = text.split_whitespace().collect();
        if parts.is_empty() || parts[0] == "comment" || parts[0] == "obj_info"
        {
            continue;
        }

        match parts[0] {
            "format" => format = Some(parse_format(&parts, *line)?),
            "element" => elements.push(parse_element(&parts, *line)?),
            "property" => {
                let element = elements.last_mut().ok_or_else(|| {
                    Error::new(
                        MalformedData,
                        format!(
                            "property-statement before element at line {}",
                            line
                        ),
                    )
                })?;
                element.properties.push(parse_property(&parts, *line)?);
            }
            "end_header" => break,
            _ => {
                return Err(Error::new(
                    MalformedData,
                    format!(
                        "unknown statement in PLY header at line {}",
                        line
                    ),
                ))
            }
        }
    }

    let format = format.ok_or_else(|| {
        Error::new(
            MalformedData,
            "PLY header without format-statement".to_string(),
        )
    })?;

    Ok(Header { format, elements })
}

fn parse_format(parts: &[&str], line: usize) -> Result<Format> {
    if parts.len() != 3 {
        return Err(Error::new(
            MalformedData,
            format!("malformed format-statement at line {}", line),
        ));
    }
    if parts[2] != "1.0" {
        return Err(Error::new(
            UnsupportedFeature,
            format!("unsupported PLY version '{}'", parts[2]),
        ));
    }

    match parts[1] {
        "ascii" => Ok(Format::Ascii),
        "binary_little_endian" => Ok(Format::BinaryLittleEndian),
        "binary_big_endian" => Err(Error::new(
            UnsupportedFeature,
            "unsupported PLY format 'binary_big_endian'".to_string(),
        )),
        _ => Err(Error::new(
            MalformedData,
            format!("unknown PLY format '{}' at line {}", parts[1], line),
        )),
    }
}

fn parse_element(parts: &[&str], line: usize) -> Result<ElementDecl> {
    let malformed_err_res = || {
        Err(Error::new(
            MalformedData,
            format!("malformed element-statement at line {}", line),
        ))
    };
    if parts.len() != 3 {
        return malformed_err_res();
    }
    let count = match parts[2].parse::<usize>() {
        Ok(count) => count,
        Err(_) => return malformed_err_res(),
    };

    Ok(ElementDecl {
        name: parts[1].to_string(),
        count,
        properties: Vec::new(),
    })
}

fn parse_property(parts: &[&str], line: usize) -> Result<PropertyDecl> {
    let kind = match parts.len() {
        3 => PropertyKind::Scalar(ScalarType::parse(parts[1], line)?),
        5 if parts[1] == "list" => {
            let count = ScalarType::parse(parts[2], line)?;
            if matches!(count, ScalarType::F32 | ScalarType::F64) {
                return Err(Error::new(
                    MalformedData,
                    format!("non-integer list count type at line {}", line),
                ));
            }
            PropertyKind::List {
                count,
                item: ScalarType::parse(parts[3], line)?,
            }
        }
        _ => {
            return Err(Error::new(
                MalformedData,
                format!("malformed property-statement at line {}", line),
            ))
        }
    };

    Ok(PropertyDecl {
        name: parts[parts.len() - 1].to_string(),
        kind,
    })
}

fn read_row(
    reader: &mut impl BufRead,
    line: &mut usize,
    format: Format,
    element: &ElementDecl,
) -> Result<Vec<Value>> {
    match format {
        Format::Ascii => read_ascii_row(reader, line, element),
        Format::BinaryLittleEndian => read_binary_row(reader, element),
    }
}

fn read_ascii_row(
    reader: &mut impl BufRead,
    line: &mut usize,
    element: &ElementDecl,
) -> Result<Vec<Value>> {
    let mut buf = String::new();
    let len = reader
        .read_line(&mut buf)
        .res(|| format!("failed to read {} data", element.name))?;
    if len == 0 {
        return Err(Error::new(
            MalformedData,
            format!("unexpected end of {} data", element.name),
        ));
    }
    *line += 1;

    let mut tokens = buf.split_whitespace();
    let mut values = Vec::with_capacity(element.properties.len());

    for property in &element.properties {
        match property.kind {
            PropertyKind::Scalar(_) => values.push(Value::Scalar(
                parse_ascii_value(tokens.next(), &element.name, *line)?,
            )),
            PropertyKind::List { count, .. } => {
                let len =
                    parse_ascii_value(tokens.next(), &element.name, *line)?;
                let len = validate_list_len(len, count, &element.name)?;
                let mut items =
                    Vec::with_capacity(len.min(MAX_LIST_PREALLOC));
                for _ in 0..len {
                    items.push(parse_ascii_value(
                        tokens.next(),
                        &element.name,
                        *line,
                    )?);
                }
                values.push(Value::List(items));
            }
        }
    }

    Ok(values)
}

fn parse_ascii_value(
    token: Option<&str>,
    element: &str,
    line: usize,
) -> Result<f64> {
    token.and_then(|str| str.parse::<f64>().ok()).ok_or_else(|| {
        Error::new(
            MalformedData,
            format!("malformed {} data at line {}", element, line),
        )
    })
}

fn read_binary_row(
    reader: &mut impl Read,
    element: &ElementDecl,
) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(element.properties.len());

    for property in &element.properties {
        match property.kind {
            PropertyKind::Scalar(ty) => values.push(Value::Scalar(
                read_binary_scalar(reader, ty, &element.name)?,
            )),
            PropertyKind::List { count, item } => {
                let len = read_binary_scalar(reader, count, &element.name)?;
                let len = validate_list_len(len, count, &element.name)?;
                let mut items =
                    Vec::with_capacity(len.min(MAX_LIST_PREALLOC));
                for _ in 0..len {
                    items.push(read_binary_scalar(
                        reader,
                        item,
                        &element.name,
                    )?);
                }
                values.push(Value::List(items));
            }
        }
    }

    Ok(values)
}

fn read_binary_scalar(
    reader: &mut impl Read,
    ty: ScalarType,
    element: &str,
) -> Result<f64> {
    let mut buf = [0u8; 8];
    reader
        .read_exact(&mut buf[..ty.size()])
        .res(|| format!("failed to read {} data", element))?;

    Ok(match ty {
        ScalarType::I8 => buf[0] as i8 as f64,
        ScalarType::U8 => buf[0] as f64,
        ScalarType::I16 => i16::from_le_bytes([buf[0], buf[1]]) as f64,
        ScalarType::U16 => u16::from_le_bytes([buf[0], buf[1]]) as f64,
        ScalarType::I32 => {
            i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as f64
        }
        ScalarType::U32 => {
            u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as f64
        }
        ScalarType::F32 => {
            f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as f64
        }
        ScalarType::F64 => f64::from_le_bytes(buf),
    })
}

// Pre-allocation is capped; a corrupt length must fail the count-type
// check, not the allocator.
const MAX_LIST_PREALLOC: usize = 4096;

fn validate_list_len(
    len: f64,
    count: ScalarType,
    element: &str,
) -> Result<usize> {
    if !(len >= 0.0 && len <= count.max_int()) || len.fract() != 0.0 {
        return Err(Error::new(
            MalformedData,
            format!("bad list length in {} data", element),
        ));
    }
    Ok(len as usize)
}

fn read_vertices(
    reader: &mut impl BufRead,
    line: &mut usize,
    format: Format,
    element: &ElementDecl,
    mesh: &mut Mesh,
) -> Result<()> {
    let x_idx = scalar_property_index(element, "x")?;
    let y_idx = scalar_property_index(element, "y")?;
    let z_idx = scalar_property_index(element, "z")?;

    mesh.vertices.reserve(element.count);
    for _ in 0..element.count {
        let values = read_row(reader, line, format, element)?;
        let mut coords = [0f64; 3];
        for (idx, value) in values.into_iter().enumerate() {
            let slot = if idx == x_idx {
                0
            } else if idx == y_idx {
                1
            } else if idx == z_idx {
                2
            } else {
                continue;
            };
            coords[slot] = value.into_scalar(&element.name)?;
        }
        mesh.vertices.push(Point3::new(coords[0], coords[1], coords[2]));
    }

    Ok(())
}

fn scalar_property_index(element: &ElementDecl, name: &str) -> Result<usize> {
    element
        .properties
        .iter()
        .position(|prop| {
            prop.name == name && matches!(prop.kind, PropertyKind::Scalar(_))
        })
        .ok_or_else(|| {
            Error::new(
                MalformedData,
                format!("{} element without '{}' property", element.name, name),
            )
        })
}

fn read_faces(
    reader: &mut impl BufRead,
    line: &mut usize,
    format: Format,
    element: &ElementDecl,
    mesh: &mut Mesh,
) -> Result<()> {
    let vi_idx = element
        .properties
        .iter()
        .position(|prop| {
            prop.name == "vertex_indices"
                && matches!(prop.kind, PropertyKind::List { .. })
        })
        .ok_or_else(|| {
            Error::new(
                MalformedData,
                "face element without 'vertex_indices' list property"
                    .to_string(),
            )
        })?;
    let tc_idx = element.properties.iter().position(|prop| {
        prop.name == "texcoord"
            && matches!(prop.kind, PropertyKind::List { .. })
    });
    let tn_idx = element.properties.iter().position(|prop| {
        prop.name == "texnumber"
            && matches!(prop.kind, PropertyKind::Scalar(_))
    });

    mesh.faces.reserve(element.count);
    for face_idx in 0..element.count {
        let values = read_row(reader, line, format, element)?;

        let mut indices = Vec::new();
        let mut texcoord = None;
        let mut texnumber = 0.0;
        for (idx, value) in values.into_iter().enumerate() {
            if idx == vi_idx {
                indices = value.into_list(&element.name)?;
            } else if Some(idx) == tc_idx {
                texcoord = Some(value.into_list(&element.name)?);
            } else if Some(idx) == tn_idx {
                texnumber = value.into_scalar(&element.name)?;
            }
        }

        let num_vertices_err_res = |kind, prop| {
            let msg = "number of vertices in face";
            Err(Error::new(kind, format!("{} {} {}", prop, msg, face_idx)))
        };
        if indices.len() < 3 {
            return num_vertices_err_res(MalformedData, "bad");
        } else if indices.len() > MAX_FACE_CORNERS {
            return num_vertices_err_res(UnsupportedFeature, "unsupported");
        }

        if texnumber < 0.0 {
            return Err(Error::new(
                MalformedData,
                format!("negative texture number in face {}", face_idx),
            ));
        }

        let mut face = Face {
            vertices: ArrayVec::new(),
            uvs: ArrayVec::new(),
            texture: Some(TextureRef::Index(texnumber as usize)),
        };

        for index in indices {
            if index < 0.0 || index as usize >= mesh.vertices.len() {
                return Err(Error::new(
                    MalformedData,
                    format!(
                        "reference to unknown vertex {} in face {}",
                        index, face_idx
                    ),
                ));
            }
            face.vertices.push(index as usize);
        }

        if let Some(coords) = texcoord {
            if coords.len() != 2 * face.vertices.len() {
                return Err(Error::new(
                    MalformedData,
                    format!(
                        "bad number of texture coordinates in face {}",
                        face_idx
                    ),
                ));
            }
            for pair in coords.chunks_exact(2) {
                face.uvs.push(Vector2::new(pair[0], pair[1]));
            }
        }

        mesh.faces.push(face);
    }

    Ok(())
}

fn skip_element(
    reader: &mut impl BufRead,
    line: &mut usize,
    format: Format,
    element: &ElementDecl,
) -> Result<()> {
    for _ in 0..element.count {
        read_row(reader, line, format, element)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base::defs::ErrorKind;

    const ASCII_PLY: &str = r#"ply
format ascii 1.0
comment produced by hand
element vertex 3
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
property list uchar float texcoord
property int texnumber
end_header
0 0 0
1 0 0
0 1 0
3 0 1 2 6 0 0 1 0 0 1 1
"#;

    #[test]
    fn test_import_ascii() {
        let mesh = import_ply(ASCII_PLY.as_bytes()).unwrap();

        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.vertices[1], Point3::new(1.0, 0.0, 0.0));

        assert_eq!(mesh.faces.len(), 1);
        let face = &mesh.faces[0];
        assert_eq!(face.vertices.as_slice(), &[0, 1, 2]);
        assert_eq!(
            face.uvs.as_slice(),
            &[
                Vector2::new(0.0, 0.0),
                Vector2::new(1.0, 0.0),
                Vector2::new(0.0, 1.0)
            ]
        );
        assert_eq!(face.texture, Some(TextureRef::Index(1)));
    }

    #[test]
    fn test_import_binary_little_endian() {
        let mut data = Vec::new();
        data.extend_from_slice(
            concat!(
                "ply\n",
                "format binary_little_endian 1.0\n",
                "element vertex 3\n",
                "property float x\n",
                "property float y\n",
                "property float z\n",
                "element face 1\n",
                "property list uchar int vertex_indices\n",
                "end_header\n"
            )
            .as_bytes(),
        );
        for &(x, y, z) in
            &[(0f32, 0f32, 0f32), (1f32, 0f32, 0f32), (0f32, 1f32, 0f32)]
        {
            data.extend_from_slice(&x.to_le_bytes());
            data.extend_from_slice(&y.to_le_bytes());
            data.extend_from_slice(&z.to_le_bytes());
        }
        data.push(3);
        for index in [0i32, 1, 2] {
            data.extend_from_slice(&index.to_le_bytes());
        }

        let mesh = import_ply(data.as_slice()).unwrap();

        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.vertices[2], Point3::new(0.0, 1.0, 0.0));

        let face = &mesh.faces[0];
        assert_eq!(face.vertices.as_slice(), &[0, 1, 2]);
        assert!(face.uvs.is_empty());
        assert_eq!(face.texture, Some(TextureRef::Index(0)));
    }

    #[test]
    fn test_skips_unknown_element() {
        let data = r#"ply
format ascii 1.0
element vertex 1
property float x
property float y
property float z
element edge 2
property int vertex1
property int vertex2
element face 0
property list uchar int vertex_indices
end_header
0 0 0
0 0
0 0
"#;
        let mesh = import_ply(data.as_bytes()).unwrap();
        assert_eq!(mesh.vertices.len(), 1);
        assert!(mesh.faces.is_empty());
    }

    #[test]
    fn test_not_a_ply_file() {
        let err = import_ply("obj\n".as_bytes()).err().unwrap();
        assert_eq!(err.kind, ErrorKind::MalformedData);
        assert_eq!(&err.description, "not a PLY file");
    }

    #[test]
    fn test_unsupported_format() {
        let data = "ply\nformat binary_big_endian 1.0\nend_header\n";
        let err = import_ply(data.as_bytes()).err().unwrap();
        assert_eq!(err.kind, ErrorKind::UnsupportedFeature);
        assert_eq!(
            &err.description,
            "unsupported PLY format 'binary_big_endian'"
        );
    }

    #[test]
    fn test_unknown_scalar_type() {
        let data = "ply\nformat ascii 1.0\nelement vertex 0\n\
            property quad x\nend_header\n";
        let err = import_ply(data.as_bytes()).err().unwrap();
        assert_eq!(err.kind, ErrorKind::MalformedData);
        assert_eq!(&err.description, "unknown PLY scalar type 'quad' at line 4");
    }

    #[test]
    fn test_oversized_list_length() {
        // A corrupt count must come back as an error, not blow up
        // allocating the list.
        let data = r#"ply
format ascii 1.0
element vertex 0
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
99999999999999999999 0 1 2
"#;
        let err = import_ply(data.as_bytes()).err().unwrap();
        assert_eq!(err.kind, ErrorKind::MalformedData);
        assert_eq!(&err.description, "bad list length in face data");
    }

    #[test]
    fn test_negative_binary_list_length() {
        let mut data = Vec::new();
        data.extend_from_slice(
            concat!(
                "ply\n",
                "format binary_little_endian 1.0\n",
                "element vertex 0\n",
                "property float x\n",
                "property float y\n",
                "property float z\n",
                "element face 1\n",
                "property list char int vertex_indices\n",
                "end_header\n"
            )
            .as_bytes(),
        );
        data.push(0xFF);

        let err = import_ply(data.as_slice()).err().unwrap();
        assert_eq!(err.kind, ErrorKind::MalformedData);
        assert_eq!(&err.description, "bad list length in face data");
    }

    #[test]
    fn test_non_integer_list_count_type() {
        let data = "ply\nformat ascii 1.0\nelement face 0\n\
            property list float int vertex_indices\nend_header\n";
        let err = import_ply(data.as_bytes()).err().unwrap();
        assert_eq!(err.kind, ErrorKind::MalformedData);
        assert_eq!(&err.description, "non-integer list count type at line 4");
    }

    #[test]
    fn test_too_few_face_vertices() {
        let data = r#"ply
format ascii 1.0
element vertex 2
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
0 0 0
1 0 0
2 0 1
"#;
        let err = import_ply(data.as_bytes()).err().unwrap();
        assert_eq!(err.kind, ErrorKind::MalformedData);
        assert_eq!(&err.description, "bad number of vertices in face 0");
    }

    #[test]
    fn test_unknown_vertex_reference() {
        let data = r#"ply
format ascii 1.0
element vertex 2
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
0 0 0
1 0 0
3 0 1 2
"#;
        let err = import_ply(data.as_bytes()).err().unwrap();
        assert_eq!(err.kind, ErrorKind::MalformedData);
        assert_eq!(&err.description, "reference to unknown vertex 2 in face 0");
    }
}
