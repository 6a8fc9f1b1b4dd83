//! OBJ file loader for 3D models
//!
//! Supports the `v`/`vt`/`vn`/`f` record subset: indices are 1-based,
//! negative indices are relative to the records seen so far, and polygons
//! with more than three corners are fanned into triangles. Missing
//! attributes fall back to defaults (flat normal up, zero texcoord).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::graphics::mesh::{Mesh, Primitive};

/// OBJ parse errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// Underlying I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be parsed
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based source line
        line: usize,
        /// What went wrong
        message: String,
    },

    /// The file parsed but described no usable geometry
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

/// OBJ reader
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file from disk
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, ObjError> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    /// Parse OBJ records from a string
    pub fn parse_str(source: &str) -> Result<Mesh, ObjError> {
        Self::parse(source.as_bytes())
    }

    /// Parse OBJ records from any buffered reader
    pub fn parse<R: BufRead>(reader: R) -> Result<Mesh, ObjError> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();
        let mut mesh = Mesh::new(Primitive::Triangles);

        for (line_number, line) in reader.lines().enumerate() {
            let line_number = line_number + 1;
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let Some(record) = parts.next() else {
                continue;
            };
            let parts: Vec<&str> = parts.collect();

            match record {
                "v" => {
                    positions.push(parse_vec3(&parts, line_number, "vertex")?);
                }
                "vn" => {
                    normals.push(parse_vec3(&parts, line_number, "normal")?);
                }
                "vt" => {
                    if parts.len() < 2 {
                        return Err(ObjError::Parse {
                            line: line_number,
                            message: "texture coordinate needs two components".into(),
                        });
                    }
                    let u = parse_f32(parts[0], line_number, "texcoord u")?;
                    let v = parse_f32(parts[1], line_number, "texcoord v")?;
                    tex_coords.push([u, v]);
                }
                "f" => {
                    if parts.len() < 3 {
                        return Err(ObjError::Parse {
                            line: line_number,
                            message: "face needs at least three corners".into(),
                        });
                    }

                    let mut face_indices = Vec::with_capacity(parts.len());
                    for corner in &parts {
                        let mut refs = corner.split('/');

                        let pos_ref = refs.next().unwrap_or("");
                        let pos_idx = resolve_index(pos_ref, positions.len(), line_number)?
                            .ok_or_else(|| ObjError::Parse {
                                line: line_number,
                                message: format!("corner '{corner}' has no position index"),
                            })?;

                        let tex_idx =
                            resolve_index(refs.next().unwrap_or(""), tex_coords.len(), line_number)?;
                        let normal_idx =
                            resolve_index(refs.next().unwrap_or(""), normals.len(), line_number)?;

                        let position =
                            positions.get(pos_idx).ok_or_else(|| ObjError::Parse {
                                line: line_number,
                                message: format!("position index {} out of range", pos_idx + 1),
                            })?;
                        let tex_coord = tex_idx
                            .and_then(|i| tex_coords.get(i))
                            .copied()
                            .unwrap_or([0.0, 0.0]);
                        let normal = normal_idx
                            .and_then(|i| normals.get(i))
                            .copied()
                            .unwrap_or([0.0, 1.0, 0.0]);

                        face_indices.push(mesh.vertex_count() as u32);
                        mesh.vertex(position[0], position[1], position[2]);
                        mesh.normal(normal[0], normal[1], normal[2]);
                        mesh.texcoord(tex_coord[0], tex_coord[1]);
                    }

                    // Fan triangulation around the first corner.
                    for i in 1..face_indices.len() - 1 {
                        mesh.index(face_indices[0]);
                        mesh.index(face_indices[i]);
                        mesh.index(face_indices[i + 1]);
                    }
                }
                _ => {
                    // Groups, materials, smoothing: ignored.
                }
            }
        }

        if mesh.vertex_count() == 0 {
            return Err(ObjError::InvalidFormat("no vertices found".into()));
        }
        Ok(mesh)
    }
}

fn parse_f32(text: &str, line: usize, what: &str) -> Result<f32, ObjError> {
    text.parse().map_err(|_| ObjError::Parse {
        line,
        message: format!("invalid {what}: '{text}'"),
    })
}

fn parse_vec3(parts: &[&str], line: usize, what: &str) -> Result<[f32; 3], ObjError> {
    if parts.len() < 3 {
        return Err(ObjError::Parse {
            line,
            message: format!("{what} needs three components"),
        });
    }
    Ok([
        parse_f32(parts[0], line, what)?,
        parse_f32(parts[1], line, what)?,
        parse_f32(parts[2], line, what)?,
    ])
}

/// Resolve a 1-based (or negative, relative-to-end) OBJ index against a
/// record list of the given length. Empty text resolves to `None`.
fn resolve_index(text: &str, len: usize, line: usize) -> Result<Option<usize>, ObjError> {
    if text.is_empty() {
        return Ok(None);
    }
    let raw: i64 = text.parse().map_err(|_| ObjError::Parse {
        line,
        message: format!("invalid index '{text}'"),
    })?;
    let resolved = if raw > 0 {
        (raw - 1) as usize
    } else if raw < 0 {
        let back = (-raw) as usize;
        if back > len {
            return Err(ObjError::Parse {
                line,
                message: format!("relative index {raw} reaches before the first record"),
            });
        }
        len - back
    } else {
        return Err(ObjError::Parse {
            line,
            message: "index 0 is not valid in OBJ".into(),
        });
    };
    Ok(Some(resolved))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
# a single triangle
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 1 2 3
";

    #[test]
    fn parses_a_minimal_triangle() {
        let mesh = ObjLoader::parse_str(TRIANGLE).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.positions[1], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn quads_are_fanned_into_triangles() {
        let source = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";
        let mesh = ObjLoader::parse_str(source).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn negative_indices_are_relative() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
f -3 -2 -1
";
        let mesh = ObjLoader::parse_str(source).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.positions[0], [0.0, 0.0, 0.0]);
        assert_eq!(mesh.positions[2], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn slash_forms_resolve_texcoords_and_normals() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
";
        let mesh = ObjLoader::parse_str(source).unwrap();
        assert_eq!(mesh.texcoords[1], [1.0, 0.0]);
        assert_eq!(mesh.normals[2], [0.0, 0.0, 1.0]);

        // Position//normal without texcoords.
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1
";
        let mesh = ObjLoader::parse_str(source).unwrap();
        assert_eq!(mesh.normals[0], [0.0, 0.0, 1.0]);
        assert_eq!(mesh.texcoords[0], [0.0, 0.0]);
    }

    #[test]
    fn missing_normals_default_up() {
        let mesh = ObjLoader::parse_str(TRIANGLE).unwrap();
        assert_eq!(mesh.normals[0], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn bad_records_report_their_line() {
        let source = "v 0 0 0\nv 1 0 oops\n";
        match ObjLoader::parse_str(source) {
            Err(ObjError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let source = "v 0 0 0\nf 1 2 3\n";
        assert!(matches!(
            ObjLoader::parse_str(source),
            Err(ObjError::Parse { .. })
        ));
    }

    #[test]
    fn empty_input_is_invalid() {
        assert!(matches!(
            ObjLoader::parse_str("# nothing\n"),
            Err(ObjError::InvalidFormat(_))
        ));
    }
}
