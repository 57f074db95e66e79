//! Wavefront OBJ geometry codec.
//!
//! Supports positions, normals and texture coordinates with 1-based or
//! negative (relative) indices. Polygons are fan-triangulated and identical
//! `v/vt/vn` triplets are shared in the output vertex buffer. Material and
//! grouping directives are ignored.

use std::{
    collections::HashMap,
    io::{self, BufRead},
};

use anyhow::{Context, Result, anyhow, bail};

use crate::mesh::{MeshData, MeshVertex};

/// Parse OBJ text already loaded in memory (file or archive entry).
pub fn load_obj_from_bytes(bytes: &[u8]) -> Result<MeshData> {
    load_obj_from_reader(io::Cursor::new(bytes))
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str) -> Result<MeshData> {
    load_obj_from_reader(io::Cursor::new(contents))
}

/// Load an OBJ mesh from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(reader: R) -> Result<MeshData> {
    let mut parser = ObjParser::default();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_no + 1))?;
        parser
            .line(line.trim(), line_no + 1)
            .with_context(|| format!("OBJ line {}: '{}'", line_no + 1, line.trim()))?;
    }
    parser.finish()
}

/// Unique `v/vt/vn` triplet, zero-based.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
struct Corner(usize, Option<usize>, Option<usize>);

#[derive(Default)]
struct ObjParser {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    shared: HashMap<Corner, u32>,
    mesh: MeshData,
    skipped: usize,
}

impl ObjParser {
    fn line(&mut self, line: &str, line_no: usize) -> Result<()> {
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }
        let mut parts = line.split_whitespace();
        let Some(tag) = parts.next() else {
            return Ok(());
        };
        match tag {
            "v" => {
                let [x, y, z] = floats::<3>(&mut parts, "position")?;
                self.positions.push([x, y, z]);
            }
            "vn" => {
                let n = floats::<3>(&mut parts, "normal")?;
                self.normals.push(n);
            }
            "vt" => {
                // A third (w) component is allowed and dropped.
                let uv = floats::<2>(&mut parts, "texture coordinate")?;
                self.texcoords.push(uv);
            }
            "f" => self.face(parts, line_no)?,
            _ => self.skipped += 1,
        }
        Ok(())
    }

    fn face<'a>(&mut self, parts: impl Iterator<Item = &'a str>, line_no: usize) -> Result<()> {
        let corners = parts
            .map(|token| self.corner(token))
            .collect::<Result<Vec<_>>>()?;
        if corners.len() < 3 {
            log::debug!("Skipping degenerate OBJ face on line {}", line_no);
            return Ok(());
        }
        let indices = corners
            .into_iter()
            .map(|c| self.vertex_index(c))
            .collect::<Result<Vec<_>>>()?;
        for i in 1..indices.len() - 1 {
            self.mesh
                .indices
                .extend_from_slice(&[indices[0], indices[i], indices[i + 1]]);
        }
        Ok(())
    }

    fn corner(&self, token: &str) -> Result<Corner> {
        let mut split = token.split('/');
        let position = split
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("Malformed face element '{}'", token))?;
        let position = resolve_index(position, self.positions.len())?;
        let texcoord = optional_index(split.next(), self.texcoords.len())?;
        let normal = optional_index(split.next(), self.normals.len())?;
        Ok(Corner(position, texcoord, normal))
    }

    fn vertex_index(&mut self, corner: Corner) -> Result<u32> {
        if let Some(&idx) = self.shared.get(&corner) {
            return Ok(idx);
        }
        let Corner(p, t, n) = corner;
        let vertex = MeshVertex::new(
            self.positions[p],
            n.map(|i| self.normals[i]).unwrap_or([0.0, 0.0, 1.0]),
            t.map(|i| self.texcoords[i]).unwrap_or([0.0, 0.0]),
        );
        let idx = u32::try_from(self.mesh.vertices.len())
            .map_err(|_| anyhow!("Too many vertices in OBJ (>{})", u32::MAX))?;
        self.mesh.vertices.push(vertex);
        self.shared.insert(corner, idx);
        Ok(idx)
    }

    fn finish(self) -> Result<MeshData> {
        if !self.mesh.is_valid() {
            bail!("OBJ contained no triangles");
        }
        if self.skipped > 0 {
            log::debug!("OBJ: ignored {} unsupported directives", self.skipped);
        }
        Ok(self.mesh)
    }
}

fn floats<'a, const N: usize>(
    parts: &mut impl Iterator<Item = &'a str>,
    what: &str,
) -> Result<[f32; N]> {
    let mut out = [0.0f32; N];
    for (i, slot) in out.iter_mut().enumerate() {
        let token = parts
            .next()
            .ok_or_else(|| anyhow!("Missing component {} of {}", i, what))?;
        *slot = token
            .parse::<f32>()
            .with_context(|| format!("Invalid {} component '{}'", what, token))?;
    }
    Ok(out)
}

fn optional_index(token: Option<&str>, len: usize) -> Result<Option<usize>> {
    match token {
        Some(value) if !value.is_empty() => resolve_index(value, len).map(Some),
        _ => Ok(None),
    }
}

/// OBJ indices are 1-based; negative values count back from the end.
fn resolve_index(token: &str, len: usize) -> Result<usize> {
    let raw = token
        .parse::<i64>()
        .with_context(|| format!("Invalid index '{}'", token))?;
    let idx = match raw {
        0 => bail!("OBJ indices are 1-based; found 0"),
        r if r > 0 => r - 1,
        r => len as i64 + r,
    };
    if idx < 0 || idx as usize >= len {
        bail!("OBJ index {} out of bounds (len={})", raw, len);
    }
    Ok(idx as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_triangle() {
        let src = r#"
            v 0.0 0.0 0.0
            v 1.0 0.0 0.0
            v 0.0 1.0 0.0
            vn 0.0 0.0 1.0
            vt 0.0 0.0
            vt 1.0 0.0
            vt 0.0 1.0
            f 1/1/1 2/2/1 3/3/1
        "#;
        let mesh = load_obj_from_str(src).expect("parse triangle");
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertices[1].uv, [1.0, 0.0]);
    }

    #[test]
    fn quads_are_fan_triangulated_and_corners_shared() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let mesh = load_obj_from_bytes(src.as_bytes()).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn negative_indices_are_relative() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = load_obj_from_str(src).unwrap();
        assert_eq!(mesh.vertices[2].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let err = load_obj_from_str("v 0 0 0\nf 1 2 3\n").unwrap_err();
        assert!(format!("{:#}", err).contains("out of bounds"));
    }

    #[test]
    fn empty_geometry_is_rejected() {
        assert!(load_obj_from_str("# nothing\nusemtl stone\n").is_err());
    }
}
