//! Minimal OBJ parser for pre-triangulated meshes.
//!
//! Only `v` and `f` records matter. Each face corner is expanded into its own
//! vertex, colored from a fixed palette by the corner's normal index.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result, anyhow};

use crate::mesh::{MeshBuffer, Vertex};

/// Face colors, picked by `(normal_index - 1) % 6`.
pub const PALETTE: [[f32; 3]; 6] = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 1.0, 0.0],
    [1.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
];

/// Palette color for a 1-based OBJ normal index.
///
/// `normal_index` must be positive; the parser rejects 0 before calling this.
#[inline]
pub fn palette_color(normal_index: u32) -> [f32; 3] {
    debug_assert!(normal_index > 0, "OBJ normal indices are 1-based");
    PALETTE[(normal_index.saturating_sub(1) as usize) % PALETTE.len()]
}

/// Load an OBJ mesh from a file path.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> Result<MeshBuffer> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open OBJ file: {}", path.display()))?;
    let mesh = load_obj_from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to read OBJ file: {}", path.display()))?;
    log::info!(
        "Loaded {} ({} vertices, {} triangles)",
        path.display(),
        mesh.vertex_count(),
        mesh.vertex_count() / 3
    );
    Ok(mesh)
}

/// Load an OBJ mesh from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(reader: R) -> Result<MeshBuffer> {
    parse_obj(reader)
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str) -> Result<MeshBuffer> {
    parse_obj(io::Cursor::new(contents))
}

fn parse_obj<R: BufRead>(reader: R) -> Result<MeshBuffer> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut vertices: Vec<Vertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_no + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let tag = parts
            .next()
            .ok_or_else(|| anyhow!("Malformed OBJ line {}: '{}'", line_no + 1, trimmed))?;

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), line_no, "x coordinate")?;
                let y = parse_f32(parts.next(), line_no, "y coordinate")?;
                let z = parse_f32(parts.next(), line_no, "z coordinate")?;
                positions.push([x, y, z]);
            }
            "f" => {
                let corners: Vec<&str> = parts.collect();
                if corners.len() != 3 {
                    anyhow::bail!(
                        "Face on line {} has {} vertices; only triangles are supported",
                        line_no + 1,
                        corners.len()
                    );
                }

                for corner in corners {
                    let (pos_idx, normal_idx) =
                        parse_face_corner(corner, positions.len(), line_no)?;
                    vertices.push(Vertex::new(positions[pos_idx], palette_color(normal_idx)));
                    let index = u32::try_from(pos_idx)
                        .map_err(|_| anyhow!("Too many positions in OBJ (>{})", u32::MAX))?;
                    indices.push(index);
                }
            }
            _ => {
                // vn/vt/o/g/s/usemtl/mtllib carry nothing we draw
            }
        }
    }

    if vertices.is_empty() {
        anyhow::bail!("OBJ contained no triangles");
    }

    Ok(MeshBuffer::new(vertices, indices))
}

fn parse_f32(value: Option<&str>, line_no: usize, what: &str) -> Result<f32> {
    let token = value.ok_or_else(|| anyhow!("Missing {} on line {}", what, line_no + 1))?;
    token
        .parse::<f32>()
        .with_context(|| format!("Failed to parse {} on line {}", what, line_no + 1))
}

/// Splits a `p/t/n` (or `p//n`) corner into a resolved 0-based position index
/// and the raw 1-based normal index.
fn parse_face_corner(token: &str, pos_count: usize, line_no: usize) -> Result<(usize, u32)> {
    let fields: Vec<&str> = token.split('/').collect();
    if fields.len() != 3 || fields[2].is_empty() {
        anyhow::bail!(
            "Face element '{}' on line {} has no normal index (expected p/t/n)",
            token,
            line_no + 1
        );
    }

    let pos_idx = resolve_index(fields[0], pos_count, line_no)?;

    let normal_idx = fields[2]
        .parse::<u32>()
        .with_context(|| format!("Invalid normal index '{}' on line {}", fields[2], line_no + 1))?;
    if normal_idx == 0 {
        anyhow::bail!("OBJ indices are 1-based; found normal 0 on line {}", line_no + 1);
    }

    Ok((pos_idx, normal_idx))
}

fn resolve_index(token: &str, len: usize, line_no: usize) -> Result<usize> {
    let raw = token
        .parse::<i64>()
        .with_context(|| format!("Invalid index '{}' on line {}", token, line_no + 1))?;
    if raw == 0 {
        anyhow::bail!("OBJ indices are 1-based; found 0 on line {}", line_no + 1);
    }

    // Negative indices count back from the last position read so far.
    let idx = if raw > 0 { raw - 1 } else { len as i64 + raw };

    if idx < 0 || idx as usize >= len {
        anyhow::bail!(
            "OBJ index {} resolved out of bounds (len={}) on line {}",
            raw,
            len,
            line_no + 1
        );
    }

    Ok(idx as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "
        v 0.0 0.0 0.0
        v 1.0 0.0 0.0
        v 0.0 1.0 0.0
        f 1//1 2//1 3//1
    ";

    #[test]
    fn single_triangle_expands_to_interleaved_buffer() {
        let mesh = load_obj_from_str(TRIANGLE).expect("parse triangle");
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(
            mesh.interleaved(),
            &[
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, 1.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 1.0, 0.0, 0.0,
            ]
        );
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn corners_keep_file_order() {
        let src = "
            v 0 0 0
            v 1 0 0
            v 0 1 0
            vn 0 0 1
            vt 0 0
            f 3/1/2 1/1/3 2/1/4
        ";
        let mesh = load_obj_from_str(src).unwrap();
        assert_eq!(mesh.indices, vec![2, 0, 1]);
        assert_eq!(mesh.vertices[0], Vertex::new([0.0, 1.0, 0.0], PALETTE[1]));
        assert_eq!(mesh.vertices[1], Vertex::new([0.0, 0.0, 0.0], PALETTE[2]));
        assert_eq!(mesh.vertices[2], Vertex::new([1.0, 0.0, 0.0], PALETTE[3]));
    }

    #[test]
    fn palette_wraps_every_six_normals() {
        for n in 1..=60u32 {
            assert_eq!(palette_color(n), PALETTE[((n - 1) % 6) as usize]);
        }
        assert_eq!(palette_color(7), palette_color(1));
        assert_eq!(palette_color(12), [0.0, 1.0, 1.0]);
    }

    #[test]
    fn negative_indices_are_relative() {
        let src = "
            v 0 0 0
            v 1 0 0
            v 0 1 0
            f -3//1 -2//1 -1//1
        ";
        let mesh = load_obj_from_str(src).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn quads_are_rejected() {
        let src = "
            v 0 0 0
            v 1 0 0
            v 1 1 0
            v 0 1 0
            f 1//1 2//1 3//1 4//1
        ";
        let err = load_obj_from_str(src).unwrap_err();
        assert!(err.to_string().contains("only triangles"));
    }

    #[test]
    fn corner_without_normal_is_rejected() {
        let src = "
            v 0 0 0
            v 1 0 0
            v 0 1 0
            f 1/1 2/1 3/1
        ";
        assert!(load_obj_from_str(src).is_err());
    }

    #[test]
    fn out_of_range_position_is_rejected() {
        let src = "
            v 0 0 0
            f 1//1 2//1 3//1
        ";
        let err = load_obj_from_str(src).unwrap_err();
        assert!(err.to_string().contains("out of bounds"));
    }

    #[test]
    fn file_without_faces_is_rejected() {
        assert!(load_obj_from_str("v 0 0 0\n# nothing else\n").is_err());
    }

    #[test]
    fn missing_file_reports_error() {
        let err = load_obj_from_path("definitely/not/here.obj").unwrap_err();
        assert!(err.to_string().contains("Failed to open OBJ file"));
    }

    #[test]
    fn bundled_cube_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets/cube.obj");
        let mesh = load_obj_from_path(path).expect("bundled cube");
        assert_eq!(mesh.vertex_count(), 36);
        assert_eq!(mesh.interleaved().len(), 36 * 6);
        assert!(mesh.is_valid());
    }
}
