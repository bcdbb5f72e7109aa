/// Plain-text mesh loader (the vertex/face subset of Wavefront OBJ)
///
/// `v x y z` appends a vertex to a 1-indexed table and `f a b c` emits one
/// triangle from three table entries. Values after the third coordinate of a
/// vertex (`w`, per-vertex colors) are skipped. Every other directive is ignored.
use std::fs;
use std::path::Path;

use nalgebra::Vector4;
use nom::{
    branch::alt,
    bytes::complete::{take_till, take_till1},
    character::complete::{char, i64 as parse_index, space0, space1},
    combinator::{all_consuming, eof, opt, peek},
    number::complete::float,
    sequence::{preceded, terminated, tuple},
    IResult,
};

use crate::error::LoadError;
use crate::geometry::{Mesh, Triangle};
use crate::transform::point;

/// Read and parse a mesh file
pub fn load_obj(path: impl AsRef<Path>) -> Result<Mesh, LoadError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mesh = parse_obj(&source)?;
    log::info!("Loaded {} triangles from {}", mesh.len(), path.display());
    Ok(mesh)
}

/// Parse mesh source text
///
/// Faces may only reference vertices defined on earlier lines.
pub fn parse_obj(source: &str) -> Result<Mesh, LoadError> {
    let mut vertices: Vec<Vector4<f32>> = Vec::new();
    let mut mesh = Mesh::new();

    for (number, raw) in source.lines().enumerate() {
        let line = number + 1;
        let Ok((rest, marker)) = parse_directive(raw.trim()) else {
            continue; // blank line
        };

        let malformed = || LoadError::Malformed {
            line,
            directive: marker.to_string(),
        };

        match marker {
            "v" => {
                let (extra, (x, y, z)) = parse_vertex(rest).map_err(|_| malformed())?;
                let extra = extra.trim();
                if !extra.is_empty() {
                    log::debug!("line {line}: ignoring extra vertex values '{extra}'");
                }
                vertices.push(point(x, y, z));
            }
            "f" => {
                let (_, indices) = parse_face(rest).map_err(|_| malformed())?;
                let [a, b, c] = indices.map(|i| lookup(&vertices, i, line));
                mesh.add_triangle(Triangle::new(a?, b?, c?));
            }
            other => log::debug!("line {line}: ignoring '{other}' directive"),
        }
    }

    Ok(mesh)
}

fn lookup(vertices: &[Vector4<f32>], index: i64, line: usize) -> Result<Vector4<f32>, LoadError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| vertices.get(i).copied())
        .ok_or(LoadError::FaceIndexOutOfRange {
            line,
            index,
            vertices: vertices.len(),
        })
}

fn parse_directive(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace())(input)
}

/// Three coordinates; whatever follows them is returned unparsed
fn parse_vertex(input: &str) -> IResult<&str, (f32, f32, f32)> {
    terminated(
        tuple((
            preceded(space1, float),
            preceded(space1, float),
            preceded(space1, float),
        )),
        peek(alt((space1, eof))),
    )(input)
}

fn parse_face(input: &str) -> IResult<&str, [i64; 3]> {
    let (input, (a, b, c)) = all_consuming(terminated(
        tuple((face_index, face_index, face_index)),
        space0,
    ))(input)?;
    Ok((input, [a, b, c]))
}

/// A vertex reference; `a/b/c` forms keep only the vertex index
fn face_index(input: &str) -> IResult<&str, i64> {
    let (input, _) = space1(input)?;
    let (input, vertex) = parse_index(input)?;
    let (input, _) = opt(preceded(char('/'), take_till(|c: char| c.is_whitespace())))(input)?;
    Ok((input, vertex))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE: &str = "\
# unit cube
o cube
v 0 0 0
v 0 1 0
v 1 1 0
v 1 0 0
v 1 1 1
v 1 0 1
v 0 1 1
v 0 0 1
vn 0 0 -1
s off

f 1 2 3
f 1 3 4
f 4 3 5
f 4 5 6
f 6 5 7
f 6 7 8
f 8 7 2
f 8 2 1
f 2 7 5
f 2 5 3
f 6 8 1
f 6 1 4
";

    #[test]
    fn test_parse_cube() {
        let mesh = parse_obj(CUBE).unwrap();
        assert_eq!(mesh.len(), 12);
        assert_eq!(mesh.triangles, Mesh::unit_cube().triangles);
    }

    #[test]
    fn test_empty_source() {
        let mesh = parse_obj("").unwrap();
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_slash_indices_and_floats() {
        let mesh = parse_obj("v -1.5 2e1 .25\nv 0 0 1\nv 1 0 0\nf 1/4/2 2//9 3/1\n").unwrap();
        assert_eq!(mesh.len(), 1);
        assert_eq!(mesh.triangles[0].vertices[0], point(-1.5, 20.0, 0.25));
    }

    #[test]
    fn test_index_out_of_range() {
        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n").unwrap_err();
        match err {
            LoadError::FaceIndexOutOfRange {
                line,
                index,
                vertices,
            } => {
                assert_eq!(line, 4);
                assert_eq!(index, 4);
                assert_eq!(vertices, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_and_negative_indices_rejected() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\n";
        assert!(matches!(
            parse_obj(&format!("{source}f 0 1 2\n")),
            Err(LoadError::FaceIndexOutOfRange { index: 0, .. })
        ));
        assert!(matches!(
            parse_obj(&format!("{source}f -1 1 2\n")),
            Err(LoadError::FaceIndexOutOfRange { index: -1, .. })
        ));
    }

    #[test]
    fn test_forward_reference_rejected() {
        let err = parse_obj("v 0 0 0\nf 1 2 3\nv 1 0 0\nv 0 1 0\n").unwrap_err();
        assert!(matches!(
            err,
            LoadError::FaceIndexOutOfRange { line: 2, vertices: 1, .. }
        ));
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(
            parse_obj("v 1 2\n"),
            Err(LoadError::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 3 4\n"),
            Err(LoadError::Malformed { line: 5, .. })
        ));
        assert!(matches!(
            parse_obj("v 1 two 3\n"),
            Err(LoadError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn test_vertex_extra_values_ignored() {
        // Homogeneous w
        let mesh = parse_obj("v 0 0 0 1.0\nv 1 0 0 1.0\nv 0 1 0 1.0\nf 1 2 3\n").unwrap();
        assert_eq!(mesh.len(), 1);
        assert_eq!(mesh.triangles[0].vertices[1], point(1.0, 0.0, 0.0));

        // Per-vertex colors
        let mesh = parse_obj("v 0 0 0 1 0 0\nv 1 0 0 0 1 0\nv 0 1 0 0 0 1\nf 1 2 3\n").unwrap();
        assert_eq!(mesh.triangles[0].vertices[2], point(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_vertex_number_must_end_at_whitespace() {
        assert!(matches!(
            parse_obj("v 1 2 3abc\n"),
            Err(LoadError::Malformed { line: 1, .. })
        ));
        assert_eq!(parse_vertex(" 1 2 3\t").unwrap().1, (1.0, 2.0, 3.0));
    }

    #[test]
    fn test_missing_file() {
        let err = load_obj("/nonexistent/mesh.obj").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
