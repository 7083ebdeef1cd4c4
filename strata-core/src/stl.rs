/// STL parser for binary and ASCII formats
use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::many0,
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::{GeometryLoadError, Result};
use crate::geometry::{Mesh, Triangle, Vertex};

/// 80 byte header plus the little-endian facet count
const BINARY_HEADER_LEN: usize = 84;

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh> {
    if data.len() < BINARY_HEADER_LEN {
        return Err(GeometryLoadError::TooShort(data.len()));
    }

    let (mut input, declared) = binary_header(data)
        .map_err(|_| GeometryLoadError::TooShort(data.len()))?;
    let declared = declared as usize;

    // Never trust the header for the allocation size.
    let mut mesh = Mesh::with_capacity(declared.min(input.len() / 50));

    for found in 0..declared {
        match binary_facet(input) {
            Ok((rest, triangle)) => {
                mesh.add_triangle(triangle);
                input = rest;
            }
            Err(_) => return Err(GeometryLoadError::Truncated { declared, found }),
        }
    }

    Ok(mesh)
}

fn binary_header(input: &[u8]) -> IResult<&[u8], u32> {
    preceded(take(80usize), le_u32)(input)
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, normal) = le_vector3(input)?;
    let (input, a) = le_vector3(input)?;
    let (input, b) = le_vector3(input)?;
    let (input, c) = le_vector3(input)?;
    // Attribute byte count, unused
    let (input, _) = le_u16(input)?;

    Ok((input, facet(normal, [a, b, c])))
}

fn le_vector3(input: &[u8]) -> IResult<&[u8], (f32, f32, f32)> {
    tuple((le_f32, le_f32, le_f32))(input)
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh> {
    match ascii_solid(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(e) => Err(GeometryLoadError::Ascii(format!("{:?}", e))),
    }
}

fn ascii_solid(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _name) = not_line_ending(input)?;
    let (input, triangles) = many0(ascii_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;

    Ok((input, Mesh::from_triangles(triangles)))
}

fn ascii_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = ascii_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, a) = ascii_vertex(input)?;
    let (input, b) = ascii_vertex(input)?;
    let (input, c) = ascii_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, facet(normal, [a, b, c])))
}

fn ascii_vertex(input: &str) -> IResult<&str, (f32, f32, f32)> {
    preceded(preceded(multispace0, tag("vertex")), ascii_vector3)(input)
}

fn ascii_vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

fn facet(normal: (f32, f32, f32), corners: [(f32, f32, f32); 3]) -> Triangle {
    let normal = Vector3::new(normal.0, normal.1, normal.2);
    let [a, b, c] = corners.map(|(x, y, z)| Vertex::from_parts(Point3::new(x, y, z), normal));
    Triangle::new(a, b, c)
}

/// Detect and parse STL data (ASCII first when it looks like text, then binary).
///
/// Text is decoded lossily: only the solid name may carry non-ASCII bytes,
/// and exporters write it in whatever local encoding they use. When data
/// starting with `solid` fails both ways, the ASCII error is reported.
pub fn parse_stl(data: &[u8]) -> Result<Mesh> {
    if !data.starts_with(b"solid") {
        return parse_binary_stl(data);
    }

    let ascii_err = match parse_ascii_stl(&String::from_utf8_lossy(data)) {
        Ok(mesh) => return Ok(mesh),
        Err(err) => err,
    };
    parse_binary_stl(data).map_err(|_| ascii_err)
}

/// Encode a mesh as binary STL; used to build fixtures and exports
pub fn write_binary_stl(mesh: &Mesh) -> Vec<u8> {
    let mut out = Vec::with_capacity(BINARY_HEADER_LEN + mesh.triangle_count() * 50);
    out.extend_from_slice(&[0u8; 80]);
    out.extend_from_slice(&(mesh.triangle_count() as u32).to_le_bytes());

    for triangle in &mesh.triangles {
        let normal = triangle.calculate_normal();
        for value in normal.iter() {
            out.extend_from_slice(&value.to_le_bytes());
        }
        for position in triangle.positions() {
            for value in position.coords.iter() {
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
        out.extend_from_slice(&0u16.to_le_bytes());
    }

    out
}
