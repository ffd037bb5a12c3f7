use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use bund_core::raster::Raster;

use crate::BundError;

/// a closed 3-D solid between the design surface and the terrain.
///
/// every footprint cell becomes a closed prism whose top is the design surface and
/// whose bottom is the terrain, so the enclosed volume equals the fill volume of the
/// footprint. faces are quads wound counter-clockwise seen from outside.
#[derive(Clone, Debug, Default)]
pub struct SolidMesh {
    pub vertices: Vec<[f64; 3]>,
    /// zero-based vertex indices
    pub faces: Vec<[usize; 4]>,
}

/// local corner order of a prism: bottom ring then top ring, both counter-clockwise
/// from the lower-left corner.
const PRISM_FACES: [[usize; 4]; 6] = [
    [4, 5, 6, 7], // top
    [0, 3, 2, 1], // bottom
    [0, 1, 5, 4], // south
    [1, 2, 6, 5], // east
    [2, 3, 7, 6], // north
    [3, 0, 4, 7], // west
];

impl SolidMesh {
    /// builds the solid over the cells where `fill` is positive and both surfaces
    /// are defined. all rasters must share the same grid.
    pub fn between(surface: &Raster, terrain: &Raster, fill: &Raster) -> Result<SolidMesh, BundError> {
        let spec = *surface.spec();
        if *terrain.spec() != spec || *fill.spec() != spec {
            return Err(BundError::InternalError(String::from(
                "solid surfaces must share one grid",
            )));
        }
        let mut mesh = SolidMesh::default();
        for row in 0..spec.rows {
            for col in 0..spec.cols {
                let positive = fill.get(row, col).is_some_and(|f| f > 0.0);
                let (Some(top), Some(bottom)) = (surface.get(row, col), terrain.get(row, col)) else {
                    continue;
                };
                if !positive || top <= bottom {
                    continue;
                }
                let (upper_left, lower_right) = spec.cell_bounds(row, col);
                let ring = [
                    (upper_left.x, lower_right.y),
                    (lower_right.x, lower_right.y),
                    (lower_right.x, upper_left.y),
                    (upper_left.x, upper_left.y),
                ];
                let offset = mesh.vertices.len();
                mesh.vertices
                    .extend(ring.iter().map(|(x, y)| [*x, *y, bottom]));
                mesh.vertices.extend(ring.iter().map(|(x, y)| [*x, *y, top]));
                mesh.faces.extend(
                    PRISM_FACES
                        .iter()
                        .map(|f| [f[0] + offset, f[1] + offset, f[2] + offset, f[3] + offset]),
                );
            }
        }
        Ok(mesh)
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// enclosed volume, by the divergence theorem over the triangulated faces.
    pub fn volume(&self) -> f64 {
        let v = |i: usize| self.vertices[i];
        let tet = |a: [f64; 3], b: [f64; 3], c: [f64; 3]| {
            (a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
                + a[2] * (b[0] * c[1] - b[1] * c[0]))
                / 6.0
        };
        self.faces
            .iter()
            .map(|f| tet(v(f[0]), v(f[1]), v(f[2])) + tet(v(f[0]), v(f[2]), v(f[3])))
            .sum()
    }
}

/// writes a solid as a Wavefront OBJ file. the datum label is kept as a comment.
pub fn write_obj(mesh: &SolidMesh, datum: &str, path: &Path) -> Result<(), BundError> {
    let write_error = |e: std::io::Error| BundError::WriteError {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let file = File::create(path).map_err(write_error)?;
    let mut out = BufWriter::new(file);
    writeln!(out, "# bund solid between design surface and terrain").map_err(write_error)?;
    writeln!(out, "# datum {datum}").map_err(write_error)?;
    writeln!(out, "o bund").map_err(write_error)?;
    for [x, y, z] in mesh.vertices.iter() {
        writeln!(out, "v {x} {y} {z}").map_err(write_error)?;
    }
    for [a, b, c, d] in mesh.faces.iter() {
        writeln!(out, "f {} {} {} {}", a + 1, b + 1, c + 1, d + 1).map_err(write_error)?;
    }
    out.flush().map_err(write_error)?;
    log::info!(
        "wrote solid with {} faces to '{}'",
        mesh.faces.len(),
        path.display()
    );
    Ok(())
}
