use crate::core::models::lattice::Lattice;
use nalgebra::Vector3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Conversion factor from Kelvin-equivalent energies to kJ/mol (R / 1000).
pub const KELVIN_TO_KJ_PER_MOL: f64 = 8.314 / 1000.0;

/// Values written per body line.
pub const VALUES_PER_LINE: usize = 6;

#[derive(Debug, Error)]
pub enum CubeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed cube header on line {line}: {reason}")]
    Header { line: usize, reason: String },
    #[error("Slab {x_index} has {found} values, expected {expected}")]
    SlabShape {
        x_index: usize,
        expected: usize,
        found: usize,
    },
    #[error("Slab {found} written out of order, expected slab {expected}")]
    OutOfOrder { expected: usize, found: usize },
    #[error("Grid incomplete: {written} of {expected} slabs written")]
    Incomplete { expected: usize, written: usize },
}

/// Geometry block of a cube file.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeHeader {
    pub comments: [String; 2],
    pub atom_count: i64,
    pub origin: Vector3<f64>,
    /// Grid points along each lattice axis.
    pub counts: [usize; 3],
    /// Cartesian step between neighbouring grid points along each axis.
    pub voxel_vectors: [Vector3<f64>; 3],
}

impl CubeHeader {
    /// Header for a grid spanning one unit cell with both faces included.
    ///
    /// The voxel vector of an axis is its cell vector divided by `N - 1`; an
    /// axis sampled by a single point keeps the full cell vector.
    pub fn for_unit_cell(comments: [String; 2], lattice: &Lattice, counts: [usize; 3]) -> Self {
        let voxel_vectors = [0, 1, 2].map(|axis| {
            let column = lattice.column(axis);
            match counts[axis] {
                0 | 1 => column,
                n => column / (n - 1) as f64,
            }
        });
        Self {
            comments,
            atom_count: 0,
            origin: Vector3::zeros(),
            counts,
            voxel_vectors,
        }
    }

    pub fn slab_len(&self) -> usize {
        self.counts[1] * self.counts[2]
    }

    pub fn write_to(&self, writer: &mut impl Write) -> Result<(), CubeError> {
        for comment in &self.comments {
            writeln!(writer, "{}", comment.replace(['\n', '\r'], " "))?;
        }
        writeln!(
            writer,
            "{:>5} {:>12.6} {:>12.6} {:>12.6}",
            self.atom_count, self.origin.x, self.origin.y, self.origin.z
        )?;
        for (count, vector) in self.counts.iter().zip(&self.voxel_vectors) {
            // Shortest round-trip representation keeps the header lossless.
            writeln!(
                writer,
                "{:>5} {:>20} {:>20} {:>20}",
                count,
                format!("{:?}", vector.x),
                format!("{:?}", vector.y),
                format!("{:?}", vector.z)
            )?;
        }
        Ok(())
    }

    pub fn read_from(reader: &mut impl BufRead) -> Result<Self, CubeError> {
        let mut lines = reader.lines();
        let mut next_line = |line: usize| -> Result<String, CubeError> {
            lines.next().transpose()?.ok_or_else(|| CubeError::Header {
                line,
                reason: "unexpected end of file".to_string(),
            })
        };

        let comments = [next_line(1)?, next_line(2)?];

        let (atom_count, origin) = parse_count_and_vector(&next_line(3)?, 3)?;
        let atom_count = atom_count.parse::<i64>().map_err(|_| CubeError::Header {
            line: 3,
            reason: format!("invalid atom count '{atom_count}'"),
        })?;

        let mut counts = [0usize; 3];
        let mut voxel_vectors = [Vector3::zeros(); 3];
        for axis in 0..3 {
            let line = axis + 4;
            let (count, vector) = parse_count_and_vector(&next_line(line)?, line)?;
            counts[axis] = count.parse::<usize>().map_err(|_| CubeError::Header {
                line,
                reason: format!("invalid point count '{count}'"),
            })?;
            voxel_vectors[axis] = vector;
        }

        Ok(Self {
            comments,
            atom_count,
            origin,
            counts,
            voxel_vectors,
        })
    }
}

fn parse_count_and_vector(line: &str, line_num: usize) -> Result<(String, Vector3<f64>), CubeError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(CubeError::Header {
            line: line_num,
            reason: format!("expected 4 fields, found {}", fields.len()),
        });
    }
    let mut vector = Vector3::zeros();
    for (i, field) in fields[1..4].iter().enumerate() {
        vector[i] = field.parse::<f64>().map_err(|_| CubeError::Header {
            line: line_num,
            reason: format!("invalid number '{field}'"),
        })?;
    }
    Ok((fields[0].to_string(), vector))
}

/// Formats a value as `±d.dddddE±XX`, the notation used in cube bodies.
pub fn format_scientific(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let formatted = format!("{:.5E}", value);
    match formatted.split_once('E') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}E{sign}{:02}", exponent.abs())
        }
        None => formatted,
    }
}

/// Streaming cube writer.
///
/// Slabs (all points sharing one x-index) must arrive in ascending x order.
/// Energies are given in Kelvin and written in kJ/mol.
pub struct CubeWriter<W: Write> {
    writer: W,
    counts: [usize; 3],
    slabs_written: usize,
}

impl<W: Write> CubeWriter<W> {
    pub fn new(mut writer: W, header: &CubeHeader) -> Result<Self, CubeError> {
        header.write_to(&mut writer)?;
        Ok(Self {
            writer,
            counts: header.counts,
            slabs_written: 0,
        })
    }

    pub fn slabs_written(&self) -> usize {
        self.slabs_written
    }

    pub fn write_slab(&mut self, x_index: usize, energies_kelvin: &[f64]) -> Result<(), CubeError> {
        if x_index != self.slabs_written {
            return Err(CubeError::OutOfOrder {
                expected: self.slabs_written,
                found: x_index,
            });
        }
        let [_, ny, nz] = self.counts;
        if energies_kelvin.len() != ny * nz {
            return Err(CubeError::SlabShape {
                x_index,
                expected: ny * nz,
                found: energies_kelvin.len(),
            });
        }

        if nz > 0 {
            for row in energies_kelvin.chunks(nz) {
                self.write_row(row)?;
            }
        }
        self.slabs_written += 1;
        Ok(())
    }

    fn write_row(&mut self, row: &[f64]) -> Result<(), CubeError> {
        for (k, energy) in row.iter().enumerate() {
            write!(
                self.writer,
                " {:>12}",
                format_scientific(energy * KELVIN_TO_KJ_PER_MOL)
            )?;
            if (k + 1) % VALUES_PER_LINE == 0 || k + 1 == row.len() {
                writeln!(self.writer)?;
            }
        }
        Ok(())
    }

    /// Flushes the output and returns the inner writer.
    ///
    /// # Errors
    ///
    /// Returns [`CubeError::Incomplete`] if fewer than `Nx` slabs were written.
    pub fn finish(mut self) -> Result<W, CubeError> {
        if self.slabs_written != self.counts[0] {
            return Err(CubeError::Incomplete {
                expected: self.counts[0],
                written: self.slabs_written,
            });
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(counts: [usize; 3]) -> CubeHeader {
        let lattice = Lattice::from_parameters(10.0, 12.0, 14.0, 90.0, 90.0, 90.0).unwrap();
        CubeHeader::for_unit_cell(
            ["first comment".to_string(), "second comment".to_string()],
            &lattice,
            counts,
        )
    }

    fn write_constant_grid(counts: [usize; 3], value: f64) -> String {
        let header = header(counts);
        let mut writer = CubeWriter::new(Vec::new(), &header).unwrap();
        for x in 0..counts[0] {
            writer
                .write_slab(x, &vec![value; header.slab_len()])
                .unwrap();
        }
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn format_scientific_uses_signed_two_digit_exponent() {
        assert_eq!(format_scientific(-12.345), "-1.23450E+01");
        assert_eq!(format_scientific(0.0), "0.00000E+00");
        assert_eq!(format_scientific(1.5e-7), "1.50000E-07");
        assert_eq!(format_scientific(2.0e123), "2.00000E+123");
        assert_eq!(format_scientific(f64::INFINITY), "inf");
    }

    #[test]
    fn voxel_vectors_divide_cell_vectors_by_intervals() {
        let header = header([3, 5, 1]);
        assert_eq!(header.voxel_vectors[0], Vector3::new(5.0, 0.0, 0.0));
        assert_eq!(header.voxel_vectors[1], Vector3::new(0.0, 3.0, 0.0));
        assert_eq!(header.voxel_vectors[2], Vector3::new(0.0, 0.0, 14.0));
        assert_eq!(header.atom_count, 0);
        assert_eq!(header.origin, Vector3::zeros());
    }

    #[test]
    fn header_layout_matches_cube_convention() {
        let output = write_constant_grid([2, 2, 2], 0.0);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "first comment");
        assert_eq!(lines[1], "second comment");
        assert_eq!(
            lines[2].split_whitespace().collect::<Vec<_>>(),
            vec!["0", "0.000000", "0.000000", "0.000000"]
        );
        assert_eq!(
            lines[3].split_whitespace().collect::<Vec<_>>(),
            vec!["2", "10.0", "0.0", "0.0"]
        );
    }

    #[test]
    fn header_round_trips_exactly() {
        let lattice = Lattice::from_parameters(8.3, 9.1, 10.7, 81.0, 97.0, 103.0).unwrap();
        let original = CubeHeader::for_unit_cell(
            ["a".to_string(), "b".to_string()],
            &lattice,
            [9, 10, 11],
        );
        let mut buffer = Vec::new();
        original.write_to(&mut buffer).unwrap();

        let parsed = CubeHeader::read_from(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn rows_wrap_every_six_values_and_break_at_row_end() {
        let output = write_constant_grid([1, 2, 8], 1000.0 / 8.314);
        let body: Vec<&str> = output.lines().skip(6).collect();
        let widths: Vec<usize> = body.iter().map(|l| l.split_whitespace().count()).collect();
        assert_eq!(widths, vec![6, 2, 6, 2]);
        assert!(body[0].starts_with("  1.00000E+00"));
    }

    #[test]
    fn row_ending_on_six_values_has_no_blank_line() {
        let output = write_constant_grid([2, 1, 12], -50.0);
        let body: Vec<&str> = output.lines().skip(6).collect();
        assert_eq!(body.len(), 4);
        assert!(body.iter().all(|l| l.split_whitespace().count() == 6));
    }

    #[test]
    fn energies_are_converted_to_kj_per_mol() {
        let output = write_constant_grid([1, 1, 1], -100.0);
        let value: f64 = output.lines().nth(6).unwrap().trim().parse().unwrap();
        assert!((value - (-0.8314)).abs() < 1e-9);
    }

    #[test]
    fn slab_of_wrong_shape_is_rejected() {
        let mut writer = CubeWriter::new(Vec::new(), &header([2, 2, 2])).unwrap();
        assert!(matches!(
            writer.write_slab(0, &[0.0; 3]),
            Err(CubeError::SlabShape {
                expected: 4,
                found: 3,
                ..
            })
        ));
    }

    #[test]
    fn slab_out_of_order_is_rejected() {
        let mut writer = CubeWriter::new(Vec::new(), &header([2, 2, 2])).unwrap();
        assert!(matches!(
            writer.write_slab(1, &[0.0; 4]),
            Err(CubeError::OutOfOrder {
                expected: 0,
                found: 1
            })
        ));
    }

    #[test]
    fn finish_rejects_incomplete_grid() {
        let mut writer = CubeWriter::new(Vec::new(), &header([2, 2, 2])).unwrap();
        writer.write_slab(0, &[0.0; 4]).unwrap();
        assert!(matches!(
            writer.finish(),
            Err(CubeError::Incomplete {
                expected: 2,
                written: 1
            })
        ));
    }

    #[test]
    fn read_from_reports_truncated_header() {
        let result = CubeHeader::read_from(&mut Cursor::new("only\ntwo lines\n"));
        assert!(matches!(result, Err(CubeError::Header { line: 3, .. })));
    }
}
