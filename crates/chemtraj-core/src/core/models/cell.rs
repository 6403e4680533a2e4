use nalgebra::{Matrix3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellShape {
    /// No periodic boundaries; the matrix is all zeros.
    Infinite,
    /// All angles are 90°.
    Orthorhombic,
    Triclinic,
}

const ORTHOGONAL_TOLERANCE: f64 = 1e-6;

/// Periodic boundary description of a frame.
///
/// The cell is stored as a matrix whose columns are the three cell vectors
/// `a`, `b` and `c`, in Angstroms. Lengths and angles (in degrees) are derived
/// from the matrix on demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    matrix: Matrix3<f64>,
}

impl Default for UnitCell {
    fn default() -> Self {
        Self::infinite()
    }
}

impl UnitCell {
    pub fn infinite() -> Self {
        Self {
            matrix: Matrix3::zeros(),
        }
    }

    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Self {
        Self {
            matrix: Matrix3::from_diagonal(&Vector3::new(a, b, c)),
        }
    }

    /// Builds a cell from lengths `[a, b, c]` and angles `[alpha, beta, gamma]`
    /// in degrees, with `a` along x and `b` in the xy plane.
    pub fn triclinic(lengths: [f64; 3], angles: [f64; 3]) -> Self {
        let [a, b, c] = lengths;
        let (cos_alpha, cos_beta) = (angles[0].to_radians().cos(), angles[1].to_radians().cos());
        let (sin_gamma, cos_gamma) = angles[2].to_radians().sin_cos();

        let va = Vector3::new(a, 0.0, 0.0);
        let vb = Vector3::new(b * cos_gamma, b * sin_gamma, 0.0);
        let cx = cos_beta;
        let cy = (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let cz = (1.0 - cx * cx - cy * cy).max(0.0).sqrt();
        let vc = Vector3::new(c * cx, c * cy, c * cz);

        Self {
            matrix: Matrix3::from_columns(&[va, vb, vc]),
        }
    }

    /// Builds a cell from a matrix whose columns are the cell vectors.
    pub fn from_matrix(matrix: Matrix3<f64>) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn lengths(&self) -> [f64; 3] {
        [
            self.matrix.column(0).norm(),
            self.matrix.column(1).norm(),
            self.matrix.column(2).norm(),
        ]
    }

    /// Returns `[alpha, beta, gamma]` in degrees. Degenerate vectors report 90°.
    pub fn angles(&self) -> [f64; 3] {
        let a = self.matrix.column(0).into_owned();
        let b = self.matrix.column(1).into_owned();
        let c = self.matrix.column(2).into_owned();
        [angle_between(&b, &c), angle_between(&a, &c), angle_between(&a, &b)]
    }

    pub fn shape(&self) -> CellShape {
        if self.matrix.iter().all(|&value| value == 0.0) {
            return CellShape::Infinite;
        }
        let orthogonal = self
            .angles()
            .iter()
            .all(|angle| (angle - 90.0).abs() < ORTHOGONAL_TOLERANCE);
        if orthogonal {
            CellShape::Orthorhombic
        } else {
            CellShape::Triclinic
        }
    }

    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }
}

fn angle_between(u: &Vector3<f64>, v: &Vector3<f64>) -> f64 {
    let norms = u.norm() * v.norm();
    if norms == 0.0 {
        return 90.0;
    }
    (u.dot(v) / norms).clamp(-1.0, 1.0).acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn default_cell_is_infinite() {
        let cell = UnitCell::default();
        assert_eq!(cell.shape(), CellShape::Infinite);
        assert_eq!(cell.volume(), 0.0);
        assert_eq!(cell.angles(), [90.0, 90.0, 90.0]);
    }

    #[test]
    fn orthorhombic_cell_reports_lengths_and_right_angles() {
        let cell = UnitCell::orthorhombic(10.0, 20.0, 30.0);
        assert_eq!(cell.shape(), CellShape::Orthorhombic);
        assert_eq!(cell.lengths(), [10.0, 20.0, 30.0]);
        assert_close(cell.volume(), 6000.0);
        for angle in cell.angles() {
            assert_close(angle, 90.0);
        }
    }

    #[test]
    fn triclinic_cell_round_trips_lengths_and_angles() {
        let cell = UnitCell::triclinic([10.0, 11.0, 12.0], [80.0, 95.0, 110.0]);
        assert_eq!(cell.shape(), CellShape::Triclinic);
        let lengths = cell.lengths();
        let angles = cell.angles();
        assert_close(lengths[0], 10.0);
        assert_close(lengths[1], 11.0);
        assert_close(lengths[2], 12.0);
        assert_close(angles[0], 80.0);
        assert_close(angles[1], 95.0);
        assert_close(angles[2], 110.0);
    }

    #[test]
    fn triclinic_with_right_angles_is_orthorhombic() {
        let cell = UnitCell::triclinic([5.0, 6.0, 7.0], [90.0, 90.0, 90.0]);
        assert_eq!(cell.shape(), CellShape::Orthorhombic);
    }

    #[test]
    fn from_matrix_keeps_columns_as_cell_vectors() {
        let matrix = Matrix3::new(2.0, 1.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 4.0);
        let cell = UnitCell::from_matrix(matrix);
        assert_eq!(cell.matrix(), &matrix);
        assert_close(cell.lengths()[1], (1.0f64 + 9.0).sqrt());
    }
}
