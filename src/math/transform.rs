use glam::Vec3;

use crate::core::{Error, Result};

/// Floats per vertex position or normal
pub const COMPONENTS: usize = 3;

/// Floats per triangle (three points of three components)
pub const TRIANGLE_STRIDE: usize = COMPONENTS * 3;

pub fn degree_to_radian(angle: f32) -> f32 {
    angle * std::f32::consts::PI / 180.0
}

pub fn radian_to_degree(angle: f32) -> f32 {
    angle * 180.0 / std::f32::consts::PI
}

/// Flat per-triangle normals for a triangle list.
///
/// Each group of nine floats is read as points A, B and C. The normal
/// `normalize(AB x AC)` is emitted once per vertex, so the result has the
/// same length as the input and can be uploaded alongside it.
///
/// Degenerate triangles yield NaN normals.
pub fn calculate_normals(vertices: &[f32]) -> Result<Vec<f32>> {
    if vertices.len() % TRIANGLE_STRIDE != 0 {
        return Err(Error::InvalidVertexData {
            len: vertices.len(),
            multiple: TRIANGLE_STRIDE,
        });
    }

    let normals = vertices
        .chunks_exact(TRIANGLE_STRIDE)
        .flat_map(|triangle| {
            let a = Vec3::from_slice(&triangle[0..3]);
            let b = Vec3::from_slice(&triangle[3..6]);
            let c = Vec3::from_slice(&triangle[6..9]);
            let normal = (b - a).cross(c - a).normalize();
            std::iter::repeat(normal.to_array()).take(3).flatten()
        })
        .collect();

    Ok(normals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degree_to_radian_known_values() {
        assert!((degree_to_radian(180.0) - std::f32::consts::PI).abs() < 1e-6);
        assert!((degree_to_radian(90.0) - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(degree_to_radian(0.0), 0.0);
    }

    #[test]
    fn test_radian_to_degree_known_values() {
        assert!((radian_to_degree(std::f32::consts::PI) - 180.0).abs() < 1e-4);
        assert!((radian_to_degree(-std::f32::consts::FRAC_PI_2) + 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_normals_of_xy_triangle_point_up_z() {
        let vertices = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let normals = calculate_normals(&vertices).unwrap();

        assert_eq!(normals.len(), 9);
        for normal in normals.chunks_exact(3) {
            assert_eq!(normal, &[0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_normals_follow_winding() {
        // Same triangle, B and C swapped
        let vertices = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let normals = calculate_normals(&vertices).unwrap();
        assert_eq!(&normals[0..3], &[0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_normals_reject_partial_triangle() {
        let vertices = [0.0; 12];
        let result = calculate_normals(&vertices);
        assert!(matches!(
            result,
            Err(Error::InvalidVertexData { len: 12, multiple: 9 })
        ));
    }

    #[test]
    fn test_normals_of_empty_buffer() {
        assert!(calculate_normals(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_degenerate_triangle_gives_nan() {
        let vertices = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let normals = calculate_normals(&vertices).unwrap();
        assert!(normals.iter().all(|n| n.is_nan()));
    }
}
