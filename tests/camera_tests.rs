use glam::{Mat4, Vec3, Vec4};
use shadow_scene::Camera;

#[cfg(test)]
mod camera_view_tests {
    use super::*;

    fn assert_mat_close(a: Mat4, b: Mat4) {
        let (a, b) = (a.to_cols_array(), b.to_cols_array());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-5, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_default_view_is_identity() {
        assert_mat_close(Camera::default().view(), Mat4::IDENTITY);
    }

    #[test]
    fn test_reset_after_moves_is_identity_again() {
        let mut camera = Camera::new();
        camera.move_to(Vec3::new(-50.0, -50.0, -200.0));
        camera.look_at(Vec3::new(10.0, 20.0, -600.0));
        assert!(!camera.view().abs_diff_eq(Mat4::IDENTITY, 1e-3));

        camera.reset();
        assert_mat_close(camera.view(), Mat4::IDENTITY);
    }

    #[test]
    fn test_translated_camera_view_is_inverse_translation() {
        let mut camera = Camera::new();
        let position = Vec3::new(5.0, -3.0, 10.0);
        camera.move_to(position);
        camera.look_at(position + Vec3::new(0.0, 0.0, -1.0));

        assert_mat_close(camera.view(), Mat4::from_translation(-position));
    }

    #[test]
    fn test_view_is_rigid() {
        let mut camera = Camera::new();
        camera.move_to(Vec3::new(30.0, 40.0, 50.0));
        camera.look_at(Vec3::new(-10.0, 0.0, -300.0));
        let view = camera.view();

        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            let length = view.transform_vector3(axis).length();
            assert!((length - 1.0).abs() < 1e-5);
        }
        assert!((view.determinant() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_view_looks_down_negative_z() {
        let mut camera = Camera::new();
        camera.move_to(Vec3::new(100.0, 0.0, 0.0));
        camera.look_at(Vec3::new(100.0, 0.0, -50.0));

        let target = camera.view() * Vec4::new(100.0, 0.0, -50.0, 1.0);
        assert!((target - Vec4::new(0.0, 0.0, -50.0, 1.0)).length() < 1e-4);
    }
}
