mod transform;

pub use transform::{
    calculate_normals, degree_to_radian, radian_to_degree, COMPONENTS, TRIANGLE_STRIDE,
};
