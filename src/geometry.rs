//! Built-in meshes, as flat triangle lists wound counter-clockwise seen from
//! outside.

/// Extruded letter F: 100 wide, 150 tall, 30 deep, first vertex at the origin
#[rustfmt::skip]
pub const LETTER_F: [f32; 288] = [
    // left column front
    0.0, 0.0, 0.0,      0.0, 150.0, 0.0,    30.0, 0.0, 0.0,
    0.0, 150.0, 0.0,    30.0, 150.0, 0.0,   30.0, 0.0, 0.0,
    // top rung front
    30.0, 0.0, 0.0,     30.0, 30.0, 0.0,    100.0, 0.0, 0.0,
    30.0, 30.0, 0.0,    100.0, 30.0, 0.0,   100.0, 0.0, 0.0,
    // middle rung front
    30.0, 60.0, 0.0,    30.0, 90.0, 0.0,    67.0, 60.0, 0.0,
    30.0, 90.0, 0.0,    67.0, 90.0, 0.0,    67.0, 60.0, 0.0,
    // left column back
    0.0, 0.0, 30.0,     30.0, 0.0, 30.0,    0.0, 150.0, 30.0,
    0.0, 150.0, 30.0,   30.0, 0.0, 30.0,    30.0, 150.0, 30.0,
    // top rung back
    30.0, 0.0, 30.0,    100.0, 0.0, 30.0,   30.0, 30.0, 30.0,
    30.0, 30.0, 30.0,   100.0, 0.0, 30.0,   100.0, 30.0, 30.0,
    // middle rung back
    30.0, 60.0, 30.0,   67.0, 60.0, 30.0,   30.0, 90.0, 30.0,
    30.0, 90.0, 30.0,   67.0, 60.0, 30.0,   67.0, 90.0, 30.0,
    // top
    0.0, 0.0, 0.0,      100.0, 0.0, 0.0,    100.0, 0.0, 30.0,
    0.0, 0.0, 0.0,      100.0, 0.0, 30.0,   0.0, 0.0, 30.0,
    // top rung right
    100.0, 0.0, 0.0,    100.0, 30.0, 0.0,   100.0, 30.0, 30.0,
    100.0, 0.0, 0.0,    100.0, 30.0, 30.0,  100.0, 0.0, 30.0,
    // under top rung
    30.0, 30.0, 0.0,    30.0, 30.0, 30.0,   100.0, 30.0, 30.0,
    30.0, 30.0, 0.0,    100.0, 30.0, 30.0,  100.0, 30.0, 0.0,
    // between top rung and middle
    30.0, 30.0, 0.0,    30.0, 60.0, 30.0,   30.0, 30.0, 30.0,
    30.0, 30.0, 0.0,    30.0, 60.0, 0.0,    30.0, 60.0, 30.0,
    // top of middle rung
    30.0, 60.0, 0.0,    67.0, 60.0, 30.0,   30.0, 60.0, 30.0,
    30.0, 60.0, 0.0,    67.0, 60.0, 0.0,    67.0, 60.0, 30.0,
    // right of middle rung
    67.0, 60.0, 0.0,    67.0, 90.0, 30.0,   67.0, 60.0, 30.0,
    67.0, 60.0, 0.0,    67.0, 90.0, 0.0,    67.0, 90.0, 30.0,
    // bottom of middle rung
    30.0, 90.0, 0.0,    30.0, 90.0, 30.0,   67.0, 90.0, 30.0,
    30.0, 90.0, 0.0,    67.0, 90.0, 30.0,   67.0, 90.0, 0.0,
    // right of bottom
    30.0, 90.0, 0.0,    30.0, 150.0, 30.0,  30.0, 90.0, 30.0,
    30.0, 90.0, 0.0,    30.0, 150.0, 0.0,   30.0, 150.0, 30.0,
    // bottom
    0.0, 150.0, 0.0,    0.0, 150.0, 30.0,   30.0, 150.0, 30.0,
    0.0, 150.0, 0.0,    30.0, 150.0, 30.0,  30.0, 150.0, 0.0,
    // left side
    0.0, 0.0, 0.0,      0.0, 0.0, 30.0,     0.0, 150.0, 30.0,
    0.0, 0.0, 0.0,      0.0, 150.0, 30.0,   0.0, 150.0, 0.0,
];

/// 2000 x 2000 plane at z = 0 facing +z
#[rustfmt::skip]
pub const BACKDROP: [f32; 18] = [
    -1000.0, -1000.0, 0.0,   1000.0, -1000.0, 0.0,   -1000.0, 1000.0, 0.0,
    -1000.0, 1000.0, 0.0,    1000.0, -1000.0, 0.0,   1000.0, 1000.0, 0.0,
];

/// Single point at the origin, placed by its translation
pub const LIGHT_POINT: [f32; 3] = [0.0, 0.0, 0.0];
