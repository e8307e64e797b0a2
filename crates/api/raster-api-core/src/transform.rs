//! Decomposed 2D transform.
//!
//! Transforms are stored as independent position/size/anchor/angle components so that
//! keyframe blending can interpolate each component on its own and recombine afterwards.
//! Blending a composed matrix directly would shear and shrink during rotations.

use serde::{Deserialize, Serialize};

/// Row-major affine 3x3 matrix; the last row is always `[0, 0, 1]`.
pub type Mat3 = [[f32; 3]; 3];

const IDENTITY: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Transform2D {
    pub position: [f32; 2],
    pub size: [f32; 2],
    pub anchor: [f32; 2],
    /// Rotation in degrees.
    pub angle: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<Transform2D>>,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0],
            size: [1.0, 1.0],
            anchor: [0.0, 0.0],
            angle: 0.0,
            parent: None,
        }
    }
}

fn mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [[0.0f32; 3]; 3];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = a[r][0] * b[0][c] + a[r][1] * b[1][c] + a[r][2] * b[2][c];
        }
    }
    out
}

fn translation(t: [f32; 2]) -> Mat3 {
    [[1.0, 0.0, t[0]], [0.0, 1.0, t[1]], [0.0, 0.0, 1.0]]
}

fn rotation(degrees: f32) -> Mat3 {
    let (s, c) = degrees.to_radians().sin_cos();
    [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]]
}

fn scale(s: [f32; 2]) -> Mat3 {
    [[s[0], 0.0, 0.0], [0.0, s[1], 0.0], [0.0, 0.0, 1.0]]
}

impl Transform2D {
    pub fn new(position: [f32; 2], size: [f32; 2], anchor: [f32; 2], angle: f32) -> Self {
        Self {
            position,
            size,
            anchor,
            angle,
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: Transform2D) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Matrix of this transform alone: `T(position) * R(angle) * S(size) * T(-anchor)`.
    pub fn local_matrix(&self) -> Mat3 {
        let m = mul(&translation(self.position), &rotation(self.angle));
        let m = mul(&m, &scale(self.size));
        mul(&m, &translation([-self.anchor[0], -self.anchor[1]]))
    }

    /// Matrix including the whole parent chain.
    pub fn matrix(&self) -> Mat3 {
        match &self.parent {
            Some(parent) => mul(&parent.matrix(), &self.local_matrix()),
            None => self.local_matrix(),
        }
    }

    pub fn transform_point(&self, point: [f32; 2]) -> [f32; 2] {
        let m = self.matrix();
        [
            m[0][0] * point[0] + m[0][1] * point[1] + m[0][2],
            m[1][0] * point[0] + m[1][1] * point[1] + m[1][2],
        ]
    }

    pub fn is_identity(&self) -> bool {
        self.matrix() == IDENTITY
    }
}
