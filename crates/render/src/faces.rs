//! Cube faces and the fixed per-face vertex table.
//!
//! Face order is load-bearing: index `i` of a [`FaceSet`] is drawn with
//! `FACE_TABLE[i]`. Positions are cube-local (every coordinate is ±1) and
//! are given before the 180° X flip the skybox applies, so the `-Y` face ends
//! up on top.

use crate::error::RenderError;
use glam::{Vec2, Vec3};
use panorama_common::TextureId;
use serde::{Deserialize, Serialize};

pub const FACE_COUNT: usize = 6;

/// Semantic name of each face index, as seen after the skybox flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Face {
    Front = 0,
    Right = 1,
    Back = 2,
    Left = 3,
    Top = 4,
    Bottom = 5,
}

impl Face {
    pub const ALL: [Face; FACE_COUNT] = [
        Face::Front,
        Face::Right,
        Face::Back,
        Face::Left,
        Face::Top,
        Face::Bottom,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Cube-local outward axis of this face (before the flip).
    pub fn axis(self) -> Vec3 {
        match self {
            Face::Front => Vec3::Z,
            Face::Right => Vec3::X,
            Face::Back => Vec3::NEG_Z,
            Face::Left => Vec3::NEG_X,
            Face::Top => Vec3::NEG_Y,
            Face::Bottom => Vec3::Y,
        }
    }
}

/// One corner of a face quad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceCorner {
    pub position: Vec3,
    pub uv: Vec2,
}

const fn corner(x: f32, y: f32, z: f32, u: f32, v: f32) -> FaceCorner {
    FaceCorner {
        position: Vec3::new(x, y, z),
        uv: Vec2::new(u, v),
    }
}

/// UV corners in emission order, shared by every face.
pub const UV_ORDER: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(1.0, 0.0),
];

/// Corner positions and UVs per face index, in emission order.
///
/// Every quad winds so its triangle normals point at the cube centre: the
/// faces are front-facing for a viewer inside the cube.
#[rustfmt::skip]
pub const FACE_TABLE: [[FaceCorner; 4]; FACE_COUNT] = [
    // 0: front, z = +1
    [corner(-1.0, -1.0,  1.0, 0.0, 0.0), corner(-1.0,  1.0,  1.0, 0.0, 1.0),
     corner( 1.0,  1.0,  1.0, 1.0, 1.0), corner( 1.0, -1.0,  1.0, 1.0, 0.0)],
    // 1: right, x = +1
    [corner( 1.0, -1.0,  1.0, 0.0, 0.0), corner( 1.0,  1.0,  1.0, 0.0, 1.0),
     corner( 1.0,  1.0, -1.0, 1.0, 1.0), corner( 1.0, -1.0, -1.0, 1.0, 0.0)],
    // 2: back, z = -1
    [corner( 1.0, -1.0, -1.0, 0.0, 0.0), corner( 1.0,  1.0, -1.0, 0.0, 1.0),
     corner(-1.0,  1.0, -1.0, 1.0, 1.0), corner(-1.0, -1.0, -1.0, 1.0, 0.0)],
    // 3: left, x = -1
    [corner(-1.0, -1.0, -1.0, 0.0, 0.0), corner(-1.0,  1.0, -1.0, 0.0, 1.0),
     corner(-1.0,  1.0,  1.0, 1.0, 1.0), corner(-1.0, -1.0,  1.0, 1.0, 0.0)],
    // 4: top after the flip, y = -1
    [corner(-1.0, -1.0, -1.0, 0.0, 0.0), corner(-1.0, -1.0,  1.0, 0.0, 1.0),
     corner( 1.0, -1.0,  1.0, 1.0, 1.0), corner( 1.0, -1.0, -1.0, 1.0, 0.0)],
    // 5: bottom after the flip, y = +1
    [corner(-1.0,  1.0,  1.0, 0.0, 0.0), corner(-1.0,  1.0, -1.0, 0.0, 1.0),
     corner( 1.0,  1.0, -1.0, 1.0, 1.0), corner( 1.0,  1.0,  1.0, 1.0, 0.0)],
];

/// The six textures of a cube, indexed by [`Face`].
///
/// Construction does not check the length; drawing does, so a malformed set
/// is rejected before any render state changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceSet {
    faces: Vec<TextureId>,
}

impl FaceSet {
    pub fn new(faces: Vec<TextureId>) -> Self {
        Self { faces }
    }

    /// `{prefix}_0.png` through `{prefix}_5.png`.
    pub fn panorama(prefix: &str) -> Self {
        Self {
            faces: (0..FACE_COUNT)
                .map(|i| TextureId(format!("{prefix}_{i}.png")))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn get(&self, face: Face) -> Option<&TextureId> {
        self.faces.get(face.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextureId> {
        self.faces.iter()
    }

    /// Borrow the six faces, or fail with [`RenderError::InvalidFaceSet`].
    pub fn validated(&self) -> Result<&[TextureId; FACE_COUNT], RenderError> {
        self.faces
            .as_slice()
            .try_into()
            .map_err(|_| RenderError::InvalidFaceSet(self.faces.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
        (b - a).cross(c - a)
    }

    #[test]
    fn every_face_is_planar_on_its_axis() {
        for face in Face::ALL {
            let axis = face.axis();
            for c in &FACE_TABLE[face.index()] {
                assert_eq!(c.position.dot(axis), 1.0, "{face:?}");
                assert!(c.position.abs().cmpeq(Vec3::ONE).all());
            }
        }
    }

    #[test]
    fn every_face_winds_toward_the_centre() {
        for face in Face::ALL {
            let [a, b, c, d] = FACE_TABLE[face.index()].map(|c| c.position);
            let n1 = triangle_normal(a, b, c);
            let n2 = triangle_normal(a, c, d);
            // Signed area against the outward axis: negative means the quad
            // faces the inside of the cube.
            assert!(n1.dot(face.axis()) < 0.0, "{face:?} first triangle");
            assert!(n2.dot(face.axis()) < 0.0, "{face:?} second triangle");
            assert_eq!(n1.normalize(), n2.normalize(), "{face:?} non-planar");
        }
    }

    #[test]
    fn uvs_follow_the_shared_order() {
        for corners in &FACE_TABLE {
            let uvs: Vec<Vec2> = corners.iter().map(|c| c.uv).collect();
            assert_eq!(uvs, UV_ORDER);
        }
    }

    #[test]
    fn uv_edges_track_position_edges() {
        // Adjacent corners differ in exactly one UV axis and one position
        // axis, so the texture is neither skewed nor mirrored diagonally.
        for corners in &FACE_TABLE {
            for i in 0..4 {
                let a = corners[i];
                let b = corners[(i + 1) % 4];
                let duv = (b.uv - a.uv).abs();
                let dpos = (b.position - a.position).abs();
                assert_eq!(duv.x + duv.y, 1.0);
                assert_eq!(dpos.x + dpos.y + dpos.z, 2.0);
            }
        }
    }

    #[test]
    fn panorama_names_faces_in_order() {
        let set = FaceSet::panorama("title/panorama");
        assert_eq!(set.len(), FACE_COUNT);
        assert_eq!(set.get(Face::Front), Some(&TextureId::from("title/panorama_0.png")));
        assert_eq!(set.get(Face::Bottom), Some(&TextureId::from("title/panorama_5.png")));
    }

    #[test]
    fn validated_rejects_wrong_length() {
        let short = FaceSet::new(vec![TextureId::from("a"); 5]);
        assert_eq!(short.validated(), Err(RenderError::InvalidFaceSet(5)));
        let long = FaceSet::new(vec![TextureId::from("a"); 7]);
        assert_eq!(long.validated(), Err(RenderError::InvalidFaceSet(7)));
        assert!(FaceSet::panorama("p").validated().is_ok());
    }
}
