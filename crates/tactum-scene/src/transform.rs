//! 2D affine transforms for local/global conversion.
//!
//! A node's local transform is translate(position) ∘ rotate(rotation) ∘
//! scale(scale); the global transform is the parent's global transform
//! composed with the local one. Rotation is counter-clockwise, in radians,
//! around the node's origin (its top-left corner).

use tactum_geometry::Point;

/// Row-major 2×3 affine transform: `[xx xy tx; yx yy ty]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
    pub xx: f32,
    pub xy: f32,
    pub yx: f32,
    pub yy: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        xx: 1.0,
        xy: 0.0,
        yx: 0.0,
        yy: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Builds a node's local transform from its position, rotation, and scale.
    pub fn from_parts(position: Point, rotation: f32, scale: Point) -> Self {
        let (sin, cos) = rotation.sin_cos();
        Affine {
            xx: cos * scale.x,
            xy: -sin * scale.y,
            yx: sin * scale.x,
            yy: cos * scale.y,
            tx: position.x,
            ty: position.y,
        }
    }

    /// `self ∘ other`: applies `other` first, then `self`.
    pub fn then(&self, other: &Affine) -> Affine {
        Affine {
            xx: self.xx * other.xx + self.xy * other.yx,
            xy: self.xx * other.xy + self.xy * other.yy,
            yx: self.yx * other.xx + self.yy * other.yx,
            yy: self.yx * other.xy + self.yy * other.yy,
            tx: self.xx * other.tx + self.xy * other.ty + self.tx,
            ty: self.yx * other.tx + self.yy * other.ty + self.ty,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point {
            x: self.xx * p.x + self.xy * p.y + self.tx,
            y: self.yx * p.x + self.yy * p.y + self.ty,
        }
    }

    /// Applies only the linear part, for direction vectors.
    pub fn apply_vector(&self, v: Point) -> Point {
        Point {
            x: self.xx * v.x + self.xy * v.y,
            y: self.yx * v.x + self.yy * v.y,
        }
    }

    /// Returns `None` when the transform is degenerate (zero scale).
    pub fn try_invert(&self) -> Option<Affine> {
        let det = self.xx * self.yy - self.xy * self.yx;
        if det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;
        let xx = self.yy * inv_det;
        let xy = -self.xy * inv_det;
        let yx = -self.yx * inv_det;
        let yy = self.xx * inv_det;
        Some(Affine {
            xx,
            xy,
            yx,
            yy,
            tx: -(xx * self.tx + xy * self.ty),
            ty: -(yx * self.tx + yy * self.ty),
        })
    }
}
