use rapier3d::{na::UnitQuaternion, prelude::*};

use crate::physics::ColliderTags;

/// Immutable world collider: a fixed body at `translation`/`rotation` carrying one shape.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Insertion order key.
    pub id: u32,
    pub translation: Vector<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub shape: ColliderShapeDef,
    pub tags: ColliderTags,
}

impl WorldStaticDef {
    pub fn new(id: u32, translation: Vector<f32>, shape: ColliderShapeDef) -> Self {
        Self {
            id,
            translation,
            rotation: UnitQuaternion::identity(),
            shape,
            tags: ColliderTags::empty(),
        }
    }

    pub fn rotated(mut self, rotation: UnitQuaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn tagged(mut self, tags: ColliderTags) -> Self {
        self.tags = tags;
        self
    }
}

#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite half-space whose normal is the body's local +Y.
    Plane {
        /// Offset of the surface along the normal (meters).
        offset_along_normal: f32,
    },

    Cuboid { half_extents: Vector<f32> },

    Sphere { radius: f32 },

    CapsuleY { radius: f32, half_height: f32 },

    CylinderY { radius: f32, half_height: f32 },

    ConeY { radius: f32, half_height: f32 },
}

/// Build the collider for `shape`, in its parent body's local frame.
pub fn collider_from_shape(shape: &ColliderShapeDef) -> ColliderBuilder {
    match shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => ColliderBuilder::halfspace(Vector::y_axis())
            .translation(Vector::y() * *offset_along_normal),
        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),
        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius),
        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius),
        ColliderShapeDef::ConeY {
            radius,
            half_height,
        } => ColliderBuilder::cone(*half_height, *radius),
    }
}

/// Collider for a static definition, with its tags stored in `user_data`.
pub fn collider_from_def(def: &WorldStaticDef) -> Collider {
    collider_from_shape(&def.shape)
        .user_data(def.tags.bits)
        .build()
}
