use {
    hecs::{Entity, World},
    nalgebra as na,
    std::fmt::Debug,
};

/// Access to bone transforms owned by the consumer's scene graph.
///
/// Retargeting never owns bones, it only reads and writes them
/// through this capability.
pub trait Transforms {
    type Handle: Copy + Eq + Debug;

    fn world_position(&self, handle: Self::Handle) -> na::Point3<f32>;

    fn set_world_position(
        &mut self,
        handle: Self::Handle,
        position: na::Point3<f32>,
    );

    fn world_rotation(&self, handle: Self::Handle) -> na::UnitQuaternion<f32>;

    fn set_world_rotation(
        &mut self,
        handle: Self::Handle,
        rotation: na::UnitQuaternion<f32>,
    );

    /// Position relative to parent transform.
    fn local_position(&self, handle: Self::Handle) -> na::Point3<f32>;

    fn local_scale(&self, handle: Self::Handle) -> na::Vector3<f32>;

    fn set_local_scale(&mut self, handle: Self::Handle, scale: na::Vector3<f32>);

    /// Effective scale in world space, accumulated over all ancestors.
    fn lossy_scale(&self, handle: Self::Handle) -> na::Vector3<f32>;

    /// Maps point from the transform's local space into world space.
    fn transform_point(
        &self,
        handle: Self::Handle,
        point: &na::Point3<f32>,
    ) -> na::Point3<f32>;
}

/// Transform relative to the parent entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Local3 {
    pub parent: Entity,
    pub iso: na::Isometry3<f32>,
    pub scale: na::Vector3<f32>,
}

impl Local3 {
    pub fn from_iso(parent: Entity, iso: na::Isometry3<f32>) -> Self {
        Local3 {
            parent,
            iso,
            scale: na::Vector3::repeat(1.0),
        }
    }
}

/// World transform. Scale and shear are kept in `skew`
/// expressed in the rotated frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Global3 {
    pub iso: na::Isometry3<f32>,
    pub skew: na::Matrix3<f32>,
}

impl Global3 {
    pub fn identity() -> Self {
        Global3::from_iso(na::Isometry3::identity())
    }

    pub fn from_iso(iso: na::Isometry3<f32>) -> Self {
        Global3 {
            iso,
            skew: na::Matrix3::identity(),
        }
    }

    pub fn append_iso_scale(
        &self,
        iso: &na::Isometry3<f32>,
        scale: &na::Vector3<f32>,
    ) -> Self {
        let total = self.to_homogeneous()
            * iso.to_homogeneous()
            * na::Matrix4::new_nonuniform_scaling(scale);
        let rotation = self.iso.rotation * iso.rotation;
        let inv_rotation = rotation.inverse().to_rotation_matrix();
        let translation = total.column(3).xyz();
        let rotskew = total.remove_column(3).remove_row(3);
        let skew = inv_rotation * rotskew;

        Global3 {
            iso: na::Isometry3 {
                translation: na::Translation3 {
                    vector: translation,
                },
                rotation,
            },
            skew,
        }
    }

    pub fn append_local(&self, local: &Local3) -> Self {
        self.append_iso_scale(&local.iso, &local.scale)
    }

    pub fn to_homogeneous(&self) -> na::Matrix4<f32> {
        self.iso.to_homogeneous() * self.skew.to_homogeneous()
    }

    /// Scale along each local axis, ignoring shear.
    pub fn lossy_scale(&self) -> na::Vector3<f32> {
        self.skew.diagonal()
    }

    pub fn transform_point(&self, point: &na::Point3<f32>) -> na::Point3<f32> {
        let v = self.to_homogeneous() * point.to_homogeneous();
        na::Point3::from_homogeneous(v).unwrap_or_else(na::Point3::origin)
    }
}

/// Bone hierarchy stored in an ECS world.
///
/// Entities with `Local3` are attached to their parent,
/// entities with `Global3` only are roots.
/// World transforms are always derived from the parent chain,
/// so writes are visible immediately.
pub struct Scene {
    pub world: World,
}

impl Default for Scene {
    fn default() -> Self {
        Scene::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Scene {
            world: World::new(),
        }
    }

    pub fn spawn_root(&mut self, iso: na::Isometry3<f32>) -> Entity {
        self.world.spawn((Global3::from_iso(iso),))
    }

    pub fn spawn_child(
        &mut self,
        parent: Entity,
        iso: na::Isometry3<f32>,
    ) -> Entity {
        let local = Local3::from_iso(parent, iso);
        let global = self.global(parent).append_local(&local);
        self.world.spawn((local, global))
    }

    /// Computes world transform of the entity.
    /// Missing entities resolve to identity.
    pub fn global(&self, entity: Entity) -> Global3 {
        if let Ok(local) = self.world.get::<Local3>(entity) {
            let local = *local;
            return self.global(local.parent).append_local(&local);
        }

        match self.world.get::<Global3>(entity) {
            Ok(global) => *global,
            Err(_) => {
                tracing::error!("Entity {:?} is not in scene", entity);
                Global3::identity()
            }
        }
    }

    fn local(&self, entity: Entity) -> Option<Local3> {
        self.world.get::<Local3>(entity).ok().map(|local| *local)
    }

    fn modify_local(&mut self, entity: Entity, f: impl FnOnce(&mut Local3)) {
        if let Ok(mut local) = self.world.get_mut::<Local3>(entity) {
            f(&mut local);
        }
    }

    fn modify_root(&mut self, entity: Entity, f: impl FnOnce(&mut Global3)) {
        match self.world.get_mut::<Global3>(entity) {
            Ok(mut global) => f(&mut global),
            Err(_) => {
                tracing::error!("Entity {:?} is not in scene", entity)
            }
        }
    }

    /// Refreshes cached `Global3` components for renderers.
    /// Entities whose parent is gone are despawned.
    pub fn sync(&mut self) {
        let mut updates = Vec::new();
        let mut despawn = Vec::new();

        for (entity, local) in self.world.query::<&Local3>().iter() {
            if self.world.get::<Global3>(local.parent).is_err() {
                tracing::warn!(
                    "Entity's ({:?}) parent is not in scene and shall be despawned",
                    entity
                );
                despawn.push(entity);
                continue;
            }
            updates.push((entity, self.global(entity)));
        }

        for (entity, global) in updates {
            if let Ok(mut cached) = self.world.get_mut::<Global3>(entity) {
                *cached = global;
            }
        }

        for entity in despawn {
            if self.world.despawn(entity).is_err() {
                tracing::error!("Entity {:?} is not in scene", entity)
            }
        }
    }
}

impl Transforms for Scene {
    type Handle = Entity;

    fn world_position(&self, entity: Entity) -> na::Point3<f32> {
        self.global(entity).iso.translation.vector.into()
    }

    fn set_world_position(
        &mut self,
        entity: Entity,
        position: na::Point3<f32>,
    ) {
        match self.local(entity) {
            Some(local) => {
                let parent = self.global(local.parent).to_homogeneous();
                let local_position = parent
                    .try_inverse()
                    .and_then(|inv| {
                        na::Point3::from_homogeneous(
                            inv * position.to_homogeneous(),
                        )
                    });

                match local_position {
                    Some(p) => self.modify_local(entity, |local| {
                        local.iso.translation.vector = p.coords
                    }),
                    None => tracing::warn!(
                        "Parent of {:?} has degenerate transform",
                        entity
                    ),
                }
            }
            None => self.modify_root(entity, |global| {
                global.iso.translation.vector = position.coords
            }),
        }
    }

    fn world_rotation(&self, entity: Entity) -> na::UnitQuaternion<f32> {
        self.global(entity).iso.rotation
    }

    fn set_world_rotation(
        &mut self,
        entity: Entity,
        rotation: na::UnitQuaternion<f32>,
    ) {
        match self.local(entity) {
            Some(local) => {
                let parent = self.global(local.parent).iso.rotation;
                self.modify_local(entity, |local| {
                    local.iso.rotation = parent.inverse() * rotation
                })
            }
            None => {
                self.modify_root(entity, |global| global.iso.rotation = rotation)
            }
        }
    }

    fn local_position(&self, entity: Entity) -> na::Point3<f32> {
        match self.local(entity) {
            Some(local) => local.iso.translation.vector.into(),
            None => self.world_position(entity),
        }
    }

    fn local_scale(&self, entity: Entity) -> na::Vector3<f32> {
        match self.local(entity) {
            Some(local) => local.scale,
            None => self.global(entity).lossy_scale(),
        }
    }

    fn set_local_scale(&mut self, entity: Entity, scale: na::Vector3<f32>) {
        match self.local(entity) {
            Some(_) => self.modify_local(entity, |local| local.scale = scale),
            None => self.modify_root(entity, |global| {
                global.skew = na::Matrix3::from_diagonal(&scale)
            }),
        }
    }

    fn lossy_scale(&self, entity: Entity) -> na::Vector3<f32> {
        self.global(entity).lossy_scale()
    }

    fn transform_point(
        &self,
        entity: Entity,
        point: &na::Point3<f32>,
    ) -> na::Point3<f32> {
        self.global(entity).transform_point(point)
    }
}
