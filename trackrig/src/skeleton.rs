use {
    crate::{joint::JointId, scene::Scene},
    hecs::Entity,
    nalgebra as na,
    std::convert::TryFrom,
};

#[derive(Debug, thiserror::Error)]
pub enum SkeletonError {
    #[error("Bone {index} references parent {parent} that is not declared before it")]
    ParentOrder { index: usize, parent: usize },
}

/// Tree-like structure of bones in rest pose.
/// Parents are always declared before their children.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(try_from = "Vec<Bone>")]
pub struct Skeleton {
    bones: Box<[Bone]>,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Bone {
    /// Tracked joint driving this bone, if any.
    #[serde(default)]
    pub joint: Option<JointId>,
    #[serde(default)]
    pub parent: Option<usize>,
    pub translation: na::Vector3<f32>,
    #[serde(default = "default_rotation")]
    pub rotation: na::UnitQuaternion<f32>,
}

fn default_rotation() -> na::UnitQuaternion<f32> {
    na::UnitQuaternion::identity()
}

impl TryFrom<Vec<Bone>> for Skeleton {
    type Error = SkeletonError;

    fn try_from(bones: Vec<Bone>) -> Result<Self, SkeletonError> {
        Skeleton::new(bones)
    }
}

impl Skeleton {
    pub fn new(bones: Vec<Bone>) -> Result<Self, SkeletonError> {
        for (index, bone) in bones.iter().enumerate() {
            match bone.parent {
                Some(parent) if parent >= index => {
                    return Err(SkeletonError::ParentOrder { index, parent })
                }
                _ => {}
            }
        }
        Ok(Skeleton {
            bones: bones.into_boxed_slice(),
        })
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Spawns bones under `origin` and returns entities in bone order.
    pub fn spawn(
        &self,
        scene: &mut Scene,
        origin: Entity,
    ) -> Result<Vec<Entity>, SkeletonError> {
        let mut entities = Vec::with_capacity(self.bones.len());
        for (index, bone) in self.bones.iter().enumerate() {
            let parent = match bone.parent {
                None => origin,
                Some(parent) => *entities
                    .get(parent)
                    .ok_or(SkeletonError::ParentOrder { index, parent })?,
            };
            let iso = na::Isometry3::from_parts(
                na::Translation3::from(bone.translation),
                bone.rotation,
            );
            entities.push(scene.spawn_child(parent, iso));
        }
        Ok(entities)
    }

    /// Pairs of tracked joints and their spawned bones.
    pub fn bindings<'a>(
        &'a self,
        entities: &'a [Entity],
    ) -> impl Iterator<Item = (JointId, Entity)> + 'a {
        self.bones
            .iter()
            .zip(entities)
            .filter_map(|(bone, &entity)| Some((bone.joint?, entity)))
    }
}
