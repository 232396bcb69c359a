use {
    crate::{
        frame::{Mirroring, SkeletonFrame},
        joint::{JointId, JointMap, JointMask},
        scene::Transforms,
        space::WorkingSpace,
        topology::Topology,
    },
    nalgebra as na,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("Joint `{joint}` is bound to more than one bone")]
    DuplicateJoint { joint: JointId },

    #[error("Retarget root bone is the working space transform")]
    RootIsSpaceTransform,

    #[error("Root joint `{joint}` is not bound to any bone")]
    MissingRoot { joint: JointId },
}

/// Per-frame retargeting settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ApplyOptions {
    /// Samples with confidence at or below this value are ignored.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Place every joint at its tracked position
    /// and stretch parent bones to the tracked limb length.
    #[serde(default)]
    pub rescale_bone_length: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        ApplyOptions {
            confidence_threshold: default_confidence_threshold(),
            rescale_bone_length: false,
        }
    }
}

fn default_confidence_threshold() -> f32 {
    0.01
}

/// Bone bound to a tracked joint, captured at bind time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundJoint<H> {
    joint: JointId,
    bone: H,
    base_offset: na::UnitQuaternion<f32>,
    parent: Option<usize>,
    base_distance: f32,
}

impl<H> BoundJoint<H>
where
    H: Copy,
{
    pub fn joint(&self) -> JointId {
        self.joint
    }

    pub fn bone(&self) -> H {
        self.bone
    }

    /// Rest-pose rotation of the bone relative to the working space.
    pub fn base_offset(&self) -> na::UnitQuaternion<f32> {
        self.base_offset
    }

    /// Index of the bound topological parent in `RetargetRig::joints`.
    /// `None` when the parent joint has no bone.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Rest-pose distance to the parent bone, zero without parent.
    pub fn base_distance(&self) -> f32 {
        self.base_distance
    }
}

/// Collects bones before binding.
#[derive(Clone, Debug)]
pub struct RigBuilder<H> {
    origin: H,
    space_reference: Option<H>,
    mirror_aware: bool,
    bones: Vec<(JointId, H)>,
}

impl<H> RigBuilder<H>
where
    H: Copy + Eq + std::fmt::Debug,
{
    pub fn new(origin: H) -> Self {
        RigBuilder {
            origin,
            space_reference: None,
            mirror_aware: false,
            bones: Vec::new(),
        }
    }

    /// Externally designated sensor space.
    pub fn with_space_reference(mut self, reference: Option<H>) -> Self {
        self.space_reference = reference;
        self
    }

    pub fn with_mirror_aware(mut self, mirror_aware: bool) -> Self {
        self.mirror_aware = mirror_aware;
        self
    }

    pub fn with_bone(mut self, joint: JointId, bone: H) -> Self {
        self.bones.push((joint, bone));
        self
    }

    pub fn with_bones<I>(mut self, bones: I) -> Self
    where
        I: IntoIterator<Item = (JointId, H)>,
    {
        self.bones.extend(bones);
        self
    }

    /// Captures rest pose of the bones.
    /// Either the whole rig is bound or an error is returned.
    #[tracing::instrument(skip(self, transforms), fields(bones = self.bones.len()))]
    pub fn bind<T>(
        self,
        transforms: &T,
        root: JointId,
        mirroring: Mirroring,
    ) -> Result<RetargetRig<H>, BindError>
    where
        T: Transforms<Handle = H>,
    {
        let topology = Topology::standard();
        let space = WorkingSpace::new(self.origin, self.space_reference);

        let swap = self.mirror_aware && mirroring.is_mirrored();
        let resolve = |joint: JointId| {
            if swap {
                topology.mirror(joint)
            } else {
                joint
            }
        };

        let mut lookup = JointMap::<Option<usize>>::default();
        let mut resolved = Vec::with_capacity(self.bones.len());
        for &(joint, bone) in &self.bones {
            let joint = resolve(joint);
            if lookup[joint].is_some() {
                return Err(BindError::DuplicateJoint { joint });
            }
            lookup[joint] = Some(resolved.len());
            resolved.push((joint, bone));
        }

        let root_joint = resolve(root);
        let root = lookup[root_joint]
            .ok_or(BindError::MissingRoot { joint: root_joint })?;
        let root_bone = resolved[root].1;
        if root_bone == space.handle() {
            return Err(BindError::RootIsSpaceTransform);
        }

        let inv_space = space.rotation(transforms).inverse();

        let joints = resolved
            .iter()
            .map(|&(joint, bone)| {
                let base_offset = inv_space * transforms.world_rotation(bone);

                let parent = match topology.parent(joint) {
                    JointId::None => None,
                    parent => lookup[parent],
                };
                let base_distance = match parent {
                    Some(parent) => {
                        let parent_bone = resolved[parent].1;
                        na::distance(
                            &transforms.world_position(bone),
                            &transforms.world_position(parent_bone),
                        )
                    }
                    None => 0.0,
                };

                BoundJoint {
                    joint,
                    bone,
                    base_offset,
                    parent,
                    base_distance,
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "Bound {} joints, root `{}`, mirrored ids: {}",
            joints.len(),
            root_joint,
            swap,
        );

        Ok(RetargetRig {
            joints,
            lookup,
            root,
            space,
            initial_root_local: transforms.local_position(root_bone),
            degenerate: JointMask::empty(),
        })
    }
}

/// Target bone hierarchy driven by tracked skeleton frames.
#[derive(Debug)]
pub struct RetargetRig<H> {
    joints: Vec<BoundJoint<H>>,
    lookup: JointMap<Option<usize>>,
    root: usize,
    space: WorkingSpace<H>,
    initial_root_local: na::Point3<f32>,

    /// Joints already reported for degenerate limb length.
    degenerate: JointMask,
}

impl<H> RetargetRig<H>
where
    H: Copy + Eq + std::fmt::Debug,
{
    pub fn builder(origin: H) -> RigBuilder<H> {
        RigBuilder::new(origin)
    }

    pub fn joints(&self) -> &[BoundJoint<H>] {
        &self.joints
    }

    pub fn joint(&self, joint: JointId) -> Option<&BoundJoint<H>> {
        self.lookup[joint].map(|index| &self.joints[index])
    }

    pub fn root(&self) -> &BoundJoint<H> {
        &self.joints[self.root]
    }

    pub fn space(&self) -> &WorkingSpace<H> {
        &self.space
    }

    /// Drives bound bones from the frame.
    ///
    /// Root position follows the tracked root regardless of its confidence
    /// unless bone lengths are rescaled. Joints without confident samples
    /// keep their last pose.
    pub fn apply<T>(
        &mut self,
        transforms: &mut T,
        frame: &SkeletonFrame,
        mirroring: Mirroring,
        options: &ApplyOptions,
    ) where
        T: Transforms<Handle = H>,
    {
        if frame.is_empty() {
            tracing::trace!("Frame of subject {} is empty", frame.subject);
            return;
        }

        let space_rotation = self.space.rotation(transforms);

        if !options.rescale_bone_length {
            let root = self.joints[self.root];
            if let Some(sample) = frame.get(root.joint) {
                let position = self.space.to_world(transforms, &sample.position);
                transforms.set_world_position(root.bone, position);
            }
        }

        let mut skipped = 0;
        for index in 0..self.joints.len() {
            let joint = self.joints[index];
            let sample = match frame.get(joint.joint) {
                Some(sample)
                    if sample.confidence > options.confidence_threshold =>
                {
                    sample
                }
                _ => {
                    skipped += 1;
                    continue;
                }
            };

            let orientation = if mirroring.is_mirrored() {
                sample.reflected_orientation()
            } else {
                sample.orientation
            };

            transforms.set_world_rotation(
                joint.bone,
                space_rotation * (orientation * joint.base_offset),
            );

            if options.rescale_bone_length {
                let position = self.space.to_world(transforms, &sample.position);
                transforms.set_world_position(joint.bone, position);

                match joint.parent {
                    Some(parent) if parent != self.root => {
                        self.rescale_parent(transforms, &joint, parent, position)
                    }
                    _ => {}
                }
            }
        }

        tracing::trace!(
            "Applied frame of subject {}, {} joints held",
            frame.subject,
            skipped
        );
    }

    fn rescale_parent<T>(
        &mut self,
        transforms: &mut T,
        joint: &BoundJoint<H>,
        parent: usize,
        position: na::Point3<f32>,
    ) where
        T: Transforms<Handle = H>,
    {
        let parent_bone = self.joints[parent].bone;
        let current =
            na::distance(&position, &transforms.world_position(parent_bone));
        let factor = joint.base_distance / current;

        if !(factor.is_finite() && factor > 0.0) {
            if self.degenerate.insert(joint.joint) {
                tracing::warn!(
                    "Degenerate bone length for joint `{}`, rescale skipped",
                    joint.joint
                );
            }
            return;
        }

        let mut scale = na::Vector3::repeat(1.0 / factor);
        transforms.set_local_scale(parent_bone, scale);

        let correction = scale.x / transforms.lossy_scale(parent_bone).x;
        if correction.is_finite() {
            scale *= correction;
            transforms.set_local_scale(parent_bone, scale);
        }
    }

    /// Recalibration subscriber. Shifts pivot so the root returns
    /// to its bind-time place along forward and vertical axes.
    pub fn on_calibration_succeeded<T>(
        &mut self,
        transforms: &T,
        rotation: na::UnitQuaternion<f32>,
    ) where
        T: Transforms<Handle = H>,
    {
        let current = transforms.local_position(self.root().bone);
        self.space.recenter(self.initial_root_local, current);

        tracing::debug!(
            "Calibrated with rotation {:?}, pivot offset {:?}",
            rotation.euler_angles(),
            self.space.pivot()
        );
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{frame::JointSample, scene::Scene},
        hecs::Entity,
    };

    struct Chain {
        scene: Scene,
        origin: Entity,
        waist: Entity,
        hip: Entity,
        knee: Entity,
    }

    fn chain() -> Chain {
        chain_at(na::Isometry3::identity())
    }

    fn chain_at(placement: na::Isometry3<f32>) -> Chain {
        let mut scene = Scene::new();
        let origin = scene.spawn_root(placement);
        let waist =
            scene.spawn_child(origin, na::Isometry3::translation(0.0, 1.0, 0.0));
        let hip =
            scene.spawn_child(waist, na::Isometry3::translation(-0.1, 0.0, 0.0));
        let knee =
            scene.spawn_child(hip, na::Isometry3::translation(0.0, -0.4, 0.0));
        Chain {
            scene,
            origin,
            waist,
            hip,
            knee,
        }
    }

    fn bind(chain: &Chain) -> RetargetRig<Entity> {
        RetargetRig::builder(chain.origin)
            .with_bone(JointId::Waist, chain.waist)
            .with_bone(JointId::LeftHip, chain.hip)
            .with_bone(JointId::LeftKnee, chain.knee)
            .bind(&chain.scene, JointId::Waist, Mirroring::Direct)
            .unwrap()
    }

    fn sample(joint: JointId, x: f32, y: f32, confidence: f32) -> JointSample {
        JointSample::new(
            joint,
            na::Point3::new(x, y, 0.0),
            na::UnitQuaternion::identity(),
            confidence,
        )
    }

    #[test]
    fn bind_records_rest_distances() {
        let chain = chain();
        let rig = bind(&chain);

        let hip = rig.joint(JointId::LeftHip).unwrap();
        let knee = rig.joint(JointId::LeftKnee).unwrap();
        assert_eq!(rig.root().joint(), JointId::Waist);
        assert_eq!(hip.parent(), Some(0));
        assert_eq!(knee.parent(), Some(1));
        assert!((hip.base_distance() - 0.1).abs() < 1e-6);
        assert!((knee.base_distance() - 0.4).abs() < 1e-6);
        assert_eq!(rig.root().parent(), None);
    }

    #[test]
    fn bind_is_deterministic() {
        let chain = chain();
        let a = bind(&chain);
        let b = bind(&chain);
        assert_eq!(a.joints(), b.joints());
    }

    #[test]
    fn duplicate_joint_rejected() {
        let chain = chain();
        let err = RetargetRig::builder(chain.origin)
            .with_bone(JointId::Waist, chain.waist)
            .with_bone(JointId::LeftHip, chain.hip)
            .with_bone(JointId::LeftHip, chain.knee)
            .bind(&chain.scene, JointId::Waist, Mirroring::Direct)
            .unwrap_err();
        assert_eq!(
            err,
            BindError::DuplicateJoint {
                joint: JointId::LeftHip
            }
        );
    }

    #[test]
    fn mirrored_ids_resolved_at_bind() {
        let chain = chain();
        let direct = RetargetRig::builder(chain.origin)
            .with_mirror_aware(true)
            .with_bone(JointId::Waist, chain.waist)
            .with_bone(JointId::LeftHip, chain.hip)
            .bind(&chain.scene, JointId::Waist, Mirroring::Direct)
            .unwrap();
        assert_eq!(direct.joint(JointId::LeftHip).unwrap().bone(), chain.hip);

        let rig = RetargetRig::builder(chain.origin)
            .with_mirror_aware(true)
            .with_bone(JointId::Waist, chain.waist)
            .with_bone(JointId::LeftHip, chain.hip)
            .bind(&chain.scene, JointId::Waist, Mirroring::Mirrored)
            .unwrap();
        assert!(rig.joint(JointId::LeftHip).is_none());
        assert_eq!(rig.joint(JointId::RightHip).unwrap().bone(), chain.hip);
    }

    #[test]
    fn root_cannot_be_space() {
        let chain = chain();
        let err = RetargetRig::builder(chain.origin)
            .with_space_reference(Some(chain.waist))
            .with_bone(JointId::Waist, chain.waist)
            .bind(&chain.scene, JointId::Waist, Mirroring::Direct)
            .unwrap_err();
        assert_eq!(err, BindError::RootIsSpaceTransform);

        let err = RetargetRig::builder(chain.origin)
            .with_bone(JointId::LeftHip, chain.hip)
            .bind(&chain.scene, JointId::Waist, Mirroring::Direct)
            .unwrap_err();
        assert_eq!(
            err,
            BindError::MissingRoot {
                joint: JointId::Waist
            }
        );
    }

    #[test]
    fn two_bone_chain_rescale() {
        let mut chain = chain();
        let mut rig = bind(&chain);

        // Source space is turned around, so positive x lands on the left.
        let frame = SkeletonFrame::from_samples(
            0,
            vec![
                sample(JointId::Waist, 0.0, 1.0, 1.0),
                sample(JointId::LeftHip, 0.1, 1.0, 1.0),
                sample(JointId::LeftKnee, 0.1, 0.8, 1.0),
            ],
        );
        let options = ApplyOptions {
            confidence_threshold: 0.5,
            rescale_bone_length: true,
        };
        rig.apply(&mut chain.scene, &frame, Mirroring::Direct, &options);

        // factor = 0.40 / 0.20 = 2.0, stored scale 1 / factor,
        // unscaled waist leaves the correction at 1.
        let scale = chain.scene.local_scale(chain.hip);
        assert!((scale - na::Vector3::repeat(0.5)).norm() < 1e-5);

        // Hip rescale against the root is never done.
        let waist = chain.scene.local_scale(chain.waist);
        assert_eq!(waist, na::Vector3::repeat(1.0));
    }

    #[test]
    fn rescale_compensates_scaled_ancestors() {
        let mut chain = chain();
        chain
            .scene
            .set_local_scale(chain.waist, na::Vector3::repeat(2.0));
        let mut rig = bind(&chain);

        let frame = SkeletonFrame::from_samples(
            0,
            vec![
                sample(JointId::LeftHip, 0.2, 1.0, 1.0),
                sample(JointId::LeftKnee, 0.2, 0.2, 1.0),
            ],
        );
        let options = ApplyOptions {
            confidence_threshold: 0.5,
            rescale_bone_length: true,
        };
        rig.apply(&mut chain.scene, &frame, Mirroring::Direct, &options);

        // Rest knee distance is 0.8 in the doubled waist,
        // tracked distance 0.8, so the hip ends at unit world scale.
        let lossy = chain.scene.lossy_scale(chain.hip);
        assert!((lossy - na::Vector3::repeat(1.0)).norm() < 1e-5);
        let local = chain.scene.local_scale(chain.hip);
        assert!((local - na::Vector3::repeat(0.5)).norm() < 1e-5);
    }

    #[test]
    fn coincident_bones_skip_rescale() {
        let mut chain = chain();
        let mut rig = bind(&chain);

        let frame = SkeletonFrame::from_samples(
            0,
            vec![
                sample(JointId::LeftHip, 0.1, 1.0, 1.0),
                sample(JointId::LeftKnee, 0.1, 1.0, 1.0),
            ],
        );
        let options = ApplyOptions {
            confidence_threshold: 0.5,
            rescale_bone_length: true,
        };
        rig.apply(&mut chain.scene, &frame, Mirroring::Direct, &options);
        rig.apply(&mut chain.scene, &frame, Mirroring::Direct, &options);

        assert_eq!(chain.scene.local_scale(chain.hip), na::Vector3::repeat(1.0));
    }

    #[test]
    fn low_confidence_keeps_last_rotation() {
        let mut chain = chain();
        let mut rig = bind(&chain);
        let options = ApplyOptions::default();

        let turned = na::UnitQuaternion::from_euler_angles(0.3, 0.2, 0.1);
        let mut frame = SkeletonFrame::new(0);
        frame.insert(JointSample {
            orientation: turned,
            ..sample(JointId::LeftKnee, 0.0, 0.0, 1.0)
        });
        rig.apply(&mut chain.scene, &frame, Mirroring::Direct, &options);
        let before = chain.scene.world_rotation(chain.knee);

        let mut frame = SkeletonFrame::new(0);
        frame.insert(sample(JointId::LeftKnee, 0.0, 0.0, 0.0));
        rig.apply(&mut chain.scene, &frame, Mirroring::Direct, &options);
        assert_eq!(chain.scene.world_rotation(chain.knee), before);

        rig.apply(
            &mut chain.scene,
            &SkeletonFrame::new(0),
            Mirroring::Direct,
            &options,
        );
        assert_eq!(chain.scene.world_rotation(chain.knee), before);
    }

    #[test]
    fn confidence_threshold_is_exclusive() {
        let mut chain = chain();
        let mut rig = bind(&chain);
        let options = ApplyOptions {
            confidence_threshold: 0.5,
            rescale_bone_length: false,
        };
        let turned = na::UnitQuaternion::from_euler_angles(0.0, 0.0, 0.7);
        let frame_with = |confidence| {
            let mut frame = SkeletonFrame::new(0);
            frame.insert(JointSample {
                orientation: turned,
                ..sample(JointId::LeftHip, 0.0, 0.0, confidence)
            });
            frame
        };

        let rest = chain.scene.world_rotation(chain.hip);
        rig.apply(&mut chain.scene, &frame_with(0.5), Mirroring::Direct, &options);
        assert_eq!(chain.scene.world_rotation(chain.hip), rest);

        rig.apply(
            &mut chain.scene,
            &frame_with(0.5001),
            Mirroring::Direct,
            &options,
        );
        let rotation = chain.scene.world_rotation(chain.hip);
        assert!(rotation.angle_to(&turned) < 1e-5);
    }

    #[test]
    fn root_follows_even_without_confidence() {
        let mut chain = chain();
        let mut rig = bind(&chain);
        let options = ApplyOptions::default();

        let frame = SkeletonFrame::from_samples(
            0,
            vec![sample(JointId::Waist, 0.5, 1.2, 0.0)],
        );
        rig.apply(&mut chain.scene, &frame, Mirroring::Direct, &options);

        let position = chain.scene.world_position(chain.waist);
        assert!((position - na::Point3::new(-0.5, 1.2, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn rotation_keeps_bind_offset() {
        let mut chain = chain();
        let authored = na::UnitQuaternion::from_euler_angles(0.0, 1.0, 0.0);
        chain.scene.set_world_rotation(chain.knee, authored);
        let mut rig = bind(&chain);

        let tracked = na::UnitQuaternion::from_euler_angles(0.4, 0.0, 0.0);
        let frame = SkeletonFrame::from_samples(
            0,
            vec![JointSample {
                orientation: tracked,
                ..sample(JointId::LeftKnee, 0.0, 0.0, 1.0)
            }],
        );
        rig.apply(
            &mut chain.scene,
            &frame,
            Mirroring::Mirrored,
            &ApplyOptions::default(),
        );

        let expected = crate::frame::reflect(&tracked) * authored;
        let rotation = chain.scene.world_rotation(chain.knee);
        assert!(rotation.angle_to(&expected) < 1e-5);
    }

    #[test]
    fn unbound_collar_leaves_torso_unscaled() {
        let mut scene = Scene::new();
        let origin = scene.spawn_root(na::Isometry3::identity());
        let waist =
            scene.spawn_child(origin, na::Isometry3::translation(0.0, 1.0, 0.0));
        let torso =
            scene.spawn_child(waist, na::Isometry3::translation(0.0, 0.3, 0.0));
        let shoulder =
            scene.spawn_child(torso, na::Isometry3::translation(-0.2, 0.2, 0.0));

        let mut rig = RetargetRig::builder(origin)
            .with_bone(JointId::Waist, waist)
            .with_bone(JointId::Torso, torso)
            .with_bone(JointId::LeftShoulder, shoulder)
            .bind(&scene, JointId::Waist, Mirroring::Direct)
            .unwrap();

        // Collar has no bone, so the shoulder has nothing to scale against.
        let bound = rig.joint(JointId::LeftShoulder).unwrap();
        assert_eq!(bound.parent(), None);
        assert_eq!(bound.base_distance(), 0.0);
        assert_eq!(rig.joint(JointId::Torso).unwrap().parent(), Some(0));

        let frame = SkeletonFrame::from_samples(
            0,
            vec![
                sample(JointId::Waist, 0.0, 1.0, 1.0),
                sample(JointId::Torso, 0.0, 1.3, 1.0),
                sample(JointId::LeftShoulder, 0.6, 1.5, 1.0),
            ],
        );
        let options = ApplyOptions {
            confidence_threshold: 0.5,
            rescale_bone_length: true,
        };
        rig.apply(&mut scene, &frame, Mirroring::Direct, &options);

        assert_eq!(scene.local_scale(torso), na::Vector3::repeat(1.0));
        let position = scene.world_position(shoulder);
        assert!((position - na::Point3::new(-0.6, 1.5, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn rotated_origin_composes_space_rotation() {
        let yaw = na::UnitQuaternion::from_axis_angle(&na::Vector3::y_axis(), 0.8);
        let mut chain = chain_at(na::Isometry3::from_parts(
            na::Translation3::identity(),
            yaw,
        ));
        let authored = na::UnitQuaternion::from_euler_angles(0.0, 0.0, 0.5);
        chain.scene.set_world_rotation(chain.knee, yaw * authored);
        let rest = chain.scene.world_rotation(chain.knee);
        let mut rig = bind(&chain);

        let offset = rig.joint(JointId::LeftKnee).unwrap().base_offset();
        assert!(offset.angle_to(&(yaw.inverse() * rest)) < 1e-5);

        let tracked = na::UnitQuaternion::from_euler_angles(0.4, 0.0, 0.0);
        let frame = SkeletonFrame::from_samples(
            0,
            vec![JointSample {
                orientation: tracked,
                ..sample(JointId::LeftKnee, 0.0, 0.0, 1.0)
            }],
        );
        rig.apply(
            &mut chain.scene,
            &frame,
            Mirroring::Direct,
            &ApplyOptions::default(),
        );

        let expected = yaw * (tracked * (yaw.inverse() * rest));
        let rotation = chain.scene.world_rotation(chain.knee);
        assert!(rotation.angle_to(&expected) < 1e-5);
        assert!(rotation.angle_to(&(tracked * rest)) > 1e-2);
    }

    #[test]
    fn space_reference_skips_correction() {
        let mut chain = chain();
        let placement = na::Isometry3::from_parts(
            na::Translation3::new(1.0, 0.0, 0.5),
            na::UnitQuaternion::from_axis_angle(&na::Vector3::y_axis(), -0.6),
        );
        let sensor = chain.scene.spawn_root(placement);
        let space = placement.rotation;

        let authored = na::UnitQuaternion::from_euler_angles(0.2, 0.0, 0.0);
        chain.scene.set_world_rotation(chain.knee, authored);
        let rest = chain.scene.world_rotation(chain.knee);

        let mut rig = RetargetRig::builder(chain.origin)
            .with_space_reference(Some(sensor))
            .with_bone(JointId::Waist, chain.waist)
            .with_bone(JointId::LeftHip, chain.hip)
            .with_bone(JointId::LeftKnee, chain.knee)
            .bind(&chain.scene, JointId::Waist, Mirroring::Direct)
            .unwrap();
        assert_eq!(rig.space().handle(), sensor);

        let source = na::Point3::new(0.3, 1.0, 0.5);
        let tracked = na::UnitQuaternion::from_euler_angles(0.0, 0.0, 0.7);
        let frame = SkeletonFrame::from_samples(
            0,
            vec![
                JointSample::new(
                    JointId::Waist,
                    source,
                    na::UnitQuaternion::identity(),
                    1.0,
                ),
                JointSample {
                    orientation: tracked,
                    ..sample(JointId::LeftKnee, 0.0, 0.0, 1.0)
                },
            ],
        );
        rig.apply(
            &mut chain.scene,
            &frame,
            Mirroring::Direct,
            &ApplyOptions::default(),
        );

        let expected = space * (tracked * (space.inverse() * rest));
        let rotation = chain.scene.world_rotation(chain.knee);
        assert!(rotation.angle_to(&expected) < 1e-5);

        let waist = chain.scene.world_position(chain.waist);
        assert!((waist - placement * source).norm() < 1e-5);
    }

    #[test]
    fn calibration_moves_pivot() {
        let mut chain = chain();
        let mut rig = bind(&chain);

        chain
            .scene
            .set_world_position(chain.waist, na::Point3::new(0.3, 0.8, 0.2));
        rig.on_calibration_succeeded(
            &chain.scene,
            na::UnitQuaternion::identity(),
        );

        let pivot = rig.space().pivot();
        assert!((pivot - na::Vector3::new(0.0, 0.2, -0.2)).norm() < 1e-5);
    }
}
