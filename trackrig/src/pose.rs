use {
    crate::{
        frame::{mirror_correct, Mirroring, SkeletonFrame},
        joint::JointId,
        topology::Topology,
    },
    nalgebra as na,
};

/// Reduced skeleton compared by pose matching.
pub const POSE_JOINTS: [JointId; 9] = [
    JointId::Waist,
    JointId::LeftHip,
    JointId::RightHip,
    JointId::LeftKnee,
    JointId::RightKnee,
    JointId::LeftShoulder,
    JointId::RightShoulder,
    JointId::LeftElbow,
    JointId::RightElbow,
];

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JointReference {
    pub active: bool,
    pub orientation: na::UnitQuaternion<f32>,

    /// Fraction of a perfect alignment counted as a full match.
    pub tolerance: f32,
}

impl Default for JointReference {
    fn default() -> Self {
        JointReference {
            active: true,
            orientation: na::UnitQuaternion::identity(),
            tolerance: default_tolerance(),
        }
    }
}

pub fn default_tolerance() -> f32 {
    0.9
}

/// Stored pose compared against live frames.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReferencePose {
    /// Compare joints relative to the waist instead of world space.
    #[serde(default)]
    pub relative: bool,
    pub joints: [JointReference; 9],
}

impl Default for ReferencePose {
    fn default() -> Self {
        ReferencePose {
            relative: false,
            joints: [JointReference::default(); 9],
        }
    }
}

impl ReferencePose {
    /// Captures current orientations of the frame.
    /// Joints missing from the frame are left inactive.
    pub fn capture(
        frame: &SkeletonFrame,
        mirroring: Mirroring,
        tolerance: f32,
        relative: bool,
    ) -> Self {
        let mut pose = ReferencePose {
            relative,
            ..ReferencePose::default()
        };

        for (reference, &joint) in pose.joints.iter_mut().zip(POSE_JOINTS.iter()) {
            *reference = match frame.get(joint) {
                Some(sample) => JointReference {
                    active: true,
                    orientation: mirror_correct(sample, mirroring),
                    tolerance,
                },
                None => JointReference {
                    active: false,
                    tolerance,
                    ..JointReference::default()
                },
            };
        }
        pose
    }

    pub fn get(&self, joint: JointId) -> Option<&JointReference> {
        let index = slot(joint)?;
        Some(&self.joints[index])
    }

    pub fn get_mut(&mut self, joint: JointId) -> Option<&mut JointReference> {
        let index = slot(joint)?;
        Some(&mut self.joints[index])
    }

    pub fn entries(
        &self,
    ) -> impl Iterator<Item = (JointId, &JointReference)> + '_ {
        POSE_JOINTS.iter().copied().zip(self.joints.iter())
    }
}

fn slot(joint: JointId) -> Option<usize> {
    POSE_JOINTS.iter().position(|&j| j == joint)
}

/// Scores live frames against reference poses.
#[derive(Clone, Copy, Debug)]
pub struct PoseMatcher<'a> {
    topology: &'a Topology,
    mirroring: Mirroring,
}

impl PoseMatcher<'static> {
    pub fn new(mirroring: Mirroring) -> Self {
        PoseMatcher::with_topology(Topology::standard(), mirroring)
    }
}

impl<'a> PoseMatcher<'a> {
    pub fn with_topology(topology: &'a Topology, mirroring: Mirroring) -> Self {
        PoseMatcher {
            topology,
            mirroring,
        }
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Match score in `[0, 1]` using the pose's comparison mode.
    pub fn score(&self, pose: &ReferencePose, frame: &SkeletonFrame) -> f32 {
        if pose.relative {
            self.score_relative(pose, frame)
        } else {
            self.score_absolute(pose, frame)
        }
    }

    /// Compares joint directions in world space.
    /// Zero when the pose has no active joints.
    pub fn score_absolute(
        &self,
        pose: &ReferencePose,
        frame: &SkeletonFrame,
    ) -> f32 {
        let identity = na::UnitQuaternion::identity();
        self.accumulate(pose, frame, None, &identity, &identity)
    }

    /// Compares joint directions relative to the waist,
    /// so whole-body heading does not affect the score.
    pub fn score_relative(
        &self,
        pose: &ReferencePose,
        frame: &SkeletonFrame,
    ) -> f32 {
        if self.mirroring == Mirroring::Unavailable {
            tracing::warn!("Relative pose match requires mirroring mode");
            return 0.0;
        }

        let waist = match frame.get(JointId::Waist) {
            Some(waist) => waist,
            None => {
                tracing::debug!(
                    "Subject {} has no waist sample, relative match skipped",
                    frame.subject
                );
                return 0.0;
            }
        };
        let pose_waist = match pose.get(JointId::Waist) {
            Some(reference) => reference.orientation,
            None => na::UnitQuaternion::identity(),
        };

        let skeleton_inverse = mirror_correct(waist, self.mirroring).inverse();
        let pose_inverse = pose_waist.inverse();

        self.accumulate(
            pose,
            frame,
            Some(JointId::Waist),
            &pose_inverse,
            &skeleton_inverse,
        )
    }

    fn accumulate(
        &self,
        pose: &ReferencePose,
        frame: &SkeletonFrame,
        exclude: Option<JointId>,
        pose_inverse: &na::UnitQuaternion<f32>,
        skeleton_inverse: &na::UnitQuaternion<f32>,
    ) -> f32 {
        let mut sum = 0.0;
        let mut count = 0usize;

        for (joint, reference) in pose.entries() {
            if !reference.active || Some(joint) == exclude {
                continue;
            }
            count += 1;

            let sample = match frame.get(joint) {
                Some(sample) => sample,
                None => continue,
            };

            let outward = self.topology.outward(joint);
            let tracked = skeleton_inverse
                * mirror_correct(sample, self.mirroring)
                * outward;
            let expected = pose_inverse * reference.orientation * outward;

            let dot = expected.dot(&tracked) / reference.tolerance;
            sum += clamp01(dot);
        }

        if count == 0 {
            tracing::debug!("Pose has no active joints");
            return 0.0;
        }

        sum / count as f32
    }
}

fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0).min(1.0)
    }
}
