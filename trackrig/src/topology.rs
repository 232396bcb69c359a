use {
    crate::joint::{JointId, JointMap, JointMask},
    nalgebra as na,
    once_cell::sync::Lazy,
    smallvec::SmallVec,
    std::sync::atomic::{AtomicU32, Ordering},
};

/// Inline capacity large enough to hold every joint,
/// so traversals never spill to the heap.
pub type JointList = SmallVec<[JointId; 24]>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("Joint `{joint}` visited twice while walking descendants of `{start}`, parent table has a cycle")]
    Cycle { start: JointId, joint: JointId },
}

static STANDARD: Lazy<Topology> = Lazy::new(Topology::build_standard);

/// Static description of the skeleton graph.
#[derive(Debug)]
pub struct Topology {
    parent: JointMap<JointId>,
    children: JointMap<SmallVec<[JointId; 4]>>,
    mirror: JointMap<JointId>,
    outward: JointMap<Option<na::Vector3<f32>>>,

    /// Joints already reported for missing outward direction.
    warned: AtomicU32,
}

impl Topology {
    /// Process-wide table for the standard joint set.
    pub fn standard() -> &'static Topology {
        &STANDARD
    }

    /// Builds table from parent, mirror and outward direction mappings.
    /// Children lists are derived from `parent`.
    pub fn from_parents(
        parent: JointMap<JointId>,
        mirror: JointMap<JointId>,
        outward: JointMap<Option<na::Vector3<f32>>>,
    ) -> Self {
        let mut children = JointMap::<SmallVec<[JointId; 4]>>::default();

        for (joint, &parent) in parent.iter() {
            if joint != JointId::None && parent != JointId::None {
                children[parent].push(joint);
            }
        }

        Topology {
            parent,
            children,
            mirror,
            outward,
            warned: AtomicU32::new(0),
        }
    }

    pub fn parent(&self, joint: JointId) -> JointId {
        self.parent[joint]
    }

    /// Returns direct children of the joint or, if `recursive` is set,
    /// all descendants with every parent preceding its descendants.
    ///
    /// # Panics
    ///
    /// Panics if the parent table contains a cycle reachable from `joint`.
    pub fn children(&self, joint: JointId, recursive: bool) -> JointList {
        if !recursive {
            return self.children[joint].iter().copied().collect();
        }

        match self.try_descendants(joint) {
            Ok(list) => list,
            Err(err) => panic!("{}", err),
        }
    }

    /// Depth-first pre-order walk over strict descendants of `joint`.
    pub fn try_descendants(
        &self,
        joint: JointId,
    ) -> Result<JointList, TopologyError> {
        let mut visited = JointMask::empty();
        visited.insert(joint);

        let mut out = JointList::new();
        let mut stack = JointList::new();
        stack.extend(self.children[joint].iter().rev().copied());

        while let Some(next) = stack.pop() {
            if !visited.insert(next) {
                return Err(TopologyError::Cycle { start: joint, joint: next });
            }
            out.push(next);
            stack.extend(self.children[next].iter().rev().copied());
        }

        Ok(out)
    }

    pub fn mirror(&self, joint: JointId) -> JointId {
        self.mirror[joint]
    }

    /// Canonical bone axis of the joint in its local frame.
    /// Joints without an entry yield zero vector.
    pub fn outward(&self, joint: JointId) -> na::Vector3<f32> {
        match self.outward[joint] {
            Some(direction) => direction,
            None => {
                let bit = 1 << joint.index();
                let prev = self.warned.fetch_or(bit, Ordering::Relaxed);
                if prev & bit == 0 {
                    tracing::warn!(
                        "Outward direction for joint `{}` is undefined",
                        joint
                    );
                }
                na::Vector3::zeros()
            }
        }
    }

    fn build_standard() -> Self {
        use JointId::*;

        let parent = JointMap::from_fn(|joint| match joint {
            None | Waist => None,
            Torso => Waist,
            Neck => Torso,
            Head => Neck,
            LeftCollar | RightCollar => Torso,
            LeftShoulder => LeftCollar,
            LeftElbow => LeftShoulder,
            LeftWrist => LeftElbow,
            LeftHand => LeftWrist,
            LeftFingertip => LeftHand,
            RightShoulder => RightCollar,
            RightElbow => RightShoulder,
            RightWrist => RightElbow,
            RightHand => RightWrist,
            RightFingertip => RightHand,
            LeftHip | RightHip => Waist,
            LeftKnee => LeftHip,
            LeftAnkle => LeftKnee,
            LeftFoot => LeftAnkle,
            RightKnee => RightHip,
            RightAnkle => RightKnee,
            RightFoot => RightAnkle,
        });

        let mirror = JointMap::from_fn(|joint| match joint {
            LeftCollar => RightCollar,
            LeftShoulder => RightShoulder,
            LeftElbow => RightElbow,
            LeftWrist => RightWrist,
            LeftHand => RightHand,
            LeftFingertip => RightFingertip,
            RightCollar => LeftCollar,
            RightShoulder => LeftShoulder,
            RightElbow => LeftElbow,
            RightWrist => LeftWrist,
            RightHand => LeftHand,
            RightFingertip => LeftFingertip,
            LeftHip => RightHip,
            LeftKnee => RightKnee,
            LeftAnkle => RightAnkle,
            LeftFoot => RightFoot,
            RightHip => LeftHip,
            RightKnee => LeftKnee,
            RightAnkle => LeftAnkle,
            RightFoot => LeftFoot,
            axial => axial,
        });

        let up = na::Vector3::y();
        let down = -na::Vector3::y();
        let left = -na::Vector3::x();
        let right = na::Vector3::x();
        let forward = na::Vector3::z();

        let outward = JointMap::from_fn(|joint| match joint {
            Head | Neck | Torso | Waist => Some(up),
            LeftCollar | LeftShoulder | LeftElbow | LeftWrist | LeftHand => {
                Some(left)
            }
            RightCollar | RightShoulder | RightElbow | RightWrist
            | RightHand => Some(right),
            LeftHip | LeftKnee | LeftAnkle | RightHip | RightKnee
            | RightAnkle => Some(down),
            LeftFoot | RightFoot => Some(forward),
            None | LeftFingertip | RightFingertip => Option::None,
        });

        Topology::from_parents(parent, mirror, outward)
    }
}
