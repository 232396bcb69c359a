//! Retargeting of tracked body skeletons onto bone hierarchies
//! and pose matching against stored reference poses.

pub mod config;
pub mod detector;
pub mod frame;
pub mod joint;
pub mod pose;
pub mod rig;
pub mod scene;
pub mod skeleton;
pub mod source;
pub mod space;
pub mod topology;

pub use self::{
    config::Config,
    detector::{PoseDetector, PoseEvent},
    frame::{JointSample, Mirroring, SkeletonFrame},
    joint::{JointId, JointMap},
    pose::{JointReference, PoseMatcher, ReferencePose},
    rig::{ApplyOptions, BindError, BoundJoint, RetargetRig, RigBuilder},
    scene::{Global3, Local3, Scene, Transforms},
    skeleton::{Bone, Skeleton},
    source::{Recording, Tick, TrackingSource},
    space::WorkingSpace,
    topology::Topology,
};
