use crate::{joint::JointId, pose::default_tolerance, rig::ApplyOptions};

/// Retargeting and matching settings.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct Config {
    #[serde(default = "default_root")]
    pub root: JointId,

    #[serde(default)]
    pub mirror_aware: bool,

    #[serde(default)]
    pub apply: ApplyOptions,

    /// Tolerance assigned to joints of captured poses.
    #[serde(default = "default_tolerance")]
    pub pose_tolerance: f32,

    /// Score above which a pose is reported as matched.
    #[serde(default = "default_pose_threshold")]
    pub pose_threshold: f32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            root: default_root(),
            mirror_aware: false,
            apply: ApplyOptions::default(),
            pose_tolerance: default_tolerance(),
            pose_threshold: default_pose_threshold(),
        }
    }
}

fn default_root() -> JointId {
    JointId::Waist
}

fn default_pose_threshold() -> f32 {
    0.8
}
