use std::{
    fmt::{self, Display, Formatter},
    ops::{Index, IndexMut},
};

/// Skeletal landmark reported by a tracking source.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
#[repr(u8)]
pub enum JointId {
    None,
    Head,
    Neck,
    Torso,
    Waist,
    LeftCollar,
    LeftShoulder,
    LeftElbow,
    LeftWrist,
    LeftHand,
    LeftFingertip,
    RightCollar,
    RightShoulder,
    RightElbow,
    RightWrist,
    RightHand,
    RightFingertip,
    LeftHip,
    LeftKnee,
    LeftAnkle,
    LeftFoot,
    RightHip,
    RightKnee,
    RightAnkle,
    RightFoot,
}

impl JointId {
    pub const COUNT: usize = 25;

    /// All joints in dense index order.
    pub const ALL: [JointId; JointId::COUNT] = [
        JointId::None,
        JointId::Head,
        JointId::Neck,
        JointId::Torso,
        JointId::Waist,
        JointId::LeftCollar,
        JointId::LeftShoulder,
        JointId::LeftElbow,
        JointId::LeftWrist,
        JointId::LeftHand,
        JointId::LeftFingertip,
        JointId::RightCollar,
        JointId::RightShoulder,
        JointId::RightElbow,
        JointId::RightWrist,
        JointId::RightHand,
        JointId::RightFingertip,
        JointId::LeftHip,
        JointId::LeftKnee,
        JointId::LeftAnkle,
        JointId::LeftFoot,
        JointId::RightHip,
        JointId::RightKnee,
        JointId::RightAnkle,
        JointId::RightFoot,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        JointId::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            JointId::None => "None",
            JointId::Head => "Head",
            JointId::Neck => "Neck",
            JointId::Torso => "Torso",
            JointId::Waist => "Waist",
            JointId::LeftCollar => "LeftCollar",
            JointId::LeftShoulder => "LeftShoulder",
            JointId::LeftElbow => "LeftElbow",
            JointId::LeftWrist => "LeftWrist",
            JointId::LeftHand => "LeftHand",
            JointId::LeftFingertip => "LeftFingertip",
            JointId::RightCollar => "RightCollar",
            JointId::RightShoulder => "RightShoulder",
            JointId::RightElbow => "RightElbow",
            JointId::RightWrist => "RightWrist",
            JointId::RightHand => "RightHand",
            JointId::RightFingertip => "RightFingertip",
            JointId::LeftHip => "LeftHip",
            JointId::LeftKnee => "LeftKnee",
            JointId::LeftAnkle => "LeftAnkle",
            JointId::LeftFoot => "LeftFoot",
            JointId::RightHip => "RightHip",
            JointId::RightKnee => "RightKnee",
            JointId::RightAnkle => "RightAnkle",
            JointId::RightFoot => "RightFoot",
        }
    }
}

impl Display for JointId {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.name())
    }
}

/// Fixed-size map with a slot for every `JointId`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointMap<T> {
    values: [T; JointId::COUNT],
}

impl<T> JointMap<T> {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnMut(JointId) -> T,
    {
        JointMap {
            values: JointId::ALL.map(f),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (JointId, &T)> + '_ {
        JointId::ALL.iter().copied().zip(self.values.iter())
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }
}

impl<T> Default for JointMap<T>
where
    T: Default,
{
    fn default() -> Self {
        JointMap::from_fn(|_| T::default())
    }
}

impl<T> Index<JointId> for JointMap<T> {
    type Output = T;

    #[inline]
    fn index(&self, joint: JointId) -> &T {
        &self.values[joint.index()]
    }
}

impl<T> IndexMut<JointId> for JointMap<T> {
    #[inline]
    fn index_mut(&mut self, joint: JointId) -> &mut T {
        &mut self.values[joint.index()]
    }
}

/// Set of joints packed into a bitmask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JointMask(u32);

impl JointMask {
    pub const fn empty() -> Self {
        JointMask(0)
    }

    pub fn contains(self, joint: JointId) -> bool {
        self.0 & (1 << joint.index()) != 0
    }

    /// Inserts joint, returns `true` if it was not in the set.
    pub fn insert(&mut self, joint: JointId) -> bool {
        let bit = 1 << joint.index();
        let fresh = self.0 & bit == 0;
        self.0 |= bit;
        fresh
    }
}
