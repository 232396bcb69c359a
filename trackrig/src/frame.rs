use {
    crate::{
        joint::{JointId, JointMap},
        topology::Topology,
    },
    nalgebra as na,
    serde::{Deserialize, Deserializer, Serialize, Serializer},
};

/// Capture convention reported by a tracking source.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Mirroring {
    /// Source has no notion of mirroring configured.
    Unavailable,
    Direct,
    Mirrored,
}

impl Default for Mirroring {
    fn default() -> Self {
        Mirroring::Direct
    }
}

impl Mirroring {
    pub fn is_mirrored(self) -> bool {
        self == Mirroring::Mirrored
    }
}

/// Tracked state of one joint for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointSample {
    pub joint: JointId,

    /// Position in source space, meters.
    pub position: na::Point3<f32>,
    pub orientation: na::UnitQuaternion<f32>,

    /// Mirrored orientation precomputed by the source, if it provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirrored_orientation: Option<na::UnitQuaternion<f32>>,
    pub confidence: f32,
}

impl JointSample {
    pub fn new(
        joint: JointId,
        position: na::Point3<f32>,
        orientation: na::UnitQuaternion<f32>,
        confidence: f32,
    ) -> Self {
        JointSample {
            joint,
            position,
            orientation,
            mirrored_orientation: None,
            confidence,
        }
    }

    pub fn with_mirrored_orientation(
        mut self,
        orientation: na::UnitQuaternion<f32>,
    ) -> Self {
        self.mirrored_orientation = Some(orientation);
        self
    }

    /// Source-provided mirrored variant, raw orientation when absent.
    pub fn source_mirrored_orientation(&self) -> na::UnitQuaternion<f32> {
        self.mirrored_orientation.unwrap_or(self.orientation)
    }

    /// Orientation reflected across the sensor viewing plane.
    pub fn reflected_orientation(&self) -> na::UnitQuaternion<f32> {
        reflect(&self.orientation)
    }
}

/// Negates `z` and `w` components of the quaternion.
pub fn reflect(q: &na::UnitQuaternion<f32>) -> na::UnitQuaternion<f32> {
    let q = q.quaternion();
    na::UnitQuaternion::new_unchecked(na::Quaternion::new(
        -q.w, q.i, q.j, -q.k,
    ))
}

/// Orientation of the sample as seen by pose matching.
/// Reflected explicitly for mirrored capture,
/// source-provided mirrored variant otherwise.
pub fn mirror_correct(
    sample: &JointSample,
    mirroring: Mirroring,
) -> na::UnitQuaternion<f32> {
    if mirroring.is_mirrored() {
        sample.reflected_orientation()
    } else {
        sample.source_mirrored_orientation()
    }
}

/// Snapshot of one tracked subject for a single tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkeletonFrame {
    pub subject: u32,

    #[serde(
        serialize_with = "serialize_samples",
        deserialize_with = "deserialize_samples"
    )]
    samples: JointMap<Option<JointSample>>,
}

impl SkeletonFrame {
    pub fn new(subject: u32) -> Self {
        SkeletonFrame {
            subject,
            samples: JointMap::default(),
        }
    }

    pub fn from_samples<I>(subject: u32, samples: I) -> Self
    where
        I: IntoIterator<Item = JointSample>,
    {
        let mut frame = SkeletonFrame::new(subject);
        for sample in samples {
            frame.insert(sample);
        }
        frame
    }

    /// Inserts sample, replacing previous one for the same joint.
    pub fn insert(&mut self, sample: JointSample) {
        self.samples[sample.joint] = Some(sample);
    }

    pub fn get(&self, joint: JointId) -> Option<&JointSample> {
        self.samples[joint].as_ref()
    }

    /// Confidence of the joint, zero when absent.
    pub fn confidence(&self, joint: JointId) -> f32 {
        self.get(joint).map_or(0.0, |sample| sample.confidence)
    }

    pub fn samples(&self) -> impl Iterator<Item = &JointSample> + '_ {
        self.samples.values().iter().filter_map(Option::as_ref)
    }

    pub fn is_empty(&self) -> bool {
        self.samples().next().is_none()
    }

    /// Parent-child pairs where both ends are tracked
    /// above `threshold`.
    pub fn bones<'a>(
        &'a self,
        topology: &'a Topology,
        threshold: f32,
    ) -> impl Iterator<Item = (&'a JointSample, &'a JointSample)> + 'a {
        self.samples()
            .filter(move |child| child.confidence > threshold)
            .filter_map(move |child| {
                let parent = self.get(topology.parent(child.joint))?;
                if parent.confidence > threshold {
                    Some((parent, child))
                } else {
                    None
                }
            })
    }
}

fn serialize_samples<S>(
    samples: &JointMap<Option<JointSample>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(samples.values().iter().filter_map(Option::as_ref))
}

fn deserialize_samples<'de, D>(
    deserializer: D,
) -> Result<JointMap<Option<JointSample>>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = Vec::<JointSample>::deserialize(deserializer)?;
    let mut samples = JointMap::default();
    for sample in list {
        samples[sample.joint] = Some(sample);
    }
    Ok(samples)
}
