use crate::{
    frame::{Mirroring, SkeletonFrame},
    pose::{PoseMatcher, ReferencePose},
};

/// Transition reported when a pose score crosses its threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PoseEvent {
    Entered { score: f32 },
    Left { score: f32 },
}

#[derive(Clone, Debug)]
struct Watched {
    name: String,
    pose: ReferencePose,
    threshold: f32,
    score: f32,
    matched: bool,
}

/// Tracks a set of named poses for one subject and reports
/// when each of them starts or stops matching.
#[derive(Clone, Debug, Default)]
pub struct PoseDetector {
    poses: Vec<Watched>,
}

impl PoseDetector {
    pub fn new() -> Self {
        PoseDetector::default()
    }

    /// Adds pose considered matched while its score is above `threshold`.
    pub fn watch(
        &mut self,
        name: impl Into<String>,
        pose: ReferencePose,
        threshold: f32,
    ) -> &mut Self {
        self.poses.push(Watched {
            name: name.into(),
            pose,
            threshold,
            score: 0.0,
            matched: false,
        });
        self
    }

    /// Scores every watched pose against the frame and
    /// calls `listener` for poses that changed state.
    pub fn process<F>(
        &mut self,
        frame: &SkeletonFrame,
        mirroring: Mirroring,
        mut listener: F,
    ) where
        F: FnMut(&str, PoseEvent),
    {
        let matcher = PoseMatcher::new(mirroring);

        for watched in &mut self.poses {
            let score = matcher.score(&watched.pose, frame);
            let matched = score > watched.threshold;
            watched.score = score;

            if matched != watched.matched {
                watched.matched = matched;
                let event = if matched {
                    PoseEvent::Entered { score }
                } else {
                    PoseEvent::Left { score }
                };
                tracing::debug!("Pose `{}`: {:?}", watched.name, event);
                listener(&watched.name, event);
            }
        }
    }

    /// Latest score of every watched pose.
    pub fn scores(&self) -> impl Iterator<Item = (&str, f32)> + '_ {
        self.poses.iter().map(|w| (w.name.as_str(), w.score))
    }

    pub fn is_matched(&self, name: &str) -> bool {
        self.poses.iter().any(|w| w.name == name && w.matched)
    }
}
