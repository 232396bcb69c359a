use {
    crate::{
        frame::{Mirroring, SkeletonFrame},
        scene::Scene,
    },
    eyre::{Report, WrapErr as _},
    hecs::Entity,
    nalgebra as na,
    std::path::Path,
};

/// Supplier of tracked skeletons, polled once per tick.
pub trait TrackingSource {
    type Handle;

    /// Latest frame of the subject, `None` if it is not tracked.
    fn current_frame(&self, subject: u32) -> Option<SkeletonFrame>;

    fn mirroring(&self) -> Mirroring;

    /// Externally designated coordinate reference.
    fn space_reference(&self) -> Option<Self::Handle> {
        None
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Tick {
    pub frames: Vec<SkeletonFrame>,
}

/// Prerecorded sequence of ticks replayed in order.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Recording {
    #[serde(default)]
    pub mirroring: Mirroring,

    /// Placement of the sensor in the scene.
    /// Without it frames are mapped through the rig's own origin.
    #[serde(default)]
    pub sensor: Option<na::Isometry3<f32>>,

    pub ticks: Vec<Tick>,

    #[serde(skip)]
    space_reference: Option<Entity>,

    #[serde(skip)]
    cursor: usize,
}

impl Recording {
    pub fn new(mirroring: Mirroring, ticks: Vec<Tick>) -> Self {
        Recording {
            mirroring,
            sensor: None,
            ticks,
            space_reference: None,
            cursor: 0,
        }
    }

    /// Spawns the sensor transform into the scene
    /// and reports it as space reference from now on.
    pub fn place_sensor(&mut self, scene: &mut Scene) -> Option<Entity> {
        let sensor = self.sensor?;
        let entity = scene.spawn_root(sensor);
        self.space_reference = Some(entity);
        Some(entity)
    }

    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self, Report> {
        let file = std::fs::File::open(path).wrap_err_with(|| {
            format!("Failed to open recording '{}'", path.display())
        })?;
        let recording: Recording = ron::de::from_reader(file)
            .wrap_err_with(|| {
                format!("Failed to parse recording '{}'", path.display())
            })?;
        tracing::info!("Loaded {} ticks", recording.ticks.len());
        Ok(recording)
    }

    /// Moves to the next tick, returns `false` past the end.
    pub fn advance(&mut self) -> bool {
        if self.cursor < self.ticks.len() {
            self.cursor += 1;
        }
        self.cursor < self.ticks.len()
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.ticks.len()
    }

    /// Subjects present in the current tick.
    pub fn subjects(&self) -> impl Iterator<Item = u32> + '_ {
        self.ticks
            .get(self.cursor)
            .into_iter()
            .flat_map(|tick| tick.frames.iter().map(|frame| frame.subject))
    }
}

impl TrackingSource for Recording {
    type Handle = Entity;

    fn current_frame(&self, subject: u32) -> Option<SkeletonFrame> {
        self.ticks
            .get(self.cursor)?
            .frames
            .iter()
            .find(|frame| frame.subject == subject)
            .cloned()
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn space_reference(&self) -> Option<Entity> {
        self.space_reference
    }
}
