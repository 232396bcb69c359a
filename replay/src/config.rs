use {
    eyre::{Report, WrapErr as _},
    std::path::{Path, PathBuf},
};

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rig: trackrig::Config,

    pub replay: ReplayConfig,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct ReplayConfig {
    /// Rest pose of the target rig.
    pub skeleton: PathBuf,

    /// Recorded frames to replay.
    pub recording: PathBuf,

    /// Tracked subject driving the rig.
    #[serde(default)]
    pub subject: u32,

    /// Tick after which recalibration is triggered.
    #[serde(default)]
    pub calibrate_at: Option<usize>,

    #[serde(default)]
    pub poses: Vec<PoseConfig>,
}

/// Reference pose captured from the recording itself.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct PoseConfig {
    pub name: String,
    pub tick: usize,
    #[serde(default)]
    pub relative: bool,
}

impl Config {
    pub fn load_default() -> Result<Self, Report> {
        // Load from predefined file path unless overridden.
        let path = std::env::var("TRACKRIG_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./cfg.ron"));

        Self::load(&path)
    }

    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self, Report> {
        let file = std::fs::File::open(path).wrap_err_with(|| {
            format!("Failed to open config '{}'", path.display())
        })?;
        let mut config: Config = ron::de::from_reader(file)?;

        // Data paths are relative to the config file.
        if let Some(dir) = path.parent() {
            config.replay.skeleton = dir.join(&config.replay.skeleton);
            config.replay.recording = dir.join(&config.replay.recording);
        }
        Ok(config)
    }
}
