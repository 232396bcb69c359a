mod config;

use {
    crate::config::{Config, PoseConfig},
    color_eyre::Report,
    eyre::{eyre, WrapErr as _},
    nalgebra as na,
    std::path::Path,
    tracing_subscriber::{layer::SubscriberExt as _, EnvFilter},
    trackrig::{
        PoseDetector, PoseEvent, Recording, ReferencePose, RetargetRig, Scene,
        Skeleton, TrackingSource as _, Transforms as _,
    },
};

fn main() -> Result<(), Report> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .finish()
        .with(tracing_error::ErrorLayer::default());
    tracing::subscriber::set_global_default(subscriber)?;
    color_eyre::install()?;

    let config = Config::load_default()?;
    let replay = &config.replay;

    let skeleton = load_skeleton(&replay.skeleton)?;
    let mut recording = Recording::load(&replay.recording)?;
    let mirroring = recording.mirroring();

    let mut scene = Scene::new();
    let origin = scene.spawn_root(na::Isometry3::identity());
    let bones = skeleton.spawn(&mut scene, origin)?;
    if let Some(sensor) = recording.place_sensor(&mut scene) {
        tracing::info!("Sensor placed as {:?}", sensor);
    }

    let mut rig = RetargetRig::builder(origin)
        .with_space_reference(recording.space_reference())
        .with_mirror_aware(config.rig.mirror_aware)
        .with_bones(skeleton.bindings(&bones))
        .bind(&scene, config.rig.root, mirroring)?;

    let mut detector = PoseDetector::new();
    for pose in &replay.poses {
        let reference = capture_pose(&recording, replay.subject, pose, &config)?;
        detector.watch(pose.name.clone(), reference, config.rig.pose_threshold);
    }

    let mut tick = 0;
    while !recording.is_finished() {
        match recording.current_frame(replay.subject) {
            Some(frame) => {
                rig.apply(&mut scene, &frame, mirroring, &config.rig.apply);
                detector.process(&frame, mirroring, |name, event| match event {
                    PoseEvent::Entered { score } => {
                        tracing::info!(tick, score, "Pose `{}` entered", name)
                    }
                    PoseEvent::Left { score } => {
                        tracing::info!(tick, score, "Pose `{}` left", name)
                    }
                });
            }
            None => tracing::debug!(tick, "Subject {} not tracked", replay.subject),
        }

        if replay.calibrate_at == Some(tick) {
            rig.on_calibration_succeeded(&scene, na::UnitQuaternion::identity());
        }

        scene.sync();
        for (name, score) in detector.scores() {
            tracing::trace!(tick, score, "Pose `{}`", name);
        }

        tick += 1;
        recording.advance();
    }

    println!("{:<16} {:>24} {:>8}", "joint", "position", "scale");
    for joint in rig.joints() {
        let p = scene.world_position(joint.bone());
        let s = scene.local_scale(joint.bone());
        println!(
            "{:<16} {:>7.3} {:>7.3} {:>7.3} {:>8.3}",
            joint.joint().name(),
            p.x,
            p.y,
            p.z,
            s.x,
        );
    }

    Ok(())
}

fn load_skeleton(path: &Path) -> Result<Skeleton, Report> {
    let file = std::fs::File::open(path).wrap_err_with(|| {
        format!("Failed to open skeleton '{}'", path.display())
    })?;
    let skeleton = ron::de::from_reader(file).wrap_err_with(|| {
        format!("Failed to parse skeleton '{}'", path.display())
    })?;
    Ok(skeleton)
}

fn capture_pose(
    recording: &Recording,
    subject: u32,
    pose: &PoseConfig,
    config: &Config,
) -> Result<ReferencePose, Report> {
    let frame = recording
        .ticks
        .get(pose.tick)
        .and_then(|tick| tick.frames.iter().find(|f| f.subject == subject))
        .ok_or_else(|| {
            eyre!(
                "Pose `{}` refers to tick {} without subject {}",
                pose.name,
                pose.tick,
                subject
            )
        })?;

    Ok(ReferencePose::capture(
        frame,
        recording.mirroring(),
        config.rig.pose_tolerance,
        pose.relative,
    ))
}
