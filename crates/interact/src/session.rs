use crate::answer_option::{AnswerOption, AnswerStatus, SharedAnswerOption};
use crate::avatar::{Avatar, PlayerRig};
use crate::error::InteractError;
use crate::gaze_target::{GazeTarget, SharedGazeTarget};
use crate::router::GazeRouter;
use crate::teleport_target::{SharedTeleportTarget, TeleportTarget};
use gazeland_common::{EntityId, Transform};
use gazeland_config::{GameSettings, SceneConfig, ScriptStep, SharedSettings};
use gazeland_dwell::{DwellCompletion, DwellTimer, IndicatorState, Thresholds};
use gazeland_input::{PointerEvent, RayEvent, ScreenProjector};
use gazeland_kernel::{Scene, SceneEvent, SharedScene};
use gazeland_progress::{ProgressStatus, ProgressTracker, SharedTracker};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// What happened during one session tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub frame: u64,
    pub completion: Option<DwellCompletion>,
    /// Indicator fill after the tick.
    pub fill: f32,
    pub status: ProgressStatus,
}

/// One interactive scene: the shared timer, tracker and avatar, and every
/// target built from a [`SceneConfig`].
pub struct Session {
    scene: SharedScene,
    dwell: DwellTimer,
    indicator: Rc<RefCell<IndicatorState>>,
    tracker: SharedTracker,
    settings: SharedSettings,
    avatar: Rc<RefCell<PlayerRig>>,
    router: GazeRouter,
    gaze_targets: BTreeMap<String, SharedGazeTarget>,
    teleport_targets: BTreeMap<String, SharedTeleportTarget>,
    answer_options: BTreeMap<String, SharedAnswerOption>,
    verdict: Rc<RefCell<Option<AnswerStatus>>>,
    /// Avatar pose the gaze camera was last aimed from.
    camera_pose: Transform,
    names: BTreeMap<String, EntityId>,
}

impl Session {
    /// Build a session with its own settings record seeded from the config.
    pub fn from_config(config: &SceneConfig) -> Self {
        Self::with_settings(config, config.settings.shared())
    }

    /// Build a session reading `settings`, which the menu may keep writing.
    pub fn with_settings(config: &SceneConfig, settings: SharedSettings) -> Self {
        let initial: GameSettings = *settings.borrow();
        let scene = Scene::new().shared();
        let mut names = BTreeMap::new();

        let dwell = DwellTimer::with_thresholds(Thresholds {
            select: config.dwell.select_default,
            teleport: config.dwell.teleport,
        });
        let indicator = Rc::new(RefCell::new(IndicatorState::default()));
        dwell.bind_indicator(Rc::clone(&indicator));

        let unlocks: Vec<EntityId> = config
            .unlocks
            .iter()
            .map(|name| spawn_named(&scene, &mut names, name, Transform::default(), false))
            .collect();
        let mut tracker = ProgressTracker::new()
            .with_scene(Rc::clone(&scene))
            .with_unlocks(unlocks.iter().copied());
        tracker.register(config.counted_targets());
        let tracker = tracker.shared();

        let start = Transform::from_position_yaw(
            config.avatar.position,
            config.avatar.yaw_degrees.to_radians(),
        );
        let player = scene.borrow_mut().spawn("player", start, true);
        let mut rig = PlayerRig::new(start).with_scene(Rc::clone(&scene), player);
        rig.set_speed(initial.player_speed);
        rig.set_free_walk(!initial.teleportation_activated);
        let avatar = rig.shared();

        let mut projector = ScreenProjector::default();
        projector.aim(start.position, start.yaw());
        let mut router = GazeRouter::new(projector);

        let verdict = Rc::new(RefCell::new(None));
        let mut answer_options = BTreeMap::new();
        if let Some(answer) = &config.answer {
            for (name, id) in config.unlocks.iter().zip(&unlocks) {
                let option = AnswerOption::new(*id, name.clone(), answer.clone(), Rc::clone(&scene));
                let sink = Rc::clone(&verdict);
                option.verdicts().subscribe(move |status: &AnswerStatus| {
                    *sink.borrow_mut() = Some(status.clone());
                });
                let option = option.shared();
                router.register(option.clone());
                answer_options.insert(name.clone(), option);
            }
        }

        let mut gaze_targets = BTreeMap::new();
        for cfg in &config.gaze_targets {
            let transform = Transform {
                position: cfg.position,
                ..Transform::default()
            };
            let id = spawn_named(&scene, &mut names, &cfg.name, transform, true);
            let mut target = GazeTarget::new(id, cfg.name.clone(), dwell.clone())
                .with_thresholds(config.dwell.select_hover, config.dwell.select_default)
                .with_tracker(Rc::clone(&tracker));
            if let Some(content) = &cfg.content {
                let content_id =
                    spawn_named(&scene, &mut names, content, Transform::default(), false);
                target = target.with_content(Rc::clone(&scene), content_id);
            }
            if !cfg.counts_toward_progress {
                target = target.uncounted();
            }
            let target = target.attach();
            router.register(target.clone());
            gaze_targets.insert(cfg.name.clone(), target);
        }

        let mut teleport_targets = BTreeMap::new();
        for cfg in &config.teleport_targets {
            let transform =
                Transform::from_position_yaw(cfg.position, cfg.yaw_degrees.to_radians());
            let id = spawn_named(&scene, &mut names, &cfg.name, transform, true);
            let target = TeleportTarget::new(id, cfg.name.clone(), transform, dwell.clone())
                .with_threshold(config.dwell.teleport)
                .with_avatar(avatar.clone())
                .with_scene(Rc::clone(&scene))
                .attach();
            target
                .borrow_mut()
                .set_available(initial.teleportation_activated);
            router.register(target.clone());
            teleport_targets.insert(cfg.name.clone(), target);
        }

        tracing::info!(
            gaze_targets = gaze_targets.len(),
            teleport_targets = teleport_targets.len(),
            total = config.counted_targets(),
            "session ready"
        );

        Self {
            scene,
            dwell,
            indicator,
            tracker,
            settings,
            avatar,
            router,
            gaze_targets,
            teleport_targets,
            answer_options,
            verdict,
            camera_pose: start,
            names,
        }
    }

    /// Deliver a ray event from the gaze pointer.
    pub fn handle(&mut self, event: RayEvent) -> Result<(), InteractError> {
        self.router.handle(event)
    }

    /// Advance one frame: read settings, run the dwell timer, close the frame.
    pub fn tick(&mut self, delta: f32) -> TickReport {
        let frame = self.scene.borrow().frame() + 1;
        let _span = tracing::info_span!("session_tick", frame).entered();

        let settings = *self.settings.borrow();
        self.apply_settings(settings);

        let completion = self.dwell.tick(delta);
        self.follow_avatar();
        self.scene.borrow_mut().step();

        TickReport {
            frame,
            completion,
            fill: self.indicator.borrow().fill,
            status: self.tracker.borrow().status(),
        }
    }

    fn apply_settings(&mut self, settings: GameSettings) {
        {
            let mut avatar = self.avatar.borrow_mut();
            avatar.set_free_walk(!settings.teleportation_activated);
            avatar.set_speed(settings.player_speed);
        }
        for target in self.teleport_targets.values() {
            target
                .borrow_mut()
                .set_available(settings.teleportation_activated);
        }
    }

    /// Re-aim the gaze camera after the avatar moved, e.g. by teleport.
    fn follow_avatar(&mut self) {
        let pose = self.avatar.borrow().transform();
        if pose == self.camera_pose {
            return;
        }
        self.router
            .projector_mut()
            .aim(pose.position, pose.yaw());
        self.camera_pose = pose;
    }

    /// Run one scripted step. `Wait` runs a fixed number of `frame_dt` ticks,
    /// the last one shortened to land on `seconds`.
    pub fn play(
        &mut self,
        step: &ScriptStep,
        frame_dt: f32,
    ) -> Result<Vec<TickReport>, InteractError> {
        match step {
            ScriptStep::Enter { target } => {
                let (id, hit) = self.locate(target)?;
                self.handle(RayEvent::HoverEnter { target: id, hit })?;
                Ok(Vec::new())
            }
            ScriptStep::Exit { target } => {
                let (id, _) = self.locate(target)?;
                self.handle(RayEvent::HoverExit { target: id })?;
                Ok(Vec::new())
            }
            ScriptStep::Click { target } => {
                let (id, hit) = self.locate(target)?;
                self.handle(RayEvent::Click { target: id, hit })?;
                Ok(Vec::new())
            }
            ScriptStep::Wait { seconds } => {
                if frame_dt <= 0.0 {
                    return Ok(vec![self.tick(*seconds)]);
                }
                let (frames, last_dt) = wait_frames(*seconds, frame_dt);
                let mut reports = Vec::new();
                for frame in 0..frames {
                    let dt = if frame + 1 == frames { last_dt } else { frame_dt };
                    reports.push(self.tick(dt));
                }
                Ok(reports)
            }
        }
    }

    fn locate(&self, name: &str) -> Result<(EntityId, glam::Vec3), InteractError> {
        let id = self
            .target_id(name)
            .ok_or_else(|| InteractError::UnknownTarget(name.to_string()))?;
        let hit = self
            .scene
            .borrow()
            .get(id)
            .map(|obj| obj.transform.position)
            .unwrap_or_default();
        Ok((id, hit))
    }

    /// Id of the target or scene object called `name`.
    pub fn target_id(&self, name: &str) -> Option<EntityId> {
        self.names.get(name).copied()
    }

    pub fn gaze_target(&self, name: &str) -> Option<&SharedGazeTarget> {
        self.gaze_targets.get(name)
    }

    pub fn teleport_target(&self, name: &str) -> Option<&SharedTeleportTarget> {
        self.teleport_targets.get(name)
    }

    pub fn scene(&self) -> &SharedScene {
        &self.scene
    }

    pub fn dwell(&self) -> &DwellTimer {
        &self.dwell
    }

    pub fn indicator(&self) -> IndicatorState {
        *self.indicator.borrow()
    }

    pub fn tracker(&self) -> &SharedTracker {
        &self.tracker
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn avatar(&self) -> &Rc<RefCell<PlayerRig>> {
        &self.avatar
    }

    pub fn answer_option(&self, name: &str) -> Option<&SharedAnswerOption> {
        self.answer_options.get(name)
    }

    /// Status of the last answer chosen, if any.
    pub fn answer_status(&self) -> Option<AnswerStatus> {
        self.verdict.borrow().clone()
    }

    /// Take the scene's event log accumulated since the last call.
    pub fn drain_scene_events(&mut self) -> Vec<SceneEvent> {
        self.scene.borrow_mut().drain_events()
    }

    pub fn drain_pointer_events(&mut self) -> Vec<PointerEvent> {
        self.router.drain_pointer_events()
    }

    /// First blocking fault recorded by any teleport target.
    pub fn blocking_fault(&self) -> Option<InteractError> {
        self.teleport_targets
            .values()
            .find_map(|t| t.borrow().fault().cloned())
    }
}

/// Number of frames a wait of `seconds` takes at `frame_dt`, and the length of
/// the last (possibly shorter) frame. A final sliver under a microsecond is
/// folded into the previous frame.
fn wait_frames(seconds: f32, frame_dt: f32) -> (u64, f32) {
    let ratio = f64::from(seconds) / f64::from(frame_dt);
    if !ratio.is_finite() || ratio <= 0.0 {
        return (0, 0.0);
    }
    let mut frames = ratio.ceil() as u64;
    if frames > 0 && (ratio - (frames - 1) as f64) * f64::from(frame_dt) < 1e-6 {
        frames -= 1;
    }
    if frames == 0 {
        return (0, 0.0);
    }
    let last = f64::from(seconds) - (frames - 1) as f64 * f64::from(frame_dt);
    (frames, last as f32)
}

fn spawn_named(
    scene: &SharedScene,
    names: &mut BTreeMap<String, EntityId>,
    name: &str,
    transform: Transform,
    active: bool,
) -> EntityId {
    let id = scene.borrow_mut().spawn(name, transform, active);
    names.insert(name.to_string(), id);
    id
}
