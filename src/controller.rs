use crate::animation_validation::{ClipValidator, ValidationSeverity};
use crate::blend_tree::BlendTree;
use crate::clip::{AnimationClip, ClipLibrary};
use crate::config::ControllerConfig;
use crate::events::{dispatch, AnimationEvent, AnimationEventListener, EventSweep, EventTrack, FiredEvent};
use crate::playback::{PlaybackPhase, PlaybackState};
use crate::pose::{Pose, Transform};
use crate::profiler::{PhaseTimingSummary, UpdatePhase, UpdateProfiler};
use crate::sampler::sample_clip;
use crate::skeleton::Skeleton;
use crate::state_machine::AnimationStateMachine;
use anyhow::Result;
use glam::Mat4;

/// Drives one skeleton: owns its clips, playback, optional state machine and blend tree, and the events
/// registered against its clips.
///
/// Call [`AnimationController::update`] once per simulation tick; the pose it produces stays valid until
/// the next call.
pub struct AnimationController {
    skeleton: Skeleton,
    clips: ClipLibrary,
    playback: PlaybackState,
    state_machine: AnimationStateMachine,
    use_state_machine: bool,
    blend_tree: BlendTree,
    use_blend_tree: bool,
    events: EventTrack,
    listener: Option<Box<dyn AnimationEventListener>>,
    fired: Vec<FiredEvent>,
    default_blend_time: f32,
    pose: Pose,
    profiler: UpdateProfiler,
}

impl AnimationController {
    pub fn new(skeleton: Skeleton) -> Self {
        Self::with_config(skeleton, ControllerConfig::default())
    }

    pub fn with_config(skeleton: Skeleton, config: ControllerConfig) -> Self {
        if let Err(err) = skeleton.validate() {
            log::warn!("Animation controller skeleton is malformed: {err}");
        }
        let mut playback = PlaybackState::new();
        playback.set_speed(config.speed);
        playback.set_looping(config.looping_override);
        let pose = skeleton.bind_pose();
        Self {
            skeleton,
            clips: ClipLibrary::new(),
            playback,
            state_machine: AnimationStateMachine::new(),
            use_state_machine: config.state_machine_enabled,
            blend_tree: BlendTree::new(),
            use_blend_tree: config.blend_tree_enabled,
            events: EventTrack::new(),
            listener: None,
            fired: Vec::new(),
            default_blend_time: config.default_blend_time.max(0.0),
            pose,
            profiler: UpdateProfiler::new(),
        }
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn set_skeleton(&mut self, skeleton: Skeleton) {
        if let Err(err) = skeleton.validate() {
            log::warn!("Animation controller skeleton is malformed: {err}");
        }
        self.pose = skeleton.bind_pose();
        self.skeleton = skeleton;
    }

    pub fn add_clip(&mut self, clip: AnimationClip) -> Result<()> {
        for issue in ClipValidator::validate(&clip, &self.skeleton) {
            match issue.severity {
                ValidationSeverity::Info => log::debug!("{issue}"),
                ValidationSeverity::Warning | ValidationSeverity::Error => log::warn!("{issue}"),
            }
        }
        let name = clip.name.clone();
        let result = self.clips.insert(clip);
        if let Err(err) = &result {
            log::warn!("Rejected animation clip '{name}': {err}");
        }
        result
    }

    pub fn remove_clip(&mut self, name: &str) -> Option<AnimationClip> {
        let removed = self.clips.remove(name)?;
        self.playback.forget_clip(name);
        self.events.remove_clip(name);
        Some(removed)
    }

    pub fn has_clip(&self, name: &str) -> bool {
        self.clips.contains(name)
    }

    pub fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.clips.get(name)
    }

    pub fn clips(&self) -> &ClipLibrary {
        &self.clips
    }

    pub fn play(&mut self, clip_name: &str, fade_time: f32) {
        self.playback.play(clip_name, fade_time, &self.clips);
    }

    pub fn cross_fade(&mut self, clip_name: &str, fade_time: f32) {
        self.playback.cross_fade(clip_name, fade_time, &self.clips);
    }

    /// Jumps the current clip to `time`, wrapped or clamped to the clip. Markers skipped over do not fire.
    pub fn seek(&mut self, time: f32) {
        self.playback.seek(time, &self.clips);
    }

    pub fn stop(&mut self) {
        self.playback.stop();
    }

    pub fn pause(&mut self) {
        self.playback.pause();
    }

    pub fn resume(&mut self) {
        self.playback.resume();
    }

    pub fn state(&self) -> PlaybackPhase {
        self.playback.phase()
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn current_clip(&self) -> Option<&str> {
        self.playback.current_clip()
    }

    pub fn current_time(&self) -> f32 {
        self.playback.current_time()
    }

    pub fn normalized_time(&self) -> f32 {
        self.playback.normalized_time(&self.clips)
    }

    pub fn speed(&self) -> f32 {
        self.playback.speed()
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.playback.set_speed(speed);
    }

    pub fn is_looping(&self) -> bool {
        self.playback.looping()
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.playback.set_looping(looping);
    }

    pub fn default_blend_time(&self) -> f32 {
        self.default_blend_time
    }

    pub fn state_machine(&self) -> &AnimationStateMachine {
        &self.state_machine
    }

    pub fn state_machine_mut(&mut self) -> &mut AnimationStateMachine {
        &mut self.state_machine
    }

    pub fn enable_state_machine(&mut self, enable: bool) {
        self.use_state_machine = enable;
    }

    pub fn blend_tree(&self) -> &BlendTree {
        &self.blend_tree
    }

    pub fn blend_tree_mut(&mut self) -> &mut BlendTree {
        &mut self.blend_tree
    }

    pub fn enable_blend_tree(&mut self, enable: bool) {
        self.use_blend_tree = enable;
    }

    pub fn add_event(&mut self, clip_name: impl Into<String>, time: f32, label: impl Into<String>) {
        self.events.add(AnimationEvent::new(clip_name, time, label));
    }

    pub fn events(&self) -> &EventTrack {
        &self.events
    }

    pub fn set_event_listener(&mut self, listener: impl AnimationEventListener + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_event_listener(&mut self) {
        self.listener = None;
    }

    pub fn fired_events(&self) -> &[FiredEvent] {
        &self.fired
    }

    /// Advances playback, applies the state machine, fires due events and refreshes the published pose.
    pub fn update(&mut self, delta: f32) {
        // Lifted out so the timed closures can borrow the rest of the controller.
        let mut profiler = std::mem::take(&mut self.profiler);
        let from = self.playback.current_time();

        let report = profiler.measure(UpdatePhase::Tick, || self.playback.tick(delta, &self.clips));
        let mut restarted = report.committed_fade.is_some();
        if self.use_state_machine {
            restarted |= profiler.measure(UpdatePhase::StateMachine, || self.apply_state_machine(delta));
        }
        profiler.measure(UpdatePhase::Events, || self.fire_events(from, report.wrapped, restarted));

        let mut pose = std::mem::take(&mut self.pose);
        profiler.measure(UpdatePhase::Pose, || self.compute_pose(&mut pose));
        self.pose = pose;
        self.profiler = profiler;
    }

    pub fn bone_transforms(&self) -> &Pose {
        &self.pose
    }

    pub fn evaluate_pose(&self) -> Pose {
        let mut pose = Pose::default();
        self.compute_pose(&mut pose);
        pose
    }

    pub fn current_transform(&self) -> Transform {
        if self.skeleton.is_empty() {
            return self.playback.root_transform(&self.clips, &self.skeleton);
        }
        self.pose.get(0).copied().unwrap_or_else(|| self.skeleton.bind_pose()[0])
    }

    pub fn model_matrices(&self) -> Vec<Mat4> {
        self.pose.model_matrices(&self.skeleton)
    }

    pub fn timings(&self) -> Vec<PhaseTimingSummary> {
        self.profiler.summaries()
    }

    // Starts the state's clip unless it is already playing or being faded in. Returns true when the clip
    // was switched immediately, restarting clip time.
    fn apply_state_machine(&mut self, delta: f32) -> bool {
        let change = self.state_machine.update(delta);
        let Some(target) = self.state_machine.target_clip() else {
            return false;
        };
        if self.playback.current_clip() == Some(target) || self.playback.next_clip() == Some(target) {
            return false;
        }
        let fade = change.map(|change| change.blend_time).unwrap_or(self.default_blend_time);
        self.playback.play(target, fade, &self.clips) && !self.playback.is_fading()
    }

    fn fire_events(&mut self, from: f32, wrapped: bool, restarted: bool) {
        self.fired.clear();
        let Some(clip) = self.playback.current_clip() else {
            return;
        };
        let duration = self.clips.get(clip).map(|clip| clip.duration).unwrap_or(0.0);
        let to = self.playback.current_time();
        let sweep = if restarted {
            EventSweep::at(to, duration)
        } else if self.playback.speed() < 0.0 {
            EventSweep::backward(from, to, duration, wrapped)
        } else {
            EventSweep::forward(from, to, duration, wrapped)
        };
        self.fired = self.events.check(clip, sweep);
        if let Some(listener) = self.listener.as_deref_mut() {
            dispatch(listener, &self.fired);
        }
    }

    fn compute_pose(&self, out: &mut Pose) {
        if self.use_blend_tree && self.blend_tree_pose(out) {
            return;
        }
        self.playback.pose_into(&self.clips, &self.skeleton, out);
    }

    // Samples every active blend-tree clip at the controller's normalized phase and accumulates them by
    // weight. Returns false when no active clip is registered.
    fn blend_tree_pose(&self, out: &mut Pose) -> bool {
        let active = self.blend_tree.active_clips();
        if active.is_empty() {
            return false;
        }
        let phase = self.playback.normalized_time(&self.clips);
        let sampled: Vec<(Pose, f32)> = active
            .iter()
            .filter_map(|(name, weight)| {
                let clip = self.clips.get(name)?;
                Some((sample_clip(clip, &self.skeleton, phase * clip.duration), *weight))
            })
            .collect();
        if sampled.is_empty() {
            return false;
        }
        let weighted: Vec<(&Pose, f32)> = sampled.iter().map(|(pose, weight)| (pose, *weight)).collect();
        let accumulated = Pose::accumulate(&weighted, &self.skeleton.bind_pose());
        crate::profiler::record_blend();
        out.copy_from(&accumulated);
        true
    }
}
