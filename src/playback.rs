use crate::clip::ClipLibrary;
use crate::pose::{Pose, Transform};
use crate::sampler::{sample_clip, sample_clip_into, sample_root};
use crate::skeleton::Skeleton;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackPhase {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Cross-fade toward `next`; the incoming clip is held at time zero until the fade commits.
#[derive(Clone, Debug, PartialEq)]
struct CrossFade {
    next: String,
    elapsed: f32,
    duration: f32,
}

/// What a single [`PlaybackState::tick`] did, for callers that react to clip boundaries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub wrapped: bool,
    pub finished: bool,
    pub committed_fade: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackState {
    current_clip: Option<String>,
    current_time: f32,
    speed: f32,
    looping: bool,
    fade: Option<CrossFade>,
    phase: PlaybackPhase,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackState {
    pub fn new() -> Self {
        Self {
            current_clip: None,
            current_time: 0.0,
            speed: 1.0,
            looping: false,
            fade: None,
            phase: PlaybackPhase::Stopped,
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn current_clip(&self) -> Option<&str> {
        self.current_clip.as_deref()
    }

    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        if speed.is_finite() {
            self.speed = speed;
        }
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn next_clip(&self) -> Option<&str> {
        self.fade.as_ref().map(|fade| fade.next.as_str())
    }

    pub fn blend_elapsed(&self) -> f32 {
        self.fade.as_ref().map(|fade| fade.elapsed).unwrap_or(0.0)
    }

    pub fn blend_duration(&self) -> f32 {
        self.fade.as_ref().map(|fade| fade.duration).unwrap_or(0.0)
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn blend_factor(&self) -> f32 {
        match &self.fade {
            Some(fade) if fade.duration > 0.0 => (fade.elapsed / fade.duration).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    pub fn normalized_time(&self, library: &ClipLibrary) -> f32 {
        let Some(clip) = self.current_clip.as_deref().and_then(|name| library.get(name)) else {
            return 0.0;
        };
        if clip.duration > 0.0 {
            self.current_time / clip.duration
        } else {
            0.0
        }
    }

    pub fn play(&mut self, clip_name: &str, fade_time: f32, library: &ClipLibrary) -> bool {
        if !library.contains(clip_name) {
            log::debug!("play('{clip_name}') ignored: clip is not registered");
            return false;
        }

        if fade_time > 0.0 && self.phase == PlaybackPhase::Playing {
            self.fade = Some(CrossFade { next: clip_name.to_string(), elapsed: 0.0, duration: fade_time });
        } else {
            self.current_clip = Some(clip_name.to_string());
            self.current_time = 0.0;
            self.phase = PlaybackPhase::Playing;
            self.fade = None;
        }
        true
    }

    pub fn cross_fade(&mut self, clip_name: &str, fade_time: f32, library: &ClipLibrary) -> bool {
        self.play(clip_name, fade_time, library)
    }

    pub fn stop(&mut self) {
        self.phase = PlaybackPhase::Stopped;
        self.current_time = 0.0;
        self.fade = None;
    }

    pub fn pause(&mut self) {
        if self.phase == PlaybackPhase::Playing {
            self.phase = PlaybackPhase::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.phase == PlaybackPhase::Paused {
            self.phase = PlaybackPhase::Playing;
        }
    }

    /// Moves the current clip to `time`, wrapping when it loops and clamping otherwise. Phase and any
    /// cross-fade are kept.
    pub fn seek(&mut self, time: f32, library: &ClipLibrary) {
        let Some(clip) = self.current_clip.as_deref().and_then(|name| library.get(name)) else {
            return;
        };
        if !time.is_finite() || !clip.has_valid_duration() {
            return;
        }
        self.current_time = if clip.looping || self.looping {
            time.rem_euclid(clip.duration)
        } else {
            time.clamp(0.0, clip.duration)
        };
    }

    pub(crate) fn forget_clip(&mut self, clip_name: &str) {
        if self.next_clip() == Some(clip_name) {
            self.fade = None;
        }
        if self.current_clip.as_deref() == Some(clip_name) {
            self.current_clip = None;
            self.stop();
        }
    }

    pub fn tick(&mut self, delta: f32, library: &ClipLibrary) -> TickReport {
        let mut report = TickReport::default();
        if self.phase != PlaybackPhase::Playing || !delta.is_finite() {
            return report;
        }
        let Some(clip) = self.current_clip.as_deref().and_then(|name| library.get(name)) else {
            return report;
        };
        let duration = clip.duration;
        if duration.is_nan() || duration <= 0.0 {
            return report;
        }
        let looping = clip.looping || self.looping;

        self.current_time += delta * self.speed;
        if self.current_time >= duration {
            if looping {
                self.current_time %= duration;
                report.wrapped = true;
            } else {
                self.current_time = duration;
                report.finished = true;
                if self.fade.is_none() {
                    self.phase = PlaybackPhase::Stopped;
                }
            }
        } else if self.current_time < 0.0 {
            if looping {
                self.current_time = self.current_time.rem_euclid(duration);
                report.wrapped = true;
            } else {
                self.current_time = 0.0;
                report.finished = true;
                if self.fade.is_none() {
                    self.phase = PlaybackPhase::Stopped;
                }
            }
        }

        if let Some(fade) = self.fade.as_mut() {
            fade.elapsed += delta;
            if fade.elapsed >= fade.duration {
                let next = fade.next.clone();
                self.fade = None;
                self.current_clip = Some(next.clone());
                self.current_time = 0.0;
                report.committed_fade = Some(next);
                crate::profiler::record_fade_commit();
            }
        }
        report
    }

    pub fn pose(&self, library: &ClipLibrary, skeleton: &Skeleton) -> Pose {
        let mut out = Pose::default();
        self.pose_into(library, skeleton, &mut out);
        out
    }

    pub fn pose_into(&self, library: &ClipLibrary, skeleton: &Skeleton, out: &mut Pose) {
        let Some(current) = self.current_clip.as_deref().and_then(|name| library.get(name)) else {
            out.copy_from(&skeleton.bind_pose());
            return;
        };
        sample_clip_into(current, skeleton, self.current_time, out);

        let Some(next) = self.next_clip().and_then(|name| library.get(name)) else {
            return;
        };
        let incoming = sample_clip(next, skeleton, 0.0);
        let blended = Pose::blend(out, &incoming, self.blend_factor());
        crate::profiler::record_blend();
        out.copy_from(&blended);
    }

    pub fn root_transform(&self, library: &ClipLibrary, skeleton: &Skeleton) -> Transform {
        let Some(current) = self.current_clip.as_deref().and_then(|name| library.get(name)) else {
            return Transform::IDENTITY;
        };
        let outgoing = sample_root(current, skeleton, self.current_time);
        match self.next_clip().and_then(|name| library.get(name)) {
            Some(next) => outgoing.lerp(&sample_root(next, skeleton, 0.0), self.blend_factor()),
            None => outgoing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::AnimationClip;

    fn library() -> ClipLibrary {
        let mut library = ClipLibrary::new();
        library.insert(AnimationClip::new("loop", 2.0, true, Vec::new())).unwrap();
        library.insert(AnimationClip::new("once", 1.0, false, Vec::new())).unwrap();
        library
    }

    #[test]
    fn unknown_clip_is_ignored() {
        let library = library();
        let mut state = PlaybackState::new();
        assert!(state.play("loop", 0.0, &library));
        state.tick(0.5, &library);
        assert!(!state.play("missing", 0.2, &library));
        assert_eq!(state.current_clip(), Some("loop"));
        assert_eq!(state.current_time(), 0.5);
        assert!(!state.is_fading());
    }

    #[test]
    fn fade_requested_while_stopped_switches_immediately() {
        let library = library();
        let mut state = PlaybackState::new();
        state.play("loop", 0.5, &library);
        assert_eq!(state.phase(), PlaybackPhase::Playing);
        assert_eq!(state.current_clip(), Some("loop"));
        assert!(!state.is_fading());
    }

    #[test]
    fn pause_and_resume_require_prior_phase() {
        let library = library();
        let mut state = PlaybackState::new();
        state.resume();
        assert_eq!(state.phase(), PlaybackPhase::Stopped);
        state.play("loop", 0.0, &library);
        state.pause();
        assert_eq!(state.phase(), PlaybackPhase::Paused);
        state.tick(1.0, &library);
        assert_eq!(state.current_time(), 0.0, "paused playback does not advance");
        state.resume();
        assert_eq!(state.phase(), PlaybackPhase::Playing);
    }

    #[test]
    fn reverse_playback_wraps_and_clamps() {
        let library = library();
        let mut state = PlaybackState::new();
        state.set_speed(-1.0);
        state.play("loop", 0.0, &library);
        let report = state.tick(0.5, &library);
        assert!(report.wrapped);
        assert!((state.current_time() - 1.5).abs() < 1e-6);

        state.play("once", 0.0, &library);
        let report = state.tick(0.25, &library);
        assert!(report.finished);
        assert_eq!(state.current_time(), 0.0);
        assert_eq!(state.phase(), PlaybackPhase::Stopped);
    }

    #[test]
    fn controller_loop_override_wins_over_clip_flag() {
        let library = library();
        let mut state = PlaybackState::new();
        state.set_looping(true);
        state.play("once", 0.0, &library);
        state.tick(1.25, &library);
        assert_eq!(state.phase(), PlaybackPhase::Playing);
        assert!((state.current_time() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn ending_outgoing_clip_keeps_fade_alive() {
        let library = library();
        let mut state = PlaybackState::new();
        state.play("once", 0.0, &library);
        state.tick(0.9, &library);
        state.play("loop", 0.5, &library);
        state.tick(0.2, &library);
        assert_eq!(state.phase(), PlaybackPhase::Playing);
        assert_eq!(state.current_time(), 1.0);
        assert!(state.is_fading());
        state.tick(0.3, &library);
        assert_eq!(state.current_clip(), Some("loop"));
        assert!(!state.is_fading());
    }

    #[test]
    fn seek_wraps_looping_and_clamps_one_shots() {
        let library = library();
        let mut state = PlaybackState::new();
        state.seek(0.5, &library);
        assert_eq!(state.current_time(), 0.0, "nothing to seek without a clip");

        state.play("loop", 0.0, &library);
        state.seek(2.5, &library);
        assert!((state.current_time() - 0.5).abs() < 1e-6);
        state.seek(-0.5, &library);
        assert!((state.current_time() - 1.5).abs() < 1e-6);

        state.play("once", 0.0, &library);
        state.pause();
        state.seek(3.0, &library);
        assert_eq!(state.current_time(), 1.0);
        assert_eq!(state.phase(), PlaybackPhase::Paused);
        state.seek(f32::NAN, &library);
        assert_eq!(state.current_time(), 1.0);
    }
}
