use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpdatePhase {
    Tick,
    StateMachine,
    Events,
    Pose,
}

impl UpdatePhase {
    pub const ALL: [UpdatePhase; 4] = [UpdatePhase::Tick, UpdatePhase::StateMachine, UpdatePhase::Events, UpdatePhase::Pose];

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseTimingSummary {
    pub phase: UpdatePhase,
    pub last_ms: f32,
    pub average_ms: f32,
    pub max_ms: f32,
    pub samples: u64,
}

#[derive(Clone, Copy, Debug, Default)]
struct PhaseClock {
    last_ms: f32,
    total_ms: f64,
    max_ms: f32,
    samples: u64,
}

/// Wall-clock cost of each stage of `AnimationController::update`.
#[derive(Clone, Debug, Default)]
pub struct UpdateProfiler {
    clocks: [PhaseClock; 4],
}

impl UpdateProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn measure<R>(&mut self, phase: UpdatePhase, work: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let out = work();
        let elapsed_ms = start.elapsed().as_secs_f32() * 1000.0;
        let clock = &mut self.clocks[phase.slot()];
        clock.last_ms = elapsed_ms;
        clock.max_ms = clock.max_ms.max(elapsed_ms);
        clock.total_ms += f64::from(elapsed_ms);
        clock.samples += 1;
        out
    }

    pub fn timing(&self, phase: UpdatePhase) -> Option<PhaseTimingSummary> {
        let clock = self.clocks[phase.slot()];
        if clock.samples == 0 {
            return None;
        }
        Some(PhaseTimingSummary {
            phase,
            last_ms: clock.last_ms,
            average_ms: (clock.total_ms / clock.samples as f64) as f32,
            max_ms: clock.max_ms,
            samples: clock.samples,
        })
    }

    /// Phases that ran at least once, in update order.
    pub fn summaries(&self) -> Vec<PhaseTimingSummary> {
        UpdatePhase::ALL.iter().filter_map(|phase| self.timing(*phase)).collect()
    }
}

/// Process-wide sampling counters, compiled in with the `anim_stats` feature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnimationStats {
    pub clip_samples: u64,
    pub pose_blends: u64,
    pub fades_committed: u64,
}

#[cfg(feature = "anim_stats")]
mod counters {
    use super::AnimationStats;
    use std::sync::atomic::{AtomicU64, Ordering};

    static CLIP_SAMPLES: AtomicU64 = AtomicU64::new(0);
    static POSE_BLENDS: AtomicU64 = AtomicU64::new(0);
    static FADES_COMMITTED: AtomicU64 = AtomicU64::new(0);

    pub(crate) fn record_sample() {
        CLIP_SAMPLES.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_blend() {
        POSE_BLENDS.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fade_commit() {
        FADES_COMMITTED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn animation_stats() -> AnimationStats {
        AnimationStats {
            clip_samples: CLIP_SAMPLES.load(Ordering::Relaxed),
            pose_blends: POSE_BLENDS.load(Ordering::Relaxed),
            fades_committed: FADES_COMMITTED.load(Ordering::Relaxed),
        }
    }
}

#[cfg(not(feature = "anim_stats"))]
mod counters {
    use super::AnimationStats;

    #[inline(always)]
    pub(crate) fn record_sample() {}

    #[inline(always)]
    pub(crate) fn record_blend() {}

    #[inline(always)]
    pub(crate) fn record_fade_commit() {}

    pub fn animation_stats() -> AnimationStats {
        AnimationStats::default()
    }
}

pub use counters::animation_stats;
pub(crate) use counters::{record_blend, record_fade_commit, record_sample};
