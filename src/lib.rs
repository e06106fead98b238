pub mod animation_validation;
pub mod blend_tree;
pub mod clip;
pub mod config;
pub mod controller;
pub mod events;
pub mod playback;
pub mod pose;
pub mod profiler;
pub mod sampler;
pub mod skeleton;
pub mod state_machine;

pub use animation_validation::{ClipValidator, ValidationIssue, ValidationSeverity};
pub use blend_tree::{BlendNode, BlendTree, ACTIVE_WEIGHT_EPSILON};
pub use clip::{AnimationClip, BoneTrack, ClipLibrary, Interpolation, Keyframe};
pub use config::ControllerConfig;
pub use controller::AnimationController;
pub use events::{AnimationEvent, AnimationEventListener, EventSweep, FiredEvent};
pub use playback::{PlaybackPhase, PlaybackState};
pub use pose::{Pose, Transform};
pub use profiler::{PhaseTimingSummary, UpdatePhase};
pub use sampler::{sample_clip, sample_track};
pub use skeleton::{Bone, Skeleton};
pub use state_machine::{AnimationStateMachine, Condition, StateChange, Transition};
