use crate::clip::AnimationClip;
use crate::skeleton::Skeleton;
use std::fmt;

const ROTATION_NORM_TOLERANCE: f32 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationSeverity::Info => write!(f, "info"),
            ValidationSeverity::Warning => write!(f, "warning"),
            ValidationSeverity::Error => write!(f, "error"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    pub clip: String,
    /// Track index within the clip, when the issue is specific to one track.
    pub track: Option<usize>,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.track {
            Some(track) => write!(f, "[{}] clip '{}' track {track}: {}", self.severity, self.clip, self.message),
            None => write!(f, "[{}] clip '{}': {}", self.severity, self.clip, self.message),
        }
    }
}

/// Authoring checks for clips. Sampling tolerates every issue reported here; the validator exists so
/// content mistakes surface somewhere other than a silently wrong pose.
pub struct ClipValidator;

impl ClipValidator {
    pub fn validate(clip: &AnimationClip, skeleton: &Skeleton) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if !clip.has_valid_duration() {
            issues.push(Self::issue(
                clip,
                None,
                ValidationSeverity::Error,
                format!("Clip duration {} is not positive; the clip cannot be registered.", clip.duration),
            ));
        }
        if clip.tracks.is_empty() {
            issues.push(Self::issue(
                clip,
                None,
                ValidationSeverity::Warning,
                "Clip does not define any tracks; every bone will hold its bind pose.",
            ));
        }

        for (index, track) in clip.tracks.iter().enumerate() {
            if track.bone_index >= skeleton.len() {
                issues.push(Self::issue(
                    clip,
                    Some(index),
                    ValidationSeverity::Error,
                    format!(
                        "Bone index {} is outside the skeleton ({} bones); track is ignored.",
                        track.bone_index,
                        skeleton.len()
                    ),
                ));
            }
            if track.keyframes.is_empty() {
                issues.push(Self::issue(
                    clip,
                    Some(index),
                    ValidationSeverity::Warning,
                    "Track has no keyframes; bone samples to its bind pose.",
                ));
                continue;
            }
            if track.keyframes.windows(2).any(|pair| pair[1].time < pair[0].time) {
                issues.push(Self::issue(
                    clip,
                    Some(index),
                    ValidationSeverity::Error,
                    "Keyframes are not sorted by time.",
                ));
            }
            if let Some(kf) = track.keyframes.iter().find(|kf| !kf.time.is_finite() || kf.time < 0.0) {
                issues.push(Self::issue(
                    clip,
                    Some(index),
                    ValidationSeverity::Error,
                    format!("Keyframe time {} must be finite and non-negative.", kf.time),
                ));
            }
            let non_unit =
                track.keyframes.iter().filter(|kf| (kf.rotation.length() - 1.0).abs() > ROTATION_NORM_TOLERANCE).count();
            if non_unit > 0 {
                issues.push(Self::issue(
                    clip,
                    Some(index),
                    ValidationSeverity::Warning,
                    format!("{non_unit} keyframe rotation(s) are not unit quaternions."),
                ));
            }
            let latest = track.keyframes.iter().map(|kf| kf.time).fold(0.0_f32, f32::max);
            if clip.has_valid_duration() && latest > clip.duration + f32::EPSILON {
                issues.push(Self::issue(
                    clip,
                    Some(index),
                    ValidationSeverity::Warning,
                    format!(
                        "Latest keyframe at {:.3}s lies past the clip duration {:.3}s and is never reached.",
                        latest, clip.duration
                    ),
                ));
            }
        }

        if issues.iter().all(|issue| issue.severity == ValidationSeverity::Info) {
            let keys: usize = clip.tracks.iter().map(|track| track.keyframes.len()).sum();
            issues.push(Self::issue(
                clip,
                None,
                ValidationSeverity::Info,
                format!(
                    "Clip OK: duration {:.3}s, {} track(s), {keys} keyframe(s)",
                    clip.duration,
                    clip.tracks.len()
                ),
            ));
        }
        issues
    }

    /// Highest severity among `issues`, if any.
    pub fn worst(issues: &[ValidationIssue]) -> Option<ValidationSeverity> {
        issues.iter().map(|issue| issue.severity).max()
    }

    fn issue(
        clip: &AnimationClip,
        track: Option<usize>,
        severity: ValidationSeverity,
        message: impl Into<String>,
    ) -> ValidationIssue {
        ValidationIssue { severity, clip: clip.name.clone(), track, message: message.into() }
    }
}
