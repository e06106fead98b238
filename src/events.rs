use std::fmt;

/// Marker on a clip's timeline that fires once per pass through `time`.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationEvent {
    pub clip_name: String,
    pub time: f32,
    pub label: String,
    pub triggered: bool,
}

impl AnimationEvent {
    pub fn new(clip_name: impl Into<String>, time: f32, label: impl Into<String>) -> Self {
        Self { clip_name: clip_name.into(), time, label: label.into(), triggered: false }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FiredEvent {
    pub clip: String,
    pub label: String,
    pub time: f32,
}

impl fmt::Display for FiredEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnimationEvent clip={} label={} time={:.3}", self.clip, self.label, self.time)
    }
}

pub trait AnimationEventListener {
    fn on_event(&mut self, event: &FiredEvent);
}

impl<F> AnimationEventListener for F
where
    F: FnMut(&FiredEvent),
{
    fn on_event(&mut self, event: &FiredEvent) {
        self(event)
    }
}

/// Stretch of clip time covered by one update.
///
/// `wrapped` means the clip looped inside the update, so the covered range is `from..=duration` followed
/// by `0..=to` (mirrored when `reverse`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventSweep {
    pub from: f32,
    pub to: f32,
    pub duration: f32,
    pub wrapped: bool,
    pub reverse: bool,
}

impl EventSweep {
    pub fn at(time: f32, duration: f32) -> Self {
        Self { from: time, to: time, duration, wrapped: false, reverse: false }
    }

    pub fn forward(from: f32, to: f32, duration: f32, wrapped: bool) -> Self {
        Self { from, to, duration, wrapped, reverse: false }
    }

    pub fn backward(from: f32, to: f32, duration: f32, wrapped: bool) -> Self {
        Self { from, to, duration, wrapped, reverse: true }
    }
}

#[derive(Clone, Debug, Default)]
pub struct EventTrack {
    events: Vec<AnimationEvent>,
}

impl EventTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: AnimationEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[AnimationEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn remove_clip(&mut self, clip_name: &str) {
        self.events.retain(|event| event.clip_name != clip_name);
    }

    /// Fires the markers of `clip` crossed by `sweep`, in registration order.
    ///
    /// A marker fires at most once per pass. On a wrap the tail of the previous pass is flushed first, then
    /// every marker of the clip is re-armed before the head of the new pass is scanned. Markers of other
    /// clips are left alone.
    pub fn check(&mut self, clip: &str, sweep: EventSweep) -> Vec<FiredEvent> {
        let mut fired = Vec::new();
        let (lo, hi) = if sweep.reverse { (sweep.to, sweep.from) } else { (sweep.from, sweep.to) };

        if sweep.wrapped {
            let tail = if sweep.reverse { (0.0, sweep.from) } else { (sweep.from, sweep.duration) };
            let head = if sweep.reverse { (sweep.to, sweep.duration) } else { (0.0, sweep.to) };
            self.fire_within(clip, tail, &mut fired);
            for event in self.events.iter_mut().filter(|event| event.clip_name == clip) {
                event.triggered = false;
            }
            self.fire_within(clip, head, &mut fired);
            return fired;
        }

        self.fire_within(clip, (lo, hi), &mut fired);
        for event in self.events.iter_mut().filter(|event| event.clip_name == clip) {
            let ahead = if sweep.reverse { event.time < sweep.to } else { event.time > sweep.to };
            if ahead {
                event.triggered = false;
            }
        }
        fired
    }

    fn fire_within(&mut self, clip: &str, (lo, hi): (f32, f32), fired: &mut Vec<FiredEvent>) {
        for event in &mut self.events {
            if event.clip_name != clip || event.triggered || event.time < lo || event.time > hi {
                continue;
            }
            event.triggered = true;
            let payload = FiredEvent { clip: event.clip_name.clone(), label: event.label.clone(), time: event.time };
            log::trace!("{payload}");
            fired.push(payload);
        }
    }
}

pub fn dispatch(listener: &mut dyn AnimationEventListener, fired: &[FiredEvent]) {
    for event in fired {
        listener.on_event(event);
    }
}
