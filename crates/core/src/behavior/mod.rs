//! Time driven property mutators attached to actors.
//!
//! A [`Behavior`] owns a time window (`start_time`, `duration`, both in
//! milliseconds of scene time) and a [`BehaviorKind`] describing which actor
//! properties it drives. On every frame the scene calls [`Behavior::apply`],
//! which normalises the elapsed time, applies the cycle and ping-pong policies,
//! eases the result through the [`Interpolator`] and writes the property.

mod interpolator;

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

pub use interpolator::Interpolator;

use crate::{actor::ActorTransform, path::Path, Result, StagehandError};

static NEXT_BEHAVIOR_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BehaviorId(u64);

impl BehaviorId {
    fn next() -> Self {
        Self(NEXT_BEHAVIOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for BehaviorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "behavior#{}", self.0)
    }
}

/// Lifecycle of a behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BehaviorState {
    #[default]
    NotStarted,
    Running,
    Expired,
}

impl BehaviorState {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::Running => "running",
            Self::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorEventKind {
    Started,
    Expired,
}

/// Notification handed to behavior listeners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviorEvent {
    pub behavior: BehaviorId,
    pub kind: BehaviorEventKind,
    pub time: f64,
}

pub type BehaviorListener = Box<dyn FnMut(&BehaviorEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotateBehavior {
    pub start_angle: f64,
    pub end_angle: f64,
}

impl RotateBehavior {
    pub fn set_values(&mut self, start_angle: f64, end_angle: f64) -> &mut Self {
        self.start_angle = start_angle;
        self.end_angle = end_angle;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleBehavior {
    pub start_x: f64,
    pub end_x: f64,
    pub start_y: f64,
    pub end_y: f64,
}

impl ScaleBehavior {
    pub fn set_values(&mut self, start_x: f64, end_x: f64, start_y: f64, end_y: f64) -> &mut Self {
        self.start_x = start_x;
        self.end_x = end_x;
        self.start_y = start_y;
        self.end_y = end_y;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlphaBehavior {
    pub start_alpha: f64,
    pub end_alpha: f64,
}

impl AlphaBehavior {
    pub fn set_values(&mut self, start_alpha: f64, end_alpha: f64) -> &mut Self {
        self.start_alpha = start_alpha;
        self.end_alpha = end_alpha;
        self
    }
}

/// Moves the actor's centre along a [`Path`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathBehavior {
    path: Path,
    auto_rotate: bool,
}

impl PathBehavior {
    pub fn set_path(&mut self, path: Path) -> &mut Self {
        self.path = path;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When enabled the actor is rotated to face the direction of travel.
    pub fn set_auto_rotate(&mut self, auto_rotate: bool) -> &mut Self {
        self.auto_rotate = auto_rotate;
        self
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }
}

/// Groups child behaviors whose time windows are relative to the container's
/// start time and must lie inside `[0, duration]` of the container.
#[derive(Debug, Default)]
pub struct ContainerBehavior {
    behaviors: Vec<Behavior>,
}

impl ContainerBehavior {
    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    fn check_range(child: &Behavior, duration: f64) -> Result<()> {
        let end = child.start_time + child.duration;
        if end > duration {
            return Err(StagehandError::BehaviorRange {
                start: child.start_time,
                end,
                container: duration,
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum BehaviorKind {
    Rotate(RotateBehavior),
    Scale(ScaleBehavior),
    Alpha(AlphaBehavior),
    Path(PathBehavior),
    Container(ContainerBehavior),
}

pub struct Behavior {
    id: BehaviorId,
    start_time: f64,
    duration: f64,
    ping_pong: bool,
    cycle: bool,
    interpolator: Interpolator,
    state: BehaviorState,
    cycle_index: u64,
    listeners: Vec<BehaviorListener>,
    kind: BehaviorKind,
}

impl Behavior {
    pub fn new(kind: BehaviorKind) -> Self {
        Self {
            id: BehaviorId::next(),
            start_time: 0.0,
            duration: 0.0,
            ping_pong: false,
            cycle: false,
            interpolator: Interpolator::Linear,
            state: BehaviorState::NotStarted,
            cycle_index: 0,
            listeners: Vec::new(),
            kind,
        }
    }

    pub fn rotate(start_angle: f64, end_angle: f64) -> Self {
        Self::new(BehaviorKind::Rotate(RotateBehavior {
            start_angle,
            end_angle,
        }))
    }

    pub fn scale(start_x: f64, end_x: f64, start_y: f64, end_y: f64) -> Self {
        Self::new(BehaviorKind::Scale(ScaleBehavior {
            start_x,
            end_x,
            start_y,
            end_y,
        }))
    }

    pub fn alpha(start_alpha: f64, end_alpha: f64) -> Self {
        Self::new(BehaviorKind::Alpha(AlphaBehavior {
            start_alpha,
            end_alpha,
        }))
    }

    pub fn path(path: Path) -> Self {
        Self::new(BehaviorKind::Path(PathBehavior {
            path,
            auto_rotate: false,
        }))
    }

    pub fn container() -> Self {
        Self::new(BehaviorKind::Container(ContainerBehavior::default()))
    }

    pub fn id(&self) -> BehaviorId {
        self.id
    }

    pub fn kind(&self) -> &BehaviorKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut BehaviorKind {
        &mut self.kind
    }

    pub fn state(&self) -> BehaviorState {
        self.state
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_ping_pong(&self) -> bool {
        self.ping_pong
    }

    pub fn is_cycle(&self) -> bool {
        self.cycle
    }

    /// Sets the active window. Both values are milliseconds and must be
    /// finite and non-negative. Containers re-check their children against the
    /// new duration.
    pub fn set_frame_time(&mut self, start_time: f64, duration: f64) -> Result<&mut Self> {
        if !start_time.is_finite() || !duration.is_finite() || start_time < 0.0 || duration < 0.0
        {
            return Err(StagehandError::InvalidInput(format!(
                "behavior frame time must be non-negative, got start {start_time} duration {duration}"
            )));
        }
        if let BehaviorKind::Container(container) = &self.kind {
            for child in &container.behaviors {
                ContainerBehavior::check_range(child, duration)?;
            }
        }
        self.start_time = start_time;
        self.duration = duration;
        Ok(self)
    }

    pub fn set_ping_pong(&mut self, ping_pong: bool) -> &mut Self {
        self.ping_pong = ping_pong;
        self
    }

    pub fn set_cycle(&mut self, cycle: bool) -> &mut Self {
        self.cycle = cycle;
        self
    }

    pub fn set_interpolator(&mut self, interpolator: Interpolator) -> &mut Self {
        self.interpolator = interpolator;
        self
    }

    pub fn add_listener(&mut self, listener: impl FnMut(&BehaviorEvent) + 'static) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Adds a child to a container behavior. Children outside the
    /// container's window are rejected rather than clamped.
    pub fn add_behavior(&mut self, child: Behavior) -> Result<&mut Self> {
        let (id, duration) = (self.id, self.duration);
        let BehaviorKind::Container(container) = &mut self.kind else {
            return Err(StagehandError::InvalidInput(format!(
                "{id} is not a container behavior"
            )));
        };
        ContainerBehavior::check_range(&child, duration)?;
        container.behaviors.push(child);
        Ok(self)
    }

    /// Returns the behavior to `NotStarted`, recursively for containers.
    pub fn reset(&mut self) {
        self.state = BehaviorState::NotStarted;
        self.cycle_index = 0;
        if let BehaviorKind::Container(container) = &mut self.kind {
            for child in &mut container.behaviors {
                child.reset();
            }
        }
    }

    /// Shapes a raw `[0, 1]` fraction through ping-pong and the interpolator.
    pub fn progress(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        let t = if self.ping_pong {
            if t < 0.5 {
                2.0 * t
            } else {
                2.0 - 2.0 * t
            }
        } else {
            t
        };
        self.interpolator.interpolate(t)
    }

    /// Advances the behavior to `time` and mutates `target`. Returns the
    /// expiry event on the call that expires the behavior.
    pub fn apply(&mut self, time: f64, target: &mut ActorTransform) -> Option<BehaviorEvent> {
        if self.state == BehaviorState::Expired || time < self.start_time {
            return None;
        }

        if self.state == BehaviorState::NotStarted {
            self.state = BehaviorState::Running;
            self.notify(BehaviorEventKind::Started, time);
        }

        let elapsed = time - self.start_time;
        let finished = !self.cycle && elapsed >= self.duration;
        let fraction = if finished || self.duration <= 0.0 {
            1.0
        } else if self.cycle {
            let cycle_index = (elapsed / self.duration).floor() as u64;
            if cycle_index != self.cycle_index {
                self.cycle_index = cycle_index;
                self.restart_children();
            }
            elapsed.rem_euclid(self.duration) / self.duration
        } else {
            elapsed / self.duration
        };

        let progress = self.progress(fraction);
        let local_time = fraction * self.duration;
        match &mut self.kind {
            BehaviorKind::Rotate(rotate) => {
                target.rotation = lerp(rotate.start_angle, rotate.end_angle, progress);
            }
            BehaviorKind::Scale(scale) => {
                target.scale_x = lerp(scale.start_x, scale.end_x, progress);
                target.scale_y = lerp(scale.start_y, scale.end_y, progress);
            }
            BehaviorKind::Alpha(alpha) => {
                target.alpha = lerp(alpha.start_alpha, alpha.end_alpha, progress).clamp(0.0, 1.0);
            }
            BehaviorKind::Path(follow) => {
                let point = follow.path.position_at(progress);
                target.center_at(point);
                if follow.auto_rotate {
                    target.rotation = follow.path.tangent_at(progress);
                }
            }
            BehaviorKind::Container(container) => {
                for child in &mut container.behaviors {
                    child.apply(local_time, target);
                }
            }
        }

        if !finished {
            return None;
        }

        self.state = BehaviorState::Expired;
        tracing::debug!(behavior = %self.id, time, "behavior expired");
        Some(self.notify(BehaviorEventKind::Expired, time))
    }

    fn restart_children(&mut self) {
        if let BehaviorKind::Container(container) = &mut self.kind {
            for child in &mut container.behaviors {
                child.reset();
            }
        }
    }

    fn notify(&mut self, kind: BehaviorEventKind, time: f64) -> BehaviorEvent {
        let event = BehaviorEvent {
            behavior: self.id,
            kind,
            time,
        };
        for listener in &mut self.listeners {
            listener(&event);
        }
        event
    }
}

impl std::fmt::Debug for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Behavior")
            .field("id", &self.id)
            .field("start_time", &self.start_time)
            .field("duration", &self.duration)
            .field("ping_pong", &self.ping_pong)
            .field("cycle", &self.cycle)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .field("kind", &self.kind)
            .finish()
    }
}

#[inline]
fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, f64::consts::PI, rc::Rc};

    use approx::assert_relative_eq;

    use super::*;
    use crate::Point;

    fn transform() -> ActorTransform {
        ActorTransform {
            width: 10.0,
            height: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn rotate_reaches_end_and_expires() {
        let mut behavior = Behavior::rotate(0.0, 2.0 * PI);
        behavior.set_frame_time(0.0, 1000.0).unwrap();
        let mut target = transform();

        assert!(behavior.apply(500.0, &mut target).is_none());
        assert_relative_eq!(target.rotation, PI);
        assert_eq!(behavior.state(), BehaviorState::Running);

        let event = behavior.apply(1000.0, &mut target).unwrap();
        assert_eq!(event.kind, BehaviorEventKind::Expired);
        assert_relative_eq!(target.rotation, 2.0 * PI);
        assert_eq!(behavior.state(), BehaviorState::Expired);
    }

    #[test]
    fn waits_for_start_time() {
        let mut behavior = Behavior::alpha(1.0, 0.0);
        behavior.set_frame_time(200.0, 100.0).unwrap();
        let mut target = transform();
        assert!(behavior.apply(100.0, &mut target).is_none());
        assert_eq!(behavior.state(), BehaviorState::NotStarted);
        assert_eq!(target.alpha, 1.0);

        behavior.apply(250.0, &mut target);
        assert_relative_eq!(target.alpha, 0.5);
    }

    #[test]
    fn negative_frame_time_is_rejected() {
        let mut behavior = Behavior::rotate(0.0, 1.0);
        assert!(behavior.set_frame_time(-1.0, 10.0).is_err());
        assert!(behavior.set_frame_time(0.0, -10.0).is_err());
        assert!(behavior.set_frame_time(0.0, f64::NAN).is_err());
    }

    #[test]
    fn listeners_fire_once_on_expiry() {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = fired.clone();
        let mut behavior = Behavior::scale(1.0, 2.0, 1.0, 2.0);
        behavior
            .set_frame_time(0.0, 100.0)
            .unwrap()
            .add_listener(move |event| sink.borrow_mut().push(event.kind));

        let mut target = transform();
        for time in [0.0, 50.0, 100.0, 150.0, 400.0] {
            behavior.apply(time, &mut target);
        }
        assert_eq!(
            *fired.borrow(),
            vec![BehaviorEventKind::Started, BehaviorEventKind::Expired]
        );
        assert_eq!(target.scale_x, 2.0);
    }

    #[test]
    fn ping_pong_mirrors_progress() {
        let mut behavior = Behavior::rotate(0.0, 1.0);
        behavior.set_frame_time(0.0, 1000.0).unwrap().set_ping_pong(true);
        for t in [0.0, 0.1, 0.25, 0.4] {
            assert_relative_eq!(behavior.progress(t), behavior.progress(1.0 - t));
        }
        assert_relative_eq!(behavior.progress(0.5), 1.0);

        let mut target = transform();
        behavior.apply(250.0, &mut target);
        let rising = target.rotation;
        behavior.apply(750.0, &mut target);
        assert_relative_eq!(target.rotation, rising);
    }

    #[test]
    fn cycling_never_expires() {
        let mut behavior = Behavior::alpha(0.0, 1.0);
        behavior.set_frame_time(0.0, 100.0).unwrap().set_cycle(true);
        let mut target = transform();
        assert!(behavior.apply(250.0, &mut target).is_none());
        assert_relative_eq!(target.alpha, 0.5);
        assert_eq!(behavior.state(), BehaviorState::Running);
    }

    #[test]
    fn container_rejects_out_of_range_children() {
        let mut container = Behavior::container();
        container.set_frame_time(0.0, 1000.0).unwrap();

        let mut inside = Behavior::rotate(0.0, 1.0);
        inside.set_frame_time(200.0, 800.0).unwrap();
        container.add_behavior(inside).unwrap();

        let mut outside = Behavior::rotate(0.0, 1.0);
        outside.set_frame_time(500.0, 600.0).unwrap();
        let err = container.add_behavior(outside).unwrap_err();
        assert!(matches!(err, StagehandError::BehaviorRange { end, .. } if end == 1100.0));

        assert!(container.set_frame_time(0.0, 900.0).is_err());
        assert_eq!(container.duration(), 1000.0);
    }

    #[test]
    fn container_runs_children_on_local_clock() {
        let mut container = Behavior::container();
        container.set_frame_time(1000.0, 1000.0).unwrap();
        let mut first = Behavior::rotate(0.0, 1.0);
        first.set_frame_time(0.0, 500.0).unwrap();
        let mut second = Behavior::alpha(1.0, 0.0);
        second.set_frame_time(500.0, 500.0).unwrap();
        container.add_behavior(first).unwrap().add_behavior(second).unwrap();

        let mut target = transform();
        container.apply(1250.0, &mut target);
        assert_relative_eq!(target.rotation, 0.5);
        assert_eq!(target.alpha, 1.0);

        container.apply(1750.0, &mut target);
        assert_relative_eq!(target.rotation, 1.0);
        assert_relative_eq!(target.alpha, 0.5);

        assert!(container.apply(2000.0, &mut target).is_some());
        assert_relative_eq!(target.alpha, 0.0);
        if let BehaviorKind::Container(inner) = container.kind() {
            assert!(inner
                .behaviors()
                .iter()
                .all(|child| child.state() == BehaviorState::Expired));
        }
    }

    #[test]
    fn cycling_container_restarts_children_each_wrap() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let mut child = Behavior::rotate(0.0, 1.0);
        child
            .set_frame_time(0.0, 50.0)
            .unwrap()
            .add_listener(move |event| sink.borrow_mut().push(event.kind));

        let mut container = Behavior::container();
        container.set_frame_time(0.0, 100.0).unwrap().set_cycle(true);
        container.add_behavior(child).unwrap();

        let child_state = |container: &Behavior| match container.kind() {
            BehaviorKind::Container(inner) => inner.behaviors()[0].state(),
            _ => unreachable!(),
        };

        let mut target = transform();
        container.apply(25.0, &mut target);
        assert_relative_eq!(target.rotation, 0.5);
        container.apply(60.0, &mut target);
        assert_relative_eq!(target.rotation, 1.0);
        assert_eq!(child_state(&container), BehaviorState::Expired);

        container.apply(125.0, &mut target);
        assert_eq!(child_state(&container), BehaviorState::Running);
        assert_relative_eq!(target.rotation, 0.5);
        container.apply(180.0, &mut target);
        assert_eq!(child_state(&container), BehaviorState::Expired);

        assert!(container.apply(210.0, &mut target).is_none());
        assert_relative_eq!(target.rotation, 0.2, epsilon = 1e-12);
        assert_eq!(container.state(), BehaviorState::Running);

        let expiries = events
            .borrow()
            .iter()
            .filter(|&&kind| kind == BehaviorEventKind::Expired)
            .count();
        assert_eq!(expiries, 2);
    }

    #[test]
    fn ping_pong_repeats_in_every_cycle() {
        let mut behavior = Behavior::rotate(0.0, 1.0);
        behavior
            .set_frame_time(0.0, 100.0)
            .unwrap()
            .set_cycle(true)
            .set_ping_pong(true);
        let mut target = transform();

        behavior.apply(130.0, &mut target);
        let rising = target.rotation;
        assert_relative_eq!(rising, 0.6, epsilon = 1e-12);
        behavior.apply(170.0, &mut target);
        assert_relative_eq!(target.rotation, rising, epsilon = 1e-12);

        behavior.apply(250.0, &mut target);
        assert_relative_eq!(target.rotation, 1.0);
        assert!(behavior.apply(300.0, &mut target).is_none());
        assert_relative_eq!(target.rotation, 0.0);
        assert_eq!(behavior.state(), BehaviorState::Running);
    }

    #[test]
    fn add_behavior_requires_container() {
        let mut rotate = Behavior::rotate(0.0, 1.0);
        assert!(rotate.add_behavior(Behavior::alpha(0.0, 1.0)).is_err());
    }

    #[test]
    fn path_behavior_centres_actor_and_rotates() {
        let mut behavior = Behavior::path(Path::linear(0.0, 0.0, 100.0, 100.0));
        behavior.set_frame_time(0.0, 100.0).unwrap();
        if let BehaviorKind::Path(follow) = behavior.kind_mut() {
            follow.set_auto_rotate(true);
        }
        let mut target = transform();
        behavior.apply(50.0, &mut target);
        assert_relative_eq!(target.x, 45.0);
        assert_relative_eq!(target.y, 45.0);
        assert_relative_eq!(target.rotation, PI / 4.0);
        assert_eq!(target.center(), Point::new(50.0, 50.0));
    }
}
