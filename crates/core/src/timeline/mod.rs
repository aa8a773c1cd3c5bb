use serde::{Deserialize, Serialize};

use crate::{scene::Scene, Result, StagehandError};

/// Monotonic frame clock in milliseconds.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PlaybackClock {
    pub time_ms: f64,
}

impl PlaybackClock {
    pub fn reset(&mut self) {
        self.time_ms = 0.0;
    }

    pub fn advance(&mut self, delta: f64) {
        self.time_ms = (self.time_ms + delta.max(0.0)).max(0.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

impl TimerId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerEventKind {
    Tick,
    Timeout,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerEvent {
    pub timer: TimerId,
    pub kind: TimerEventKind,
    pub time: f64,
    /// Milliseconds since the timer was (re)armed.
    pub elapsed: f64,
}

pub type TimerCallback = Box<dyn FnMut(&TimerEvent, &mut Scene)>;

/// A callback scheduled against scene time.
pub struct TimerTask {
    id: Option<TimerId>,
    start_time: f64,
    duration: f64,
    repeat: bool,
    finished: bool,
    on_timeout: Option<TimerCallback>,
    on_tick: Option<TimerCallback>,
    on_cancel: Option<TimerCallback>,
}

impl TimerTask {
    /// Fires `duration` milliseconds after `start_time`.
    pub fn new(start_time: f64, duration: f64) -> Result<Self> {
        if !start_time.is_finite() || !duration.is_finite() || duration < 0.0 {
            return Err(StagehandError::InvalidInput(format!(
                "invalid timer window start {start_time} duration {duration}"
            )));
        }
        Ok(Self {
            id: None,
            start_time,
            duration,
            repeat: false,
            finished: false,
            on_timeout: None,
            on_tick: None,
            on_cancel: None,
        })
    }

    /// Re-arms from the firing time instead of finishing.
    pub fn repeating(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn on_timeout(mut self, callback: impl FnMut(&TimerEvent, &mut Scene) + 'static) -> Self {
        self.on_timeout = Some(Box::new(callback));
        self
    }

    /// Runs on every frame while the timer is armed but not yet due.
    pub fn on_tick(mut self, callback: impl FnMut(&TimerEvent, &mut Scene) + 'static) -> Self {
        self.on_tick = Some(Box::new(callback));
        self
    }

    pub fn on_cancel(mut self, callback: impl FnMut(&TimerEvent, &mut Scene) + 'static) -> Self {
        self.on_cancel = Some(Box::new(callback));
        self
    }

    pub fn id(&self) -> Option<TimerId> {
        self.id
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn event(&self, kind: TimerEventKind, time: f64) -> Option<TimerEvent> {
        Some(TimerEvent {
            timer: self.id?,
            kind,
            time,
            elapsed: time - self.start_time,
        })
    }

    /// Whether a call to `check` at `time` would fire the timeout.
    pub fn is_due(&self, time: f64) -> bool {
        !self.finished && time >= self.start_time && time - self.start_time >= self.duration
    }

    /// Runs due callbacks. Returns the timeout event when the timer fired.
    pub(crate) fn check(&mut self, time: f64, scene: &mut Scene) -> Option<TimerEvent> {
        if self.finished || time < self.start_time {
            return None;
        }

        if time - self.start_time < self.duration {
            let event = self.event(TimerEventKind::Tick, time)?;
            if let Some(callback) = &mut self.on_tick {
                callback(&event, scene);
            }
            return None;
        }

        let event = self.event(TimerEventKind::Timeout, time)?;
        if self.repeat {
            self.start_time = time;
        } else {
            self.finished = true;
        }
        if let Some(callback) = &mut self.on_timeout {
            callback(&event, scene);
        }
        Some(event)
    }

    pub(crate) fn cancel(&mut self, time: f64, scene: &mut Scene) {
        self.finished = true;
        let Some(event) = self.event(TimerEventKind::Cancel, time) else {
            return;
        };
        if let Some(callback) = &mut self.on_cancel {
            callback(&event, scene);
        }
    }
}

impl std::fmt::Debug for TimerTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerTask")
            .field("id", &self.id)
            .field("start_time", &self.start_time)
            .field("duration", &self.duration)
            .field("repeat", &self.repeat)
            .field("finished", &self.finished)
            .finish()
    }
}

/// Timers of one scene in creation order.
#[derive(Debug, Default)]
pub struct TimerManager {
    tasks: Vec<TimerTask>,
    next_id: u64,
    /// Live timers currently checked out by a timer pass.
    checked_out: Vec<TimerId>,
    pending_cancels: Vec<TimerId>,
}

impl TimerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, mut task: TimerTask) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        task.id = Some(id);
        self.tasks.push(task);
        id
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, id: TimerId) -> bool {
        self.tasks.iter().any(|task| task.id == Some(id))
    }

    pub(crate) fn remove(&mut self, id: TimerId) -> Option<TimerTask> {
        let index = self.tasks.iter().position(|task| task.id == Some(id))?;
        Some(self.tasks.remove(index))
    }

    /// Records a cancel for a live timer checked out by the scene. Returns
    /// false when no such timer exists or it is already being cancelled.
    pub(crate) fn defer_cancel(&mut self, id: TimerId) -> bool {
        if !self.release(id) {
            return false;
        }
        self.pending_cancels.push(id);
        true
    }

    /// Marks a checked-out timer as no longer live.
    pub(crate) fn release(&mut self, id: TimerId) -> bool {
        let Some(index) = self.checked_out.iter().position(|&live| live == id) else {
            return false;
        };
        self.checked_out.swap_remove(index);
        true
    }

    pub(crate) fn take_pending_cancels(&mut self) -> Vec<TimerId> {
        std::mem::take(&mut self.pending_cancels)
    }

    pub(crate) fn take_tasks(&mut self) -> Vec<TimerTask> {
        self.checked_out = self
            .tasks
            .iter()
            .filter(|task| !task.finished)
            .filter_map(TimerTask::id)
            .collect();
        std::mem::take(&mut self.tasks)
    }

    /// Puts checked-out tasks back ahead of timers created in the meantime.
    pub(crate) fn restore_tasks(&mut self, mut tasks: Vec<TimerTask>) {
        self.checked_out.clear();
        tasks.retain(|task| !task.finished);
        tasks.append(&mut self.tasks);
        self.tasks = tasks;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_never_goes_backwards() {
        let mut clock = PlaybackClock::default();
        clock.advance(16.0);
        clock.advance(-100.0);
        assert_eq!(clock.time_ms, 16.0);
        clock.reset();
        assert_eq!(clock.time_ms, 0.0);
    }

    #[test]
    fn rejects_negative_duration() {
        assert!(TimerTask::new(0.0, -1.0).is_err());
    }

    #[test]
    fn restore_keeps_creation_order() {
        let mut timers = TimerManager::new();
        let first = timers.create(TimerTask::new(0.0, 10.0).unwrap());
        let taken = timers.take_tasks();
        let second = timers.create(TimerTask::new(0.0, 10.0).unwrap());
        timers.restore_tasks(taken);
        assert_eq!(timers.len(), 2);
        assert_eq!(timers.tasks[0].id(), Some(first));
        assert_eq!(timers.tasks[1].id(), Some(second));
    }
}
