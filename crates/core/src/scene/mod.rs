//! Scene graph root: actor storage, hierarchy, frame update, painting and
//! pointer dispatch.
//!
//! A frame runs in a fixed order: every actor in the tree is animated (paint
//! order, parents before children, skipping subtrees of actors outside their
//! life span), then children queued with
//! [`Scene::add_child_delayed`] join their containers, then due timers fire,
//! and finally expired discardable actors are dropped. Painting is a separate
//! pass driven by the director.

mod arena;

use glam::{DAffine2, DVec2};

pub use arena::ActorId;

use crate::{
    actor::Actor,
    behavior::BehaviorEvent,
    input::{Modifiers, MouseEvent, MouseEventKind},
    render::RenderContext,
    timeline::{TimerEvent, TimerId, TimerManager, TimerTask},
    Point, Result, StagehandError,
};
use arena::ActorArena;

/// What happened during one [`Scene::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub time: f64,
    pub expired_behaviors: Vec<(ActorId, BehaviorEvent)>,
    pub inserted: Vec<ActorId>,
    pub timers_fired: Vec<TimerId>,
    pub removed: Vec<ActorId>,
}

#[derive(Debug)]
pub struct Scene {
    arena: ActorArena,
    root: ActorId,
    pending: Vec<(ActorId, ActorId)>,
    timers: TimerManager,
    time: f64,
    hover: Option<ActorId>,
    pressed: Option<ActorId>,
    last_pointer: Option<Point>,
}

impl Scene {
    /// Creates a scene whose root container covers `width x height`.
    pub fn new(width: f64, height: f64) -> Self {
        let mut arena = ActorArena::default();
        let mut root = Actor::container().with_name("scene");
        root.set_size(width, height).enable_events(false);
        let root = arena.insert(root);
        Self {
            arena,
            root,
            pending: Vec::new(),
            timers: TimerManager::new(),
            time: 0.0,
            hover: None,
            pressed: None,
            last_pointer: None,
        }
    }

    pub fn root(&self) -> ActorId {
        self.root
    }

    /// Scene time of the last tick in milliseconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn width(&self) -> f64 {
        self.get(self.root).map_or(0.0, Actor::width)
    }

    pub fn height(&self) -> f64 {
        self.get(self.root).map_or(0.0, Actor::height)
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.arena.get(id)
    }

    pub fn actor(&self, id: ActorId) -> Result<&Actor> {
        self.arena.get(id).ok_or(StagehandError::ActorNotFound(id))
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Result<&mut Actor> {
        self.arena.get_mut(id).ok_or(StagehandError::ActorNotFound(id))
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.arena.contains(id)
    }

    /// Number of stored actors including the root and queued children.
    pub fn actor_count(&self) -> usize {
        self.arena.len()
    }

    pub fn add_child(&mut self, actor: Actor) -> Result<ActorId> {
        self.add_child_to(self.root, actor)
    }

    pub fn add_child_immediately(&mut self, actor: Actor) -> Result<ActorId> {
        self.add_child_to(self.root, actor)
    }

    pub fn add_child_delayed(&mut self, actor: Actor) -> Result<ActorId> {
        self.add_child_delayed_to(self.root, actor)
    }

    /// Appends `actor` to `parent`'s children; it is painted above its siblings.
    pub fn add_child_to(&mut self, parent: ActorId, actor: Actor) -> Result<ActorId> {
        self.ensure_container(parent)?;
        let id = self.arena.insert(actor);
        self.attach(parent, id)?;
        Ok(id)
    }

    /// Stores `actor` now but only links it into `parent` at the next tick.
    /// Until then it is neither animated, painted nor hit-tested.
    pub fn add_child_delayed_to(&mut self, parent: ActorId, actor: Actor) -> Result<ActorId> {
        self.ensure_container(parent)?;
        let id = self.arena.insert(actor);
        self.pending.push((parent, id));
        tracing::trace!(%parent, child = %id, "queued delayed child");
        Ok(id)
    }

    pub fn pending_children(&self) -> usize {
        self.pending.len()
    }

    pub fn children(&self, parent: ActorId) -> &[ActorId] {
        match self.get(parent) {
            Some(actor) => actor.children(),
            None => &[],
        }
    }

    pub fn child_count(&self, parent: ActorId) -> usize {
        self.children(parent).len()
    }

    pub fn get_child_at(&self, parent: ActorId, index: usize) -> Option<ActorId> {
        self.children(parent).get(index).copied()
    }

    /// Moves `child` to `index` in its parent's paint order. Indices past the
    /// end place it on top.
    pub fn set_z_order(&mut self, parent: ActorId, child: ActorId, index: usize) -> Result<()> {
        let container = self
            .actor_mut(parent)?
            .container_mut()
            .ok_or_else(|| not_a_container(parent))?;
        let children = container.children_mut();
        let position = children.iter().position(|&id| id == child).ok_or_else(|| {
            StagehandError::InvalidHierarchy(format!("{child} is not a child of {parent}"))
        })?;
        children.remove(position);
        let index = index.min(children.len());
        children.insert(index, child);
        Ok(())
    }

    /// Detaches `id` and drops it together with its descendants.
    pub fn remove_child(&mut self, id: ActorId) -> Result<Actor> {
        if id == self.root {
            return Err(StagehandError::InvalidHierarchy(
                "the scene root cannot be removed".to_string(),
            ));
        }
        let parent = self.actor(id)?.parent();
        if let Some(parent) = parent {
            if let Some(container) = self.arena.get_mut(parent).and_then(Actor::container_mut) {
                container.children_mut().retain(|&child| child != id);
            }
        }
        self.pending.retain(|&(_, child)| child != id);

        let mut descendants = self.children(id).to_vec();
        while let Some(next) = descendants.pop() {
            descendants.extend_from_slice(self.children(next));
            self.forget(next);
            self.arena.remove(next);
        }
        self.forget(id);

        let mut actor = self
            .arena
            .remove(id)
            .ok_or(StagehandError::ActorNotFound(id))?;
        actor.set_parent(None);
        if let Some(container) = actor.container_mut() {
            container.children_mut().clear();
        }
        tracing::debug!(actor = %id, "removed actor");
        Ok(actor)
    }

    fn forget(&mut self, id: ActorId) {
        if self.hover == Some(id) {
            self.hover = None;
        }
        if self.pressed == Some(id) {
            self.pressed = None;
            self.last_pointer = None;
        }
    }

    fn ensure_container(&self, parent: ActorId) -> Result<()> {
        if self.actor(parent)?.is_container() {
            Ok(())
        } else {
            Err(not_a_container(parent))
        }
    }

    fn attach(&mut self, parent: ActorId, child: ActorId) -> Result<()> {
        let container = self
            .arena
            .get_mut(parent)
            .and_then(Actor::container_mut)
            .ok_or_else(|| not_a_container(parent))?;
        container.children_mut().push(child);
        self.actor_mut(child)?.set_parent(Some(parent));
        Ok(())
    }

    /// Actors of the tree in paint order, root first.
    pub fn paint_order(&self) -> Vec<ActorId> {
        let mut order = Vec::with_capacity(self.arena.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        order
    }

    /// Parent-space matrix of `id` composed up to the surface.
    pub fn world_matrix(&self, id: ActorId) -> Result<DAffine2> {
        let mut matrix = DAffine2::IDENTITY;
        let mut current = Some(id);
        while let Some(next) = current {
            let actor = self.actor(next)?;
            matrix = actor.local_transform() * matrix;
            current = actor.parent();
        }
        Ok(matrix)
    }

    /// Maps a point in `id`'s local space to the surface.
    pub fn model_to_view(&self, id: ActorId, point: Point) -> Result<Point> {
        Ok(self
            .world_matrix(id)?
            .transform_point2(DVec2::from(point))
            .into())
    }

    /// Maps a surface point into `id`'s local space.
    pub fn view_to_model(&self, id: ActorId, point: Point) -> Result<Point> {
        let matrix = self.world_matrix(id)?;
        if matrix.matrix2.determinant() == 0.0 {
            return Err(StagehandError::InvalidInput(format!(
                "{id} has a degenerate transform"
            )));
        }
        Ok(matrix.inverse().transform_point2(DVec2::from(point)).into())
    }

    /// Maps a point from `from`'s local space into `to`'s local space.
    pub fn model_to_model(&self, from: ActorId, point: Point, to: ActorId) -> Result<Point> {
        let view = self.model_to_view(from, point)?;
        self.view_to_model(to, view)
    }

    pub fn create_timer(
        &mut self,
        start_time: f64,
        duration: f64,
        on_timeout: impl FnMut(&TimerEvent, &mut Scene) + 'static,
    ) -> Result<TimerId> {
        let task = TimerTask::new(start_time, duration)?.on_timeout(on_timeout);
        Ok(self.add_timer(task))
    }

    pub fn add_timer(&mut self, task: TimerTask) -> TimerId {
        let id = self.timers.create(task);
        tracing::trace!(timer = id.get(), "timer created");
        id
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Cancels a timer, running its cancel callback. Returns whether the timer
    /// was live. Cancels issued from inside timer callbacks take effect before
    /// the next timer of the current pass is checked. A one-shot timer is no
    /// longer live once its timeout has started.
    pub fn cancel_timer(&mut self, id: TimerId) -> bool {
        match self.timers.remove(id) {
            Some(mut task) => {
                let time = self.time;
                task.cancel(time, self);
                true
            }
            None => self.timers.defer_cancel(id),
        }
    }

    /// Runs one frame at scene time `time`.
    pub fn tick(&mut self, time: f64) -> FrameReport {
        self.time = time;
        let mut report = FrameReport {
            time,
            ..Default::default()
        };

        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(actor) = self.arena.get_mut(id) else {
                continue;
            };
            for event in actor.animate(time) {
                report.expired_behaviors.push((id, event));
            }
            // Same subtrees as paint and hit testing.
            if actor.is_in_frame(time) {
                stack.extend(actor.children().iter().rev());
            }
        }

        report.inserted = self.flush_pending();
        report.timers_fired = self.fire_timers(time);
        report.removed = self.reap_discarded();

        tracing::trace!(
            time,
            expired = report.expired_behaviors.len(),
            inserted = report.inserted.len(),
            timers = report.timers_fired.len(),
            removed = report.removed.len(),
            "scene tick"
        );
        report
    }

    fn flush_pending(&mut self) -> Vec<ActorId> {
        let mut inserted = Vec::new();
        for (parent, child) in std::mem::take(&mut self.pending) {
            let parent_ok = self.get(parent).is_some_and(Actor::is_container);
            if parent_ok && self.contains(child) {
                if self.attach(parent, child).is_ok() {
                    inserted.push(child);
                }
            } else {
                tracing::warn!(%parent, %child, "dropping delayed child, parent is gone");
                self.arena.remove(child);
            }
        }
        if !inserted.is_empty() {
            tracing::debug!(count = inserted.len(), "flushed delayed children");
        }
        inserted
    }

    fn fire_timers(&mut self, time: f64) -> Vec<TimerId> {
        let mut tasks = self.timers.take_tasks();
        let mut fired = Vec::new();
        for index in 0..tasks.len() {
            self.apply_cancels(&mut tasks, time);
            let task = &mut tasks[index];
            if task.is_finished() {
                continue;
            }
            if task.is_due(time) && !task.is_repeating() {
                if let Some(id) = task.id() {
                    self.timers.release(id);
                }
            }
            if let Some(event) = task.check(time, self) {
                tracing::debug!(timer = event.timer.get(), time, "timer fired");
                fired.push(event.timer);
            }
        }
        self.apply_cancels(&mut tasks, time);
        self.timers.restore_tasks(tasks);
        fired
    }

    fn apply_cancels(&mut self, tasks: &mut [TimerTask], time: f64) {
        loop {
            let pending = self.timers.take_pending_cancels();
            if pending.is_empty() {
                return;
            }
            for id in pending {
                let live = tasks
                    .iter_mut()
                    .find(|task| task.id() == Some(id) && !task.is_finished());
                if let Some(task) = live {
                    task.cancel(time, self);
                }
            }
        }
    }

    fn reap_discarded(&mut self) -> Vec<ActorId> {
        let doomed: Vec<ActorId> = self
            .paint_order()
            .into_iter()
            .filter(|&id| {
                id != self.root
                    && self
                        .get(id)
                        .is_some_and(|actor| actor.is_expired() && actor.is_discardable())
            })
            .collect();

        let mut removed = Vec::new();
        for id in doomed {
            // Already gone when an ancestor was reaped first.
            if self.contains(id) && self.remove_child(id).is_ok() {
                removed.push(id);
            }
        }
        removed
    }

    /// Paints the tree, parents below their children.
    pub fn paint(&self, ctx: &mut dyn RenderContext) {
        self.paint_actor(self.root, ctx);
    }

    fn paint_actor(&self, id: ActorId, ctx: &mut dyn RenderContext) {
        let Some(actor) = self.get(id) else {
            return;
        };
        if !actor.is_in_frame(self.time) {
            return;
        }
        ctx.save();
        ctx.transform(actor.local_transform());
        let alpha = ctx.global_alpha() * actor.alpha();
        ctx.set_global_alpha(alpha);
        actor.paint(ctx, actor.time());
        for &child in actor.children() {
            self.paint_actor(child, ctx);
        }
        ctx.restore();
    }

    /// Topmost actor under `point` that accepts events, with the point in its
    /// local space. Children are tested before their container and later
    /// siblings before earlier ones.
    pub fn find_actor_at(&self, point: Point) -> Option<(ActorId, Point)> {
        self.hit(self.root, DAffine2::IDENTITY, DVec2::from(point))
    }

    fn hit(&self, id: ActorId, parent: DAffine2, point: DVec2) -> Option<(ActorId, Point)> {
        let actor = self.get(id)?;
        if !actor.is_in_frame(self.time) {
            return None;
        }
        let world = parent * actor.local_transform();
        for &child in actor.children().iter().rev() {
            if let Some(found) = self.hit(child, world, point) {
                return Some(found);
            }
        }
        if !actor.events_enabled() || world.matrix2.determinant() == 0.0 {
            return None;
        }
        let local: Point = world.inverse().transform_point2(point).into();
        actor.contains(local).then_some((id, local))
    }

    /// Pointer moved. Drags the pressed actor, or updates hover and sends
    /// enter/exit. Returns the actor that received the move, if any.
    pub fn mouse_move(&mut self, point: Point, modifiers: Modifiers) -> Option<ActorId> {
        if let Some(pressed) = self.pressed {
            self.drag(pressed, point, modifiers);
            return Some(pressed);
        }

        let target = self.find_actor_at(point).map(|(id, _)| id);
        if target != self.hover {
            if let Some(previous) = self.hover {
                self.dispatch(previous, MouseEventKind::Exit, point, modifiers);
            }
            if let Some(next) = target {
                self.dispatch(next, MouseEventKind::Enter, point, modifiers);
            }
            self.hover = target;
        }
        target
    }

    pub fn mouse_down(&mut self, point: Point, modifiers: Modifiers) -> Option<ActorId> {
        let (target, _) = self.find_actor_at(point)?;
        self.dispatch(target, MouseEventKind::Down, point, modifiers);
        self.pressed = Some(target);
        self.last_pointer = Some(point);
        Some(target)
    }

    /// Releases the pressed actor; sends a click when released over it.
    pub fn mouse_up(&mut self, point: Point, modifiers: Modifiers) -> Option<ActorId> {
        let pressed = self.pressed.take()?;
        self.last_pointer = None;
        self.dispatch(pressed, MouseEventKind::Up, point, modifiers);
        if self.find_actor_at(point).map(|(id, _)| id) == Some(pressed) {
            self.dispatch(pressed, MouseEventKind::Click, point, modifiers);
        }
        Some(pressed)
    }

    fn drag(&mut self, id: ActorId, point: Point, modifiers: Modifiers) {
        let previous = self.last_pointer.replace(point).unwrap_or(point);
        let drag_enabled = self.get(id).is_some_and(Actor::drag_enabled);
        if drag_enabled {
            if let Some(delta) = self.parent_space_delta(id, previous, point) {
                if let Ok(actor) = self.actor_mut(id) {
                    let (x, y) = (actor.x() + delta.x, actor.y() + delta.y);
                    actor.set_location(x, y);
                }
            }
        }
        self.dispatch(id, MouseEventKind::Drag, point, modifiers);
    }

    fn parent_space_delta(&self, id: ActorId, from: Point, to: Point) -> Option<Point> {
        let parent = self.get(id)?.parent()?;
        let from = self.view_to_model(parent, from).ok()?;
        let to = self.view_to_model(parent, to).ok()?;
        Some(Point::new(to.x - from.x, to.y - from.y))
    }

    fn dispatch(&mut self, id: ActorId, kind: MouseEventKind, screen: Point, modifiers: Modifiers) {
        let Ok(local) = self.view_to_model(id, screen) else {
            return;
        };
        let event = MouseEvent {
            kind,
            point: local,
            screen_point: screen,
            time: self.time,
            source: id,
            modifiers,
        };
        if let Some(actor) = self.arena.get_mut(id) {
            let handled = actor.fire_mouse(&event);
            tracing::trace!(actor = %id, kind = kind.name(), handled, "mouse event");
        }
    }
}

fn not_a_container(id: ActorId) -> StagehandError {
    StagehandError::InvalidHierarchy(format!("{id} is not a container"))
}
