use serde::{Deserialize, Serialize};

use crate::{scene::ActorId, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseEventKind {
    Enter,
    Exit,
    Down,
    Up,
    Click,
    Drag,
}

impl MouseEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Exit => "exit",
            Self::Down => "down",
            Self::Up => "up",
            Self::Click => "click",
            Self::Drag => "drag",
        }
    }
}

/// Keyboard modifiers held while the pointer event happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Pointer event delivered to an actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    /// Position in the receiving actor's local space.
    pub point: Point,
    /// Position on the drawing surface.
    pub screen_point: Point,
    pub time: f64,
    pub source: ActorId,
    pub modifiers: Modifiers,
}

impl MouseEvent {
    pub fn point(&self) -> Point {
        self.point
    }

    pub fn screen_point(&self) -> Point {
        self.screen_point
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn x(&self) -> f64 {
        self.point.x
    }

    pub fn y(&self) -> f64 {
        self.point.y
    }
}

pub type MouseHandler = Box<dyn FnMut(&MouseEvent)>;

/// Optional callbacks, one per event kind.
#[derive(Default)]
pub struct MouseHandlers {
    enter: Option<MouseHandler>,
    exit: Option<MouseHandler>,
    down: Option<MouseHandler>,
    up: Option<MouseHandler>,
    click: Option<MouseHandler>,
    drag: Option<MouseHandler>,
}

impl MouseHandlers {
    fn slot(&mut self, kind: MouseEventKind) -> &mut Option<MouseHandler> {
        match kind {
            MouseEventKind::Enter => &mut self.enter,
            MouseEventKind::Exit => &mut self.exit,
            MouseEventKind::Down => &mut self.down,
            MouseEventKind::Up => &mut self.up,
            MouseEventKind::Click => &mut self.click,
            MouseEventKind::Drag => &mut self.drag,
        }
    }

    pub fn set(&mut self, kind: MouseEventKind, handler: MouseHandler) {
        *self.slot(kind) = Some(handler);
    }

    pub fn clear(&mut self, kind: MouseEventKind) {
        *self.slot(kind) = None;
    }

    /// Runs the handler for `event.kind`; returns whether one was installed.
    pub fn fire(&mut self, event: &MouseEvent) -> bool {
        match self.slot(event.kind) {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for MouseHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MouseHandlers")
            .field("enter", &self.enter.is_some())
            .field("exit", &self.exit.is_some())
            .field("down", &self.down.is_some())
            .field("up", &self.up.is_some())
            .field("click", &self.click.is_some())
            .field("drag", &self.drag.is_some())
            .finish()
    }
}
