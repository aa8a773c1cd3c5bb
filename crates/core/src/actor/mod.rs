//! Paintable, transformable scene nodes.
//!
//! An [`Actor`] carries its placement ([`ActorTransform`]), look (fill,
//! outline, background sprite), the behaviors that animate it and the mouse
//! callbacks it answers to. What it draws is selected by [`ActorKind`]; a
//! plain actor with a background image is a sprite actor. Actors are stored in
//! a scene, which owns the hierarchy and hands out [`ActorId`]s.

mod text;

use glam::{DAffine2, DVec2};

pub use text::{Font, TextActor};

use crate::{
    behavior::{Behavior, BehaviorEvent},
    input::{MouseEvent, MouseEventKind, MouseHandlers},
    render::{RenderContext, TextMeasure},
    scene::ActorId,
    sprite::SpriteImage,
    Point, Rect, Result, StagehandError,
};

const DEFAULT_OUTLINE_COLOR: &str = "black";
const DEFAULT_TEXT_STYLE: &str = "black";

/// Placement of an actor inside its parent. Rotation and scale pivot around
/// the anchor, given as a fraction of the actor's size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorTransform {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Radians, clockwise in screen space.
    pub rotation: f64,
    pub anchor_x: f64,
    pub anchor_y: f64,
    pub alpha: f64,
}

impl Default for ActorTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            anchor_x: 0.5,
            anchor_y: 0.5,
            alpha: 1.0,
        }
    }
}

impl ActorTransform {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn center_at(&mut self, point: Point) {
        self.x = point.x - self.width * 0.5;
        self.y = point.y - self.height * 0.5;
    }

    /// Bounds in the actor's own coordinate space.
    pub fn local_bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Parent-from-local matrix.
    pub fn matrix(&self) -> DAffine2 {
        let pivot = DVec2::new(self.anchor_x * self.width, self.anchor_y * self.height);
        DAffine2::from_translation(DVec2::new(self.x, self.y) + pivot)
            * DAffine2::from_angle(self.rotation)
            * DAffine2::from_scale(DVec2::new(self.scale_x, self.scale_y))
            * DAffine2::from_translation(-pivot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Rectangle,
    Circle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShapeActor {
    shape: Shape,
}

impl ShapeActor {
    pub fn new(shape: Shape) -> Self {
        Self { shape }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: Shape) -> &mut Self {
        self.shape = shape;
        self
    }
}

/// Child list of a container actor, in paint order. Only the scene edits it,
/// so a child is always listed by exactly one container.
#[derive(Debug, Default)]
pub struct ActorContainer {
    children: Vec<ActorId>,
}

impl ActorContainer {
    pub fn children(&self) -> &[ActorId] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<ActorId> {
        &mut self.children
    }
}

#[derive(Debug)]
pub enum ActorKind {
    Plain,
    Shape(ShapeActor),
    Text(TextActor),
    Container(ActorContainer),
}

#[derive(Debug)]
pub struct Actor {
    name: String,
    transform: ActorTransform,
    kind: ActorKind,
    parent: Option<ActorId>,
    fill_style: Option<String>,
    outline: bool,
    outline_color: String,
    background: Option<SpriteImage>,
    behaviors: Vec<Behavior>,
    events_enabled: bool,
    drag_enabled: bool,
    discardable: bool,
    expired: bool,
    frame_time: Option<(f64, f64)>,
    time: f64,
    handlers: MouseHandlers,
}

impl Default for Actor {
    fn default() -> Self {
        Self::with_kind(ActorKind::Plain)
    }
}

impl Actor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(kind: ActorKind) -> Self {
        Self {
            name: String::new(),
            transform: ActorTransform::default(),
            kind,
            parent: None,
            fill_style: None,
            outline: false,
            outline_color: DEFAULT_OUTLINE_COLOR.to_string(),
            background: None,
            behaviors: Vec::new(),
            events_enabled: true,
            drag_enabled: false,
            discardable: false,
            expired: false,
            frame_time: None,
            time: 0.0,
            handlers: MouseHandlers::default(),
        }
    }

    pub fn shape(shape: Shape) -> Self {
        Self::with_kind(ActorKind::Shape(ShapeActor::new(shape)))
    }

    /// Text actor sized to its measured text.
    pub fn text(text: impl Into<String>, font: Font, measure: &dyn TextMeasure) -> Self {
        let mut actor = Self::with_kind(ActorKind::Text(TextActor::new(text, font)));
        actor.calc_text_size(measure);
        actor
    }

    pub fn container() -> Self {
        Self::with_kind(ActorKind::Container(ActorContainer::default()))
    }

    /// Sprite actor sized to one frame of `sprite`.
    pub fn sprite(sprite: SpriteImage) -> Self {
        let mut actor = Self::new();
        actor.set_background_image(sprite, true);
        actor
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ActorKind {
        &self.kind
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, ActorKind::Container(_))
    }

    pub(crate) fn container_mut(&mut self) -> Option<&mut ActorContainer> {
        match &mut self.kind {
            ActorKind::Container(container) => Some(container),
            _ => None,
        }
    }

    pub fn children(&self) -> &[ActorId] {
        match &self.kind {
            ActorKind::Container(container) => container.children(),
            _ => &[],
        }
    }

    pub fn parent(&self) -> Option<ActorId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ActorId>) {
        self.parent = parent;
    }

    pub fn transform(&self) -> &ActorTransform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut ActorTransform {
        &mut self.transform
    }

    /// Maps local coordinates into the parent's space.
    pub fn local_transform(&self) -> DAffine2 {
        self.transform.matrix()
    }

    pub fn x(&self) -> f64 {
        self.transform.x
    }

    pub fn y(&self) -> f64 {
        self.transform.y
    }

    pub fn width(&self) -> f64 {
        self.transform.width
    }

    pub fn height(&self) -> f64 {
        self.transform.height
    }

    pub fn rotation(&self) -> f64 {
        self.transform.rotation
    }

    pub fn alpha(&self) -> f64 {
        self.transform.alpha
    }

    /// Scene time of the last frame this actor was animated in.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn set_location(&mut self, x: f64, y: f64) -> &mut Self {
        self.transform.x = x;
        self.transform.y = y;
        self
    }

    pub fn set_size(&mut self, width: f64, height: f64) -> &mut Self {
        self.transform.width = width;
        self.transform.height = height;
        self
    }

    pub fn set_bounds(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.set_location(x, y).set_size(width, height)
    }

    /// Moves the actor so its centre sits at `(x, y)`.
    pub fn center_at(&mut self, x: f64, y: f64) -> &mut Self {
        self.transform.center_at(Point::new(x, y));
        self
    }

    pub fn set_scale(&mut self, scale_x: f64, scale_y: f64) -> &mut Self {
        self.transform.scale_x = scale_x;
        self.transform.scale_y = scale_y;
        self
    }

    pub fn set_rotation(&mut self, angle: f64) -> &mut Self {
        self.transform.rotation = angle;
        self
    }

    /// Pivot for rotation and scale as a fraction of the size.
    pub fn set_anchor(&mut self, anchor_x: f64, anchor_y: f64) -> &mut Self {
        self.transform.anchor_x = anchor_x;
        self.transform.anchor_y = anchor_y;
        self
    }

    pub fn set_alpha(&mut self, alpha: f64) -> &mut Self {
        self.transform.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn fill_style(&self) -> Option<&str> {
        self.fill_style.as_deref()
    }

    pub fn set_fill_style(&mut self, style: impl Into<String>) -> &mut Self {
        self.fill_style = Some(style.into());
        self
    }

    pub fn set_outline(&mut self, outline: bool) -> &mut Self {
        self.outline = outline;
        self
    }

    pub fn set_outline_color(&mut self, color: impl Into<String>) -> &mut Self {
        self.outline_color = color.into();
        self
    }

    pub fn background_image(&self) -> Option<&SpriteImage> {
        self.background.as_ref()
    }

    /// Installs a background sprite, optionally resizing the actor to one frame.
    pub fn set_background_image(&mut self, sprite: SpriteImage, adjust_size: bool) -> &mut Self {
        if adjust_size {
            self.set_size(sprite.frame_width(), sprite.frame_height());
        }
        self.background = Some(sprite);
        self
    }

    pub fn set_sprite_index(&mut self, index: usize) -> Result<&mut Self> {
        let sprite = self.background.as_mut().ok_or_else(|| {
            StagehandError::InvalidInput("actor has no background image".to_string())
        })?;
        sprite.set_sprite_index(index)?;
        Ok(self)
    }

    pub fn text_actor(&self) -> Option<&TextActor> {
        match &self.kind {
            ActorKind::Text(text) => Some(text),
            _ => None,
        }
    }

    fn text_actor_mut(&mut self) -> Result<&mut TextActor> {
        match &mut self.kind {
            ActorKind::Text(text) => Ok(text),
            _ => Err(StagehandError::InvalidInput(
                "actor is not a text actor".to_string(),
            )),
        }
    }

    pub fn set_text(
        &mut self,
        text: impl Into<String>,
        measure: &dyn TextMeasure,
    ) -> Result<&mut Self> {
        self.text_actor_mut()?.set_text(text.into());
        self.calc_text_size(measure);
        Ok(self)
    }

    pub fn set_font(&mut self, font: Font, measure: &dyn TextMeasure) -> Result<&mut Self> {
        self.text_actor_mut()?.set_font(font);
        self.calc_text_size(measure);
        Ok(self)
    }

    /// Re-measures text actors and resizes them to fit. Other kinds are untouched.
    pub fn calc_text_size(&mut self, measure: &dyn TextMeasure) -> &mut Self {
        if let ActorKind::Text(text) = &mut self.kind {
            let metrics = text.calc_text_size(measure);
            self.transform.width = metrics.width;
            self.transform.height = metrics.height;
        }
        self
    }

    pub fn set_shape(&mut self, shape: Shape) -> Result<&mut Self> {
        let ActorKind::Shape(actor) = &mut self.kind else {
            return Err(StagehandError::InvalidInput(
                "actor is not a shape actor".to_string(),
            ));
        };
        actor.set_shape(shape);
        Ok(self)
    }

    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    pub fn behaviors_mut(&mut self) -> &mut [Behavior] {
        &mut self.behaviors
    }

    pub fn add_behavior(&mut self, behavior: Behavior) -> &mut Self {
        self.behaviors.push(behavior);
        self
    }

    pub fn empty_behavior_list(&mut self) -> &mut Self {
        self.behaviors.clear();
        self
    }

    pub fn events_enabled(&self) -> bool {
        self.events_enabled
    }

    pub fn enable_events(&mut self, enabled: bool) -> &mut Self {
        self.events_enabled = enabled;
        self
    }

    pub fn drag_enabled(&self) -> bool {
        self.drag_enabled
    }

    /// Lets the pointer move the actor while a button is held over it.
    pub fn enable_drag(&mut self, enabled: bool) -> &mut Self {
        self.drag_enabled = enabled;
        if enabled {
            self.events_enabled = true;
        }
        self
    }

    pub fn is_discardable(&self) -> bool {
        self.discardable
    }

    /// Discardable actors are removed from the scene once expired.
    pub fn set_discardable(&mut self, discardable: bool) -> &mut Self {
        self.discardable = discardable;
        self
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn set_expired(&mut self, expired: bool) -> &mut Self {
        self.expired = expired;
        self
    }

    /// Limits the actor's life to `[start, start + duration)` of scene time.
    pub fn set_frame_time(&mut self, start: f64, duration: f64) -> Result<&mut Self> {
        if !start.is_finite() || !duration.is_finite() || start < 0.0 || duration < 0.0 {
            return Err(StagehandError::InvalidInput(format!(
                "actor frame time must be non-negative, got start {start} duration {duration}"
            )));
        }
        self.frame_time = Some((start, duration));
        Ok(self)
    }

    /// Whether the actor takes part in the frame at `time`.
    pub fn is_in_frame(&self, time: f64) -> bool {
        if self.expired {
            return false;
        }
        match self.frame_time {
            Some((start, _)) => time >= start,
            None => true,
        }
    }

    pub fn set_mouse_handler(
        &mut self,
        kind: MouseEventKind,
        handler: impl FnMut(&MouseEvent) + 'static,
    ) -> &mut Self {
        self.handlers.set(kind, Box::new(handler));
        self
    }

    pub fn on_mouse_enter(&mut self, handler: impl FnMut(&MouseEvent) + 'static) -> &mut Self {
        self.set_mouse_handler(MouseEventKind::Enter, handler)
    }

    pub fn on_mouse_exit(&mut self, handler: impl FnMut(&MouseEvent) + 'static) -> &mut Self {
        self.set_mouse_handler(MouseEventKind::Exit, handler)
    }

    pub fn on_mouse_down(&mut self, handler: impl FnMut(&MouseEvent) + 'static) -> &mut Self {
        self.set_mouse_handler(MouseEventKind::Down, handler)
    }

    pub fn on_mouse_up(&mut self, handler: impl FnMut(&MouseEvent) + 'static) -> &mut Self {
        self.set_mouse_handler(MouseEventKind::Up, handler)
    }

    pub fn on_mouse_click(&mut self, handler: impl FnMut(&MouseEvent) + 'static) -> &mut Self {
        self.set_mouse_handler(MouseEventKind::Click, handler)
    }

    pub fn on_mouse_drag(&mut self, handler: impl FnMut(&MouseEvent) + 'static) -> &mut Self {
        self.set_mouse_handler(MouseEventKind::Drag, handler)
    }

    pub(crate) fn fire_mouse(&mut self, event: &MouseEvent) -> bool {
        self.handlers.fire(event)
    }

    /// Hit test against a point in local space.
    pub fn contains(&self, point: Point) -> bool {
        self.transform.local_bounds().contains(point)
    }

    /// Advances the actor's clock and behaviors. Returns expiry events.
    pub fn animate(&mut self, time: f64) -> Vec<BehaviorEvent> {
        self.time = time;
        if let Some((start, duration)) = self.frame_time {
            if time >= start + duration {
                self.expired = true;
            }
        }
        if !self.is_in_frame(time) {
            return Vec::new();
        }

        let mut expired = Vec::new();
        for behavior in &mut self.behaviors {
            if let Some(event) = behavior.apply(time, &mut self.transform) {
                expired.push(event);
            }
        }
        expired
    }

    /// Draws the actor in its local space. The caller has already applied
    /// the actor's transform and alpha to `ctx`.
    pub fn paint(&self, ctx: &mut dyn RenderContext, time: f64) {
        let bounds = self.transform.local_bounds();

        if let Some(sprite) = &self.background {
            if let Some(source) = sprite.sub_image(sprite.index_at(time)) {
                ctx.draw_image(sprite.image(), source, bounds);
            }
        }

        match &self.kind {
            ActorKind::Plain | ActorKind::Container(_) => {
                if let Some(style) = &self.fill_style {
                    ctx.fill_rect(bounds, style);
                }
            }
            ActorKind::Shape(shape) => {
                let style = self.fill_style.as_deref().unwrap_or(DEFAULT_OUTLINE_COLOR);
                match shape.shape() {
                    Shape::Rectangle => ctx.fill_rect(bounds, style),
                    Shape::Circle => {
                        ctx.fill_circle(bounds.center(), circle_radius(&bounds), style)
                    }
                }
            }
            ActorKind::Text(text) => {
                let style = self.fill_style.as_deref().unwrap_or(DEFAULT_TEXT_STYLE);
                ctx.fill_text(text.text(), text.font(), Point::ORIGIN, style);
            }
        }

        if self.outline {
            match &self.kind {
                ActorKind::Shape(shape) if shape.shape() == Shape::Circle => {
                    ctx.stroke_circle(bounds.center(), circle_radius(&bounds), &self.outline_color)
                }
                _ => ctx.stroke_rect(bounds, &self.outline_color),
            }
        }
    }
}

fn circle_radius(bounds: &Rect) -> f64 {
    bounds.width.min(bounds.height) * 0.5
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        render::{DisplayList, DrawOp},
        sprite::ImageInfo,
    };

    #[test]
    fn matrix_rotates_around_anchor() {
        let mut actor = Actor::new();
        actor.set_bounds(10.0, 10.0, 20.0, 20.0).set_rotation(FRAC_PI_2);
        let matrix = actor.transform().matrix();
        let centre = matrix.transform_point2(DVec2::new(10.0, 10.0));
        assert_relative_eq!(centre.x, 20.0);
        assert_relative_eq!(centre.y, 20.0);
        let corner = matrix.transform_point2(DVec2::ZERO);
        assert_relative_eq!(corner.x, 30.0);
        assert_relative_eq!(corner.y, 10.0);
    }

    #[test]
    fn text_actor_is_sized_by_measure() {
        let list = DisplayList::new();
        let mut actor = Actor::text("hey", Font::new("mono", 10.0), &list);
        assert_relative_eq!(actor.width(), 18.0);
        assert_eq!(actor.height(), 10.0);

        actor.set_text("hello!", &list).unwrap();
        assert_relative_eq!(actor.width(), 36.0);
        assert!(Actor::new().set_text("x", &list).is_err());
    }

    #[test]
    fn frame_time_expires_actor() {
        let mut actor = Actor::new();
        actor.set_frame_time(100.0, 50.0).unwrap();
        actor.animate(50.0);
        assert!(!actor.is_in_frame(50.0));
        actor.animate(120.0);
        assert!(actor.is_in_frame(120.0));
        actor.animate(150.0);
        assert!(actor.is_expired());
    }

    #[test]
    fn paints_sprite_frame_and_outline() {
        let image = ImageInfo::new("sheet", 64.0, 32.0);
        let mut sprite = SpriteImage::initialize(image, 1, 2).unwrap();
        sprite.set_sprite_index(1).unwrap();
        let mut actor = Actor::sprite(sprite);
        actor.set_outline(true).set_outline_color("red");
        assert_eq!(actor.width(), 32.0);

        let mut list = DisplayList::new();
        actor.paint(&mut list, 0.0);
        assert_eq!(
            list.commands()[0].op,
            DrawOp::DrawImage {
                image: "sheet".to_string(),
                source: Rect::new(32.0, 0.0, 32.0, 32.0),
                dest: Rect::new(0.0, 0.0, 32.0, 32.0),
            }
        );
        assert!(matches!(
            &list.commands()[1].op,
            DrawOp::StrokeRect { color, .. } if color == "red"
        ));
    }

    #[test]
    fn circle_shape_paints_circle() {
        let mut actor = Actor::shape(Shape::Rectangle);
        actor.set_size(20.0, 10.0).set_fill_style("#0f0");
        actor.set_shape(Shape::Circle).unwrap();
        let mut list = DisplayList::new();
        actor.paint(&mut list, 0.0);
        assert_eq!(
            list.commands()[0].op,
            DrawOp::FillCircle {
                center: Point::new(10.0, 5.0),
                radius: 5.0,
                style: "#0f0".to_string(),
            }
        );
    }
}
