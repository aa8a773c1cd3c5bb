//! Core library for the Stagehand 2D animation engine.
//!
//! A [`Director`] owns one or more [`Scene`]s. Each scene stores its actors in
//! a generational arena and runs a frame in a fixed order: behaviors, then
//! delayed children, then timers, then removal of expired actors. Painting
//! goes through the [`RenderContext`] trait; [`DisplayList`] records the
//! resulting draw calls so frames can be inspected without a canvas.

pub mod actor;
pub mod assets;
pub mod audio;
pub mod behavior;
pub mod config;
pub mod director;
pub mod error;
pub mod geometry;
pub mod input;
pub mod path;
pub mod render;
pub mod scene;
pub mod sprite;
pub mod timeline;

pub use actor::{Actor, ActorKind, ActorTransform, Font, Shape, TextActor};
pub use assets::ImageStore;
pub use audio::{AudioClip, AudioManager, ChannelId, LoopId};
pub use behavior::{
    Behavior, BehaviorEvent, BehaviorEventKind, BehaviorKind, BehaviorState, Interpolator,
};
pub use config::{AppConfig, AudioConfig, DirectorConfig};
pub use director::Director;
pub use error::{Result, StagehandError};
pub use geometry::{Point, Rect};
pub use input::{Modifiers, MouseEvent, MouseEventKind};
pub use path::{Path, PathSegment, PathState};
pub use render::{DisplayList, DrawCommand, DrawOp, RenderContext, TextMeasure, TextMetrics};
pub use scene::{ActorId, FrameReport, Scene};
pub use sprite::{ImageInfo, SpriteImage};
pub use timeline::{PlaybackClock, TimerEvent, TimerEventKind, TimerId, TimerTask};
