//! Top-level driver: owns the scenes, the resource registries, the frame
//! clock and the render surface, and runs frames against the current scene.

use crate::{
    actor::Font,
    assets::ImageStore,
    audio::{AudioClip, AudioManager, ChannelId, LoopId},
    config::{AppConfig, DirectorConfig},
    input::Modifiers,
    render::{DisplayList, RenderContext, TextMeasure, TextMetrics},
    scene::{ActorId, FrameReport, Scene},
    sprite::ImageInfo,
    timeline::PlaybackClock,
    Point, Result, StagehandError,
};

#[derive(Debug)]
pub struct Director<C: RenderContext = DisplayList> {
    config: DirectorConfig,
    scenes: Vec<Scene>,
    current: Option<usize>,
    /// Clock value at which the current scene was entered.
    scene_started_at: f64,
    images: ImageStore,
    audio: AudioManager,
    clock: PlaybackClock,
    frames: u64,
    ctx: C,
}

impl Director<DisplayList> {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_context(config, DisplayList::new())
    }
}

impl<C: RenderContext> Director<C> {
    pub fn with_context(config: &AppConfig, ctx: C) -> Self {
        tracing::debug!(
            width = config.director.width,
            height = config.director.height,
            fps = config.director.fps,
            "creating director"
        );
        Self {
            config: config.director.clone(),
            scenes: Vec::new(),
            current: None,
            scene_started_at: 0.0,
            images: ImageStore::new(),
            audio: AudioManager::new(&config.audio),
            clock: PlaybackClock::default(),
            frames: 0,
            ctx,
        }
    }

    pub fn width(&self) -> f64 {
        self.config.width
    }

    pub fn height(&self) -> f64 {
        self.config.height
    }

    /// Milliseconds elapsed on the director clock.
    pub fn time(&self) -> f64 {
        self.clock.time_ms
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Creates a scene covering the whole surface. The first scene created
    /// becomes current.
    pub fn create_scene(&mut self) -> usize {
        self.scenes.push(Scene::new(self.width(), self.height()));
        let index = self.scenes.len() - 1;
        if self.current.is_none() {
            self.current = Some(index);
            self.scene_started_at = self.clock.time_ms;
        }
        tracing::debug!(index, "created scene");
        index
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Switches to another scene. Scene time restarts from zero.
    pub fn set_scene(&mut self, index: usize) -> Result<()> {
        if index >= self.scenes.len() {
            return Err(StagehandError::InvalidInput(format!(
                "no scene at index {index}"
            )));
        }
        self.current = Some(index);
        self.scene_started_at = self.clock.time_ms;
        tracing::debug!(index, "switched scene");
        Ok(())
    }

    pub fn current_scene_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_scene(&self) -> Result<&Scene> {
        let index = self.current.ok_or_else(no_scene)?;
        self.scene(index)
    }

    pub fn current_scene_mut(&mut self) -> Result<&mut Scene> {
        let index = self.current.ok_or_else(no_scene)?;
        self.scene_mut(index)
    }

    pub fn scene(&self, index: usize) -> Result<&Scene> {
        self.scenes
            .get(index)
            .ok_or_else(|| StagehandError::InvalidInput(format!("no scene at index {index}")))
    }

    pub fn scene_mut(&mut self, index: usize) -> Result<&mut Scene> {
        self.scenes
            .get_mut(index)
            .ok_or_else(|| StagehandError::InvalidInput(format!("no scene at index {index}")))
    }

    pub fn add_image(&mut self, image: ImageInfo) -> &mut Self {
        self.images.register(image);
        self
    }

    pub fn add_images(&mut self, images: impl IntoIterator<Item = ImageInfo>) -> &mut Self {
        for image in images {
            self.images.register(image);
        }
        self
    }

    pub fn get_image(&self, id: &str) -> Result<&ImageInfo> {
        self.images.get(id)
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn add_audio(&mut self, clip: AudioClip) -> &mut Self {
        self.audio.add_audio(clip);
        self
    }

    pub fn get_audio_manager(&self) -> &AudioManager {
        &self.audio
    }

    pub fn get_audio_manager_mut(&mut self) -> &mut AudioManager {
        &mut self.audio
    }

    pub fn audio_play(&mut self, id: &str) -> Result<Option<ChannelId>> {
        self.audio.play(id, self.clock.time_ms)
    }

    pub fn audio_loop(&mut self, id: &str) -> Result<Option<LoopId>> {
        self.audio.loop_audio(id)
    }

    pub fn ctx(&self) -> &C {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    /// Advances the clock by `delta` ms, runs the current scene and repaints
    /// it. Returns `None` when there is no scene to run.
    pub fn tick(&mut self, delta: f64) -> Option<FrameReport> {
        self.clock.advance(delta);
        let now = self.clock.time_ms;
        self.audio.update(now);
        self.frames += 1;

        let index = self.current?;
        let scene = self.scenes.get_mut(index)?;
        let report = scene.tick(now - self.scene_started_at);

        self.ctx.clear(self.config.width, self.config.height);
        scene.paint(&mut self.ctx);
        Some(report)
    }

    /// Runs `frames` fixed steps at the configured frame rate.
    pub fn run_frames(&mut self, frames: u32) -> Result<Vec<FrameReport>> {
        let step = self.config.frame_duration_ms()?;
        let mut reports = Vec::with_capacity(frames as usize);
        for _ in 0..frames {
            reports.extend(self.tick(step));
        }
        tracing::debug!(frames, time = self.clock.time_ms, "ran fixed frames");
        Ok(reports)
    }

    pub fn mouse_down(&mut self, x: f64, y: f64, modifiers: Modifiers) -> Option<ActorId> {
        self.current_scene_mut()
            .ok()?
            .mouse_down(Point::new(x, y), modifiers)
    }

    pub fn mouse_up(&mut self, x: f64, y: f64, modifiers: Modifiers) -> Option<ActorId> {
        self.current_scene_mut()
            .ok()?
            .mouse_up(Point::new(x, y), modifiers)
    }

    pub fn mouse_move(&mut self, x: f64, y: f64, modifiers: Modifiers) -> Option<ActorId> {
        self.current_scene_mut()
            .ok()?
            .mouse_move(Point::new(x, y), modifiers)
    }
}

impl<C: RenderContext> TextMeasure for Director<C> {
    fn measure_text(&self, text: &str, font: &Font) -> TextMetrics {
        self.ctx.measure_text(text, font)
    }
}

fn no_scene() -> StagehandError {
    StagehandError::msg("director has no current scene")
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        actor::{Actor, Shape},
        behavior::Behavior,
        render::DrawOp,
    };

    fn director() -> Director {
        Director::new(&AppConfig::default())
    }

    #[test]
    fn first_scene_becomes_current() {
        let mut director = director();
        assert!(director.current_scene().is_err());
        assert!(director.tick(16.0).is_none());

        let first = director.create_scene();
        let second = director.create_scene();
        assert_eq!(director.current_scene_index(), Some(first));
        director.set_scene(second).unwrap();
        assert_eq!(director.current_scene_index(), Some(second));
        assert!(director.set_scene(7).is_err());
        assert_eq!(director.current_scene().unwrap().width(), 800.0);
    }

    #[test]
    fn scene_time_restarts_on_switch() {
        let mut director = director();
        director.create_scene();
        let second = director.create_scene();
        director.tick(400.0);
        director.set_scene(second).unwrap();

        let report = director.tick(100.0).unwrap();
        assert_relative_eq!(director.time(), 500.0);
        assert_relative_eq!(report.time, 100.0);
    }

    #[test]
    fn tick_repaints_the_current_scene() {
        let mut director = director();
        director.create_scene();
        let mut ball = Actor::shape(Shape::Circle);
        ball.set_bounds(10.0, 10.0, 20.0, 20.0).set_fill_style("red");
        director.current_scene_mut().unwrap().add_child(ball).unwrap();

        director.tick(16.0);
        director.tick(16.0);
        let commands = director.ctx().commands();
        assert!(matches!(commands[0].op, DrawOp::Clear { width, .. } if width == 800.0));
        assert_eq!(commands.len(), 2);
        assert!(matches!(&commands[1].op, DrawOp::FillCircle { style, .. } if style == "red"));
    }

    #[test]
    fn run_frames_uses_configured_rate() {
        let mut config = AppConfig::default();
        config.director.fps = 50;
        let mut director = Director::new(&config);
        director.create_scene();

        let mut spinner = Actor::new();
        let mut spin = Behavior::rotate(0.0, 1.0);
        spin.set_frame_time(0.0, 100.0).unwrap();
        spinner.set_size(10.0, 10.0).add_behavior(spin);
        let id = director.current_scene_mut().unwrap().add_child(spinner).unwrap();

        let reports = director.run_frames(3).unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(director.frame_count(), 3);
        assert_relative_eq!(director.time(), 60.0);
        let rotation = director.current_scene().unwrap().actor(id).unwrap().rotation();
        assert_relative_eq!(rotation, 0.6, epsilon = 1e-9);

        config.director.fps = 0;
        assert!(Director::new(&config).run_frames(1).is_err());
    }

    #[test]
    fn forwards_mouse_to_current_scene() {
        let mut director = director();
        director.create_scene();
        let clicks = Rc::new(Cell::new(0));
        let seen = Rc::clone(&clicks);
        let mut button = Actor::new();
        button
            .set_bounds(0.0, 0.0, 100.0, 40.0)
            .on_mouse_click(move |_| seen.set(seen.get() + 1));
        let id = director.current_scene_mut().unwrap().add_child(button).unwrap();

        assert_eq!(director.mouse_down(50.0, 20.0, Modifiers::default()), Some(id));
        assert_eq!(director.mouse_up(50.0, 20.0, Modifiers::default()), Some(id));
        assert_eq!(clicks.get(), 1);
        assert_eq!(director.mouse_move(500.0, 500.0, Modifiers::default()), None);
    }

    #[test]
    fn resources_resolve_through_the_director() {
        let mut director = director();
        director.add_images([ImageInfo::new("bg", 800.0, 600.0)]);
        director.add_audio(AudioClip::new("beep", "beep.wav", 50.0));

        assert_eq!(director.get_image("bg").unwrap().height, 600.0);
        assert!(director.get_image("fg").is_err());
        assert_eq!(director.audio_play("beep").unwrap(), Some(ChannelId(0)));
        assert!(director.audio_loop("boop").is_err());

        director.tick(50.0);
        assert_eq!(director.get_audio_manager().active_channels(), 0);
    }

    #[test]
    fn measures_text_with_the_context() {
        let director = director();
        let metrics = director.measure_text("abcd", &Font::new("mono", 10.0));
        assert_relative_eq!(metrics.width, 24.0);
        assert_relative_eq!(metrics.height, 10.0);
    }
}
