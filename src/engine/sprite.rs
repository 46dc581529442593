// Sprite sheet animation driven by the game loop

use glam::Vec2;
use std::cell::RefCell;
use std::rc::Rc;

use super::game_loop::LoopHandle;
use crate::core::SubscriptionId;

/// Errors raised while configuring a sprite
#[derive(Debug, thiserror::Error)]
pub enum SpriteError {
    #[error("sprite row {row} is out of range ({rows} rows in the sheet)")]
    RowOutOfRange { row: usize, rows: usize },

    #[error("sprite sheet has no rows")]
    EmptySheet,
}

/// Layout of a sprite sheet: one animation per row
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteSheet {
    /// Width of each frame in pixels
    pub tile_width: u32,
    /// Height of each frame in pixels
    pub tile_height: u32,
    /// Pixel offset of the first frame in the image
    pub offset: Vec2,
    /// Scale factor applied on top of the stage scale
    pub scale: f32,
    /// Index of the last frame of each row; 0 for a still row
    pub last_frames: Vec<usize>,
}

impl SpriteSheet {
    /// Create a sheet of `rows` rows that all end on frame `last_frame`
    pub fn uniform(tile_width: u32, tile_height: u32, rows: usize, last_frame: usize) -> Self {
        Self {
            tile_width,
            tile_height,
            offset: Vec2::ZERO,
            scale: 1.0,
            last_frames: vec![last_frame; rows],
        }
    }

    /// A single still image
    pub fn still(tile_width: u32, tile_height: u32) -> Self {
        Self::uniform(tile_width, tile_height, 1, 0)
    }

    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.offset = Vec2::new(x, y);
        self
    }

    pub fn rows(&self) -> usize {
        self.last_frames.len()
    }

    pub fn last_frame(&self, row: usize) -> Result<usize, SpriteError> {
        self.last_frames
            .get(row)
            .copied()
            .ok_or(SpriteError::RowOutOfRange {
                row,
                rows: self.rows(),
            })
    }

    /// Pixel position of a frame's top-left corner in the sheet image
    pub fn source(&self, row: usize, frame: usize) -> Vec2 {
        self.offset
            + Vec2::new(
                (frame as u32 * self.tile_width) as f32,
                (row as u32 * self.tile_height) as f32,
            )
    }
}

/// Which row plays and how
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteAnimation {
    pub row: usize,
    /// Wrap to the first frame instead of finishing
    pub repeat: bool,
    /// Loop ticks waited between two frames
    pub ticks_per_frame: u32,
}

impl SpriteAnimation {
    pub const fn new(row: usize) -> Self {
        Self {
            row,
            repeat: false,
            ticks_per_frame: 4,
        }
    }

    pub const fn repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub const fn ticks_per_frame(mut self, ticks: u32) -> Self {
        self.ticks_per_frame = ticks;
        self
    }
}

impl Default for SpriteAnimation {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Notification sent to the sprite's owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEvent {
    /// The animation (re)started
    Start,
    /// A non-repeating animation reached its last frame
    End,
}

/// What to draw this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteFrame {
    pub row: usize,
    /// Frame drawn; 0 once the animation has finished
    pub frame: usize,
    /// Top-left of the frame in the sheet image, in pixels
    pub source: Vec2,
    pub tile_size: Vec2,
    pub scale: f32,
    pub finished: bool,
}

/// Per-row animation progress
#[derive(Debug)]
struct AnimationState {
    sheet: SpriteSheet,
    animation: SpriteAnimation,
    /// Index of the frame reached in the row
    step: usize,
    /// Ticks since the last frame change attempt
    tick: u32,
    finished: bool,
    events: Vec<AnimationEvent>,
}

impl AnimationState {
    /// Run one loop tick of the animation
    fn advance(&mut self) {
        if self.tick < self.animation.ticks_per_frame {
            self.tick += 1;
            return;
        }
        self.tick = 0;

        // Row validated on configure
        let last = self.sheet.last_frames[self.animation.row];
        if last == 0 {
            return;
        }

        if self.step == last {
            if self.animation.repeat {
                self.step = 0;
            } else if !self.finished {
                self.finished = true;
                self.events.push(AnimationEvent::End);
            }
        } else {
            self.step += 1;
        }
    }

    fn reset(&mut self) {
        self.step = 0;
        self.tick = 0;
        if self.finished {
            self.finished = false;
            self.events.push(AnimationEvent::Start);
        }
    }

    fn is_animated(&self) -> bool {
        self.sheet.last_frames[self.animation.row] > 0
    }

    fn frame(&self) -> SpriteFrame {
        let frame = if self.finished { 0 } else { self.step };
        SpriteFrame {
            row: self.animation.row,
            frame,
            source: self.sheet.source(self.animation.row, frame),
            tile_size: Vec2::new(self.sheet.tile_width as f32, self.sheet.tile_height as f32),
            scale: self.sheet.scale,
            finished: self.finished,
        }
    }
}

/// A sprite sheet animation advanced once per loop tick
///
/// The sprite only holds a loop slot while its current row has more than
/// one frame. Events are queued and handed out by [`Sprite::poll_events`].
pub struct Sprite {
    state: Rc<RefCell<AnimationState>>,
    game_loop: LoopHandle,
    subscription: Option<SubscriptionId>,
}

impl Sprite {
    pub fn new(
        game_loop: &LoopHandle,
        sheet: SpriteSheet,
        animation: SpriteAnimation,
    ) -> Result<Self, SpriteError> {
        if sheet.rows() == 0 {
            return Err(SpriteError::EmptySheet);
        }
        sheet.last_frame(animation.row)?;

        let mut sprite = Self {
            state: Rc::new(RefCell::new(AnimationState {
                sheet,
                animation,
                step: 0,
                tick: 0,
                finished: false,
                events: vec![AnimationEvent::Start],
            })),
            game_loop: game_loop.clone(),
            subscription: None,
        };
        sprite.sync_subscription();
        Ok(sprite)
    }

    /// Switch row, repeat flag or speed
    ///
    /// Any change restarts the animation from its first frame, even mid-way.
    pub fn configure(&mut self, animation: SpriteAnimation) -> Result<(), SpriteError> {
        {
            let mut state = self.state.borrow_mut();
            if state.animation == animation {
                return Ok(());
            }
            state.sheet.last_frame(animation.row)?;
            state.animation = animation;
            state.reset();
        }
        self.sync_subscription();
        Ok(())
    }

    /// Take the events raised since the last poll, oldest first
    pub fn poll_events(&self) -> Vec<AnimationEvent> {
        std::mem::take(&mut self.state.borrow_mut().events)
    }

    pub fn frame(&self) -> SpriteFrame {
        self.state.borrow().frame()
    }

    #[cfg(test)]
    pub fn animation(&self) -> SpriteAnimation {
        self.state.borrow().animation
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.state.borrow().finished
    }

    /// Whether the sprite currently holds a loop slot
    #[cfg(test)]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    fn sync_subscription(&mut self) {
        let animated = self.state.borrow().is_animated();
        match (animated, self.subscription) {
            (true, None) => {
                let state = Rc::clone(&self.state);
                self.subscription = Some(self.game_loop.subscribe(move || {
                    state.borrow_mut().advance();
                }));
            }
            (false, Some(id)) => {
                self.game_loop.unsubscribe(id);
                self.subscription = None;
            }
            _ => {}
        }
    }
}

impl Drop for Sprite {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.game_loop.unsubscribe(id);
        }
    }
}
