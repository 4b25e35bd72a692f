use std::sync::Arc;

use trajview_types::{PlaybackConfig, StreamConfig, StreamKind, YAxis};

use crate::{
    Dataset, Rgba, Sprite, Surface, TextStyle, TrailSpec,
    label::{text_width, wrap},
    resolve_trail,
};

const BACKGROUND: Rgba = Rgba::WHITE;
const GRID_COLOR: Rgba = Rgba::rgb(225, 225, 225);
const AXIS_COLOR: Rgba = Rgba::rgb(180, 180, 180);
const DENSITY_COLOR: Rgba = Rgba::rgb(40, 70, 170).with_alpha(60);
const DENSITY_RADIUS: f32 = 1.5;
const GRID_SPACING: f64 = 0.5;
const PROGRESS_COLOR: Rgba = Rgba::rgb(60, 120, 220);
const PROGRESS_TRACK: Rgba = Rgba::rgb(230, 230, 230);
const ERROR_COLOR: Rgba = Rgba::rgb(180, 20, 20);

const TIME_LABEL: TextStyle = TextStyle {
    size: 14.0,
    color: Rgba::BLACK,
};
const TITLE: TextStyle = TextStyle {
    size: 16.0,
    color: Rgba::BLACK,
};

/// Maps the data square `[-1, 1] x [-1, 1]` onto surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mapping {
    pub width: f32,
    pub height: f32,
    pub y_axis: YAxis,
}

impl Mapping {
    pub fn to_canvas(&self, x: f64, y: f64) -> (f32, f32) {
        let px = (x + 1.0) / 2.0 * self.width as f64;
        let py = match self.y_axis {
            YAxis::Down => (y + 1.0) / 2.0,
            YAxis::Up => (1.0 - y) / 2.0,
        } * self.height as f64;
        (px as f32, py as f32)
    }

    /// A data-space velocity expressed in canvas directions.
    fn velocity_to_canvas(&self, vx: f64, vy: f64) -> (f64, f64) {
        match self.y_axis {
            YAxis::Down => (vx, vy),
            YAxis::Up => (vx, -vy),
        }
    }
}

/// Clockwise rotation in degrees turning an up-pointing marker along `(vx, vy)`.
///
/// The velocity is in canvas directions (y grows downwards).
pub fn velocity_angle(vx: f64, vy: f64) -> f32 {
    (vy.atan2(vx).to_degrees() + 90.0) as f32
}

/// Blue at rest, green at half of `max_speed`, red at `max_speed` and above.
pub fn speed_color(speed: f64, max_speed: f64) -> Rgba {
    let t = (speed / max_speed).clamp(0.0, 1.0);
    let (r, g, b) = if t < 0.5 {
        let u = t * 2.0;
        (0.0, u, 1.0 - u)
    } else {
        let u = (t - 0.5) * 2.0;
        (u, 1.0 - u, 0.0)
    };
    let c = |v: f64| (v * 255.0).round() as u8;
    Rgba::rgb(c(r), c(g), c(b))
}

/// Everything that decides the look of one stream's frames.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub y_axis: YAxis,
    pub grid: bool,
    pub kind: StreamKind,
    pub trail: TrailSpec,
    pub trail_radius: f32,
    pub trail_radius_step: f32,
    pub max_speed: f64,
    pub sprite_size: f32,
    pub density_window: usize,
}

impl RenderOptions {
    pub fn new(playback: &PlaybackConfig, stream: &StreamConfig) -> Self {
        Self {
            width: stream.width,
            height: stream.height,
            y_axis: stream.y_axis,
            grid: stream.grid,
            kind: stream.kind,
            trail: TrailSpec {
                length: playback.trail_length,
                offset: playback.trail_offset,
            },
            trail_radius: playback.trail_radius,
            trail_radius_step: playback.trail_radius_step,
            max_speed: playback.max_speed,
            sprite_size: playback.sprite_size,
            density_window: playback.density_window,
        }
    }

    pub fn mapping(&self) -> Mapping {
        Mapping {
            width: self.width as f32,
            height: self.height as f32,
            y_axis: self.y_axis,
        }
    }

    /// Radius of the trail point at recency `rank` (0 is nearest).
    fn trail_point_radius(&self, rank: usize) -> f32 {
        self.trail_radius - rank as f32 * self.trail_radius_step
    }
}

/// Composes frames for one stream.
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    opts: RenderOptions,
    sprite: Arc<Sprite>,
}

impl FrameRenderer {
    pub fn new(opts: RenderOptions, sprite: Arc<Sprite>) -> Self {
        Self { opts, sprite }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.opts
    }

    /// Draw the complete frame of `tick`.
    pub fn compose<S: Surface>(&self, surface: &mut S, data: &Dataset, tick: usize) {
        surface.clear(BACKGROUND);
        if self.opts.grid {
            self.draw_grid(surface);
        }
        match self.opts.kind {
            StreamKind::Trajectories => self.draw_entities(surface, data, tick),
            StreamKind::Density => self.draw_density(surface, data, tick),
        }
        if let Some(time) = data.timeline().time(tick) {
            surface.draw_text(&format!("t = {time:.2} s"), (6.0, 4.0), &TIME_LABEL);
        }
    }

    fn draw_grid<S: Surface>(&self, surface: &mut S) {
        let map = self.opts.mapping();
        let n = (2.0 / GRID_SPACING).round() as i32;
        for i in 0..=n {
            let v = -1.0 + i as f64 * GRID_SPACING;
            let color = if v == 0.0 { AXIS_COLOR } else { GRID_COLOR };
            surface.stroke_line(map.to_canvas(v, -1.0), map.to_canvas(v, 1.0), 1.0, color);
            surface.stroke_line(map.to_canvas(-1.0, v), map.to_canvas(1.0, v), 1.0, color);
        }
    }

    fn draw_entities<S: Surface>(&self, surface: &mut S, data: &Dataset, tick: usize) {
        let map = self.opts.mapping();
        for sample in data.samples_at(tick) {
            let trail = resolve_trail(data, tick, sample, &self.opts.trail);
            for (rank, past) in trail.iter().enumerate() {
                let radius = self.opts.trail_point_radius(rank);
                if radius <= 0.0 {
                    break;
                }
                surface.fill_circle(
                    map.to_canvas(past.x, past.y),
                    radius,
                    speed_color(past.speed, self.opts.max_speed),
                );
            }

            let (vx, vy) = map.velocity_to_canvas(sample.vx, sample.vy);
            surface.draw_sprite(
                map.to_canvas(sample.x, sample.y),
                velocity_angle(vx, vy),
                self.opts.sprite_size,
                &self.sprite,
            );
        }
    }

    fn draw_density<S: Surface>(&self, surface: &mut S, data: &Dataset, tick: usize) {
        let map = self.opts.mapping();
        let first = (tick + 1).saturating_sub(self.opts.density_window);
        for past in first..=tick {
            for sample in data.samples_at(past) {
                surface.fill_circle(map.to_canvas(sample.x, sample.y), DENSITY_RADIUS, DENSITY_COLOR);
            }
        }
    }

    /// Draw the indicator shown while frames are being precomputed.
    pub fn compose_progress<S: Surface>(&self, surface: &mut S, title: &str, percent: u8) {
        surface.clear(BACKGROUND);
        surface.draw_text(title, (10.0, 10.0), &TITLE);

        let w = surface.width() as f32;
        let h = surface.height() as f32;
        let bar_w = w * 0.8;
        let bar_h = 12.0;
        let origin = (w * 0.1, h / 2.0 - bar_h / 2.0);
        surface.fill_rect(origin, (bar_w, bar_h), PROGRESS_TRACK);
        let done = bar_w * percent.min(100) as f32 / 100.0;
        if done > 0.0 {
            surface.fill_rect(origin, (done, bar_h), PROGRESS_COLOR);
        }
        surface.draw_text(
            &format!("Precomputing frames: {percent}%"),
            (origin.0, origin.1 + bar_h + 8.0),
            &TIME_LABEL,
        );
    }

    /// Draw a message in place of the animation, e.g. a load failure.
    pub fn compose_message<S: Surface>(&self, surface: &mut S, title: &str, message: &str) {
        surface.clear(BACKGROUND);
        surface.draw_text(title, (10.0, 10.0), &TITLE);
        let style = TextStyle {
            color: ERROR_COLOR,
            ..TIME_LABEL
        };
        let max_chars = ((surface.width() as f32 - 20.0) / text_width(1, style.size)) as usize;
        let line_height = style.size * 1.3;
        for (i, line) in wrap(message, max_chars).iter().enumerate() {
            surface.draw_text(line, (10.0, 40.0 + i as f32 * line_height), &style);
        }
    }
}
