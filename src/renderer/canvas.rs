//! Canvas 2D layer for particles and debris

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::error::{FxError, Result};
use crate::sim::{Debris, Particle};

pub struct CanvasLayer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    dpr: f64,
}

impl CanvasLayer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|_| FxError::Dom("getContext(\"2d\") threw".into()))?
            .ok_or(FxError::Unsupported("canvas 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| FxError::Dom("not a 2d context".into()))?;
        Ok(Self {
            canvas,
            ctx,
            dpr: 1.0,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Resize the backing store to device pixels; drawing stays in CSS px
    pub fn resize(&mut self, backing: (u32, u32), dpr: f32) {
        self.canvas.set_width(backing.0);
        self.canvas.set_height(backing.1);
        self.dpr = dpr as f64;
        let _ = self.ctx.set_transform(self.dpr, 0.0, 0.0, self.dpr, 0.0, 0.0);
    }

    pub fn clear(&self) {
        let w = self.canvas.width() as f64 / self.dpr;
        let h = self.canvas.height() as f64 / self.dpr;
        self.ctx.clear_rect(0.0, 0.0, w, h);
    }

    pub fn draw_particles(&self, particles: &[Particle], color: &str) {
        self.clear();
        self.ctx.set_fill_style_str(color);
        for p in particles {
            self.ctx.set_global_alpha(p.opacity as f64);
            self.ctx.begin_path();
            let _ = self.ctx.arc(
                p.pos.x as f64,
                p.pos.y as f64,
                p.size as f64,
                0.0,
                std::f64::consts::TAU,
            );
            self.ctx.fill();
        }
        self.ctx.set_global_alpha(1.0);
    }

    pub fn draw_debris(&self, pieces: &[Debris], color: &str) {
        self.clear();
        self.ctx.set_fill_style_str(color);
        for d in pieces {
            self.ctx.save();
            self.ctx.set_global_alpha(d.life.clamp(0.0, 1.0) as f64);
            let _ = self.ctx.translate(d.pos.x as f64, d.pos.y as f64);
            let _ = self.ctx.rotate(d.rotation as f64);
            let s = d.size as f64;
            self.ctx.fill_rect(-s / 2.0, -s / 2.0, s, s);
            self.ctx.restore();
        }
    }
}
