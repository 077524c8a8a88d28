//! Rendering helpers
//!
//! Element effects render by writing CSS transforms (`css`). The particle
//! field and page-break debris paint onto a 2D canvas (`canvas`, wasm only).

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod css;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasLayer;
pub use css::Transform;
