//! Deterministic interaction engine
//!
//! Everything that moves lives here. This module must stay platform-free:
//! - Per-frame stepping only, driven by whoever owns the frame loop
//! - Seeded RNG only
//! - Pools indexed by handle, mutated in place
//! - No DOM or canvas access (the page is reached through `platform` traits)

pub mod breaker;
pub mod castle;
pub mod cursor;
pub mod debris;
pub mod events;
pub mod flee;
pub mod magnetic;
pub mod particles;
pub mod physics;
pub mod scramble;
pub mod selection;
pub mod spring;
pub mod tilt;

pub use breaker::{BreakerPhase, CloneTransform, FallingElement, PageBreaker};
pub use castle::{CardCastle, CardPlacement, CastlePhase, castle_layout};
pub use cursor::{CursorService, PointerSample};
pub use debris::{Debris, DebrisField};
pub use events::{EventBus, FxSignal, SubscriptionId};
pub use flee::FleeField;
pub use magnetic::{WordField, WordHandle, linear_pull, magnetic_target, squared_pull, word_target};
pub use particles::{Particle, ParticleField};
pub use physics::{BodyDesc, BodyHandle, BodyPose, FixedStep, Material, PhysicsWorld, RapierWorld};
pub use scramble::TextScramble;
pub use selection::{BREAK_SELECTORS, SelectionRules, select_targets};
pub use spring::{FrameStatus, SpringFollow, Springable};
pub use tilt::{TiltPose, tilt_target};
