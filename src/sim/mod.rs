//! Deterministic simulation module
//!
//! All motion logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - No randomness
//! - Analytic motion (constant-acceleration segments, closed-form swings)
//! - No rendering or platform dependencies

pub mod collision;
pub mod interrupt;
pub mod kinematics;
pub mod machine;
pub mod merge;
pub mod params;
pub mod pendulum;
pub mod player;
pub mod polynomial;
pub mod states;
pub mod tick;
pub mod world;

pub use collision::{CollisionConfig, CollisionResolver, Resolution};
pub use interrupt::{Collision, Interrupt, InterruptQuery};
pub use kinematics::{Kinematic, KinematicSegment, KinematicState};
pub use machine::{MotionSnapshot, MovementStateMachine};
pub use merge::merge_segments;
pub use params::{MovementParameters, ParameterOverrides};
pub use pendulum::{Oscillation, Pendulum};
pub use player::{JumpBuffer, PlayerInfo};
pub use states::{MovementState, StateKind, Transition};
pub use tick::{PlayerController, RopeView, TickInput};
pub use world::{Aabb, Block, CollisionWorld, Level, RayHit};
