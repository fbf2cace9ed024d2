//! Core module - pure game logic with no terminal or I/O dependencies
//!
//! Everything in here is deterministic given a seed and a sequence of
//! actions and ticks. The only exception is `leaderboard`, which owns the
//! run-history file format.

pub mod board;
pub mod cards;
pub mod leaderboard;
pub mod pieces;
pub mod progression;
pub mod rng;
pub mod scoring;
pub mod session;
pub mod snapshot;
pub mod specials;

pub use board::Board;
pub use cards::{CategoryStats, Inventory};
pub use pieces::{ActivePiece, Spin};
pub use progression::{Phase, ShopStock, Task, TaskKind};
pub use rng::{PieceGenerator, SimpleRng};
pub use session::Session;
pub use snapshot::GameSnapshot;
pub use specials::{Pet, Sniper, StarMeter};
