//! Cardfall: a falling-block game with a card-driven roguelike meta loop.
//!
//! Layering: `types` holds plain data, `core` the deterministic game
//! rules, `term` the framebuffer renderer, `input` the key mapping. The
//! binary in `main.rs` wires them together.

pub mod core;
pub mod input;
pub mod term;
pub mod types;
