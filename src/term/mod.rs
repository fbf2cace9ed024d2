//! Terminal rendering module.
//!
//! A small framebuffer-based pipeline: the pure `GameView` draws a
//! `GameSnapshot` into a `FrameBuffer`, and `TerminalRenderer` diffs
//! consecutive frames onto the terminal.

pub mod fb;
pub mod game_view;
pub mod renderer;

pub use fb::{FrameBuffer, Glyph, GlyphStyle, Rgb};
pub use game_view::{GameView, Viewport};
pub use renderer::TerminalRenderer;
