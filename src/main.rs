//! Terminal runner (default binary).
//!
//! Uses crossterm for input and the framebuffer renderer from `term`.
//! Usage: cardfall [--character superman|cowboy|hunter] [--seed N]

use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Result};
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEventKind};

use cardfall::core::leaderboard::{self, Entry};
use cardfall::core::{GameSnapshot, Phase, Session};
use cardfall::input::{handle_key_event, should_quit};
use cardfall::term::{GameView, TerminalRenderer, Viewport};
use cardfall::types::{Character, GameAction, TICK_MS};

struct Args {
    character: Character,
    seed: u32,
}

fn parse_args() -> Result<Args> {
    let mut character = Character::Cowboy;
    let mut seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(1);

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--character" => {
                let Some(name) = args.next() else {
                    bail!("--character needs a value");
                };
                character = match Character::from_str(&name) {
                    Some(c) => c,
                    None => bail!("unknown character: {name}"),
                };
            }
            "--seed" => {
                let Some(raw) = args.next() else {
                    bail!("--seed needs a value");
                };
                seed = raw.parse()?;
            }
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(Args { character, seed })
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, args);

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

fn run(term: &mut TerminalRenderer, args: Args) -> Result<()> {
    let mut session = Session::new(args.seed, args.character);
    session.start();

    let view = GameView::default();
    let scores_path = PathBuf::from("cardfall_scores.json");
    let mut recorded = false;

    let mut last_tick = Instant::now();
    let tick_duration = Duration::from_millis(u64::from(TICK_MS));

    loop {
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        let viewport = Viewport::new(w, h);
        let snap = GameSnapshot::capture(&session);
        let mut fb = view.render(&snap, viewport);
        term.draw_swap(&mut fb)?;

        if let Phase::GameOver { victory } = session.phase() {
            if !recorded {
                recorded = true;
                let entry = Entry::now(
                    session.character().as_str(),
                    session.stage(),
                    session.score(),
                    victory,
                );
                // A full disk should not eat the end screen.
                let _ = leaderboard::record(&scores_path, entry);
            }
        }

        let timeout = tick_duration
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if should_quit(key) {
                        return Ok(());
                    }
                    let abundance = session.pending_abundance().is_some();
                    if let Some(action) = handle_key_event(key, session.phase(), abundance) {
                        session.apply_action(action);
                    }
                }
                Event::Mouse(mouse) => {
                    if mouse.kind == MouseEventKind::Down(MouseButton::Left)
                        && session.sniper_armed()
                    {
                        if let Some((x, y)) =
                            view.board_cell_at(viewport, mouse.column, mouse.row)
                        {
                            session.apply_action(GameAction::Target { x, y });
                        }
                    }
                }
                Event::Resize(_, _) => term.invalidate(),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_duration {
            last_tick = Instant::now();
            session.tick(TICK_MS);
        }
    }
}
