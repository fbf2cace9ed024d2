//! Input mapping - terminal key events to game actions
//!
//! Mapping is phase-aware: the same digit keys pick cards, tasks or shop
//! slots depending on where the run currently is. A pending abundance
//! choice captures the digit keys before anything else.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::Phase;
use crate::types::{Category, GameAction, WishKind};

/// q or ctrl-c ends the program.
pub fn should_quit(key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Map a key press to an action for the given phase.
pub fn handle_key_event(key: KeyEvent, phase: Phase, abundance_pending: bool) -> Option<GameAction> {
    if abundance_pending {
        return match key.code {
            KeyCode::Char('1') => Some(GameAction::ResolveAbundance(0)),
            KeyCode::Char('2') => Some(GameAction::ResolveAbundance(1)),
            _ => None,
        };
    }
    match phase {
        Phase::Playing => playing_key(key.code),
        Phase::PreStart => pick_digit(key.code).map(GameAction::PickCard),
        Phase::TaskSelection => pick_digit(key.code).map(GameAction::PickTask),
        Phase::RewardSelection => match key.code {
            KeyCode::Char('0') => Some(GameAction::SkipReward),
            code => pick_digit(code).map(GameAction::PickCard),
        },
        Phase::InterLevel => match key.code {
            KeyCode::Char('n') | KeyCode::Enter => Some(GameAction::NextLevel),
            KeyCode::Char('e') => Some(GameAction::EnterShop),
            _ => None,
        },
        Phase::Shop => shop_key(key.code),
        _ => None,
    }
}

fn playing_key(code: KeyCode) -> Option<GameAction> {
    match code {
        KeyCode::Left | KeyCode::Char('a') => Some(GameAction::MoveLeft),
        KeyCode::Right | KeyCode::Char('d') => Some(GameAction::MoveRight),
        KeyCode::Down | KeyCode::Char('s') => Some(GameAction::SoftDrop),
        KeyCode::Char(' ') => Some(GameAction::HardDrop),
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('x') => Some(GameAction::RotateCw),
        KeyCode::Char('z') => Some(GameAction::RotateCcw),
        KeyCode::Char('p') | KeyCode::Esc => Some(GameAction::Pause),
        _ => None,
    }
}

fn pick_digit(code: KeyCode) -> Option<usize> {
    match code {
        KeyCode::Char(c @ '1'..='4') => Some(c as usize - '1' as usize),
        _ => None,
    }
}

fn shop_key(code: KeyCode) -> Option<GameAction> {
    match code {
        KeyCode::Char('1') => Some(GameAction::BuyCard(0)),
        KeyCode::Char('2') => Some(GameAction::BuyCard(1)),
        KeyCode::Char('i') => Some(GameAction::BuyItem),
        KeyCode::Char('x') => Some(GameAction::SellCard),
        KeyCode::Char('u') => Some(GameAction::UpgradeShop),
        KeyCode::Char('r') => Some(GameAction::Reroll),
        KeyCode::Char('a') => Some(GameAction::Wish(WishKind::Category(Category::A))),
        KeyCode::Char('s') => Some(GameAction::Wish(WishKind::Category(Category::B))),
        KeyCode::Char('d') => Some(GameAction::Wish(WishKind::Category(Category::C))),
        KeyCode::Char('f') => Some(GameAction::Wish(WishKind::Category(Category::D))),
        KeyCode::Char('6') => Some(GameAction::Wish(WishKind::Number(1))),
        KeyCode::Char('7') => Some(GameAction::Wish(WishKind::Number(2))),
        KeyCode::Char('8') => Some(GameAction::Wish(WishKind::Number(3))),
        KeyCode::Char('9') => Some(GameAction::Wish(WishKind::Number(4))),
        KeyCode::Esc => Some(GameAction::LeaveShop),
        _ => None,
    }
}
