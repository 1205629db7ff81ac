// src/ui/keybindings.rs
//! Keyboard input handling and key mappings.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Player actions derived from key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    NextStyle,
    PreviousStyle,
    TogglePause,
    Snapshot,
    RetryBind,
    Quit,
    None,
}

/// Convert a key event to a player action.
pub fn key_to_action(key: &KeyEvent) -> PlayerAction {
    // Windows terminals also report releases
    if key.kind == KeyEventKind::Release {
        return PlayerAction::None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return PlayerAction::Quit;
    }

    match key.code {
        KeyCode::Right | KeyCode::Char('s') => PlayerAction::NextStyle,
        KeyCode::Left => PlayerAction::PreviousStyle,
        KeyCode::Char(' ') => PlayerAction::TogglePause,
        KeyCode::Char('x') => PlayerAction::Snapshot,
        KeyCode::Char('r') => PlayerAction::RetryBind,
        KeyCode::Char('q') | KeyCode::Esc => PlayerAction::Quit,
        _ => PlayerAction::None,
    }
}
