use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Position, Rect};

/// Everything the player can ask for, from either input surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Digit(char),
    Delete,
    Submit,
    Hint,
    GiveUp,
    ToggleCross(char),
    Confirm,
    Cancel,
    ToggleStats,
    NewGame,
    Quit,
}

/// Which screen the keyboard currently drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputContext {
    Playing,
    Results,
    Stats,
}

/// One button of the on-screen keypad, with its hit-box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeypadButton {
    pub rect: Rect,
    pub key: PadKey,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PadKey {
    Digit(char),
    Delete,
    Enter,
}

/// Translate a physical key press into a command. Performs no game-state
/// mutation and no debouncing; the session drops anything it can't take.
pub fn map_key(key: KeyEvent, ctx: InputContext) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        // ctrl-c quits; every other ctrl chord belongs to the terminal
        return matches!(key.code, KeyCode::Char('c')).then_some(Command::Quit);
    }
    if key
        .modifiers
        .intersects(KeyModifiers::ALT | KeyModifiers::SUPER | KeyModifiers::META)
    {
        return None;
    }

    match ctx {
        InputContext::Playing => match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => Some(Command::Digit(c)),
            KeyCode::Backspace => Some(Command::Delete),
            KeyCode::Enter => Some(Command::Submit),
            KeyCode::Char('y') => Some(Command::Confirm),
            KeyCode::Char('n') => Some(Command::Cancel),
            KeyCode::Char('h') => Some(Command::Hint),
            KeyCode::Char('g') => Some(Command::GiveUp),
            KeyCode::Char('s') => Some(Command::ToggleStats),
            KeyCode::Esc | KeyCode::Char('q') => Some(Command::Quit),
            _ => None,
        },
        InputContext::Results => match key.code {
            KeyCode::Char('n') | KeyCode::Enter => Some(Command::NewGame),
            KeyCode::Char('s') => Some(Command::ToggleStats),
            KeyCode::Esc | KeyCode::Char('q') => Some(Command::Quit),
            _ => None,
        },
        InputContext::Stats => match key.code {
            KeyCode::Char('s') | KeyCode::Char('b') | KeyCode::Esc | KeyCode::Backspace => {
                Some(Command::ToggleStats)
            }
            KeyCode::Char('q') => Some(Command::Quit),
            _ => None,
        },
    }
}

/// Translate a mouse event against the on-screen keypad. Left click activates
/// a key; right click toggles the cross-out memory aid on digit keys only.
pub fn map_mouse(event: &MouseEvent, keypad: &[KeypadButton]) -> Option<Command> {
    let pos = Position::new(event.column, event.row);
    let button = keypad.iter().find(|b| b.rect.contains(pos))?;

    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(match button.key {
            PadKey::Digit(d) => Command::Digit(d),
            PadKey::Delete => Command::Delete,
            PadKey::Enter => Command::Submit,
        }),
        MouseEventKind::Down(MouseButton::Right) => match button.key {
            PadKey::Digit(d) => Some(Command::ToggleCross(d)),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn digits_backspace_enter_map_while_playing() {
        let ctx = InputContext::Playing;
        assert_eq!(
            map_key(key(KeyCode::Char('7')), ctx),
            Some(Command::Digit('7'))
        );
        assert_eq!(map_key(key(KeyCode::Backspace), ctx), Some(Command::Delete));
        assert_eq!(map_key(key(KeyCode::Enter), ctx), Some(Command::Submit));
        assert_eq!(map_key(key(KeyCode::Char('h')), ctx), Some(Command::Hint));
        assert_eq!(map_key(key(KeyCode::Char('g')), ctx), Some(Command::GiveUp));
    }

    #[test]
    fn control_chords_pass_through_except_ctrl_c() {
        let ctrl_r = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl_r, InputContext::Playing), None);

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl_c, InputContext::Playing), Some(Command::Quit));
    }

    #[test]
    fn alt_chords_pass_through() {
        let alt_1 = KeyEvent::new(KeyCode::Char('1'), KeyModifiers::ALT);
        assert_eq!(map_key(alt_1, InputContext::Playing), None);
    }

    #[test]
    fn results_screen_keys() {
        let ctx = InputContext::Results;
        assert_eq!(map_key(key(KeyCode::Char('n')), ctx), Some(Command::NewGame));
        assert_eq!(map_key(key(KeyCode::Char('q')), ctx), Some(Command::Quit));
        assert_eq!(map_key(key(KeyCode::Char('1')), ctx), None);
    }

    fn keypad() -> Vec<KeypadButton> {
        vec![
            KeypadButton {
                rect: Rect::new(0, 0, 3, 1),
                key: PadKey::Digit('1'),
            },
            KeypadButton {
                rect: Rect::new(4, 0, 8, 1),
                key: PadKey::Enter,
            },
        ]
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn left_click_activates_keypad_buttons() {
        let pad = keypad();
        let ev = mouse(MouseEventKind::Down(MouseButton::Left), 1, 0);
        assert_eq!(map_mouse(&ev, &pad), Some(Command::Digit('1')));

        let ev = mouse(MouseEventKind::Down(MouseButton::Left), 5, 0);
        assert_eq!(map_mouse(&ev, &pad), Some(Command::Submit));
    }

    #[test]
    fn right_click_crosses_out_digits_only() {
        let pad = keypad();
        let ev = mouse(MouseEventKind::Down(MouseButton::Right), 1, 0);
        assert_eq!(map_mouse(&ev, &pad), Some(Command::ToggleCross('1')));

        // never on the enter button
        let ev = mouse(MouseEventKind::Down(MouseButton::Right), 5, 0);
        assert_eq!(map_mouse(&ev, &pad), None);
    }

    #[test]
    fn clicks_outside_the_keypad_are_ignored() {
        let pad = keypad();
        let ev = mouse(MouseEventKind::Down(MouseButton::Left), 20, 5);
        assert_eq!(map_mouse(&ev, &pad), None);
        let ev = mouse(MouseEventKind::Moved, 1, 0);
        assert_eq!(map_mouse(&ev, &pad), None);
    }
}
