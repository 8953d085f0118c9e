use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::viewport::ScrollAction;

/// Events fed into [`App::handle`](super::App::handle).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserEvent {
    Key(KeyEvent),
    /// New terminal size in columns and rows
    Resize(u16, u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Next,
    Prev,
    First,
    Last,
    CycleFilter,
    Scroll(ScrollAction),
}

/// キー入力をアクションに変換。未割り当てのキーは `None`
pub fn action_for_key(key: &KeyEvent) -> Option<Action> {
    // Kitty keyboard protocol では Release/Repeat も届くので Press のみ扱う
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    let action = match key.code {
        KeyCode::Char('c') if ctrl => Action::Quit,
        KeyCode::Char('f') if ctrl => Action::Scroll(ScrollAction::PageDown),
        KeyCode::Char('b') if ctrl => Action::Scroll(ScrollAction::PageUp),
        KeyCode::Char('d') if ctrl => Action::Scroll(ScrollAction::HalfPageDown),
        KeyCode::Char('u') if ctrl => Action::Scroll(ScrollAction::HalfPageUp),
        _ if ctrl => return None,
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('j') => Action::Next,
        KeyCode::Char('k') => Action::Prev,
        KeyCode::Char('g') => Action::First,
        KeyCode::Char('G') => Action::Last,
        KeyCode::Char('f') => Action::CycleFilter,
        KeyCode::Up => Action::Scroll(ScrollAction::LineUp),
        KeyCode::Down => Action::Scroll(ScrollAction::LineDown),
        KeyCode::PageUp => Action::Scroll(ScrollAction::PageUp),
        KeyCode::PageDown => Action::Scroll(ScrollAction::PageDown),
        KeyCode::Home => Action::Scroll(ScrollAction::Top),
        KeyCode::End => Action::Scroll(ScrollAction::Bottom),
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_browser_keys() {
        assert_eq!(action_for_key(&key(KeyCode::Char('j'))), Some(Action::Next));
        assert_eq!(action_for_key(&key(KeyCode::Char('k'))), Some(Action::Prev));
        assert_eq!(action_for_key(&key(KeyCode::Char('g'))), Some(Action::First));
        assert_eq!(action_for_key(&key(KeyCode::Char('G'))), Some(Action::Last));
        assert_eq!(
            action_for_key(&key(KeyCode::Char('f'))),
            Some(Action::CycleFilter)
        );
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(action_for_key(&key(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(action_for_key(&key(KeyCode::Esc)), Some(Action::Quit));
        assert_eq!(action_for_key(&ctrl('c')), Some(Action::Quit));
    }

    #[test]
    fn test_scroll_keys() {
        assert_eq!(
            action_for_key(&key(KeyCode::Down)),
            Some(Action::Scroll(ScrollAction::LineDown))
        );
        assert_eq!(
            action_for_key(&ctrl('f')),
            Some(Action::Scroll(ScrollAction::PageDown))
        );
        assert_eq!(
            action_for_key(&ctrl('u')),
            Some(Action::Scroll(ScrollAction::HalfPageUp))
        );
        assert_eq!(
            action_for_key(&key(KeyCode::End)),
            Some(Action::Scroll(ScrollAction::Bottom))
        );
    }

    #[test]
    fn test_unbound_keys() {
        assert_eq!(action_for_key(&key(KeyCode::Char('x'))), None);
        assert_eq!(action_for_key(&ctrl('j')), None);
        assert_eq!(action_for_key(&key(KeyCode::Tab)), None);
    }

    #[test]
    fn test_release_is_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('j'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(action_for_key(&release), None);
    }
}
