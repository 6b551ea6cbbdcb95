use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key press means to the chat loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Submit,
    Newline,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
    /// Forward to the input box.
    Edit,
}

pub fn classify_key(key: &KeyEvent) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('d') if ctrl => KeyAction::Quit,
        KeyCode::Enter if alt || key.modifiers.contains(KeyModifiers::SHIFT) => KeyAction::Newline,
        KeyCode::Char('j') if ctrl => KeyAction::Newline,
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Up if !alt => KeyAction::ScrollUp,
        KeyCode::Down if !alt => KeyAction::ScrollDown,
        KeyCode::PageUp => KeyAction::PageUp,
        KeyCode::PageDown => KeyAction::PageDown,
        KeyCode::Home if ctrl => KeyAction::ScrollToTop,
        KeyCode::End if ctrl => KeyAction::ScrollToBottom,
        _ => KeyAction::Edit,
    }
}
