/// Keyboard input thread and the shared run flag
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cell3d_core::Key;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// How long the input thread blocks before re-checking the run flag
const POLL_TIMEOUT: Duration = Duration::from_millis(20);

/// Events forwarded from the input thread to the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(Key),
    Resize(u16, u16),
}

/// Running flag shared by the frame loop and the input thread
#[derive(Debug, Clone)]
pub struct RunState {
    running: Arc<AtomicBool>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a terminal key to the logical key it drives
///
/// Arrows move the camera, W/S fly along the view direction, A/D turn,
/// R/F look up and down, Q or Esc quits.
pub fn map_key(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Esc => Key::Quit,
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => Key::Forward,
            's' => Key::Back,
            'a' => Key::TurnLeft,
            'd' => Key::TurnRight,
            'r' => Key::LookUp,
            'f' => Key::LookDown,
            'q' => Key::Quit,
            _ => return None,
        },
        _ => return None,
    };
    Some(key)
}

/// Map a full key event, honoring Ctrl+C and ignoring releases
pub fn map_key_event(event: &KeyEvent) -> Option<Key> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    if event.modifiers.contains(KeyModifiers::CONTROL) && event.code == KeyCode::Char('c') {
        return Some(Key::Quit);
    }
    map_key(event.code)
}

/// Translate one terminal event for the frame loop
pub fn translate_event(event: &Event) -> Option<InputEvent> {
    match event {
        Event::Key(key) => map_key_event(key).map(InputEvent::Key),
        Event::Resize(width, height) => Some(InputEvent::Resize(*width, *height)),
        _ => None,
    }
}

/// Poll terminal events until `state` stops or the frame loop hangs up
pub fn spawn_input_thread(state: RunState, events: Sender<InputEvent>) -> JoinHandle<io::Result<()>> {
    thread::spawn(move || {
        while state.is_running() {
            if !event::poll(POLL_TIMEOUT)? {
                continue;
            }

            let Some(input) = translate_event(&event::read()?) else {
                continue;
            };
            if input == InputEvent::Key(Key::Quit) {
                state.stop();
            }
            if events.send(input).is_err() {
                log::debug!("Frame loop gone, input thread exiting");
                break;
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key_event(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_movement_bindings() {
        assert_eq!(map_key(KeyCode::Up), Some(Key::Up));
        assert_eq!(map_key(KeyCode::Left), Some(Key::Left));
        assert_eq!(map_key(KeyCode::Char('w')), Some(Key::Forward));
        assert_eq!(map_key(KeyCode::Char('S')), Some(Key::Back));
        assert_eq!(map_key(KeyCode::Char('a')), Some(Key::TurnLeft));
        assert_eq!(map_key(KeyCode::Char('d')), Some(Key::TurnRight));
        assert_eq!(map_key(KeyCode::Char('r')), Some(Key::LookUp));
        assert_eq!(map_key(KeyCode::Char('f')), Some(Key::LookDown));
    }

    #[test]
    fn test_quit_bindings() {
        assert_eq!(map_key(KeyCode::Char('q')), Some(Key::Quit));
        assert_eq!(map_key(KeyCode::Esc), Some(Key::Quit));
        let ctrl_c = key_event(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press);
        assert_eq!(map_key_event(&ctrl_c), Some(Key::Quit));
    }

    #[test]
    fn test_unbound_and_released_keys() {
        assert_eq!(map_key(KeyCode::Char('x')), None);
        assert_eq!(map_key(KeyCode::Enter), None);

        let release = key_event(KeyCode::Char('w'), KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(map_key_event(&release), None);
        let repeat = key_event(KeyCode::Char('w'), KeyModifiers::NONE, KeyEventKind::Repeat);
        assert_eq!(map_key_event(&repeat), Some(Key::Forward));
    }

    #[test]
    fn test_translate_resize() {
        assert_eq!(
            translate_event(&Event::Resize(100, 40)),
            Some(InputEvent::Resize(100, 40))
        );
        assert_eq!(translate_event(&Event::FocusGained), None);
    }

    #[test]
    fn test_run_state_shared_between_clones() {
        let state = RunState::new();
        let other = state.clone();
        assert!(other.is_running());
        state.stop();
        assert!(!other.is_running());
    }
}
