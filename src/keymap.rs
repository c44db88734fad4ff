use sdl2::{event::Event, keyboard::Keycode};

/// Host keyboard layout for the 16-key virtual keypad. The left-hand
/// block 1234/QWER/ASDF/ZXCV maps onto the classical 4x4 grid:
///
/// ```text
/// 1 2 3 C
/// 4 5 6 D
/// 7 8 9 E
/// A 0 B F
/// ```
const KEYPAD: [(Keycode, u8); 16] = [
    (Keycode::Num1, 0x1),
    (Keycode::Num2, 0x2),
    (Keycode::Num3, 0x3),
    (Keycode::Num4, 0xC),
    (Keycode::Q, 0x4),
    (Keycode::W, 0x5),
    (Keycode::E, 0x6),
    (Keycode::R, 0xD),
    (Keycode::A, 0x7),
    (Keycode::S, 0x8),
    (Keycode::D, 0x9),
    (Keycode::F, 0xE),
    (Keycode::Z, 0xA),
    (Keycode::X, 0x0),
    (Keycode::C, 0xB),
    (Keycode::V, 0xF),
];

/// Actions to be executed by the application
pub enum Action {
    EmulateKeyState(u8, bool),
    TogglePause,
    Quit,
}

/// Translate an SDL2 event into an action to be executed by the app
pub fn translate(event: &Event) -> Option<Action> {
    match event {
        Event::KeyDown {
            keycode: Some(Keycode::Escape),
            ..
        } => Some(Action::Quit),
        Event::KeyDown {
            keycode: Some(Keycode::Space),
            ..
        } => Some(Action::TogglePause),
        Event::KeyDown {
            keycode: Some(key), ..
        } => virtual_key(*key).map(|k| Action::EmulateKeyState(k, true)),
        Event::KeyUp {
            keycode: Some(key), ..
        } => virtual_key(*key).map(|k| Action::EmulateKeyState(k, false)),
        Event::Quit { .. } => Some(Action::Quit),
        _ => None,
    }
}

fn virtual_key(key: Keycode) -> Option<u8> {
    KEYPAD
        .iter()
        .find(|(host, _)| *host == key)
        .map(|&(_, virt)| virt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypad_covers_all_virtual_keys() {
        let mut seen = [false; 16];
        for &(_, virt) in KEYPAD.iter() {
            assert!(!seen[virt as usize], "duplicate virtual key {virt:X}");
            seen[virt as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_grid_corners() {
        assert_eq!(virtual_key(Keycode::Num1), Some(0x1));
        assert_eq!(virtual_key(Keycode::Num4), Some(0xC));
        assert_eq!(virtual_key(Keycode::Z), Some(0xA));
        assert_eq!(virtual_key(Keycode::V), Some(0xF));
        assert_eq!(virtual_key(Keycode::P), None);
    }
}
