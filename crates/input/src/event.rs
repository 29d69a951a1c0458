use cellworld_common::WPos;
use serde::{Deserialize, Serialize};

/// Whether a key or button went down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyState {
    Pressed,
    Released,
}

/// A raw event from whatever window or terminal front-end is driving the
/// simulation. The generator turns these into orders; the world never sees
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Key { code: u32, state: KeyState },
    /// Cursor moved, already in world coordinates.
    MouseMove { position: WPos },
    MouseButton { button: u32, state: KeyState },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_parse_from_tagged_yaml() {
        let events: Vec<InputEvent> = serde_yaml::from_str(
            "- { type: key, code: 32, state: pressed }\n\
             - { type: mouse_move, position: { x: 1.5, y: 2.0 } }\n\
             - { type: mouse_button, button: 0, state: released }\n",
        )
        .unwrap();
        assert_eq!(
            events[0],
            InputEvent::Key {
                code: 32,
                state: KeyState::Pressed
            }
        );
        assert_eq!(
            events[1],
            InputEvent::MouseMove {
                position: WPos::planar(1.5, 2.0)
            }
        );
        assert!(matches!(
            events[2],
            InputEvent::MouseButton {
                button: 0,
                state: KeyState::Released
            }
        ));
    }
}
