use std::collections::HashSet;

/// Controls held down during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub reverse: bool,
    pub left: bool,
    pub right: bool,
}

/// Keys currently held, fed by keydown/keyup events.
#[derive(Default)]
pub struct KeyboardState {
    pressed: HashSet<String>,
}

impl KeyboardState {
    pub fn new() -> Self {
        KeyboardState::default()
    }

    /// Returns true when the key drives the jeep, so the caller can
    /// swallow the browser's default scrolling.
    pub fn key_down(&mut self, key: &str) -> bool {
        let key = normalize(key);
        let bound = is_driving_key(&key);
        self.pressed.insert(key);
        bound
    }

    pub fn key_up(&mut self, key: &str) {
        self.pressed.remove(&normalize(key));
    }

    /// Drops everything, e.g. when the page loses focus and keyup never arrives.
    pub fn release_all(&mut self) {
        self.pressed.clear();
    }

    pub fn snapshot(&self) -> InputState {
        let held = |keys: &[&str]| keys.iter().any(|k| self.pressed.contains(*k));
        InputState {
            forward: held(&["w", "arrowup"]),
            reverse: held(&["s", "arrowdown"]),
            left: held(&["a", "arrowleft"]),
            right: held(&["d", "arrowright"]),
        }
    }
}

fn normalize(key: &str) -> String {
    key.to_lowercase()
}

fn is_driving_key(key: &str) -> bool {
    matches!(
        key,
        "w" | "a" | "s" | "d" | "arrowup" | "arrowdown" | "arrowleft" | "arrowright"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_held_keys() {
        let mut keys = KeyboardState::new();
        assert_eq!(keys.snapshot(), InputState::default());

        assert!(keys.key_down("W"));
        assert!(keys.key_down("ArrowLeft"));
        let input = keys.snapshot();
        assert!(input.forward && input.left);
        assert!(!input.reverse && !input.right);

        keys.key_up("w");
        assert!(!keys.snapshot().forward);
        assert!(keys.snapshot().left);
    }

    #[test]
    fn unbound_keys_are_not_claimed() {
        let mut keys = KeyboardState::new();
        assert!(!keys.key_down("r"));
        assert!(!keys.key_down("Shift"));
        assert_eq!(keys.snapshot(), InputState::default());
    }

    #[test]
    fn release_all_clears_snapshot() {
        let mut keys = KeyboardState::new();
        keys.key_down("d");
        keys.key_down("s");
        keys.release_all();
        assert_eq!(keys.snapshot(), InputState::default());
    }
}
