//! Keyboard shortcuts scoped to a mounted editor.
//!
//! A [`Keymap`] is shared by everything hosted in one window. Each editor
//! registers its bindings when mounted and gets a [`ShortcutScope`] back;
//! dropping the scope removes exactly those bindings.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Non-modifier part of a key chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable key, stored lowercase.
    Char(char),
    Escape,
    Enter,
}

/// A key plus modifiers, e.g. `Ctrl+Shift+H`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub key: Key,
}

impl KeyChord {
    #[must_use]
    pub fn new(key: Key) -> Self {
        Self {
            ctrl: false,
            shift: false,
            alt: false,
            key,
        }
    }

    #[must_use]
    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    #[must_use]
    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

/// Error returned when a chord string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid key chord: {0:?}")]
pub struct ParseChordError(String);

impl FromStr for KeyChord {
    type Err = ParseChordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseChordError(s.to_owned());
        let mut parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let key = parts.pop().filter(|k| !k.is_empty()).ok_or_else(invalid)?;

        let key = match key.to_ascii_lowercase().as_str() {
            "esc" | "escape" => Key::Escape,
            "enter" | "return" => Key::Enter,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return Err(invalid()),
                }
            }
        };

        let mut chord = Self::new(key);
        for modifier in parts {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" | "cmd" | "meta" => chord.ctrl = true,
                "shift" => chord.shift = true,
                "alt" | "option" => chord.alt = true,
                _ => return Err(invalid()),
            }
        }
        Ok(chord)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("Ctrl+")?;
        }
        if self.shift {
            f.write_str("Shift+")?;
        }
        if self.alt {
            f.write_str("Alt+")?;
        }
        match self.key {
            Key::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
            Key::Escape => f.write_str("Escape"),
            Key::Enter => f.write_str("Enter"),
        }
    }
}

/// Editor actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shortcut {
    /// Open the search dialog, or move to the next match.
    FindNext,
    ReplaceAll,
    /// Notify save listeners with the current content.
    Save,
    CloseSearch,
}

/// Bindings every editor registers on mount.
pub const DEFAULT_BINDINGS: [(KeyChord, Shortcut); 4] = [
    (
        KeyChord {
            ctrl: true,
            shift: false,
            alt: false,
            key: Key::Char('f'),
        },
        Shortcut::FindNext,
    ),
    (
        KeyChord {
            ctrl: true,
            shift: true,
            alt: false,
            key: Key::Char('h'),
        },
        Shortcut::ReplaceAll,
    ),
    (
        KeyChord {
            ctrl: true,
            shift: false,
            alt: false,
            key: Key::Char('s'),
        },
        Shortcut::Save,
    ),
    (
        KeyChord {
            ctrl: false,
            shift: false,
            alt: false,
            key: Key::Escape,
        },
        Shortcut::CloseSearch,
    ),
];

#[derive(Debug)]
struct Binding {
    scope: u64,
    chord: KeyChord,
    action: Shortcut,
}

#[derive(Debug, Default)]
struct KeymapInner {
    bindings: RwLock<Vec<Binding>>,
    next_scope: AtomicU64,
}

impl KeymapInner {
    // Every write is a single `extend` or `retain`, so a poisoned table is
    // still consistent.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Binding>> {
        self.bindings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Binding>> {
        self.bindings.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shared table of active key bindings.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    inner: Arc<KeymapInner>,
}

impl Keymap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bindings` under a new scope.
    #[must_use]
    pub fn register(&self, bindings: &[(KeyChord, Shortcut)]) -> ShortcutScope {
        let scope = self.inner.next_scope.fetch_add(1, Ordering::Relaxed);
        let mut table = self.inner.write();
        table.extend(bindings.iter().map(|&(chord, action)| Binding {
            scope,
            chord,
            action,
        }));
        tracing::debug!(scope, count = bindings.len(), "Registered shortcut scope");
        ShortcutScope {
            keymap: self.clone(),
            scope,
        }
    }

    /// Action bound to `chord`; the most recently registered scope wins.
    #[must_use]
    pub fn lookup(&self, chord: &KeyChord) -> Option<Shortcut> {
        self.inner
            .read()
            .iter()
            .rev()
            .find(|b| b.chord == *chord)
            .map(|b| b.action)
    }

    /// Number of active bindings across all scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bindings owned by one mounted editor, removed on drop.
#[derive(Debug)]
pub struct ShortcutScope {
    keymap: Keymap,
    scope: u64,
}

impl ShortcutScope {
    /// Action bound to `chord` within this scope only.
    #[must_use]
    pub fn lookup(&self, chord: &KeyChord) -> Option<Shortcut> {
        self.keymap
            .inner
            .read()
            .iter()
            .find(|b| b.scope == self.scope && b.chord == *chord)
            .map(|b| b.action)
    }
}

impl Drop for ShortcutScope {
    fn drop(&mut self) {
        self.keymap.inner.write().retain(|b| b.scope != self.scope);
        tracing::debug!(scope = self.scope, "Removed shortcut scope");
    }
}
