//! Player actions mapped onto remote-control keys and menu calls.

use std::fmt;
use std::str::FromStr;

use bdstream_core::Error;

use crate::buffer::BdBuffer;
use crate::engine::NavKey;

/// Which menu [`BdBuffer::go_to_menu`] opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    /// The disc's top menu.
    Root,
    /// The in-movie popup menu.
    Popup,
}

impl FromStr for MenuKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "root" | "top" => Ok(MenuKind::Root),
            "popup" => Ok(MenuKind::Popup),
            other => Err(Error::navigation(format!("unknown menu '{other}'"))),
        }
    }
}

impl fmt::Display for MenuKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuKind::Root => write!(f, "root"),
            MenuKind::Popup => write!(f, "popup"),
        }
    }
}

/// Keys only meaningful while a menu is showing.
fn menu_key(action: &str) -> Option<NavKey> {
    match action {
        "UP" => Some(NavKey::Up),
        "DOWN" => Some(NavKey::Down),
        "LEFT" => Some(NavKey::Left),
        "RIGHT" => Some(NavKey::Right),
        "SELECT" => Some(NavKey::Enter),
        _ => {
            let mut chars = action.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c.to_digit(10).map(|d| NavKey::Digit(d as u8)),
                _ => None,
            }
        }
    }
}

impl BdBuffer {
    /// Offer player actions to the disc. Returns whether one was consumed.
    pub fn handle_action(&mut self, actions: &[&str], pts: i64) -> bool {
        let actions: Vec<String> = actions.iter().map(|a| a.to_ascii_uppercase()).collect();
        let has = |name: &str| actions.iter().any(|a| a == name);

        if has("MENUTEXT") || has("POPUP") {
            return self.press_key(NavKey::Popup, pts);
        }
        if has("MENU") {
            return self.go_to_menu(MenuKind::Root, pts);
        }
        if !self.is_in_menu() {
            return false;
        }
        match actions.iter().find_map(|a| menu_key(a)) {
            Some(key) => self.press_key(key, pts),
            None => false,
        }
    }

    /// Open the top menu or toggle the popup menu.
    pub fn go_to_menu(&mut self, kind: MenuKind, pts: i64) -> bool {
        let accepted = match kind {
            MenuKind::Root => {
                if !self.shared.state.lock().top_menu_supported {
                    tracing::debug!(session = %self.session_id, "Disc has no top menu");
                    return false;
                }
                self.engine.as_mut().is_some_and(|e| e.menu_call(pts))
            }
            MenuKind::Popup => return self.press_key(NavKey::Popup, pts),
        };
        tracing::debug!(session = %self.session_id, %kind, accepted, "Menu call");
        self.handle_events();
        accepted
    }

    /// Forward a mouse click on the menu plane.
    pub fn click_button(&mut self, pts: i64, x: u16, y: u16) -> bool {
        let accepted = self
            .engine
            .as_mut()
            .is_some_and(|e| e.mouse_select(pts, x, y));
        self.handle_events();
        accepted
    }

    fn press_key(&mut self, key: NavKey, pts: i64) -> bool {
        let accepted = self.engine.as_mut().is_some_and(|e| e.user_input(pts, key));
        tracing::debug!(session = %self.session_id, ?key, accepted, "Key press");
        self.handle_events();
        accepted
    }
}
