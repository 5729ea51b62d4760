//! Text clipboard for the editor UI.

use log::{debug, warn};

/// The system clipboard when one is reachable. Without one (headless, no
/// display server) text is kept inside the process so copy and paste still
/// work between editor widgets.
pub struct Clipboard {
    system: Option<arboard::Clipboard>,
    local: String,
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard {
    pub fn new() -> Self {
        let system = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                debug!("System clipboard unavailable, using a local one: {}", e);
                None
            }
        };
        Self {
            system,
            local: String::new(),
        }
    }

    /// A clipboard that never touches the system one.
    pub fn detached() -> Self {
        Self {
            system: None,
            local: String::new(),
        }
    }

    pub fn get_text(&mut self) -> Option<String> {
        let text = match &mut self.system {
            Some(system) => system.get_text().ok(),
            None => Some(self.local.clone()),
        };
        text.filter(|text| !text.is_empty())
    }

    pub fn set_text(&mut self, text: &str) {
        if let Some(system) = &mut self.system {
            if let Err(e) = system.set_text(text) {
                warn!("Failed to copy to clipboard: {}", e);
            }
        }
        self.local = text.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_clipboard_keeps_text_in_process() {
        let mut clipboard = Clipboard::detached();
        assert_eq!(clipboard.get_text(), None);

        clipboard.set_text("Cube.001");
        assert_eq!(clipboard.get_text().as_deref(), Some("Cube.001"));

        clipboard.set_text("");
        assert_eq!(clipboard.get_text(), None);
    }
}
