use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Key binding configuration
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    pub description: String,
}

impl KeyBinding {
    pub fn new(key: KeyCode, modifiers: KeyModifiers, description: &str) -> Self {
        Self {
            key,
            modifiers,
            description: description.to_string(),
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.key == event.code && self.modifiers == event.modifiers
    }

    /// Short label such as `Ctrl+S` or `n`
    pub fn label(&self) -> String {
        let key = match self.key {
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            other => format!("{:?}", other),
        };
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{}", key.to_uppercase())
        } else {
            key
        }
    }
}

/// Application key mappings
#[derive(Debug, Clone)]
pub struct KeyMap {
    /// Quit application
    pub quit: KeyBinding,

    /// Show help
    pub help: KeyBinding,

    /// Open the add-transaction form
    pub new_transaction: KeyBinding,

    /// Edit the selected transaction
    pub edit_transaction: KeyBinding,

    /// Delete the selected transaction
    pub delete_transaction: KeyBinding,

    /// Cycle the list filter
    pub cycle_filter: KeyBinding,

    /// Submit the open form
    pub submit_form: KeyBinding,

    /// Cancel the open form, asking first if it has changes
    pub cancel_form: KeyBinding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            quit: KeyBinding::new(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL,
                "Quit application"
            ),
            help: KeyBinding::new(
                KeyCode::Char('g'),
                KeyModifiers::CONTROL,
                "Show/hide help"
            ),
            new_transaction: KeyBinding::new(
                KeyCode::Char('n'),
                KeyModifiers::NONE,
                "Add a transaction"
            ),
            edit_transaction: KeyBinding::new(
                KeyCode::Char('e'),
                KeyModifiers::NONE,
                "Edit the selected transaction"
            ),
            delete_transaction: KeyBinding::new(
                KeyCode::Char('d'),
                KeyModifiers::NONE,
                "Delete the selected transaction"
            ),
            cycle_filter: KeyBinding::new(
                KeyCode::Char('f'),
                KeyModifiers::NONE,
                "Filter: all / income / expense"
            ),
            submit_form: KeyBinding::new(
                KeyCode::Char('s'),
                KeyModifiers::CONTROL,
                "Save the form"
            ),
            cancel_form: KeyBinding::new(
                KeyCode::Char('x'),
                KeyModifiers::CONTROL,
                "Cancel the form"
            ),
        }
    }
}

impl KeyMap {
    /// Check if the event should quit the application
    pub fn should_quit(&self, event: &KeyEvent) -> bool {
        self.quit.matches(event)
    }

    /// Check if the event should show help
    pub fn should_show_help(&self, event: &KeyEvent) -> bool {
        self.help.matches(event)
    }

    /// Get help text for all key bindings
    pub fn help_text(&self) -> String {
        let bindings = [
            &self.new_transaction,
            &self.edit_transaction,
            &self.delete_transaction,
            &self.cycle_filter,
            &self.submit_form,
            &self.cancel_form,
            &self.help,
            &self.quit,
        ];

        let mut lines: Vec<String> = bindings
            .iter()
            .map(|binding| format!("{:<8} {}", binding.label(), binding.description))
            .collect();
        lines.push(format!("{:<8} {}", "Esc", "Dismiss the top dialog"));
        lines.push(format!("{:<8} {}", "Tab", "Next field / alert button"));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_labels() {
        let keys = KeyMap::default();

        assert_eq!(keys.submit_form.label(), "Ctrl+S");
        assert_eq!(keys.new_transaction.label(), "n");
        assert!(keys.help_text().contains("Dismiss the top dialog"));
    }

    #[test]
    fn test_modifiers_must_match() {
        let keys = KeyMap::default();
        let plain_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);

        assert!(!keys.should_quit(&plain_c));
        assert!(keys.should_quit(&ctrl_c));
    }
}
