use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use routebook_core::{
    validation::{Field, ValidationError},
    Credentials, Registration,
};

/// Single-line text input with a character cursor.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(idx, _)| idx)
            .unwrap_or(self.value.len())
    }

    pub fn insert(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.value.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor >= self.char_len() {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.value.remove(at);
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.char_len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Apply an editing key. Returns `false` when the key is not an edit.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.insert(ch);
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_cursor(-1),
            KeyCode::Right => self.move_cursor(1),
            KeyCode::Home => self.move_home(),
            KeyCode::End => self.move_end(),
            _ => return false,
        }
        true
    }
}

/// One labelled input in a form.
#[derive(Debug, Clone)]
pub struct FormField {
    pub field: Field,
    pub label: &'static str,
    pub input: TextInput,
    pub secret: bool,
    pub error: Option<String>,
}

impl FormField {
    fn new(field: Field, label: &'static str, secret: bool) -> Self {
        Self {
            field,
            label,
            input: TextInput::default(),
            secret,
            error: None,
        }
    }

    /// Value as it should be displayed (masked for secrets).
    pub fn display_value(&self) -> String {
        if self.secret {
            "•".repeat(self.input.value().chars().count())
        } else {
            self.input.value().to_string()
        }
    }
}

/// Which authentication form is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Login,
    Register,
}

/// Login or registration form with a focused field.
#[derive(Debug, Clone)]
pub struct AuthForm {
    pub kind: FormKind,
    pub fields: Vec<FormField>,
    pub focus: usize,
}

impl AuthForm {
    pub fn login() -> Self {
        Self {
            kind: FormKind::Login,
            fields: vec![
                FormField::new(Field::Email, "Email", false),
                FormField::new(Field::Password, "Password", true),
            ],
            focus: 0,
        }
    }

    pub fn register() -> Self {
        Self {
            kind: FormKind::Register,
            fields: vec![
                FormField::new(Field::Username, "Username", false),
                FormField::new(Field::Email, "Email", false),
                FormField::new(Field::Password, "Password", true),
            ],
            focus: 0,
        }
    }

    pub fn focused_mut(&mut self) -> Option<&mut FormField> {
        self.fields.get_mut(self.focus)
    }

    pub fn move_focus(&mut self, delta: isize) {
        let len = self.fields.len() as isize;
        if len == 0 {
            return;
        }
        self.focus = (self.focus as isize + delta).rem_euclid(len) as usize;
    }

    fn value(&self, field: Field) -> String {
        self.fields
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| entry.input.value().to_string())
            .unwrap_or_default()
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.value(Field::Email), self.value(Field::Password))
    }

    pub fn registration(&self) -> Registration {
        Registration::new(
            self.value(Field::Username),
            self.value(Field::Email),
            self.value(Field::Password),
        )
    }

    /// Attach validation messages to their fields, clearing old ones, and
    /// focus the first failing field.
    pub fn apply_errors(&mut self, errors: &[ValidationError]) {
        for entry in &mut self.fields {
            entry.error = errors
                .iter()
                .find(|err| err.field() == entry.field)
                .map(ToString::to_string);
        }
        if let Some(first) = self.fields.iter().position(|entry| entry.error.is_some()) {
            self.focus = first;
        }
    }

    pub fn clear_errors(&mut self) {
        for entry in &mut self.fields {
            entry.error = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn editing_respects_multibyte_characters() {
        let mut input = TextInput::default();
        for ch in "café".chars() {
            input.insert(ch);
        }
        input.move_cursor(-1);
        input.backspace();
        assert_eq!(input.value(), "caé");
        input.move_home();
        input.delete();
        assert_eq!(input.value(), "aé");
        input.move_end();
        assert_eq!(input.cursor(), 2);
        input.move_cursor(5);
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn control_chords_are_not_edits() {
        let mut input = TextInput::default();
        assert!(input.handle_key(&key(KeyCode::Char('a'))));
        assert!(input.handle_key(&KeyEvent::new(KeyCode::Char('B'), KeyModifiers::SHIFT)));
        assert!(!input.handle_key(&KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL)));
        assert!(!input.handle_key(&key(KeyCode::Enter)));
        assert_eq!(input.value(), "aB");
    }

    #[test]
    fn focus_wraps_and_errors_attach_to_fields() {
        let mut form = AuthForm::register();
        form.move_focus(-1);
        assert_eq!(form.focus, 2);
        form.move_focus(1);
        assert_eq!(form.focus, 0);

        form.apply_errors(&[ValidationError::EmailInvalid]);
        assert_eq!(form.focus, 1);
        assert_eq!(form.fields[1].error.as_deref(), Some("Invalid email address"));
        assert!(form.fields[0].error.is_none());

        form.clear_errors();
        assert!(form.fields.iter().all(|entry| entry.error.is_none()));
    }

    #[test]
    fn secrets_are_masked() {
        let mut form = AuthForm::login();
        form.focus = 1;
        if let Some(field) = form.focused_mut() {
            for ch in "hunter2".chars() {
                field.input.insert(ch);
            }
        }
        assert_eq!(form.fields[1].display_value(), "•••••••");
        assert_eq!(form.credentials().password, "hunter2");
    }
}
