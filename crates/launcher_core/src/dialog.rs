//! Confirmation dialog shown when the auth app cannot be opened.
//!
//! The controller only ever talks to an [`AuthDialog`]: it hands over the
//! current visibility plus two callbacks and gets back an optional
//! [`DialogElement`] for the host to draw. Any implementation honoring that
//! contract can replace [`AuthAppDialog`].

use std::{fmt, sync::Arc};

pub type DialogCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub struct DialogProps {
    pub visible: bool,
    pub on_cancel: DialogCallback,
    pub on_confirm: DialogCallback,
}

impl fmt::Debug for DialogProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogProps")
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

pub trait AuthDialog: Send + Sync {
    /// Returns `None` when `props.visible` is false. Must not invoke either
    /// callback itself.
    fn render(&self, props: &DialogProps) -> Option<DialogElement>;
}

impl<F> AuthDialog for F
where
    F: Fn(&DialogProps) -> Option<DialogElement> + Send + Sync,
{
    fn render(&self, props: &DialogProps) -> Option<DialogElement> {
        self(props)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonRole {
    /// Link-styled hint above the button row.
    Link,
    Decline,
    Proceed,
}

#[derive(Clone)]
pub struct DialogButton {
    label: String,
    role: ButtonRole,
    action: DialogCallback,
}

impl DialogButton {
    pub fn new(label: impl Into<String>, role: ButtonRole, action: DialogCallback) -> Self {
        Self {
            label: label.into(),
            role,
            action,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn role(&self) -> ButtonRole {
        self.role
    }

    pub fn press(&self) {
        (self.action)();
    }
}

impl fmt::Debug for DialogButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogButton")
            .field("label", &self.label)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// A rendered, visible dialog.
#[derive(Clone)]
pub struct DialogElement {
    title: String,
    description: String,
    link: Option<DialogButton>,
    buttons: Vec<DialogButton>,
    on_dismiss: DialogCallback,
}

impl DialogElement {
    /// `on_dismiss` runs for the platform close gesture (back button, escape).
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        on_dismiss: DialogCallback,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            link: None,
            buttons: Vec::new(),
            on_dismiss,
        }
    }

    pub fn with_link(mut self, link: DialogButton) -> Self {
        self.link = Some(link);
        self
    }

    pub fn with_button(mut self, button: DialogButton) -> Self {
        self.buttons.push(button);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn link(&self) -> Option<&DialogButton> {
        self.link.as_ref()
    }

    pub fn buttons(&self) -> &[DialogButton] {
        &self.buttons
    }

    pub fn button(&self, role: ButtonRole) -> Option<&DialogButton> {
        self.link
            .iter()
            .chain(self.buttons.iter())
            .find(|button| button.role == role)
    }

    /// Presses the control with `role`. Returns false when the dialog has none.
    pub fn press(&self, role: ButtonRole) -> bool {
        match self.button(role) {
            Some(button) => {
                button.press();
                true
            }
            None => false,
        }
    }

    pub fn dismiss(&self) {
        (self.on_dismiss)();
    }
}

impl fmt::Debug for DialogElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogElement")
            .field("title", &self.title)
            .field("description", &self.description)
            .field("link", &self.link)
            .field("buttons", &self.buttons)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogText {
    pub title: String,
    pub description: String,
    pub link_hint: String,
    pub decline_label: String,
    pub proceed_label: String,
}

impl Default for DialogText {
    fn default() -> Self {
        Self {
            title: "Notice".into(),
            description: "The Chainless app is not installed on this device.".into(),
            link_hint: "Open a browser page to download and install it?".into(),
            decline_label: "No, thanks".into(),
            proceed_label: "Go now".into(),
        }
    }
}

/// Default dialog: title, description, link hint, decline and proceed buttons.
#[derive(Debug, Clone, Default)]
pub struct AuthAppDialog {
    text: DialogText,
}

impl AuthAppDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: DialogText) -> Self {
        Self { text }
    }

    pub fn text(&self) -> &DialogText {
        &self.text
    }
}

impl AuthDialog for AuthAppDialog {
    fn render(&self, props: &DialogProps) -> Option<DialogElement> {
        if !props.visible {
            return None;
        }
        let text = &self.text;
        Some(
            DialogElement::new(&text.title, &text.description, Arc::clone(&props.on_cancel))
                .with_link(DialogButton::new(
                    &text.link_hint,
                    ButtonRole::Link,
                    Arc::clone(&props.on_confirm),
                ))
                .with_button(DialogButton::new(
                    &text.decline_label,
                    ButtonRole::Decline,
                    Arc::clone(&props.on_cancel),
                ))
                .with_button(DialogButton::new(
                    &text.proceed_label,
                    ButtonRole::Proceed,
                    Arc::clone(&props.on_confirm),
                )),
        )
    }
}

#[cfg(test)]
#[path = "tests/dialog_tests.rs"]
mod tests;
