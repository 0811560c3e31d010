use crate::models::{SignupForm, StatusMessage};

/// The document elements the board writes to: the activity list container,
/// the activity select, the signup form and the message area.
pub trait BoardView: Send + 'static {
    /// Replaces everything in the list container with the given cards.
    fn replace_activities(&mut self, cards: Vec<String>);
    /// Replaces every select option except the empty placeholder.
    fn replace_options(&mut self, names: Vec<String>);
    /// Replaces the list container with a static notice.
    fn show_list_notice(&mut self, html: &str);
    fn form_values(&self) -> SignupForm;
    fn reset_form(&mut self);
    fn show_message(&mut self, message: &StatusMessage);
    fn hide_message(&mut self);
}

/// In-memory document projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub activities_html: String,
    pub options: Vec<String>,
    pub form: SignupForm,
    pub message: Option<StatusMessage>,
    pub message_visible: bool,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill_form(&mut self, email: impl Into<String>, activity: impl Into<String>) {
        self.form = SignupForm {
            email: email.into(),
            activity: activity.into(),
        };
    }

    /// The message currently on screen, if any.
    pub fn visible_message(&self) -> Option<&StatusMessage> {
        self.message.as_ref().filter(|_| self.message_visible)
    }

    /// Class list of the message area: the severity, plus `hidden` once the
    /// message has timed out. Empty before the first message.
    pub fn message_class(&self) -> String {
        match (&self.message, self.message_visible) {
            (None, _) => String::new(),
            (Some(message), true) => message.severity.class_name().to_string(),
            (Some(message), false) => format!("{} hidden", message.severity.class_name()),
        }
    }

    pub fn card_count(&self) -> usize {
        self.activities_html.matches(r#"class="activity-card""#).count()
    }
}

impl BoardView for Page {
    fn replace_activities(&mut self, cards: Vec<String>) {
        self.activities_html = cards.concat();
    }

    fn replace_options(&mut self, names: Vec<String>) {
        self.options = names;
    }

    fn show_list_notice(&mut self, html: &str) {
        self.activities_html = html.to_string();
    }

    fn form_values(&self) -> SignupForm {
        self.form.clone()
    }

    fn reset_form(&mut self) {
        self.form = SignupForm::default();
    }

    fn show_message(&mut self, message: &StatusMessage) {
        self.message = Some(message.clone());
        self.message_visible = true;
    }

    fn hide_message(&mut self) {
        self.message_visible = false;
    }
}
