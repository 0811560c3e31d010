use crate::models::{Activity, ActivityCatalog, ClickTarget};
use askama::Template;

pub const DELETE_BUTTON_CLASS: &str = "delete-btn";
pub const DATA_ACTIVITY: &str = "data-activity";
pub const DATA_EMAIL: &str = "data-email";

pub const LOAD_FAILURE_HTML: &str = "<p>Failed to load activities. Please try again later.</p>";
pub const EMPTY_PARTICIPANTS_HTML: &str =
    r#"<p class="participants-empty">No participants yet</p>"#;

/// One card of the activity list. Every interpolated value is HTML-escaped
/// by the template, attributes included.
#[derive(Template)]
#[template(path = "activity_card.html")]
struct ActivityCardTemplate<'a> {
    name: &'a str,
    description: &'a str,
    schedule: &'a str,
    spots_left: i64,
    participants: &'a [String],
}

pub fn render_catalog(catalog: &ActivityCatalog) -> Result<Vec<String>, askama::Error> {
    catalog
        .iter()
        .map(|(name, activity)| render_activity_card(name, activity))
        .collect()
}

pub fn render_activity_card(name: &str, activity: &Activity) -> Result<String, askama::Error> {
    ActivityCardTemplate {
        name,
        description: &activity.description,
        schedule: &activity.schedule,
        spots_left: activity.spots_left(),
        participants: &activity.participants,
    }
    .render()
}

/// The click target a rendered unregister control presents once parsed by the document.
pub fn unregister_control(activity: &str, email: &str) -> ClickTarget {
    ClickTarget::new()
        .with_class(DELETE_BUTTON_CLASS)
        .with_attribute(DATA_ACTIVITY, activity)
        .with_attribute(DATA_EMAIL, email)
}
