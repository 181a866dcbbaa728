pub mod activity;
pub mod answer;
pub mod notification;
pub mod question;
pub mod search;
pub mod tally;
pub mod user;

use crate::{
    domain::event::ForumEvent,
    error::resource::{ValidationErrorKind, ValidationFieldError},
};

use super::Context;

/// Hand `event` to the broker. A failure is logged and never surfaces to the
/// caller, the write that produced the event already succeeded.
async fn publish(ctx: &Context, event: ForumEvent) {
    match ctx.publisher.publish(&event).await {
        Ok(()) => tracing::debug!(
            event_type = %event.event_type,
            topic = event.topic(),
            key = ?event.key(),
            "event published"
        ),
        Err(err) => tracing::error!(
            event_type = %event.event_type,
            topic = event.topic(),
            key = ?event.key(),
            "failed to publish event: {err}"
        ),
    }
}

fn require_text(
    errors: &mut Vec<ValidationFieldError>,
    type_id: &'static str,
    path: &str,
    value: &str,
) {
    if value.trim().is_empty() {
        errors.push(ValidationFieldError::new(
            type_id,
            value.into(),
            path.into(),
            vec![ValidationErrorKind::Required],
        ));
    }
}
