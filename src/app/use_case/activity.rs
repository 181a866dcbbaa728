use chrono::Utc;

use crate::{
    app::{resource::activity::ActivityLogResponse, Context},
    domain::{entity::activity::ActivityType, start_of_day},
    error::{app::ApplicationError, resource::ValidationError},
};

fn parse_type(value: &str) -> Result<ActivityType, ApplicationError<String>> {
    value
        .parse()
        .map_err(|field| ValidationError::from_resource(value.to_string(), vec![field]).into())
}

fn respond<I>(entries: I) -> Vec<ActivityLogResponse>
where
    I: IntoIterator,
    I::Item: Into<ActivityLogResponse>,
{
    entries.into_iter().map(Into::into).collect()
}

pub async fn user_activity(
    ctx: &Context,
    user_id: &str,
) -> Result<Vec<ActivityLogResponse>, ApplicationError<String>> {
    let entries = ctx.activity.repository().find_activity_by_user(user_id).await?;
    Ok(respond(entries))
}

pub async fn user_activity_by_type(
    ctx: &Context,
    user_id: &str,
    activity_type: &str,
) -> Result<Vec<ActivityLogResponse>, ApplicationError<String>> {
    let activity_type = parse_type(activity_type)?;
    let entries = ctx
        .activity
        .repository()
        .find_activity_by_user_and_type(user_id, activity_type)
        .await?;
    Ok(respond(entries))
}

/// Activity of a user since midnight UTC.
pub async fn user_activity_today(
    ctx: &Context,
    user_id: &str,
) -> Result<Vec<ActivityLogResponse>, ApplicationError<String>> {
    let now = Utc::now();
    let entries = ctx
        .activity
        .repository()
        .find_activity_by_user_between(user_id, start_of_day(now), now)
        .await?;
    Ok(respond(entries))
}

pub async fn activity_by_type(
    ctx: &Context,
    activity_type: &str,
) -> Result<Vec<ActivityLogResponse>, ApplicationError<String>> {
    let activity_type = parse_type(activity_type)?;
    let entries = ctx
        .activity
        .repository()
        .find_activity_by_type(activity_type)
        .await?;
    Ok(respond(entries))
}
