//! OpenAPI document of the forum HTTP API and the bundled Swagger UI serving it.

use std::sync::Arc;

use async_trait::async_trait;
use salvo::{
    http::{
        header::{self, HeaderValue},
        StatusCode, StatusError,
    },
    writer::{Json, Redirect},
    Depot, FlowCtrl, Handler, Request, Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::Config;

use crate::{
    app::resource::{
        activity::ActivityLogResponse,
        forum::{
            AnswerResponse, CreateAnswer, CreateQuestion, QuestionResponse, UpdateQuestion,
            VoteAnswer, VoteTallyResponse,
        },
        iam::{CreateUser, UserCredential, UserResponse},
        notification::NotificationResponse,
    },
    domain::entity::{activity::ActivityType, notification::NotificationKind},
};

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "QA Forum API",
        description = "Questions, answers, users, search, activity and notifications"
    ),
    tags(
        (name = "questions", description = "Question management"),
        (name = "answers", description = "Answers, votes and acceptance"),
        (name = "users", description = "Registration and login"),
        (name = "search", description = "Full-text question search"),
        (name = "activity", description = "User activity log"),
        (name = "notifications", description = "User notifications"),
        (name = "votes", description = "Vote aggregation")
    ),
    paths(
        forum::create_question,
        forum::list_questions,
        forum::find_question,
        forum::update_question,
        forum::delete_question,
        forum::answer_ids,
        forum::create_answer,
        forum::list_answers,
        forum::vote_answer,
        forum::accept_answer,
        forum::vote_tally,
        iam::register_user,
        iam::list_users,
        iam::login,
        search::search,
        search::search_v2,
        activity::user_activity,
        activity::user_activity_today,
        activity::user_activity_by_type,
        activity::activity_by_type,
        notification::notifications,
        notification::unread_notifications,
        notification::mark_read,
    ),
    components(schemas(
        CreateQuestion,
        UpdateQuestion,
        QuestionResponse,
        CreateAnswer,
        VoteAnswer,
        AnswerResponse,
        VoteTallyResponse,
        CreateUser,
        UserCredential,
        UserResponse,
        ActivityLogResponse,
        ActivityType,
        NotificationResponse,
        NotificationKind,
    ))
)]
pub struct ApiDoc;

pub mod forum {
    use super::*;

    #[utoipa::path(
        post,
        path = "/api/questions",
        tag = "questions",
        request_body = CreateQuestion,
        responses(
            (status = 201, description = "Question created", body = QuestionResponse),
            (status = 400, description = "Invalid question")
        )
    )]
    pub async fn create_question() {}

    #[utoipa::path(
        get,
        path = "/api/questions",
        tag = "questions",
        params(
            ("author" = Option<String>, Query, description = "Only questions of this author"),
            ("tag" = Option<String>, Query, description = "Only questions carrying this tag")
        ),
        responses((status = 200, description = "Questions in creation order", body = [QuestionResponse]))
    )]
    pub async fn list_questions() {}

    #[utoipa::path(
        get,
        path = "/api/questions/{id}",
        tag = "questions",
        params(("id" = uuid::Uuid, Path, description = "Question id")),
        responses(
            (status = 200, description = "Question found", body = QuestionResponse),
            (status = 404, description = "Question not found")
        )
    )]
    pub async fn find_question() {}

    #[utoipa::path(
        put,
        path = "/api/questions/{id}",
        tag = "questions",
        params(("id" = uuid::Uuid, Path, description = "Question id")),
        request_body = UpdateQuestion,
        responses(
            (status = 200, description = "Question updated", body = QuestionResponse),
            (status = 400, description = "Invalid question"),
            (status = 404, description = "Question not found")
        )
    )]
    pub async fn update_question() {}

    #[utoipa::path(
        delete,
        path = "/api/questions/{id}",
        tag = "questions",
        params(("id" = uuid::Uuid, Path, description = "Question id")),
        responses(
            (status = 204, description = "Question and its answers deleted"),
            (status = 404, description = "Question not found")
        )
    )]
    pub async fn delete_question() {}

    #[utoipa::path(
        get,
        path = "/api/questions/{id}/answer-ids",
        tag = "questions",
        params(("id" = uuid::Uuid, Path, description = "Question id")),
        responses(
            (status = 200, description = "Ids of the question answers", body = [uuid::Uuid]),
            (status = 404, description = "Question not found")
        )
    )]
    pub async fn answer_ids() {}

    #[utoipa::path(
        post,
        path = "/api/questions/{id}/answers",
        tag = "answers",
        params(("id" = uuid::Uuid, Path, description = "Question id")),
        request_body = CreateAnswer,
        responses(
            (status = 201, description = "Answer created", body = AnswerResponse),
            (status = 400, description = "Invalid answer"),
            (status = 404, description = "Question not found")
        )
    )]
    pub async fn create_answer() {}

    #[utoipa::path(
        get,
        path = "/api/questions/{id}/answers",
        tag = "answers",
        params(("id" = uuid::Uuid, Path, description = "Question id")),
        responses((status = 200, description = "Answers in creation order", body = [AnswerResponse]))
    )]
    pub async fn list_answers() {}

    #[utoipa::path(
        put,
        path = "/api/answers/{id}/vote",
        tag = "answers",
        params(("id" = uuid::Uuid, Path, description = "Answer id")),
        request_body(content = VoteAnswer, description = "Vote delta, defaults to 1 when absent"),
        responses(
            (status = 200, description = "Vote applied", body = AnswerResponse),
            (status = 404, description = "Answer not found")
        )
    )]
    pub async fn vote_answer() {}

    #[utoipa::path(
        put,
        path = "/api/answers/{id}/accept",
        tag = "answers",
        params(("id" = uuid::Uuid, Path, description = "Answer id")),
        responses(
            (status = 200, description = "Answer accepted", body = AnswerResponse),
            (status = 404, description = "Answer not found")
        )
    )]
    pub async fn accept_answer() {}

    #[utoipa::path(
        get,
        path = "/api/votes/tally",
        tag = "votes",
        responses((status = 200, description = "Votes summed over every question", body = VoteTallyResponse))
    )]
    pub async fn vote_tally() {}
}

pub mod iam {
    use super::*;

    #[utoipa::path(
        post,
        path = "/api/users",
        tag = "users",
        request_body = CreateUser,
        responses(
            (status = 201, description = "User registered", body = UserResponse),
            (status = 400, description = "Invalid user or username taken")
        )
    )]
    pub async fn register_user() {}

    #[utoipa::path(
        get,
        path = "/api/users",
        tag = "users",
        responses((status = 200, description = "Registered users", body = [UserResponse]))
    )]
    pub async fn list_users() {}

    #[utoipa::path(
        post,
        path = "/api/users/login",
        tag = "users",
        request_body = UserCredential,
        responses(
            (status = 200, description = "Login successful", body = UserResponse),
            (status = 401, description = "Invalid credentials")
        )
    )]
    pub async fn login() {}
}

pub mod search {
    use super::*;

    #[utoipa::path(
        get,
        path = "/api/search",
        tag = "search",
        params(
            ("q" = String, Query, description = "Search phrase"),
            ("X-User-Id" = Option<String>, Header, description = "User performing the search")
        ),
        responses(
            (status = 200, description = "Matching questions by relevance", body = [QuestionResponse]),
            (status = 400, description = "Missing search phrase")
        )
    )]
    pub async fn search() {}

    #[utoipa::path(
        get,
        path = "/api/v2/search",
        tag = "search",
        params(("q" = Option<String>, Query, description = "Search phrase")),
        responses((status = 200, description = "Matching questions by relevance", body = [QuestionResponse]))
    )]
    pub async fn search_v2() {}
}

pub mod activity {
    use super::*;

    #[utoipa::path(
        get,
        path = "/api/activity/{userId}",
        tag = "activity",
        params(("userId" = String, Path, description = "User id")),
        responses((status = 200, description = "Activity newest first", body = [ActivityLogResponse]))
    )]
    pub async fn user_activity() {}

    #[utoipa::path(
        get,
        path = "/api/activity/{userId}/today",
        tag = "activity",
        params(("userId" = String, Path, description = "User id")),
        responses((status = 200, description = "Activity since midnight UTC", body = [ActivityLogResponse]))
    )]
    pub async fn user_activity_today() {}

    #[utoipa::path(
        get,
        path = "/api/activity/{userId}/type/{type}",
        tag = "activity",
        params(
            ("userId" = String, Path, description = "User id"),
            ("type" = ActivityType, Path, description = "Activity type")
        ),
        responses(
            (status = 200, description = "Activity of one type", body = [ActivityLogResponse]),
            (status = 400, description = "Unknown activity type")
        )
    )]
    pub async fn user_activity_by_type() {}

    #[utoipa::path(
        get,
        path = "/api/activity/type/{type}",
        tag = "activity",
        params(("type" = ActivityType, Path, description = "Activity type")),
        responses(
            (status = 200, description = "Activity of one type across users", body = [ActivityLogResponse]),
            (status = 400, description = "Unknown activity type")
        )
    )]
    pub async fn activity_by_type() {}
}

pub mod notification {
    use super::*;

    #[utoipa::path(
        get,
        path = "/api/notifications/{userId}",
        tag = "notifications",
        params(("userId" = String, Path, description = "Recipient id")),
        responses((status = 200, description = "Notifications newest first", body = [NotificationResponse]))
    )]
    pub async fn notifications() {}

    #[utoipa::path(
        get,
        path = "/api/notifications/{userId}/unread",
        tag = "notifications",
        params(("userId" = String, Path, description = "Recipient id")),
        responses((status = 200, description = "Unread notifications", body = [NotificationResponse]))
    )]
    pub async fn unread_notifications() {}

    #[utoipa::path(
        put,
        path = "/api/notifications/{id}/read",
        tag = "notifications",
        params(("id" = uuid::Uuid, Path, description = "Notification id")),
        responses(
            (status = 200, description = "Notification marked read", body = NotificationResponse),
            (status = 404, description = "Notification not found")
        )
    )]
    pub async fn mark_read() {}
}

pub const SWAGGER_UI_PATH: &str = "/swagger-ui/";

/// Serves the generated OpenAPI document.
pub struct OpenApiController {
    doc: utoipa::openapi::OpenApi,
}

impl OpenApiController {
    pub fn new() -> Self {
        Self {
            doc: ApiDoc::openapi(),
        }
    }
}

impl Default for OpenApiController {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Handler for OpenApiController {
    async fn handle(&self, _: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        res.render(Json(&self.doc));
        res.set_status_code(StatusCode::OK);
    }
}

/// Serves the Swagger UI assets bundled by `utoipa-swagger-ui`.
pub struct SwaggerUiController {
    config: Arc<Config<'static>>,
}

impl SwaggerUiController {
    pub fn new() -> Self {
        Self {
            config: Arc::new(Config::from(OPENAPI_PATH)),
        }
    }
}

impl Default for SwaggerUiController {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Handler for SwaggerUiController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let path = req
            .params()
            .iter()
            .find(|(key, _)| key.starts_with('*'))
            .map(|(_, rest)| rest.clone())
            .unwrap_or_default();

        // relative asset urls of the index page need the trailing slash
        if path.is_empty() && !req.uri().path().ends_with('/') {
            res.render(Redirect::found(SWAGGER_UI_PATH));
            return;
        }

        match utoipa_swagger_ui::serve(&path, self.config.clone()) {
            Ok(Some(file)) => {
                if let Ok(content_type) = HeaderValue::from_str(&file.content_type) {
                    res.headers_mut().insert(header::CONTENT_TYPE, content_type);
                }
                if let Err(err) = res.write_body(file.bytes.into_owned()) {
                    tracing::error!(path = %path, "failed to write swagger asset: {err}");
                    res.set_status_error(StatusError::internal_server_error());
                    return;
                }
                res.set_status_code(StatusCode::OK);
            }
            Ok(None) => res.set_status_error(StatusError::not_found()),
            Err(err) => {
                tracing::error!(path = %path, "failed to serve swagger asset: {err}");
                res.set_status_error(StatusError::internal_server_error());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for path in [
            "/api/questions",
            "/api/questions/{id}",
            "/api/questions/{id}/answer-ids",
            "/api/questions/{id}/answers",
            "/api/answers/{id}/vote",
            "/api/answers/{id}/accept",
            "/api/users",
            "/api/users/login",
            "/api/search",
            "/api/v2/search",
            "/api/activity/{userId}",
            "/api/activity/{userId}/today",
            "/api/activity/{userId}/type/{type}",
            "/api/activity/type/{type}",
            "/api/notifications/{userId}",
            "/api/notifications/{userId}/unread",
            "/api/notifications/{id}/read",
            "/api/votes/tally",
        ] {
            assert!(paths.contains(&path), "missing {path}");
        }
    }

    #[test]
    fn swagger_initializer_points_at_document() {
        let config = SwaggerUiController::new().config;

        let file = utoipa_swagger_ui::serve("swagger-initializer.js", config.clone())
            .unwrap()
            .unwrap();
        let script = String::from_utf8(file.bytes.into_owned()).unwrap();
        assert!(script.contains(OPENAPI_PATH));

        let index = utoipa_swagger_ui::serve("", config.clone()).unwrap().unwrap();
        assert_eq!(index.content_type, "text/html");

        assert!(utoipa_swagger_ui::serve("missing.js", config).unwrap().is_none());
    }
}
