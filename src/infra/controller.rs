use async_trait::async_trait;
use salvo::{
    http::{ParseError, StatusCode},
    writer::Json,
    Depot, FlowCtrl, Handler, Request, Response,
};
use uuid::Uuid;

use crate::{
    app::{
        resource::{
            forum::{CreateAnswer, CreateQuestion, QuestionFilter, UpdateQuestion, VoteAnswer},
            iam::{CreateUser, UserCredential},
        },
        use_case, Context,
    },
    error::http::BadRequest,
};

macro_rules! map_res_err {
    ($result:ident, $response:ident) => {
        match $result {
            Err(err) => {
                $response.render(err);
                return;
            }
            Ok(ok) => ok,
        }
    };
}

macro_rules! controller {
    ($($name:ident),+ $(,)?) => {
        $(
            pub struct $name {
                ctx: Context,
            }

            impl $name {
                pub fn new(ctx: Context) -> Self {
                    Self { ctx }
                }
            }
        )+
    };
}

controller!(
    CreateQuestionController,
    ListQuestionsController,
    FindQuestionController,
    UpdateQuestionController,
    DeleteQuestionController,
    AnswerIdsController,
    CreateAnswerController,
    ListAnswersController,
    VoteAnswerController,
    AcceptAnswerController,
    RegisterUserController,
    ListUsersController,
    LoginController,
    SearchController,
    SearchV2Controller,
    UserActivityController,
    UserActivityTodayController,
    UserActivityByTypeController,
    ActivityByTypeController,
    NotificationsController,
    UnreadNotificationsController,
    MarkReadController,
    VoteTallyController,
);

/// Extract a uuid from a request path param.
fn extract_id(req: &Request, param: &str) -> Result<Uuid, BadRequest> {
    req.params()
        .get(param)
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| BadRequest::InvalidParam(param.to_string()))
}

fn extract_param(req: &Request, param: &str) -> Result<String, BadRequest> {
    req.params()
        .get(param)
        .cloned()
        .ok_or_else(|| BadRequest::InvalidParam(param.to_string()))
}

/// Client address as seen by the proxy chain.
///
/// First entry of `X-Forwarded-For`, then `X-Real-IP`, otherwise `unknown`.
fn client_ip(req: &Request) -> String {
    let forwarded: Option<&str> = req.header("x-forwarded-for");
    if let Some(first) = forwarded
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return first.to_string();
    }

    let real_ip: Option<&str> = req.header("x-real-ip");
    real_ip
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

fn user_id_header(req: &Request) -> Option<String> {
    let user_id: Option<&str> = req.header("x-user-id");
    user_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
}

#[async_trait]
impl Handler for CreateQuestionController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result: Result<CreateQuestion, _> = req.parse_body().await.map_err(BadRequest::from);
        let dto = map_res_err!(result, res);

        let result = use_case::question::create_question(&self.ctx, dto).await;
        let question = map_res_err!(result, res);

        res.render(Json(question));
        res.set_status_code(StatusCode::CREATED);
    }
}

#[async_trait]
impl Handler for ListQuestionsController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let filter = QuestionFilter {
            author: req.query::<String>("author"),
            tag: req.query::<String>("tag"),
        };

        let result = use_case::question::list_questions(&self.ctx, filter).await;
        let questions = map_res_err!(result, res);

        res.render(Json(questions));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for FindQuestionController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_id(req, "id");
        let id = map_res_err!(result, res);

        let result = use_case::question::find_question(&self.ctx, id).await;
        let question = map_res_err!(result, res);

        res.render(Json(question));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for UpdateQuestionController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result: Result<UpdateQuestion, _> = req.parse_body().await.map_err(BadRequest::from);
        let dto = map_res_err!(result, res);

        let result = extract_id(req, "id");
        let id = map_res_err!(result, res);

        let result = use_case::question::update_question(&self.ctx, id, dto).await;
        let question = map_res_err!(result, res);

        res.render(Json(question));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for DeleteQuestionController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_id(req, "id");
        let id = map_res_err!(result, res);

        let result = use_case::question::delete_question(&self.ctx, id).await;
        map_res_err!(result, res);

        res.set_status_code(StatusCode::NO_CONTENT);
    }
}

#[async_trait]
impl Handler for AnswerIdsController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_id(req, "id");
        let id = map_res_err!(result, res);

        let result = use_case::question::find_answer_ids(&self.ctx, id).await;
        let ids = map_res_err!(result, res);

        res.render(Json(ids));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for CreateAnswerController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result: Result<CreateAnswer, _> = req.parse_body().await.map_err(BadRequest::from);
        let dto = map_res_err!(result, res);

        let result = extract_id(req, "id");
        let question_id = map_res_err!(result, res);

        let result = use_case::answer::create_answer(&self.ctx, question_id, dto).await;
        let answer = map_res_err!(result, res);

        res.render(Json(answer));
        res.set_status_code(StatusCode::CREATED);
    }
}

#[async_trait]
impl Handler for ListAnswersController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_id(req, "id");
        let question_id = map_res_err!(result, res);

        let result = use_case::answer::list_answers(&self.ctx, question_id).await;
        let answers = map_res_err!(result, res);

        res.render(Json(answers));
        res.set_status_code(StatusCode::OK);
    }
}

/// Vote body, an absent or blank body votes up.
async fn vote_body(req: &mut Request) -> Result<VoteAnswer, BadRequest> {
    match req.payload().await {
        Err(ParseError::EmptyBody) => Ok(VoteAnswer::default()),
        Err(err) => Err(err.into()),
        Ok(body) if body.iter().all(u8::is_ascii_whitespace) => Ok(VoteAnswer::default()),
        Ok(body) => serde_json::from_slice(body).map_err(|err| ParseError::SerdeJson(err).into()),
    }
}

#[async_trait]
impl Handler for VoteAnswerController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = vote_body(req).await;
        let dto = map_res_err!(result, res);

        let result = extract_id(req, "id");
        let id = map_res_err!(result, res);

        let result = use_case::answer::vote_answer(&self.ctx, id, dto).await;
        let answer = map_res_err!(result, res);

        res.render(Json(answer));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for AcceptAnswerController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_id(req, "id");
        let id = map_res_err!(result, res);

        let result = use_case::answer::accept_answer(&self.ctx, id).await;
        let answer = map_res_err!(result, res);

        res.render(Json(answer));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for RegisterUserController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result: Result<CreateUser, _> = req.parse_body().await.map_err(BadRequest::from);
        let dto = map_res_err!(result, res);
        let ip = client_ip(req);

        let result = use_case::user::register_user(&self.ctx, dto, &ip).await;
        let user = map_res_err!(result, res);

        res.render(Json(user));
        res.set_status_code(StatusCode::CREATED);
    }
}

#[async_trait]
impl Handler for ListUsersController {
    async fn handle(&self, _: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = use_case::user::list_users(&self.ctx).await;
        let users = map_res_err!(result, res);

        res.render(Json(users));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for LoginController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result: Result<UserCredential, _> = req.parse_body().await.map_err(BadRequest::from);
        let credential = map_res_err!(result, res);
        let ip = client_ip(req);

        let result = use_case::user::login(&self.ctx, credential, &ip).await;
        let user = map_res_err!(result, res);

        res.render(Json(user));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for SearchController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = req
            .query::<String>("q")
            .ok_or_else(|| BadRequest::MissingQuery("q".into()));
        let phrase = map_res_err!(result, res);
        let user_id = user_id_header(req);

        let result = use_case::search::tracked_search(&self.ctx, &phrase, user_id).await;
        let questions = map_res_err!(result, res);

        res.render(Json(questions));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for SearchV2Controller {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let phrase = req.query::<String>("q").unwrap_or_default();

        let result = use_case::search::search_questions(&self.ctx, &phrase).await;
        let questions = map_res_err!(result, res);

        res.render(Json(questions));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for UserActivityController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_param(req, "user_id");
        let user_id = map_res_err!(result, res);

        let result = use_case::activity::user_activity(&self.ctx, &user_id).await;
        let entries = map_res_err!(result, res);

        res.render(Json(entries));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for UserActivityTodayController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_param(req, "user_id");
        let user_id = map_res_err!(result, res);

        let result = use_case::activity::user_activity_today(&self.ctx, &user_id).await;
        let entries = map_res_err!(result, res);

        res.render(Json(entries));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for UserActivityByTypeController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_param(req, "user_id");
        let user_id = map_res_err!(result, res);
        let result = extract_param(req, "activity_type");
        let activity_type = map_res_err!(result, res);

        let result =
            use_case::activity::user_activity_by_type(&self.ctx, &user_id, &activity_type).await;
        let entries = map_res_err!(result, res);

        res.render(Json(entries));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for ActivityByTypeController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_param(req, "activity_type");
        let activity_type = map_res_err!(result, res);

        let result = use_case::activity::activity_by_type(&self.ctx, &activity_type).await;
        let entries = map_res_err!(result, res);

        res.render(Json(entries));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for NotificationsController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_param(req, "user_id");
        let user_id = map_res_err!(result, res);

        let result = use_case::notification::notifications(&self.ctx, &user_id).await;
        let notifications = map_res_err!(result, res);

        res.render(Json(notifications));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for UnreadNotificationsController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_param(req, "user_id");
        let user_id = map_res_err!(result, res);

        let result = use_case::notification::unread_notifications(&self.ctx, &user_id).await;
        let notifications = map_res_err!(result, res);

        res.render(Json(notifications));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for MarkReadController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_id(req, "id");
        let id = map_res_err!(result, res);

        let result = use_case::notification::mark_read(&self.ctx, id).await;
        let notification = map_res_err!(result, res);

        res.render(Json(notification));
        res.set_status_code(StatusCode::OK);
    }
}

#[async_trait]
impl Handler for VoteTallyController {
    async fn handle(&self, _: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = use_case::tally::tally_votes(&self.ctx).await;
        let tally = map_res_err!(result, res);

        res.render(Json(tally));
        res.set_status_code(StatusCode::OK);
    }
}
