pub mod bootstrap;
pub mod broker;
pub mod controller;
pub mod database;
pub mod memory;
pub mod openapi;
pub mod service;

pub mod router {
    use salvo::{logging::Logger, routing::PathFilter, Router};

    use super::{
        controller::*,
        openapi::{OpenApiController, SwaggerUiController},
    };
    use crate::app::Context;

    pub fn app(ctx: Context) -> Router {
        PathFilter::register_wisp_regex(
            "uuid",
            regex::Regex::new(
                "(?i)^[0-9A-F]{8}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{12}$",
            )
            .expect("Expect a valid uuid regex"),
        );

        Router::new()
            .push(
                Router::with_path("api")
                    .push(
                        Router::with_path("questions")
                            .post(CreateQuestionController::new(ctx.clone()))
                            .get(ListQuestionsController::new(ctx.clone()))
                            .push(
                                Router::with_path("<id:uuid>")
                                    .get(FindQuestionController::new(ctx.clone()))
                                    .put(UpdateQuestionController::new(ctx.clone()))
                                    .delete(DeleteQuestionController::new(ctx.clone()))
                                    .push(
                                        Router::with_path("answer-ids")
                                            .get(AnswerIdsController::new(ctx.clone())),
                                    )
                                    .push(
                                        Router::with_path("answers")
                                            .post(CreateAnswerController::new(ctx.clone()))
                                            .get(ListAnswersController::new(ctx.clone())),
                                    ),
                            ),
                    )
                    .push(
                        Router::with_path("answers/<id:uuid>")
                            .push(
                                Router::with_path("vote")
                                    .put(VoteAnswerController::new(ctx.clone())),
                            )
                            .push(
                                Router::with_path("accept")
                                    .put(AcceptAnswerController::new(ctx.clone())),
                            ),
                    )
                    .push(
                        Router::with_path("users")
                            .post(RegisterUserController::new(ctx.clone()))
                            .get(ListUsersController::new(ctx.clone()))
                            .push(
                                Router::with_path("login").post(LoginController::new(ctx.clone())),
                            ),
                    )
                    .push(Router::with_path("search").get(SearchController::new(ctx.clone())))
                    .push(
                        Router::with_path("v2/search").get(SearchV2Controller::new(ctx.clone())),
                    )
                    .push(
                        Router::with_path("activity")
                            // before <user_id>, "type" is not a user
                            .push(
                                Router::with_path("type/<activity_type>")
                                    .get(ActivityByTypeController::new(ctx.clone())),
                            )
                            .push(
                                Router::with_path("<user_id>")
                                    .get(UserActivityController::new(ctx.clone()))
                                    .push(
                                        Router::with_path("today")
                                            .get(UserActivityTodayController::new(ctx.clone())),
                                    )
                                    .push(
                                        Router::with_path("type/<activity_type>")
                                            .get(UserActivityByTypeController::new(ctx.clone())),
                                    ),
                            ),
                    )
                    .push(
                        Router::with_path("notifications")
                            .push(
                                Router::with_path("<id:uuid>/read")
                                    .put(MarkReadController::new(ctx.clone())),
                            )
                            .push(
                                Router::with_path("<user_id>")
                                    .get(NotificationsController::new(ctx.clone()))
                                    .push(
                                        Router::with_path("unread")
                                            .get(UnreadNotificationsController::new(ctx.clone())),
                                    ),
                            ),
                    )
                    .push(Router::with_path("votes/tally").get(VoteTallyController::new(ctx))),
            )
            .push(Router::with_path("api-docs/openapi.json").get(OpenApiController::new()))
            .push(Router::with_path("swagger-ui/<**path>").get(SwaggerUiController::new()))
            .hoop(Logger)
    }
}
