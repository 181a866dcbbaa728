macro_rules! resource_response {
    ($(#[$meta:meta])* struct $name:ident; $($field:ident: $field_ty:ty),+ ,) => {
        $(#[$meta])*
        #[derive(
            core::fmt::Debug,
            core::clone::Clone,
            core::cmp::PartialEq,
            serde::Serialize,
            serde::Deserialize,
            utoipa::ToSchema,
        )]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            pub id: Uuid,
            pub created_at: DateTime<Utc>,
            pub updated_at: Option<DateTime<Utc>>,
            pub version: u32,
            $(pub $field: $field_ty),+
        }
    };
}

pub mod forum {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;
    use uuid::Uuid;

    use crate::base::resource_id;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct CreateQuestion {
        pub title: String,
        pub body: String,
        #[serde(default)]
        pub tags: Vec<String>,
        pub author_id: String,
    }

    resource_id!(CreateQuestion, "forum::CreateQuestion");

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct UpdateQuestion {
        pub title: String,
        pub body: String,
        #[serde(default)]
        pub tags: Vec<String>,
    }

    resource_id!(UpdateQuestion, "forum::UpdateQuestion");

    /// Optional filters of the question listing.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct QuestionFilter {
        pub author: Option<String>,
        pub tag: Option<String>,
    }

    resource_response! {
        /// A question as exposed by the API.
        struct QuestionResponse;
        title: String,
        body: String,
        tags: Vec<String>,
        author_id: String,
        votes: i32,
    }

    resource_id!(QuestionResponse, "forum::Question");

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct CreateAnswer {
        pub body: String,
        pub author_id: String,
    }

    resource_id!(CreateAnswer, "forum::CreateAnswer");

    fn default_delta() -> i32 {
        1
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
    pub struct VoteAnswer {
        #[serde(default = "default_delta")]
        pub delta: i32,
    }

    impl Default for VoteAnswer {
        fn default() -> Self {
            Self {
                delta: default_delta(),
            }
        }
    }

    resource_response! {
        /// An answer as exposed by the API.
        struct AnswerResponse;
        question_id: Uuid,
        body: String,
        author_id: String,
        votes: i32,
        accepted: bool,
    }

    resource_id!(AnswerResponse, "forum::Answer");

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct VoteTallyResponse {
        pub questions_processed: u32,
        pub total_votes: i64,
    }
}

pub mod iam {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;
    use uuid::Uuid;

    use crate::base::resource_id;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
    pub struct CreateUser {
        pub username: String,
        pub email: String,
        #[serde(skip_serializing)]
        pub password: String,
    }

    resource_id!(CreateUser, "iam::CreateUser");

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
    pub struct UserCredential {
        pub username: String,
        #[serde(skip_serializing)]
        pub password: String,
    }

    resource_id!(UserCredential, "iam::UserCredential");

    resource_response! {
        struct UserResponse;
        username: String,
        email: String,
    }

    resource_id!(UserResponse, "iam::User");
}

pub mod activity {
    use std::collections::BTreeMap;

    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;
    use uuid::Uuid;

    use crate::domain::entity::activity::ActivityType;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct ActivityLogResponse {
        pub id: Uuid,
        pub user_id: Option<String>,
        pub activity_type: ActivityType,
        pub description: String,
        pub resource_id: Option<String>,
        pub ip_address: Option<String>,
        pub metadata: BTreeMap<String, String>,
        pub timestamp: DateTime<Utc>,
    }
}

pub mod notification {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;
    use uuid::Uuid;

    use crate::domain::entity::notification::NotificationKind;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct NotificationResponse {
        pub id: Uuid,
        pub recipient_id: String,
        #[serde(rename = "type")]
        pub kind: NotificationKind,
        pub title: String,
        pub message: String,
        pub question_id: Uuid,
        pub answer_id: Option<Uuid>,
        pub read: bool,
        pub created_at: DateTime<Utc>,
    }
}
