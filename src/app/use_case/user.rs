use super::require_text;
use crate::{
    app::{
        resource::iam::{CreateUser, UserCredential, UserResponse},
        Context,
    },
    domain::{
        entity::{
            activity::{ActivityLog, ActivityType},
            iam::User,
            Entity,
        },
        service::PasswordHashError,
    },
    error::{
        app::ApplicationError,
        persistence::PersistenceError,
        resource::{ValidationError, ValidationErrorKind, ValidationFieldError},
        security::AuthenticationError,
    },
};

pub const PASSWORD_MIN_LENGTH: usize = 8;

const UNIQUE_VIOLATION: &str = "23505";

mod validation {
    use super::*;

    pub async fn create_user(
        ctx: &Context,
        dto: &CreateUser,
    ) -> Result<(), ApplicationError<CreateUser>> {
        let mut errors = Vec::new();

        require_text(&mut errors, "iam::username", "/username", &dto.username);

        if !dto.email.contains('@') {
            errors.push(ValidationFieldError::new(
                "base::email",
                dto.email.clone(),
                "/email".into(),
                vec![ValidationErrorKind::Pattern("@".into())],
            ));
        }

        if dto.password.chars().count() < PASSWORD_MIN_LENGTH {
            errors.push(ValidationFieldError::new(
                "base::password",
                String::new(),
                "/password".into(),
                vec![ValidationErrorKind::MinLength(PASSWORD_MIN_LENGTH as u64)],
            ));
        }

        if ctx.users.find_user_by_username(&dto.username).await?.is_some() {
            errors.push(username_taken(&dto.username));
        }

        if !errors.is_empty() {
            return Err(ValidationError::from_resource(dto.clone(), errors).into());
        }

        Ok(())
    }

    pub fn username_taken(username: &str) -> ValidationFieldError {
        ValidationFieldError::new(
            "iam::username",
            username.into(),
            "/username".into(),
            vec![ValidationErrorKind::AlreadyExists],
        )
    }
}

/// Hash `password` on the blocking pool, Argon2 would stall the async workers.
async fn hash_password(ctx: &Context, password: &str) -> Result<String, PasswordHashError> {
    let hash_service = ctx.hash_service.clone();
    let password = password.to_string();

    tokio::task::spawn_blocking(move || hash_service.hash_password(&password))
        .await
        .unwrap_or_else(|err| {
            tracing::error!("password hashing task failed: {err}");
            Err(PasswordHashError::Hash)
        })
}

async fn verify_password(ctx: &Context, password: &str, hash: &str) -> Result<(), PasswordHashError> {
    let hash_service = ctx.hash_service.clone();
    let (password, hash) = (password.to_string(), hash.to_string());

    tokio::task::spawn_blocking(move || hash_service.verify_password(&password, &hash))
        .await
        .unwrap_or_else(|err| {
            tracing::error!("password verification task failed: {err}");
            Err(PasswordHashError::Hash)
        })
}

pub async fn register_user(
    ctx: &Context,
    dto: CreateUser,
    ip: &str,
) -> Result<UserResponse, ApplicationError<CreateUser>> {
    validation::create_user(ctx, &dto).await?;

    let password_hash = hash_password(ctx, &dto.password).await.map_err(|_| {
        ValidationError::from_resource(
            dto.clone(),
            vec![ValidationFieldError::new(
                "base::password",
                String::new(),
                "/password".into(),
                vec![ValidationErrorKind::Invalid],
            )],
        )
    })?;
    let user = User::new(dto.email.clone(), dto.username.clone(), password_hash);

    match ctx.users.insert_user(&user).await {
        // lost a registration race on the same username
        Err(PersistenceError::Database(Some(code))) if code == UNIQUE_VIOLATION => {
            let field = validation::username_taken(&dto.username);
            return Err(ValidationError::from_resource(dto, vec![field]).into());
        }
        result => result?,
    }

    tracing::info!(user_id = %user.ident(), username = %user.username(), "user registered");

    ctx.activity.record(
        ActivityLog::new(
            Some(user.ident().to_string()),
            ActivityType::UserRegistered,
            format!("User registered: {}", user.username()),
        )
        .with_resource(user.ident())
        .with_ip(ip)
        .with_metadata([
            ("username", user.username().clone()),
            ("email", user.email().clone()),
        ]),
    );

    Ok(user.into())
}

pub async fn login(
    ctx: &Context,
    credential: UserCredential,
    ip: &str,
) -> Result<UserResponse, ApplicationError<UserCredential>> {
    let user = match ctx.users.find_user_by_username(&credential.username).await? {
        Some(user) => user,
        None => {
            tracing::warn!(username = %credential.username, "login failed, unknown user");
            ctx.activity.record(
                ActivityLog::new(
                    None,
                    ActivityType::UserLoginFailed,
                    "Login failed: user not found",
                )
                .with_ip(ip)
                .with_metadata([("username", credential.username.clone())]),
            );
            return Err(AuthenticationError::InvalidCredential.into());
        }
    };

    if let Err(err) = verify_password(ctx, &credential.password, user.password_hash()).await {
        tracing::warn!(user_id = %user.ident(), "login failed, {err}");
        ctx.activity.record(
            ActivityLog::new(
                Some(user.ident().to_string()),
                ActivityType::UserLoginFailed,
                "Login failed: invalid password",
            )
            .with_ip(ip)
            .with_metadata([("username", credential.username.clone())]),
        );
        return Err(AuthenticationError::from(err).into());
    }

    tracing::info!(user_id = %user.ident(), "login successful");

    ctx.activity.record(
        ActivityLog::new(
            Some(user.ident().to_string()),
            ActivityType::UserLoginSuccess,
            "Login successful",
        )
        .with_ip(ip)
        .with_metadata([("username", credential.username.clone())]),
    );

    Ok(user.into())
}

pub async fn list_users(ctx: &Context) -> Result<Vec<UserResponse>, ApplicationError<()>> {
    let users = ctx.users.find_users().await?;
    Ok(users.into_iter().map(UserResponse::from).collect())
}
