use crate::auth::CurrentUser;
use crate::domain::user::driving_ports::{CreateUserError, UserError, UserPort};
use crate::domain::user::{CreateUser, UserPatch};
use crate::external_connections::ExternalConnectivity;
use crate::persistence::db_user_driven_ports::{DbDetectUser, DbReadUsers, DbWriteUsers};
use crate::routing_utils::{
    DomainErrorResponse, GenericErrorResponse, Json, ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::post;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::OpenApi;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(OpenApi)]
#[openapi(paths(create_user, get_current_user, patch_current_user))]
/// Defines the OpenAPI documentation for the user API
pub struct UsersApi;
/// Constant used to group user endpoints in OpenAPI documentation
const USER_API_GROUP: &str = "Users";

/// Builds a router for all the user routes
pub fn user_routes() -> Router<Arc<SharedData>> {
    Router::new().route(
        "/",
        post(
            |State(app_state): AppState, Json(new_user): Json<dto::NewUser>| async move {
                let mut ext_cxn = app_state.ext_cxn.clone();
                let user_service = domain::user::UserService;

                create_user(new_user, &mut ext_cxn, &user_service).await
            },
        )
        .get(
            |State(app_state): AppState, current_user: CurrentUser| async move {
                let mut ext_cxn = app_state.ext_cxn.clone();
                let user_service = domain::user::UserService;

                get_current_user(current_user, &mut ext_cxn, &user_service).await
            },
        )
        .patch(
            |State(app_state): AppState,
             current_user: CurrentUser,
             Json(patch): Json<dto::ColumnPatch>| async move {
                let mut ext_cxn = app_state.ext_cxn.clone();
                let user_service = domain::user::UserService;

                patch_current_user(current_user, patch, &mut ext_cxn, &user_service).await
            },
        ),
    )
}

/// Translates a user lookup or update failure into an API response
fn user_error_response(user_err: UserError) -> ErrorResponse {
    match user_err {
        UserError::DoesNotExist => DomainErrorResponse::NotFound.into(),
        UserError::PortError(err) => GenericErrorResponse(err).into(),
    }
}

#[utoipa::path(
    post,
    path = "/users",
    tag = USER_API_GROUP,
    request_body = dto::NewUser,
    responses(
        (status = 201, description = "User created", body = dto::InsertedUser),
        (status = 400, description = "Invalid user data or login unavailable", body = crate::routing_utils::BasicErrorResponse),
        (status = 500, description = "Unexpected failure", body = crate::routing_utils::BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all)]
/// Signs up a new user.
async fn create_user(
    new_user: dto::NewUser,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl UserPort,
) -> Result<(StatusCode, Json<dto::InsertedUser>), ErrorResponse> {
    info!("Attempt to create user: {new_user}");
    new_user
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let domain_user = CreateUser::from(new_user);
    let user_writer = DbWriteUsers;
    let user_detect = DbDetectUser;

    let creation_result = user_service
        .create_user(&domain_user, &mut *ext_cxn, &user_writer, &user_detect)
        .await;
    match creation_result {
        Ok(created) => Ok((StatusCode::CREATED, Json(dto::InsertedUser::from(created)))),
        Err(CreateUserError::LoginUnavailable) => Err(DomainErrorResponse::LoginUnavailable.into()),
        Err(CreateUserError::InvalidUser(fields)) => {
            warn!("Domain rejected user fields {fields:?}");
            let mut validation_errors = ValidationErrors::new();
            for field in fields {
                validation_errors.add(field, ValidationError::new(field));
            }
            Err(ValidationErrorResponse::from(validation_errors).into())
        }
        Err(CreateUserError::PortError(err)) => Err(GenericErrorResponse(err).into()),
    }
}

#[utoipa::path(
    get,
    path = "/users",
    tag = USER_API_GROUP,
    params(("x-authenticated-user-id" = i32, Header, description = "ID of the authenticated user")),
    responses(
        (status = 200, description = "The current user", body = dto::TodoUser),
        (status = 400, description = "The current user no longer exists", body = crate::routing_utils::BasicErrorResponse),
        (status = 401, description = "No authenticated user", body = crate::routing_utils::BasicErrorResponse),
        (status = 500, description = "Unexpected failure", body = crate::routing_utils::BasicErrorResponse),
    ),
)]
/// Retrieves the user making the request.
async fn get_current_user(
    current_user: CurrentUser,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl UserPort,
) -> Result<Json<dto::TodoUser>, ErrorResponse> {
    info!("Get user {}", current_user.user_id);
    let user_reader = DbReadUsers;

    let user = user_service
        .get_user(current_user.user_id, &mut *ext_cxn, &user_reader)
        .await
        .map_err(user_error_response)?;

    Ok(Json(dto::TodoUser::from(user)))
}

#[utoipa::path(
    patch,
    path = "/users",
    tag = USER_API_GROUP,
    params(("x-authenticated-user-id" = i32, Header, description = "ID of the authenticated user")),
    request_body = dto::ColumnPatch,
    responses(
        (status = 200, description = "User updated"),
        (status = 400, description = "Column not patchable, invalid value or missing user", body = crate::routing_utils::BasicErrorResponse),
        (status = 401, description = "No authenticated user", body = crate::routing_utils::BasicErrorResponse),
        (status = 500, description = "Unexpected failure", body = crate::routing_utils::BasicErrorResponse),
    ),
)]
/// Changes the password or name of the user making the request.
async fn patch_current_user(
    current_user: CurrentUser,
    patch: dto::ColumnPatch,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl UserPort,
) -> Result<StatusCode, ErrorResponse> {
    info!(
        "User {} patching column \"{}\"",
        current_user.user_id, patch.column
    );
    let user_patch =
        UserPatch::new(&patch.column, &patch.value).map_err(DomainErrorResponse::from)?;
    let user_writer = DbWriteUsers;

    user_service
        .patch_user(current_user.user_id, &user_patch, &mut *ext_cxn, &user_writer)
        .await
        .map_err(user_error_response)?;

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_util::{ErrorBody, deserialize_body};
    use crate::domain::user::test_util::MockUserService;
    use crate::external_connections::test_util::FakeExternalConnectivity;
    use anyhow::anyhow;
    use axum::response::IntoResponse;
    use chrono::Utc;
    use speculoos::prelude::*;

    const CURRENT_USER: CurrentUser = CurrentUser { user_id: 4 };

    mod create_user {
        use super::*;

        fn new_user() -> dto::NewUser {
            dto::NewUser {
                login: "john_doe".to_owned(),
                password: "password123".to_owned(),
                name: "John Doe".to_owned(),
            }
        }

        #[tokio::test]
        async fn happy_path() {
            let mut user_service_raw = MockUserService::new();
            let mut ext_cxn = FakeExternalConnectivity::new();
            let date_create = Utc::now();
            user_service_raw
                .create_user_result
                .set_returned_result(Ok(domain::user::CreatedUser { id: 3, date_create }));
            let user_service = std::sync::Mutex::new(user_service_raw);

            let create_response = create_user(new_user(), &mut ext_cxn, &user_service)
                .await
                .into_response();
            assert_eq!(StatusCode::CREATED, create_response.status());

            let body: dto::InsertedUser = deserialize_body(create_response.into_body()).await;
            assert_eq!(3, body.id);
            assert_eq!(date_create, body.date_create);

            let locked_service = user_service.lock().expect("user service mutex poisoned");
            assert!(matches!(
                locked_service.create_user_result.calls(),
                [CreateUser { login, .. }] if login == "john_doe"
            ));
        }

        #[tokio::test]
        async fn invalid_input_never_reaches_service() {
            let user_service = MockUserService::new_locked();
            let mut ext_cxn = FakeExternalConnectivity::new();
            let bad_user = dto::NewUser {
                login: "ab".to_owned(),
                ..new_user()
            };

            let create_response = create_user(bad_user, &mut ext_cxn, &user_service)
                .await
                .into_response();
            assert_eq!(StatusCode::BAD_REQUEST, create_response.status());

            let body: ErrorBody = deserialize_body(create_response.into_body()).await;
            assert_eq!("invalid_input", body.error_code);

            let locked_service = user_service.lock().expect("user service mutex poisoned");
            assert!(locked_service.create_user_result.calls().is_empty());
        }

        #[tokio::test]
        async fn login_unavailable_is_a_400() {
            let mut user_service_raw = MockUserService::new();
            let mut ext_cxn = FakeExternalConnectivity::new();
            user_service_raw
                .create_user_result
                .set_returned_result(Err(CreateUserError::LoginUnavailable));
            let user_service = std::sync::Mutex::new(user_service_raw);

            let create_response = create_user(new_user(), &mut ext_cxn, &user_service)
                .await
                .into_response();
            assert_eq!(StatusCode::BAD_REQUEST, create_response.status());

            let body: ErrorBody = deserialize_body(create_response.into_body()).await;
            assert_eq!("login_unavailable", body.error_code);
        }

        #[tokio::test]
        async fn port_failure_is_a_500() {
            let mut user_service_raw = MockUserService::new();
            let mut ext_cxn = FakeExternalConnectivity::new();
            user_service_raw
                .create_user_result
                .set_returned_result(Err(CreateUserError::PortError(anyhow!("db is down"))));
            let user_service = std::sync::Mutex::new(user_service_raw);

            let create_response = create_user(new_user(), &mut ext_cxn, &user_service)
                .await
                .into_response();
            assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, create_response.status());

            let body: ErrorBody = deserialize_body(create_response.into_body()).await;
            assert_eq!("internal_error", body.error_code);
        }
    }

    mod get_current_user {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let mut user_service_raw = MockUserService::new();
            let mut ext_cxn = FakeExternalConnectivity::new();
            let date_create = Utc::now();
            user_service_raw
                .get_user_result
                .set_returned_result(Ok(domain::user::TodoUser {
                    id: 4,
                    login: "john_doe".to_owned(),
                    password: "password123".to_owned(),
                    name: "John Doe".to_owned(),
                    date_create,
                }));
            let user_service = std::sync::Mutex::new(user_service_raw);

            let user_response = get_current_user(CURRENT_USER, &mut ext_cxn, &user_service)
                .await
                .into_response();
            assert_eq!(StatusCode::OK, user_response.status());

            let body: serde_json::Value = deserialize_body(user_response.into_body()).await;
            assert_eq!(4, body["id"]);
            assert_eq!("john_doe", body["login"]);
            assert!(body.get("password").is_none());

            let locked_service = user_service.lock().expect("user service mutex poisoned");
            assert_eq!(&[4], locked_service.get_user_result.calls());
        }

        #[tokio::test]
        async fn missing_user_is_a_400() {
            let mut user_service_raw = MockUserService::new();
            let mut ext_cxn = FakeExternalConnectivity::new();
            user_service_raw
                .get_user_result
                .set_returned_result(Err(UserError::DoesNotExist));
            let user_service = std::sync::Mutex::new(user_service_raw);

            let user_response = get_current_user(CURRENT_USER, &mut ext_cxn, &user_service)
                .await
                .into_response();
            assert_eq!(StatusCode::BAD_REQUEST, user_response.status());

            let body: ErrorBody = deserialize_body(user_response.into_body()).await;
            assert_eq!("not_found", body.error_code);
        }
    }

    mod patch_current_user {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let mut user_service_raw = MockUserService::new();
            let mut ext_cxn = FakeExternalConnectivity::new();
            user_service_raw.patch_user_result.set_returned_result(Ok(()));
            let user_service = std::sync::Mutex::new(user_service_raw);

            let patch_response = patch_current_user(
                CURRENT_USER,
                dto::ColumnPatch {
                    column: "password".to_owned(),
                    value: "password123".to_owned(),
                },
                &mut ext_cxn,
                &user_service,
            )
            .await;
            assert_that!(patch_response).is_ok_containing(StatusCode::OK);

            let locked_service = user_service.lock().expect("user service mutex poisoned");
            assert!(matches!(
                locked_service.patch_user_result.calls(),
                [(4, UserPatch::Password(password))] if password == "password123"
            ));
        }

        #[tokio::test]
        async fn unknown_column_never_reaches_service() {
            let user_service = MockUserService::new_locked();
            let mut ext_cxn = FakeExternalConnectivity::new();

            let patch_response = patch_current_user(
                CURRENT_USER,
                dto::ColumnPatch {
                    column: "column".to_owned(),
                    value: "value".to_owned(),
                },
                &mut ext_cxn,
                &user_service,
            )
            .await
            .into_response();
            assert_eq!(StatusCode::BAD_REQUEST, patch_response.status());

            let body: ErrorBody = deserialize_body(patch_response.into_body()).await;
            assert_eq!("invalid_patch", body.error_code);

            let locked_service = user_service.lock().expect("user service mutex poisoned");
            assert!(locked_service.patch_user_result.calls().is_empty());
            assert_eq!(0, ext_cxn.connection_requests);
        }

        #[tokio::test]
        async fn invalid_value_never_reaches_service() {
            let user_service = MockUserService::new_locked();
            let mut ext_cxn = FakeExternalConnectivity::new();

            let patch_response = patch_current_user(
                CURRENT_USER,
                dto::ColumnPatch {
                    column: "name".to_owned(),
                    value: "a".repeat(31),
                },
                &mut ext_cxn,
                &user_service,
            )
            .await
            .into_response();
            assert_eq!(StatusCode::BAD_REQUEST, patch_response.status());

            let locked_service = user_service.lock().expect("user service mutex poisoned");
            assert!(locked_service.patch_user_result.calls().is_empty());
        }
    }
}
