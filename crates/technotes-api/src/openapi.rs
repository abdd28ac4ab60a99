// OpenAPI spec generation

use utoipa::OpenApi;

use crate::api::common::{ListResponse, MessageResponse};
use crate::error::ErrorResponse;
use crate::{api, auth};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::routes::login,
        auth::routes::refresh,
        auth::routes::logout,
        api::users::list_users,
        api::users::create_user,
        api::users::update_user,
        api::users::delete_user,
        api::notes::list_notes,
        api::notes::create_note,
        api::notes::update_note,
        api::notes::delete_note,
    ),
    components(
        schemas(
            auth::routes::LoginRequest,
            auth::routes::AccessTokenResponse,
            api::users::User,
            api::users::CreateUserRequest,
            api::users::UpdateUserRequest,
            api::users::DeleteUserRequest,
            api::notes::Note,
            api::notes::CreateNoteRequest,
            api::notes::UpdateNoteRequest,
            api::notes::DeleteNoteRequest,
            ListResponse<api::users::User>,
            ListResponse<api::notes::Note>,
            MessageResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "auth", description = "Login, token refresh, and logout"),
        (name = "users", description = "User management endpoints"),
        (name = "notes", description = "Note management endpoints")
    ),
    info(
        title = "Technotes API",
        version = "0.1.0",
        description = "REST API for managing users and repair notes with JWT authentication",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;
