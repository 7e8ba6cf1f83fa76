use crate::auth::AUTHENTICATED_USER_HEADER;
use crate::dto;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};
use utoipa_swagger_ui::SwaggerUi;

/// Name of the security scheme describing the gateway-provided user header
const CURRENT_USER_SCHEME: &str = "current_user";

#[derive(OpenApi)]
#[openapi(info(
    title = "Todo REST API",
    description = "Multi-user to-do lists. Requests act on behalf of the user the gateway names in the x-authenticated-user-id header."
))]
struct TodoApi;

/// Registers the current-user header as an API key scheme so the swagger UI can send it
struct CurrentUserHeader;

impl Modify for CurrentUserHeader {
    fn modify(&self, api_docs: &mut openapi::OpenApi) {
        api_docs
            .components
            .get_or_insert_with(Default::default)
            .add_security_scheme(
                CURRENT_USER_SCHEME,
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(
                    AUTHENTICATED_USER_HEADER,
                ))),
            );
    }
}

/// Assembles the OpenAPI document from the [dto] schemas and the user and to-do endpoints
pub fn api_document() -> openapi::OpenApi {
    let mut api_docs = TodoApi::openapi();
    api_docs.merge(dto::OpenApiSchemas::openapi());
    api_docs.merge(super::user::UsersApi::openapi());
    api_docs.merge(super::todo::TaskApi::openapi());
    CurrentUserHeader.modify(&mut api_docs);

    api_docs
}

/// Serves the swagger UI at /swagger-ui and the raw document at /api-docs/openapi.json
pub fn build_documentation() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_document())
}
