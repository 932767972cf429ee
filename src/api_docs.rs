use crate::api;
use crate::domain::{
    CheckoutLine, CheckoutReceipt, CheckoutRequest, LendingHeader, LendingLine,
    LendingTransaction,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Bearer JWT issued by `POST /api/auth/login-otp`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        api::health::health_check,
        api::auth::register,
        api::auth::login,
        api::auth::login_otp,
        api::lending::show_all,
        api::lending::create_new,
        api::lending::find_by_id,
        api::lending::find_by_name,
        api::lending::download_list,
        api::lending::return_transaction,
    ),
    components(
        schemas(
            CheckoutLine,
            CheckoutRequest,
            CheckoutReceipt,
            LendingHeader,
            LendingLine,
            LendingTransaction,
            api::auth::RegisterRequest,
            api::auth::LoginRequest,
            api::auth::OtpLoginRequest,
            api::lending::FindByNameRequest,
        )
    ),
    tags(
        (name = "asset-lending", description = "Asset lending API")
    )
)]
pub struct ApiDoc;
