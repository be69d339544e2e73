use crate::presentation::auth::{log_out, me, sign_in, sign_up};
use crate::presentation::handlers::{
    add_expense, add_income, delete_expense, delete_income, get_expenses, get_incomes,
    health_check, json_config, update_expense, update_income,
};
use crate::presentation::users::{add_user, delete_user, get_users, update_user};
use actix_web::web;

pub const ROUTES: &str = "\
POST /api, POST /api/sign-up, POST /api/sign-in, POST /api/log-out, GET /api/me, \
GET /api/health, GET /api/users, POST /api/add-user, DELETE /api/delete-user/{userId}, \
PATCH /api/update-user/{userId}, POST /api/add-expense/{userId}, GET /api/get-expenses/{userId}, \
DELETE /api/delete-expense/{userId}/{expenseId}, PATCH /api/update-expense/{userId}/{expenseId}, \
POST /api/add-income/{userId}, GET /api/get-incomes/{userId}, \
DELETE /api/delete-income/{userId}/{incomeId}, PATCH /api/update-income/{userId}/{incomeId}";

/// Registers the whole `/api` surface. `AppState` must be added by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/api")
            // auth
            .route("", web::post().to(sign_up))
            .route("/sign-up", web::post().to(sign_up))
            .route("/sign-in", web::post().to(sign_in))
            .route("/log-out", web::post().to(log_out))
            .route("/me", web::get().to(me))
            .route("/health", web::get().to(health_check))
            // user administration
            .route("/users", web::get().to(get_users))
            .route("/add-user", web::post().to(add_user))
            .route("/delete-user/{userId}", web::delete().to(delete_user))
            .route("/update-user/{userId}", web::patch().to(update_user))
            // expenses
            .route("/add-expense/{userId}", web::post().to(add_expense))
            .route("/get-expenses/{userId}", web::get().to(get_expenses))
            .route(
                "/delete-expense/{userId}/{expenseId}",
                web::delete().to(delete_expense),
            )
            .route(
                "/update-expense/{userId}/{expenseId}",
                web::patch().to(update_expense),
            )
            // incomes
            .route("/add-income/{userId}", web::post().to(add_income))
            .route("/get-incomes/{userId}", web::get().to(get_incomes))
            .route(
                "/delete-income/{userId}/{incomeId}",
                web::delete().to(delete_income),
            )
            .route(
                "/update-income/{userId}/{incomeId}",
                web::patch().to(update_income),
            ),
    );
}
