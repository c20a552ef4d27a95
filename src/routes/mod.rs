pub mod health;
pub mod trip;
pub mod venues;

use actix_web::web;

/// Registers every route. Shared by the server binary and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check)).service(
        web::scope("/api")
            .service(
                web::scope("/venues")
                    .route("", web::get().to(venues::list_venues))
                    .route("/rank", web::post().to(venues::rank_venues)),
            )
            .service(
                web::scope("/trips")
                    .route("", web::post().to(trip::create_trip))
                    .route("/{id}", web::get().to(trip::get_trip))
                    .route("/{id}/votes", web::post().to(trip::submit_vote))
                    .route("/{id}/preferences", web::get().to(trip::get_preferences))
                    .route("/{id}/plans", web::post().to(trip::generate_plans))
                    .route("/{id}/comparison", web::get().to(trip::get_comparison))
                    .route("/{id}/plans/{variant}", web::get().to(trip::get_plan))
                    .route("/{id}/plans/{variant}/select", web::put().to(trip::select_plan))
                    .route(
                        "/{id}/plans/{variant}/narrative",
                        web::get().to(trip::get_narrative),
                    )
                    .route(
                        "/{id}/plans/{variant}/slots/{slot_id}/alternatives",
                        web::get().to(trip::get_alternatives),
                    )
                    .route(
                        "/{id}/plans/{variant}/slots/{slot_id}/swap",
                        web::post().to(trip::swap_slot),
                    )
                    .route(
                        "/{id}/plans/{variant}/slots/{slot_id}/confirm",
                        web::post().to(trip::confirm_slot),
                    )
                    .route(
                        "/{id}/plans/{variant}/slots/{slot_id}/skip",
                        web::post().to(trip::skip_slot),
                    ),
            ),
    );
}
