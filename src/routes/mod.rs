pub mod api;

use rocket::routes;

pub fn get_routes() -> Vec<rocket::Route> {
    routes![api::health_check, api::generate_report]
}
