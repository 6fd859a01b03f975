use rocket::Route;

mod audit;
mod biometric;
mod eligibility;
mod receipts;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(voting::routes());
    routes.extend(biometric::routes());
    routes.extend(eligibility::routes());
    routes.extend(audit::routes());
    routes.extend(receipts::routes());
    routes
}
