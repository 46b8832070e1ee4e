pub mod service_routes;
pub mod vendor_routes;
