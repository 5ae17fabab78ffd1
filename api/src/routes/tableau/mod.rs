pub mod tableau_request;
pub mod tableau_response;
pub mod tableau_routes;
