pub mod audit;
pub mod auth;
pub mod crm_service;
pub mod inventory_service;
pub mod order_service;
pub mod tenancy_service;
pub mod user_service;
