pub mod auth;
pub mod crm;
pub mod inventory;
pub mod orders;
pub mod tenancy;
pub mod users;
