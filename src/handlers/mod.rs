pub mod account;
pub mod admin;
pub mod billing;
pub mod feedback;
pub mod orgs;
pub mod public;
pub mod webhooks;
