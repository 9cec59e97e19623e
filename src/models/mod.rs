pub mod dataset;
pub mod holiday;
pub mod organization;
pub mod project;
pub mod representative;
pub mod request;
pub mod task;
pub mod user;
