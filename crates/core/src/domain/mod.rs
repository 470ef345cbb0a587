pub mod histogram;
pub mod position;
pub mod request;
pub mod summary;
pub mod validation;
pub mod weights;
