pub mod availability_service;
pub mod email_service;
pub mod jwt_service;
