mod food_service;
mod order_service;
mod review_service;
mod token_service;

pub use food_service::*;
pub use order_service::*;
pub use review_service::*;
pub use token_service::*;
