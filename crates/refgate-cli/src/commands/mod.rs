pub mod audit;
pub mod dispatch;
pub mod migrate;
pub mod reference;
pub mod schema;
