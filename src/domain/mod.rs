pub mod backend;
pub mod backend_factory;
pub mod backends;
pub mod extract;
pub mod indexer;
pub mod instance;
pub mod metric;
pub mod models;
pub mod pmed;
pub mod problem;
pub mod solution;
pub mod solve;
pub mod validate;
pub mod variant;
