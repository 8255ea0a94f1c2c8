pub mod context;
pub mod grouping;
pub mod models;
