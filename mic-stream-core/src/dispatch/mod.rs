pub mod dispatcher;
pub mod executor;
