pub mod builder;
pub mod normalize;
pub mod resolver;
pub mod retry;
