pub mod check;
pub mod compose;
pub mod plan;
pub mod probe;
pub mod render;
pub mod validate;
