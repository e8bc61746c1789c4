pub mod aggregate;
pub mod model;
pub mod render;
pub mod reporter;
