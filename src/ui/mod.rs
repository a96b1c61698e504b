pub mod input;
pub mod measure;
pub mod renderer;
