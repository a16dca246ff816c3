pub mod id;
pub mod quality;
pub mod queue;
pub mod track;
