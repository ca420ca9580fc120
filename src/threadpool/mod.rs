pub mod queue;
#[allow(clippy::module_inception)]
pub mod threadpool;
