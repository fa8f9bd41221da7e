pub mod inference_proxy;
pub mod lifecycle_manager;
