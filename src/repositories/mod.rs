pub mod catalog_repository;
pub mod docker_repository;
