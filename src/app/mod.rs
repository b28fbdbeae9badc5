pub mod catalog_service;
pub mod writes;

pub use catalog_service::CatalogService;
