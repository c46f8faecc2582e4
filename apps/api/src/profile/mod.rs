// Profile aggregate CRUD: one uniform add/update/delete pattern applied to
// all four child collections, layered on whole-document load → mutate → save.

pub mod entity;
pub mod handlers;
pub mod locks;
pub mod service;

pub use entity::ProfileEntity;
pub use service::ProfileService;
