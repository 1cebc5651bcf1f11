//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod system_prompt_repo;

pub use system_prompt_repo::SystemPromptRepo;
