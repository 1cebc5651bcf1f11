//! Domain logic for turning generated scene scripts into video artifacts.
//!
//! Nothing in this crate touches the database; persistence lives in
//! `animforge-db` and request handling in `animforge-pipeline`.

pub mod config;
pub mod error;
pub mod fallback;
pub mod ffmpeg;
pub mod render;
pub mod script;
pub mod scripting;
pub mod types;
