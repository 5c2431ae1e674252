// src/handlers/mod.rs
pub mod sessions;
