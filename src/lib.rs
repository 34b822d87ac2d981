//! StyleSense: authenticated outfit recommendations backed by a text model.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod recommendations;
pub mod state;
pub mod stylist;
