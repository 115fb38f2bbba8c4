//! Library crate for til-shuffle: the conflict-free sync core of a TIL guessing
//! game plus the HTTP session host around it.

pub mod config;
pub mod dao;
mod dto;
mod error;
pub mod routes;
pub mod services;
pub mod state;
