// src/lib.rs
pub mod config;
pub mod domain;
pub mod marketplace;
pub mod money;
pub mod persistence;
pub mod queries;
pub mod scheduler;
pub mod services;
pub mod web;

pub use domain::*;
pub use money::*;
