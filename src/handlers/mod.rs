//! HTTP handlers

pub mod health;
pub mod service;
pub mod model;
pub mod predict;
pub mod clients;
