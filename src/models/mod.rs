// src/models/mod.rs

pub mod answer;
pub mod definition;
pub mod result;
pub mod view;
