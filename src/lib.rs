pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod selection;
pub mod state;
pub mod synth;
pub mod views;
