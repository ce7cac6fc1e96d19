pub mod answer;
pub mod config;
pub mod counter;
pub mod custom;
pub mod practice;
pub mod tasks;
