//! Traffic Cycle - capture/detect/countdown controller for a traffic camera
//!
//! The controller captures a frame, sends it to a vehicle-detection backend,
//! renders the per-class counts and the derived light timings, then in auto
//! mode counts down the green phase before capturing again.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
