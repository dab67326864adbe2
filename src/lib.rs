pub mod allocation;
pub mod api;
pub mod calibration;
pub mod config;
pub mod consts;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod mapping;
pub mod overrides;
pub mod scorer;
pub mod validation;
// cmd and reports are binary modules (see main.rs).
