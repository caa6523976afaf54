//! RecruitMind Interview Server - websocket backend for live interviews
//!
//! This crate drives candidate interview sessions end to end: invitation
//! validation, the staged conversation with the agent service, and durable
//! persistence of stage results.

pub mod agent;
pub mod api;
pub mod config;
pub mod db;
pub mod orchestrator;
pub mod session;
pub mod state;
pub mod store;
pub mod transcript;
