pub mod agent;
pub mod app;
pub mod classifier;
pub mod config;
pub mod message;
pub mod observer;
pub mod orchestrator;
pub mod presentation;
pub mod response;
pub mod runtime;
