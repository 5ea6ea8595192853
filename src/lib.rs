//! Thin client for an AI code-analysis backend: a local dashboard, a CLI,
//! and the editor panel page.
pub mod actions;
pub mod activity;
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod health;
pub mod history;
pub mod store;
pub mod ui;
pub mod web;
pub mod webview;
