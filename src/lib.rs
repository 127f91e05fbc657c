//! Read-through cache in front of a headless CMS, with a rich-text HTML renderer.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
