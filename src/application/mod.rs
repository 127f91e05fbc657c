//! Application services: the content gateway and everything built on it.

pub mod catalog;
pub mod error;
pub mod gateway;
pub mod invalidation;
pub mod mapper;
pub mod pagination;
pub mod related;
pub mod render;
pub mod source;
pub mod warmer;
