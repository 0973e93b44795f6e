//! HTTP handler modules for waymark-api.

pub mod chat;
pub mod journeys;
pub mod media;
pub mod messages;
pub mod threads;
