pub mod chunk;
pub mod common;
pub mod config;
pub mod crawler;
pub mod dedupe;
pub mod export;
pub mod fetch;
pub mod html;
pub mod llm;
pub mod logging;
pub mod metadata;
pub mod normalize;
pub mod pipeline;
pub mod rules;
