pub mod api;
pub mod config;
pub mod episode;
pub mod feed;
pub mod link;
pub mod observability;
