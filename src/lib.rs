mod database {
    pub mod actions;
    pub mod error;
    pub mod export;
    pub mod filter;
    pub mod pagination;
    pub mod schema;
    pub mod validate;
    pub mod views;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod config;
mod constants;

mod media {
    pub mod image;
}

pub use authentication::*;
pub use config::*;
pub use constants::*;
pub use database::*;
pub use media::*;
