pub mod builder;
pub mod catalog;
pub mod error;
pub mod export;
pub mod projection;
pub mod sink;
pub mod store;
pub mod summary;
pub mod threshold;
pub mod view;
pub mod visibility;
