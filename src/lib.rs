pub mod activation;
pub mod api;
pub mod export;
pub mod ipc;
pub mod model;
pub mod session;
pub mod view;
