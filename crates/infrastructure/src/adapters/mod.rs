//! Adapters implementing the application ports.

mod reqwest_client;
mod wire;

pub use reqwest_client::ReqwestRemoteService;
