pub mod console;
pub mod host;
pub mod server;
pub mod session;
pub mod session_manager;
pub mod tick;
pub mod world;

pub use server::{run, Server, ServerHandle};
