//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_key_value_storage;
mod json_file_key_value_storage;
mod reqwest_http_transport;
mod watch_navigator;

pub use in_memory_key_value_storage::InMemoryKeyValueStorage;
pub use json_file_key_value_storage::JsonFileKeyValueStorage;
pub use reqwest_http_transport::ReqwestHttpTransport;
pub use watch_navigator::WatchNavigator;
