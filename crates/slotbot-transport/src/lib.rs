pub mod file_transport;
pub mod memory_transport;
pub mod registry;
pub mod transport_trait;

pub use file_transport::FileTransport;
pub use memory_transport::MemoryTransport;
pub use registry::TransportRegistry;
pub use transport_trait::{OutboundMessage, Transport};
