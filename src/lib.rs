//! cirque: client for a mesh routing daemon's admin API
//!
//! Talks bencoded UDP to the daemon's admin endpoint: keeps the session
//! alive with pings, discovers the callable functions, signs calls with
//! the cookie handshake and presents the correlated replies.

pub mod catalog;
pub mod config;
pub mod identity;
pub mod protocol;
pub mod report;
pub mod routes;
pub mod session;
pub mod transport;
pub mod utils;

// Re-export config types
pub use config::{AdminConfig, ArgValue, CallConfig, Config, ConfigError, UdpConfig};

// Re-export identity types
pub use identity::{public_key_to_address, IdentityError, MeshAddress};

// Re-export protocol types
pub use protocol::{sign_call, ProtocolError, Reply, ReplyKind, SignedCall};

// Re-export catalog types
pub use catalog::{CatalogError, FunctionCatalog, FunctionDescriptor};

// Re-export presentation types
pub use report::{ConsoleSink, MemorySink, Report, ReportSink};
pub use routes::RoutingTable;

// Re-export transport types
pub use transport::{packet_channel, PacketRx, PacketTx, ReceivedPacket, TransportError};
pub use transport::udp::UdpTransport;

// Re-export session types
pub use session::{PendingCall, Session, SessionError, SessionState};

pub use utils::Txid;
