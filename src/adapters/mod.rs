pub mod response_cache;
pub mod transport;
pub mod upstream;

pub use response_cache::ResponseCache;
pub use transport::{ReqwestTransport, TransportResponse, UpstreamTransport};
pub use upstream::{backoff_delay, normalize_records, FetchClient};
