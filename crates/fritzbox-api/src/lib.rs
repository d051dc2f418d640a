// fritzbox-api: Blocking Rust client for the AVM Fritz!Box web interface

pub mod auth;
pub mod decode;
pub mod error;
pub mod session;
pub mod transport;

pub use auth::{Credentials, LoginMethod, SessionId, challenge_response};
pub use decode::{
    CounterPeriod, DailyUsage, Decoder, Device, LogEntry, OnlineCounterRow, PortOverview,
    Protocol, Rule, RuleChange, RuleState, TamToggle, TrafficVolume,
};
pub use error::Error;
pub use session::{NewPortRule, Session, SessionConfig};
pub use transport::{Endpoint, FilePart, Form, HttpTransport, Transport, TransportConfig};
