//! Upstream provider clients for Feedgate.
//!
//! One thin reqwest wrapper plus a client per provider family: the
//! weather hub, the air-quality service, and the energy datasets
//! (odcloud + utility statistics). Normalizers reshape raw provider
//! payloads into the gateway's response shapes.

pub mod air;
pub mod client;
pub mod energy;
pub mod normalize;
pub mod weather;

pub use air::{AirClient, DustKind};
pub use client::UpstreamClient;
pub use energy::EnergyClient;
pub use weather::WeatherClient;
