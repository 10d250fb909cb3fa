//! Network identity probes.
//!
//! The service re-checks the network periodically so the dashboard follows
//! reconnects and address changes instead of showing the identity from startup.

use std::net::UdpSocket;

use crate::health::NetworkInfo;

/// Supplies the current network identity, or `None` while disconnected.
pub trait NetworkProbe: Send + Sync {
    fn sample(&self) -> Option<NetworkInfo>;
}

/// Always reports the same identity.
#[derive(Debug, Clone)]
pub struct StaticNetwork {
    info: NetworkInfo,
}

impl StaticNetwork {
    pub fn new(info: NetworkInfo) -> Self {
        Self { info }
    }
}

impl NetworkProbe for StaticNetwork {
    fn sample(&self) -> Option<NetworkInfo> {
        Some(self.info.clone())
    }
}

/// Reports a fixed network name and signal with the address currently used
/// for outbound traffic.
#[derive(Debug, Clone)]
pub struct LocalAddrProbe {
    ssid: String,
    rssi_dbm: i32,
}

impl LocalAddrProbe {
    pub fn new(ssid: impl Into<String>, rssi_dbm: i32) -> Self {
        Self {
            ssid: ssid.into(),
            rssi_dbm,
        }
    }
}

impl NetworkProbe for LocalAddrProbe {
    fn sample(&self) -> Option<NetworkInfo> {
        let ip = detect_local_ip()?;
        Some(NetworkInfo::new(self.ssid.clone(), self.rssi_dbm, ip))
    }
}

/// Local address used for outbound traffic. No packets are sent.
pub fn detect_local_ip() -> Option<String> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("192.0.2.1:80").ok()?;
    let addr = socket.local_addr().ok()?;
    if addr.ip().is_unspecified() {
        return None;
    }
    Some(addr.ip().to_string())
}
