//! Peer address types and name resolution.

use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs};

/// A peer endpoint (IP address + port).
///
/// Owned address value recorded by [`Channel::connect`](crate::Channel::connect);
/// also usable on its own wherever a resolved address is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint(SocketAddr);

impl Endpoint {
    /// Creates a new endpoint from an IP address and port.
    #[must_use]
    pub const fn new(addr: IpAddr, port: u16) -> Self {
        Self(SocketAddr::new(addr, port))
    }

    /// Creates a new IPv4 endpoint.
    #[must_use]
    pub const fn new_v4(a: u8, b: u8, c: u8, d: u8, port: u16) -> Self {
        Self(SocketAddr::V4(SocketAddrV4::new(
            Ipv4Addr::new(a, b, c, d),
            port,
        )))
    }

    /// Creates a localhost endpoint on the given port.
    #[must_use]
    pub const fn localhost(port: u16) -> Self {
        Self::new_v4(127, 0, 0, 1, port)
    }

    /// Resolves a host (dotted-decimal or hostname) and port into the list
    /// of candidate endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution fails. An empty list (a host that
    /// resolves to no addresses) is not an error at this level.
    pub fn resolve(host: &str, port: u16) -> io::Result<Vec<Self>> {
        Ok((host, port).to_socket_addrs()?.map(Self).collect())
    }

    /// Returns the IP address.
    #[must_use]
    pub const fn ip(&self) -> IpAddr {
        self.0.ip()
    }

    /// Returns the port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.0.port()
    }

    /// Returns the underlying [`SocketAddr`].
    #[must_use]
    pub const fn as_socket_addr(&self) -> SocketAddr {
        self.0
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl From<Endpoint> for SocketAddr {
    fn from(ep: Endpoint) -> Self {
        ep.0
    }
}

impl From<SocketAddrV4> for Endpoint {
    fn from(addr: SocketAddrV4) -> Self {
        Self(SocketAddr::V4(addr))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_new_v4() {
        let ep = Endpoint::new_v4(192, 168, 1, 100, 8080);
        assert_eq!(ep.ip(), IpAddr::V4(Ipv4Addr::new(192, 168, 1, 100)));
        assert_eq!(ep.port(), 8080);
    }

    #[test]
    fn endpoint_localhost() {
        let ep = Endpoint::localhost(3000);
        assert_eq!(ep.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(ep.port(), 3000);
    }

    #[test]
    fn endpoint_from_socket_addr() {
        let addr: SocketAddr = "10.0.0.1:5000".parse().unwrap();
        let ep = Endpoint::from(addr);
        assert_eq!(ep.as_socket_addr(), addr);
    }

    #[test]
    fn endpoint_display() {
        let ep = Endpoint::new_v4(127, 0, 0, 1, 8080);
        assert_eq!(format!("{ep}"), "127.0.0.1:8080");
    }

    #[test]
    fn resolve_dotted_decimal() {
        let eps = Endpoint::resolve("127.0.0.1", 9000).unwrap();
        assert_eq!(eps, vec![Endpoint::localhost(9000)]);
    }

    #[test]
    fn resolve_bogus_host() {
        // Reserved TLD, guaranteed not to resolve.
        assert!(Endpoint::resolve("no-such-host.invalid", 9000).is_err());
    }
}
