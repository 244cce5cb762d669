use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// The address peers on the local network should dial to reach this host.
///
/// "Connects" a UDP socket to a public address so the OS picks the
/// outbound interface, then reads the local end. No packet is sent. Falls
/// back to `0.0.0.0` when there is no route.
pub fn local_ip() -> IpAddr {
    let probe = || -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
        Ok(socket.local_addr()?.ip())
    };
    probe().unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_ip_is_ipv4_or_fallback() {
        // Sandboxes may have no route at all; both outcomes are valid.
        let ip = local_ip();
        assert!(ip.is_ipv4());
    }
}
