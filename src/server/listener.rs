// Listener module
// Creates the TCP listener, stepping to the next port once if the configured one is taken

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::logger;

/// Create a `TcpListener` with `SO_REUSEADDR` enabled.
///
/// `SO_REUSEPORT` stays off, so a port held by another socket fails with
/// `AddrInUse`.
///
/// Must be called from within a Tokio runtime.
pub fn create_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // Allow binding while old connections sit in TIME_WAIT
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}

/// Bind `addr`, retrying once on the next port if it is already in use
pub fn bind_with_fallback(addr: SocketAddr) -> io::Result<TcpListener> {
    match create_listener(addr) {
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
            let next_port = addr.port().checked_add(1).ok_or(e)?;
            logger::log_port_in_use(addr.port(), next_port);
            create_listener(SocketAddr::new(addr.ip(), next_port))
        }
        result => result,
    }
}
