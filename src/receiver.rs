//! This module contains the UDP receive and decode logic
//!
//! The sensor pushes one frame per datagram: 16 taxel readings as
//! big-endian u16 words. We block on the socket once per cycle, so the
//! receive here is the only place a cycle can stall.

use std::net::{SocketAddr, UdpSocket};

/// Matches the read size of the sensor firmware's peer; anything longer
/// is truncated by the kernel on read
const RECV_BUF_SIZE: usize = 1024;

pub struct TaxelReceiver {
    socket: UdpSocket,
    buf: [u8; RECV_BUF_SIZE],
}

impl TaxelReceiver {
    /// Bind to the given address and port, ready to receive frames
    pub fn bind(ip: &str, port: u16) -> std::io::Result<Self> {
        let socket = UdpSocket::bind((ip, port))?;
        Ok(Self {
            socket,
            buf: [0u8; RECV_BUF_SIZE],
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Block until one datagram arrives, then decode it.
    /// Returns the decoded words and the sender's address.
    pub fn recv_frame(&mut self) -> std::io::Result<(Vec<u16>, SocketAddr)> {
        let (n, addr) = self.socket.recv_from(&mut self.buf)?;
        Ok((words_from_payload(&self.buf[..n]), addr))
    }
}

/// Decode a payload as consecutive big-endian u16 words.
///
/// An odd trailing byte is dropped; the firmware pads frames to whole
/// words, so a lone byte is framing garbage rather than a sample.
pub fn words_from_payload(payload: &[u8]) -> Vec<u16> {
    payload
        .chunks_exact(2)
        .map(|word| u16::from_be_bytes([word[0], word[1]]))
        .collect()
}
