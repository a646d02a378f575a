//! Sequential IPv4 address allocation.

use crate::device::prefix_mask;
use crate::SimulationError;
use std::net::Ipv4Addr;

/// Hands out consecutive host addresses from one subnet.
///
/// The first address is `network + 1`. The broadcast address is never
/// handed out.
#[derive(Debug, Clone)]
pub struct AddressAllocator {
    network: Ipv4Addr,
    prefix_len: u8,
    next_host: u32,
}

impl AddressAllocator {
    /// Create an allocator for `network` with netmask `mask`.
    ///
    /// Fails if `mask` is not contiguous.
    pub fn new(network: Ipv4Addr, mask: Ipv4Addr) -> Result<Self, SimulationError> {
        let bits = u32::from(mask);
        let prefix_len = bits.leading_ones() as u8;
        if prefix_mask(prefix_len) != bits {
            return Err(SimulationError::InvalidConfig(format!(
                "netmask {mask} is not contiguous"
            )));
        }
        Self::with_prefix(network, prefix_len)
    }

    /// Create an allocator for `network/prefix_len`.
    pub fn with_prefix(network: Ipv4Addr, prefix_len: u8) -> Result<Self, SimulationError> {
        if prefix_len > 30 {
            return Err(SimulationError::InvalidConfig(format!(
                "/{prefix_len} leaves no host addresses"
            )));
        }
        let base = u32::from(network) & prefix_mask(prefix_len);
        Ok(Self {
            network: Ipv4Addr::from(base),
            prefix_len,
            next_host: 1,
        })
    }

    /// Subnet network address.
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Subnet prefix length.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Allocate the next host address.
    pub fn next_address(&mut self) -> Result<Ipv4Addr, SimulationError> {
        let host_bits = 32 - u32::from(self.prefix_len);
        let broadcast_host = (1u32 << host_bits) - 1;
        if self.next_host >= broadcast_host {
            return Err(SimulationError::AddressExhausted {
                network: self.network,
                prefix_len: self.prefix_len,
            });
        }
        let address = Ipv4Addr::from(u32::from(self.network) | self.next_host);
        self.next_host += 1;
        Ok(address)
    }
}
