//! mspiflash-core - SPI NOR flash driver behind an indirect register bus
//!
//! The host chip exposes a master SPI block through three numbered
//! registers (control, transmit, receive) that can only be reached through
//! a byte-oriented indirect register transport. This crate sequences that
//! block to read the flash status register, issue write-enable, erase 4 KiB
//! sectors and program pages one 32-bit word at a time.
//!
//! The layers, leaf first:
//!
//! - [`transport`] - the injected register transfer primitive
//! - [`indirect`] - 32-bit register read/write on top of the transport
//! - [`regs`] - register map and the SPICTL bitfield value type
//! - [`mspi`] - master SPI mode control and the done-flag wait
//! - [`protocol`] - flash status/command/erase primitives
//! - [`program`] - the page program sequencer
//!
//! Everything is synchronous. Waits are busy-polls that run forever unless a
//! bounded [`poll::PollPolicy`] is configured.
//!
//! # Example
//!
//! ```ignore
//! use mspiflash_core::{DriverConfig, FlashProgrammer, NoProgress};
//!
//! fn flash_image<T: mspiflash_core::IndirectTransport>(bus: T, image: &[u8]) {
//!     let mut programmer = FlashProgrammer::new(bus, DriverConfig::default());
//!     match programmer.write_image(0x1000, image, &mut NoProgress) {
//!         Ok(stats) => println!("wrote {} bytes", stats.bytes_written),
//!         Err(e) => println!("write failed: {}", e),
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod error;
pub mod indirect;
pub mod mspi;
pub mod opcodes;
pub mod poll;
pub mod program;
pub mod protocol;
pub mod regs;
pub mod transport;

pub use config::{DriverConfig, TailPolicy};
pub use error::{Error, Result, WaitTarget};
pub use poll::PollPolicy;
pub use program::{FlashProgrammer, NoProgress, WriteProgress, WriteStats};
pub use regs::{MspiMode, RegisterMap, SpiCtl};
pub use transport::IndirectTransport;
