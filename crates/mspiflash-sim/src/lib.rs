//! mspiflash-sim - In-memory model of the master SPI block and its flash
//!
//! [`SimChip`] answers the indirect register transport the way the host
//! chip does and forwards the bytes it clocks out to an emulated SPI NOR
//! part. It's useful for testing the driver and for dry runs without
//! hardware.
//!
//! Bus model:
//! - Entering `Transfer` from `Enable` or `Update` shifts the top
//!   `byte_count` bytes of SPITX out, most significant first, and shifts the
//!   flash's replies into SPIRX.
//! - A status read answers every byte after the opcode with the status
//!   sampled at the first one, so one RDSR transaction counts as one poll.
//! - The done flag drops on that edge and rises after `done_latency` SPICTL
//!   reads.
//! - Entering `Idle` (or disabling master SPI) releases chip select, which
//!   is when the flash acts on WREN, erase and program commands.

pub mod config;

pub use config::{parse_options, SimConfig, SimConfigError};

use mspiflash_core::error::{Error, Result};
use mspiflash_core::opcodes::{self, SECTOR_SIZE};
use mspiflash_core::protocol::StatusFlags;
use mspiflash_core::regs::{MspiMode, SpiCtl, SPICTL_DONE};
use mspiflash_core::IndirectTransport;

/// Something the emulated flash saw on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// Write enable latched
    WriteEnable,
    /// Status register returned to the host
    StatusRead(u8),
    /// Sector erase accepted
    SectorErase {
        /// First byte of the erased sector
        addr: u32,
    },
    /// One data frame clocked during a page program
    DataWord(u32),
    /// Page program committed at chip select release
    PageProgram {
        /// Start address
        addr: u32,
        /// Number of data bytes
        len: usize,
    },
    /// Command ignored (busy, write enable missing, or unknown opcode)
    Ignored {
        /// Opcode of the ignored command
        opcode: u8,
    },
}

/// Simulated host chip with an attached SPI NOR flash
pub struct SimChip {
    config: SimConfig,
    ctl: u32,
    tx: u32,
    rx: u32,
    done_countdown: Option<u32>,
    /// MOSI bytes of the open transaction, `None` while chip select is released
    transaction: Option<Vec<u8>>,
    data: Vec<u8>,
    write_enabled: bool,
    busy_left: u32,
    /// Status latched by the open RDSR transaction
    status_sample: u8,
    events: Vec<SimEvent>,
    tx_writes: Vec<u32>,
}

impl SimChip {
    /// Create a simulated chip with erased flash
    ///
    /// A zero `flash_size` gives a chip whose erase and program commands
    /// still complete but touch no data. [`parse_options`] never produces one.
    pub fn new(config: SimConfig) -> Self {
        if config.flash_size == 0 {
            log::warn!("sim: flash size is zero");
        }
        let data = vec![0xFF; config.flash_size];
        Self {
            config,
            ctl: 0,
            tx: 0,
            rx: 0,
            done_countdown: None,
            transaction: None,
            data,
            write_enabled: false,
            busy_left: 0,
            status_sample: 0,
            events: Vec::new(),
            tx_writes: Vec::new(),
        }
    }

    /// Create a simulated chip with default configuration
    pub fn new_default() -> Self {
        Self::new(SimConfig::default())
    }

    /// Create a simulated chip with pre-filled flash
    pub fn with_data(config: SimConfig, initial_data: &[u8]) -> Self {
        let mut chip = Self::new(config);
        let len = core::cmp::min(initial_data.len(), chip.data.len());
        chip.data[..len].copy_from_slice(&initial_data[..len]);
        chip
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Current SPICTL value, without the side effects of a bus read
    pub fn spictl(&self) -> SpiCtl {
        SpiCtl(self.ctl)
    }

    /// Everything the flash saw, oldest first
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Forget recorded events
    pub fn clear_events(&mut self) {
        self.events.clear();
        self.tx_writes.clear();
    }

    /// Every value written to SPITX, oldest first
    pub fn tx_writes(&self) -> &[u32] {
        &self.tx_writes
    }

    /// Number of accepted sector erases
    pub fn erase_count(&self) -> usize {
        self.count(|e| matches!(e, SimEvent::SectorErase { .. }))
    }

    /// Number of latched write enables
    pub fn write_enable_count(&self) -> usize {
        self.count(|e| matches!(e, SimEvent::WriteEnable))
    }

    /// Number of page program data frames
    pub fn data_word_count(&self) -> usize {
        self.count(|e| matches!(e, SimEvent::DataWord(_)))
    }

    /// Status values returned to the host, oldest first
    pub fn status_reads(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SimEvent::StatusRead(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    fn count(&self, f: impl Fn(&SimEvent) -> bool) -> usize {
        self.events.iter().filter(|e| f(*e)).count()
    }

    fn status(&self) -> u8 {
        let mut status = StatusFlags::empty();
        status.set(StatusFlags::WIP, self.busy_left > 0);
        status.set(StatusFlags::WEL, self.write_enabled);
        status.bits()
    }

    fn read_spictl(&mut self) -> u32 {
        if let Some(left) = self.done_countdown {
            if left == 0 {
                self.ctl |= SPICTL_DONE;
                self.done_countdown = None;
            } else {
                self.done_countdown = Some(left - 1);
            }
        }
        self.ctl
    }

    fn write_spictl(&mut self, value: u32) {
        let old = SpiCtl(self.ctl);
        // done is owned by the hardware
        let new = SpiCtl((value & !SPICTL_DONE) | (self.ctl & SPICTL_DONE));
        self.ctl = new.bits();

        if !new.master_enabled() || !new.mode().selects_chip() {
            self.release_chip_select();
            return;
        }

        if self.transaction.is_none() {
            self.transaction = Some(Vec::new());
        }

        if new.mode() == MspiMode::Transfer && old.mode() != MspiMode::Transfer {
            self.shift(new.byte_count());
        }
    }

    fn shift(&mut self, count: u8) {
        self.ctl &= !SPICTL_DONE;
        self.done_countdown = if self.config.stuck_done {
            None
        } else {
            Some(self.config.done_latency)
        };

        let bytes = self.tx.to_be_bytes();
        let frame = &bytes[..count as usize];
        let sent_before = self.transaction.as_ref().map_or(0, Vec::len);

        for &mosi in frame {
            let miso = self.clock_byte(mosi);
            self.rx = (self.rx << 8) | miso as u32;
        }

        let opcode = self.transaction.as_ref().and_then(|t| t.first().copied());
        if opcode == Some(opcodes::PP) && sent_before >= 4 {
            let word = if count == 4 {
                self.tx
            } else {
                self.tx >> ((4 - count as u32) * 8)
            };
            self.events.push(SimEvent::DataWord(word));
        }
    }

    /// Feed one MOSI byte to the flash, return its MISO byte
    fn clock_byte(&mut self, mosi: u8) -> u8 {
        let status = self.status();
        let Some(transaction) = self.transaction.as_mut() else {
            return 0xFF;
        };
        transaction.push(mosi);

        if transaction[0] == opcodes::RDSR {
            match transaction.len() {
                1 => {}
                2 => {
                    self.status_sample = status;
                    self.events.push(SimEvent::StatusRead(status));
                    if self.busy_left > 0 && !self.config.stuck_busy {
                        self.busy_left -= 1;
                    }
                    return status;
                }
                _ => return self.status_sample,
            }
        }
        0xFF
    }

    fn release_chip_select(&mut self) {
        let Some(bytes) = self.transaction.take() else {
            return;
        };
        let Some(&opcode) = bytes.first() else {
            return;
        };
        let busy = self.busy_left > 0;

        match opcode {
            opcodes::RDSR => {}
            opcodes::WREN if !busy => {
                self.write_enabled = true;
                self.events.push(SimEvent::WriteEnable);
            }
            opcodes::SE_20 if bytes.len() >= 4 && !busy && self.write_enabled => {
                let addr = address_of(&bytes) & !(SECTOR_SIZE - 1);
                self.erase(addr);
            }
            opcodes::PP if bytes.len() >= 4 && !busy && self.write_enabled => {
                self.program(address_of(&bytes), &bytes[4..]);
            }
            _ => {
                log::debug!("sim: ignoring opcode {:#04x} ({} bytes)", opcode, bytes.len());
                self.events.push(SimEvent::Ignored { opcode });
            }
        }
    }

    /// Map a flash address onto the backing store, wrapping like a part
    /// that ignores the upper address bits
    fn offset(&self, addr: u32) -> Option<usize> {
        let size = self.data.len();
        if size == 0 {
            log::warn!("sim: no flash attached, dropping access at {:#08x}", addr);
            return None;
        }
        if addr as usize >= size {
            log::warn!(
                "sim: address {:#08x} beyond {} byte flash, wrapping",
                addr,
                size
            );
        }
        Some(addr as usize % size)
    }

    fn erase(&mut self, addr: u32) {
        if let Some(start) = self.offset(addr) {
            let end = (start + SECTOR_SIZE as usize).min(self.data.len());
            self.data[start..end].fill(0xFF);
        }
        self.finish_write(SimEvent::SectorErase { addr });
    }

    fn program(&mut self, addr: u32, payload: &[u8]) {
        if let Some(start) = self.offset(addr) {
            let size = self.data.len();
            // Flash programming: can only change 1 -> 0
            for (i, &byte) in payload.iter().enumerate() {
                self.data[(start + i) % size] &= byte;
            }
        }
        self.finish_write(SimEvent::PageProgram {
            addr,
            len: payload.len(),
        });
    }

    fn finish_write(&mut self, event: SimEvent) {
        self.write_enabled = false;
        self.busy_left = if self.config.stuck_busy {
            u32::MAX
        } else {
            self.config.busy_polls
        };
        self.events.push(event);
    }
}

fn address_of(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([0, bytes[1], bytes[2], bytes[3]])
}

impl IndirectTransport for SimChip {
    fn write_register(&mut self, register: u32, data: &[u8]) -> Result<()> {
        let bytes: [u8; 4] = data.try_into().map_err(|_| Error::Transport)?;
        let value = u32::from_le_bytes(bytes);
        let regs = self.config.registers;

        if register == regs.spictl {
            self.write_spictl(value);
        } else if register == regs.spitx {
            self.tx = value;
            self.tx_writes.push(value);
        } else if register == regs.spirx {
            // read-only
        } else {
            log::warn!("sim: write to unknown register {:#04x}", register);
            return Err(Error::Transport);
        }
        Ok(())
    }

    fn read_register(&mut self, register: u32, buf: &mut [u8]) -> Result<()> {
        if buf.len() != 4 {
            return Err(Error::Transport);
        }
        let regs = self.config.registers;

        let value = if register == regs.spictl {
            self.read_spictl()
        } else if register == regs.spitx {
            self.tx
        } else if register == regs.spirx {
            self.rx
        } else {
            log::warn!("sim: read from unknown register {:#04x}", register);
            return Err(Error::Transport);
        };
        buf.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn delay_us(&mut self, _us: u32) {
        // No delay needed for in-memory operations
    }
}
