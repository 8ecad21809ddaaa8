//! Flash access for the update engine: the staging partition declared in
//! memory.x, plus the commit-and-reset path through the bootloader state.

use core::cell::RefCell;

use defmt::{error, info};
use embassy_boot::BlockingPartition;
use embassy_boot_rp::{AlignedBuffer, BlockingFirmwareUpdater, FirmwareUpdaterConfig};
use embassy_rp::flash::{Blocking, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_storage::nor_flash::{NorFlash, ReadNorFlash};
use meshbridge_dfu::{FlashBank, FlashError, MAX_PAGE_SIZE};

use crate::config::{DFU_REGION_ADDRESS, FLASH_ERASE_BLOCK_SIZE, FLASH_SIZE};

pub type FlashType = Flash<'static, FLASH, Blocking, FLASH_SIZE>;
pub type FlashMutex = Mutex<NoopRawMutex, RefCell<FlashType>>;

type DfuPartition = BlockingPartition<'static, NoopRawMutex, FlashType>;

/// Write granularity of the RP2040 flash driver.
const WRITE_ALIGN: usize = 4;

pub struct DfuFlashBank {
    flash: &'static FlashMutex,
}

impl DfuFlashBank {
    pub fn new(flash: &'static FlashMutex) -> Self {
        Self { flash }
    }

    fn partition(&self) -> DfuPartition {
        FirmwareUpdaterConfig::from_linkerfile_blocking(self.flash, self.flash).dfu
    }
}

impl FlashBank for DfuFlashBank {
    fn region_address(&self) -> u32 {
        DFU_REGION_ADDRESS
    }

    fn region_size(&self) -> usize {
        self.partition().capacity()
    }

    fn erase(&mut self) -> Result<(), FlashError> {
        let mut partition = self.partition();
        let capacity = partition.capacity() as u32;
        info!("erasing {} bytes of staging flash", capacity);
        let mut offset = 0u32;
        while offset < capacity {
            let end = (offset + FLASH_ERASE_BLOCK_SIZE as u32).min(capacity);
            partition.erase(offset, end).map_err(|e| {
                error!(
                    "flash erase failed at {=u32:#x}: {:?}",
                    offset,
                    defmt::Debug2Format(&e)
                );
                FlashError::Device
            })?;
            offset = end;
        }
        Ok(())
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), FlashError> {
        let mut partition = self.partition();
        let padded = data.len().div_ceil(WRITE_ALIGN) * WRITE_ALIGN;
        if data.len() > MAX_PAGE_SIZE || offset as usize + padded > partition.capacity() {
            return Err(FlashError::OutOfBounds);
        }

        // Pad a short final page with erased-flash bytes up to the word size.
        let mut buf: AlignedBuffer<MAX_PAGE_SIZE> = AlignedBuffer([0xFF; MAX_PAGE_SIZE]);
        buf.0[..data.len()].copy_from_slice(data);
        partition.write(offset, &buf.0[..padded]).map_err(|e| {
            error!(
                "flash write failed at {=u32:#x}: {:?}",
                offset,
                defmt::Debug2Format(&e)
            );
            FlashError::Device
        })
    }

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        let mut partition = self.partition();
        if offset as usize + buf.len() > partition.capacity() {
            return Err(FlashError::OutOfBounds);
        }
        partition.read(offset, buf).map_err(|e| {
            error!(
                "flash read failed at {=u32:#x}: {:?}",
                offset,
                defmt::Debug2Format(&e)
            );
            FlashError::Device
        })
    }

    fn commit_and_reboot(&mut self, size_words: usize) -> ! {
        let config = FirmwareUpdaterConfig::from_linkerfile_blocking(self.flash, self.flash);
        let mut aligned = AlignedBuffer([0; WRITE_ALIGN]);
        let mut updater = BlockingFirmwareUpdater::new(config, &mut aligned.0);

        // If staging fails the reset boots the current image again and the
        // peer restarts the transfer after the state check.
        if let Err(e) = updater.mark_updated() {
            error!("failed to stage update: {:?}", defmt::Debug2Format(&e));
        }
        info!("update staged ({} words), resetting", size_words);
        cortex_m::peripheral::SCB::sys_reset()
    }
}
