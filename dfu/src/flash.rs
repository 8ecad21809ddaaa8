//! Seam between the update engine and the flash/bootloader layer.

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlashError {
    OutOfBounds,
    Device,
}

/// The flash region that receives the incoming image.
///
/// Offsets are relative to the start of the region. The engine sequences
/// calls; it never touches flash hardware itself.
pub trait FlashBank {
    /// Absolute address of the region, for diagnostics.
    fn region_address(&self) -> u32;

    /// Region capacity in bytes.
    fn region_size(&self) -> usize;

    /// Erases the whole region. Called once per accepted Init.
    fn erase(&mut self) -> Result<(), FlashError>;

    /// Writes one page. `offset` and `data.len()` are multiples of the
    /// flash word size; the implementation may pad the tail of a final
    /// short page.
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), FlashError>;

    /// Reads back already-flashed bytes for checksumming.
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), FlashError>;

    /// Marks the received image for the bootloader and resets the device.
    /// Never returns.
    fn commit_and_reboot(&mut self, size_words: usize) -> !;
}
