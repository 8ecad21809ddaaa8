//! Single-producer single-consumer byte ring.
//!
//! Bridges the asynchronous byte source (UART interrupt or DMA transfer) and
//! the synchronous frame parser. The producer only touches the write cursor
//! and the bytes it stores; the consumer only advances the read cursor, so no
//! locking is needed beyond that split.

/// Fixed-capacity circular byte buffer.
///
/// One slot is kept unused so that `wr == rd` always means "empty": a
/// completely full buffer would otherwise be indistinguishable from an empty
/// one with the `(wr - rd) mod N` occupancy formula. Usable capacity is
/// therefore `N - 1`.
pub struct RingBuffer<const N: usize> {
    buf: [u8; N],
    wr: usize,
    rd: usize,
}

impl<const N: usize> RingBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            wr: 0,
            rd: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.wr == self.rd
    }

    /// Number of queued bytes.
    pub fn len(&self) -> usize {
        (self.wr + N - self.rd) % N
    }

    /// Free space left for `queue`.
    pub fn free(&self) -> usize {
        N - 1 - self.len()
    }

    /// Copies `data` into the ring, wrapping at the capacity boundary.
    ///
    /// Rejected atomically (no partial write) when `data` does not fit in the
    /// remaining free space.
    pub fn queue(&mut self, data: &[u8]) -> bool {
        if data.len() > self.free() {
            return false;
        }

        let run = data.len().min(N - self.wr);
        self.buf[self.wr..self.wr + run].copy_from_slice(&data[..run]);
        if run < data.len() {
            self.buf[..data.len() - run].copy_from_slice(&data[run..]);
        }
        self.wr = (self.wr + data.len()) % N;

        true
    }

    pub fn dequeue(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.buf[self.rd];
        self.rd = (self.rd + 1) % N;
        Some(byte)
    }

    /// Sets the write cursor directly.
    ///
    /// For producers (DMA) that have already stored bytes into the backing
    /// array and only need the cursor to catch up.
    pub fn set_write_index(&mut self, value: usize) {
        self.wr = value % N;
    }

    /// Advances the read cursor by `n` without copying.
    ///
    /// For consumers that processed a slice obtained from [`contiguous`]
    /// in place.
    ///
    /// [`contiguous`]: RingBuffer::contiguous
    pub fn increment_read_index(&mut self, n: usize) {
        self.rd = (self.rd + n) % N;
    }

    /// Longest run of unread bytes starting at the read cursor that does not
    /// wrap around the end of the backing array.
    pub fn contiguous(&self) -> &[u8] {
        let run = self.len().min(N - self.rd);
        &self.buf[self.rd..self.rd + run]
    }

    /// Mutable access to the backing storage, for producers that write into
    /// the array directly and report progress via [`set_write_index`].
    ///
    /// [`set_write_index`]: RingBuffer::set_write_index
    pub fn storage_mut(&mut self) -> &mut [u8; N] {
        &mut self.buf
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let ring: RingBuffer<16> = RingBuffer::new();
        assert!(ring.is_empty());
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.free(), 15);
    }

    #[test]
    fn fifo_order_preserved() {
        let mut ring: RingBuffer<16> = RingBuffer::new();
        assert!(ring.queue(&[1, 2, 3]));
        assert!(ring.queue(&[4, 5]));
        let mut out = [0u8; 5];
        for slot in out.iter_mut() {
            *slot = ring.dequeue().unwrap();
        }
        assert_eq!(out, [1, 2, 3, 4, 5]);
        assert_eq!(ring.dequeue(), None);
    }

    #[test]
    fn wraps_around_capacity_boundary() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        assert!(ring.queue(&[0xAA; 6]));
        for _ in 0..6 {
            ring.dequeue().unwrap();
        }
        // wr and rd now sit near the end; this write must wrap
        assert!(ring.queue(&[1, 2, 3, 4, 5]));
        assert_eq!(ring.len(), 5);
        for expected in 1..=5 {
            assert_eq!(ring.dequeue(), Some(expected));
        }
    }

    #[test]
    fn overflow_rejected_without_mutation() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        assert!(ring.queue(&[9, 8, 7]));
        // 3 queued, 4 free: a 5-byte write must be rejected whole
        assert!(!ring.queue(&[1, 2, 3, 4, 5]));
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.dequeue(), Some(9));
        assert_eq!(ring.dequeue(), Some(8));
        assert_eq!(ring.dequeue(), Some(7));
        assert_eq!(ring.dequeue(), None);
    }

    #[test]
    fn never_fills_to_capacity() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        assert!(!ring.queue(&[0; 8]));
        assert!(ring.queue(&[0; 7]));
        assert_eq!(ring.free(), 0);
        assert!(!ring.queue(&[0]));
    }

    #[test]
    fn dma_style_cursor_updates() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        ring.storage_mut()[..4].copy_from_slice(&[10, 20, 30, 40]);
        ring.set_write_index(4);
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.contiguous(), &[10, 20, 30, 40]);
        ring.increment_read_index(2);
        assert_eq!(ring.contiguous(), &[30, 40]);
        assert_eq!(ring.dequeue(), Some(30));
    }

    #[test]
    fn contiguous_stops_at_wrap() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        assert!(ring.queue(&[0; 6]));
        ring.increment_read_index(6);
        assert!(ring.queue(&[1, 2, 3, 4]));
        // two bytes fit before the boundary, the rest wrapped
        assert_eq!(ring.contiguous(), &[1, 2]);
        ring.increment_read_index(2);
        assert_eq!(ring.contiguous(), &[3, 4]);
    }
}
