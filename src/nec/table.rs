use super::*;
use crate::error::{Error, Result};

/// One burst of carrier followed by silence
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Carrier-on time; `0` means there is nothing left to send
    pub pulse_us: u32,
    /// Silence after the burst; `0` marks the last entry of the table
    pub idle_us: u32,
}

impl Entry {
    pub const fn new(pulse_us: u32, idle_us: u32) -> Self {
        Entry { pulse_us, idle_us }
    }

    const fn bit(set: bool) -> Self {
        if set {
            Entry::new(DATA_PULSE_US, BIT1_IDLE_US)
        } else {
            Entry::new(DATA_PULSE_US, BIT0_IDLE_US)
        }
    }

    /// Burst plus silence
    pub const fn duration_us(&self) -> u32 {
        self.pulse_us + self.idle_us
    }

    pub const fn is_last(&self) -> bool {
        self.idle_us == 0
    }
}

/// Bounded list of NEC timings for one transmit request
///
/// The table owns its storage; `N` is fixed at compile time via
/// [`table_capacity`]. A request that needs more than `N` entries is refused
/// by [`TimingTable::rebuild`] before any entry is touched.
#[derive(Debug, Clone)]
pub struct TimingTable<const N: usize> {
    entries: [Entry; N],
    len: usize,
    // Time left in the current 110 ms repeat interval while encoding
    remaining_us: u32,
}

impl<const N: usize> TimingTable<N> {
    pub const fn new() -> Self {
        TimingTable {
            entries: [Entry::new(0, 0); N],
            len: 0,
            remaining_us: REPEAT_INTERVAL_US,
        }
    }

    /// Encodes a frame for `address`/`command` followed by `repeats` repeat codes
    pub fn encode(address: u16, command: u8, repeats: usize) -> Result<Self> {
        let mut table = Self::new();
        table.rebuild(address, command, repeats)?;
        Ok(table)
    }

    /// Encodes a [`NecCommand`]
    pub fn encode_command(cmd: NecCommand, repeats: usize) -> Result<Self> {
        Self::encode(cmd.address, cmd.command, repeats)
    }

    /// Discards the current contents and encodes a new request in place
    pub fn rebuild(&mut self, address: u16, command: u8, repeats: usize) -> Result<()> {
        let required = repeats
            .checked_mul(REPEAT_LEN)
            .and_then(|n| n.checked_add(BASE_FRAME_LEN))
            .unwrap_or(usize::MAX);
        if required > N {
            return Err(Error::TableOverflow {
                required,
                capacity: N,
            });
        }

        self.len = 0;
        self.remaining_us = REPEAT_INTERVAL_US;

        self.push(Entry::new(LEADER_PULSE_US, LEADER_IDLE_US));
        self.push_bits(address.into(), 16);
        self.push_bits(command.into(), 8);
        // The complement is computed once here and encoded like any other field
        self.push_bits((!command).into(), 8);
        self.push(Entry::new(DATA_PULSE_US, 0));

        for _ in 0..repeats {
            self.push_repeat();
        }
        Ok(())
    }

    fn push(&mut self, entry: Entry) {
        self.entries[self.len] = entry;
        self.len += 1;
        self.remaining_us = self.remaining_us.saturating_sub(entry.duration_us());
    }

    fn push_bits(&mut self, mut value: u32, bits: u32) {
        for _ in 0..bits {
            self.push(Entry::bit(value & 1 == 1));
            value >>= 1;
        }
    }

    fn push_repeat(&mut self) {
        // Stretch the silence before the repeat so it starts exactly one
        // interval after the previous burst train started
        self.entries[self.len - 1].idle_us = self.remaining_us;
        self.remaining_us = REPEAT_INTERVAL_US;

        self.push(Entry::new(REPEAT_PULSE_US, REPEAT_IDLE_US));
        self.push(Entry::new(DATA_PULSE_US, 0));
    }

    /// Encoded entries
    pub fn as_slice(&self) -> &[Entry] {
        &self.entries[..self.len]
    }

    /// Entry at `index`, if it was encoded
    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.as_slice().get(index)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Time the whole table takes to play back
    pub fn total_duration_us(&self) -> u32 {
        self.as_slice().iter().map(Entry::duration_us).sum()
    }
}

impl<const N: usize> PartialEq for TimingTable<N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<const N: usize> Eq for TimingTable<N> {}

impl<const N: usize> Default for TimingTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> IntoIterator for &'a TimingTable<N> {
    type Item = &'a Entry;
    type IntoIter = core::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Table = TimingTable<{ table_capacity(4) }>;

    fn idle_for(bit: bool) -> u32 {
        if bit {
            BIT1_IDLE_US
        } else {
            BIT0_IDLE_US
        }
    }

    fn span(entries: &[Entry]) -> u32 {
        entries.iter().map(Entry::duration_us).sum()
    }

    #[test]
    fn base_frame_has_34_entries() {
        for &(address, command) in &[(0x0000, 0x00), (0xffff, 0xff), (0xf300, 0x91), (0x00ff, 0x5a)] {
            let table = Table::encode(address, command, 0).unwrap();
            assert_eq!(table.len(), BASE_FRAME_LEN);
            assert_eq!(table.get(33), Some(&Entry::new(DATA_PULSE_US, 0)));
            assert!(table.as_slice()[..33].iter().all(|e| !e.is_last()));
        }
    }

    #[test]
    fn data_bits_are_lsb_first() {
        let addresses = [0x0000u16, 0x0001, 0x8000, 0xf300, 0xa5c3, 0xffff];
        for &address in &addresses {
            for command in 0..=255u8 {
                let table = Table::encode(address, command, 0).unwrap();
                let entries = table.as_slice();
                assert_eq!(entries[0], Entry::new(LEADER_PULSE_US, LEADER_IDLE_US));
                for k in 0..16 {
                    let bit = (address >> k) & 1 == 1;
                    assert_eq!(entries[1 + k], Entry::new(DATA_PULSE_US, idle_for(bit)));
                }
                for k in 0..8 {
                    let bit = (command >> k) & 1 == 1;
                    assert_eq!(entries[17 + k].idle_us, idle_for(bit));
                    // complement field selects the opposite idle
                    assert_eq!(entries[25 + k].idle_us, idle_for(!bit));
                    assert_eq!(entries[25 + k].pulse_us, DATA_PULSE_US);
                }
            }
        }
    }

    #[test]
    fn repeats_keep_a_fixed_interval() {
        for &(address, command) in &[(0x0000, 0x00), (0xffff, 0x00), (0xf300, 0x91)] {
            let table = Table::encode(address, command, 3).unwrap();
            let entries = table.as_slice();
            assert_eq!(entries.len(), BASE_FRAME_LEN + 3 * REPEAT_LEN);

            assert_eq!(span(&entries[..34]), REPEAT_INTERVAL_US);
            for r in 0..2 {
                let start = 34 + r * REPEAT_LEN;
                assert_eq!(entries[start], Entry::new(REPEAT_PULSE_US, REPEAT_IDLE_US));
                assert_eq!(span(&entries[start..start + REPEAT_LEN]), REPEAT_INTERVAL_US);
            }
            assert_eq!(entries.last(), Some(&Entry::new(DATA_PULSE_US, 0)));
        }
    }

    #[test]
    fn repeat_count_boundaries() {
        assert_eq!(Table::encode(0x1234, 0x56, 0).unwrap().len(), 34);
        assert_eq!(Table::encode(0x1234, 0x56, 1).unwrap().len(), 36);
        assert_eq!(Table::encode(0x1234, 0x56, 4).unwrap().len(), 42);
    }

    #[test]
    fn overflow_is_rejected_without_touching_the_table() {
        let mut table = Table::encode(0x1234, 0x56, 1).unwrap();
        let before = table.clone();
        assert_eq!(
            table.rebuild(0x1234, 0x56, 5),
            Err(Error::TableOverflow {
                required: 44,
                capacity: 42
            })
        );
        assert_eq!(table, before);
        assert!(matches!(
            Table::encode(0, 0, usize::MAX),
            Err(Error::TableOverflow { .. })
        ));
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = Table::encode(0xf300, 0x94, 2).unwrap();
        let b = Table::encode(0xf300, 0x94, 2).unwrap();
        assert_eq!(a, b);

        let mut reused = Table::encode(0xffff, 0xff, 4).unwrap();
        reused.rebuild(0xf300, 0x94, 2).unwrap();
        assert_eq!(reused, a);
    }

    #[test]
    fn gorilla_power_frame() {
        let table = Table::encode(0xf300, 0x91, 1).unwrap();
        let entries = table.as_slice();
        assert_eq!(entries[0], Entry::new(9_000, 4_500));

        // 0xF300: low byte all zeros, high byte 0b1111_0011
        let address_idles: [u32; 16] = [
            560, 560, 560, 560, 560, 560, 560, 560, 1690, 1690, 560, 560, 1690, 1690, 1690, 1690,
        ];
        // 0x91 = 0b1001_0001, complement 0b0110_1110
        let command_idles: [u32; 8] = [1690, 560, 560, 560, 1690, 560, 560, 1690];
        let inverse_idles: [u32; 8] = [560, 1690, 1690, 1690, 560, 1690, 1690, 560];
        let mut idles = [0u32; 32];
        for (idle, entry) in idles.iter_mut().zip(&entries[1..33]) {
            *idle = entry.idle_us;
        }
        assert_eq!(&idles[..16], &address_idles);
        assert_eq!(&idles[16..24], &command_idles);
        assert_eq!(&idles[24..32], &inverse_idles);

        // the stop entry's idle becomes the gap to the repeat code
        let frame: u32 = span(&entries[..33]) + DATA_PULSE_US;
        assert_eq!(entries[33], Entry::new(DATA_PULSE_US, REPEAT_INTERVAL_US - frame));
        assert_eq!(entries[34], Entry::new(REPEAT_PULSE_US, REPEAT_IDLE_US));
        assert_eq!(entries[35], Entry::new(DATA_PULSE_US, 0));
        assert_eq!(table.total_duration_us(), REPEAT_INTERVAL_US + 9_000 + 2_250 + 560);
    }
}
