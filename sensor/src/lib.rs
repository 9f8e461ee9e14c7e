// File format:
// Repeated for every cell, row-major (y outer, x inner):
//   flags: u8 (SOLID | WATER | EVENT, bits 0x08.. reserved)
//   event id: u8 (0 when the cell has no event)

#![no_std]

pub const SOLID: u8 = 0x01;
pub const WATER: u8 = 0x02;
pub const EVENT: u8 = 0x04;

/// Bits a well-formed record may carry.
pub const KNOWN_FLAGS: u8 = SOLID | WATER | EVENT;

pub const RECORD_SIZE: usize = 2;

pub fn encode(flags: u8, event: u8) -> [u8; RECORD_SIZE] {
    [flags, event]
}

pub fn blob_size(width: usize, height: usize) -> usize {
    RECORD_SIZE * width * height
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Record {
    pub flags: u8,
    pub event: u8,
}

impl Record {
    pub fn decode(bytes: [u8; RECORD_SIZE]) -> Self {
        Record {
            flags: bytes[0],
            event: bytes[1],
        }
    }

    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        encode(self.flags, self.event)
    }

    pub fn solid(&self) -> bool {
        self.flags & SOLID != 0
    }

    pub fn water(&self) -> bool {
        self.flags & WATER != 0
    }

    /// The event id, if the EVENT flag is raised.
    pub fn event(&self) -> Option<u8> {
        if self.flags & EVENT != 0 {
            Some(self.event)
        } else {
            None
        }
    }
}

/// Iterates the records of a blob in file order. A dangling odd byte is ignored.
pub fn records(blob: &[u8]) -> impl Iterator<Item = Record> + '_ {
    blob.chunks_exact(RECORD_SIZE)
        .map(|c| Record::decode([c[0], c[1]]))
}

/// Record for cell (x, y) of a blob `width` cells wide.
pub fn record_at(blob: &[u8], width: usize, x: usize, y: usize) -> Option<Record> {
    if x >= width {
        return None;
    }
    let offset = y.checked_mul(width)?.checked_add(x)?.checked_mul(RECORD_SIZE)?;
    let bytes = blob.get(offset..offset + RECORD_SIZE)?;
    Some(Record::decode([bytes[0], bytes[1]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_bits_are_distinct() {
        assert_eq!(SOLID & WATER, 0);
        assert_eq!(SOLID & EVENT, 0);
        assert_eq!(WATER & EVENT, 0);
        assert_eq!(KNOWN_FLAGS, 0x07);
    }

    #[test]
    fn test_encode_layout() {
        assert_eq!(encode(SOLID | EVENT, 7), [0x05, 0x07]);
        assert_eq!(encode(0, 0), [0, 0]);
    }

    #[test]
    fn test_blob_size() {
        assert_eq!(blob_size(0, 0), 0);
        assert_eq!(blob_size(2, 1), 4);
        assert_eq!(blob_size(20, 15), 600);
    }

    #[test]
    fn test_record_event_requires_flag() {
        let record = Record::decode([SOLID, 9]);
        assert!(record.solid());
        assert!(!record.water());
        assert_eq!(record.event(), None);

        let record = Record::decode([EVENT, 0]);
        assert_eq!(record.event(), Some(0));
    }

    #[test]
    fn test_records_ignores_dangling_byte() {
        let blob = [0x01, 0x00, 0x06, 0x03, 0xff];
        let mut it = records(&blob);
        assert_eq!(it.next(), Some(Record { flags: 0x01, event: 0 }));
        assert_eq!(it.next(), Some(Record { flags: 0x06, event: 3 }));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_record_at() {
        // 2x2 map
        let blob = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x04, 0x07];
        assert_eq!(record_at(&blob, 2, 1, 0), Some(Record { flags: WATER, event: 0 }));
        assert_eq!(record_at(&blob, 2, 1, 1).and_then(|r| r.event()), Some(7));
        assert_eq!(record_at(&blob, 2, 2, 0), None);
        assert_eq!(record_at(&blob, 2, 0, 2), None);
    }

    #[test]
    fn test_record_at_huge_row() {
        let blob = [0x01, 0x00, 0x02, 0x00];
        assert_eq!(record_at(&blob, 2, 0, usize::MAX / 2 + 1), None);
        assert_eq!(record_at(&blob, 2, 1, usize::MAX), None);
        assert_eq!(record_at(&blob, usize::MAX, 0, 1), None);
    }

    #[test]
    fn test_record_encode() {
        let record = Record { flags: WATER | EVENT, event: 3 };
        assert_eq!(record.encode(), [0x06, 0x03]);
        assert_eq!(Record::decode(record.encode()), record);
        assert_eq!(record.flags & !KNOWN_FLAGS, 0);
    }
}
