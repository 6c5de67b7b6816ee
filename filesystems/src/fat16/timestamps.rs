// FAT packed date/time values
//
// FAT date: bits 15-9: year (0=1980), bits 8-5: month, bits 4-0: day
// FAT time: bits 15-11: hours, bits 10-5: minutes, bits 4-0: seconds/2

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// A packed FAT date/time pair, kept in its on-disk encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FatTimestamp {
    pub date: u16,
    pub time: u16,
}

impl FatTimestamp {
    pub fn new(date: u16, time: u16) -> Self {
        Self { date, time }
    }

    pub fn year(&self) -> i32 {
        ((self.date >> 9) & 0x7F) as i32 + 1980
    }

    pub fn month(&self) -> u32 {
        ((self.date >> 5) & 0x0F) as u32
    }

    pub fn day(&self) -> u32 {
        (self.date & 0x1F) as u32
    }

    pub fn hours(&self) -> u32 {
        ((self.time >> 11) & 0x1F) as u32
    }

    pub fn minutes(&self) -> u32 {
        ((self.time >> 5) & 0x3F) as u32
    }

    pub fn seconds(&self) -> u32 {
        // FAT stores seconds/2
        ((self.time & 0x1F) * 2) as u32
    }

    /// Calendar time, or `None` if the packed fields are out of range
    /// (an all-zero date is common on images written without a clock).
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year(), self.month(), self.day())?
            .and_hms_opt(self.hours(), self.minutes(), self.seconds())
    }
}
