#![allow(dead_code)]

use byteorder::{BigEndian, ByteOrder};

/// Represents the register pointers of the ADS1x15.
#[derive(Clone, Copy)]
#[repr(u8)]
pub(crate) enum Register {
    /// Conversion result (signed, big-endian)
    Conversion = 0x00,
    /// Configuration word
    Config,
    /// Comparator low threshold
    LowThreshold,
    /// Comparator high threshold
    HighThreshold,
}

/// Trait for config word field manipulation.
pub(crate) trait ConfigField {
    fn offset(&self) -> u16;
    fn width(&self) -> u16;

    fn mask(&self) -> u16 {
        ((1 << self.width()) - 1) << self.offset()
    }

    fn get(&self, word: u16) -> u16 {
        (word & self.mask()) >> self.offset()
    }
}

/// Fields of the `Config` register.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Config {
    /// Comparator queue; `0b11` disables the comparator.
    CompQue,
    /// Comparator latching.
    CompLat,
    /// Comparator polarity.
    CompPol,
    /// Comparator mode: 0 = traditional, 1 = window.
    CompMode,
    /// Data rate.
    Dr,
    /// Operating mode: 0 = continuous, 1 = single-shot.
    Mode,
    /// Programmable gain amplifier.
    Pga,
    /// Input multiplexer.
    Mux,
    /// Operational status; write 1 to start a single conversion.
    Os,
}

impl ConfigField for Config {
    fn offset(&self) -> u16 {
        match self {
            Config::CompQue => 0,
            Config::CompLat => 2,
            Config::CompPol => 3,
            Config::CompMode => 4,
            Config::Dr => 5,
            Config::Mode => 8,
            Config::Pga => 9,
            Config::Mux => 12,
            Config::Os => 15,
        }
    }

    fn width(&self) -> u16 {
        match self {
            Config::CompQue => 2,
            Config::Dr | Config::Pga | Config::Mux => 3,
            _ => 1,
        }
    }
}

pub(crate) const OS_SINGLE: u16 = 0x8000;
pub(crate) const MODE_SINGLE: u16 = 0x0100;
pub(crate) const COMP_QUE_DISABLE: u16 = 0x0003;

/// Builds a single-shot config word from its resolved parts.
///
/// `gain_bits` and `rate_bits` are already shifted into place, as they are
/// stored in the profile tables.
pub(crate) fn config_word(mux: u8, gain_bits: u16, rate_bits: u16) -> u16 {
    OS_SINGLE
        | (((mux as u16) & 0x07) << Config::Mux.offset())
        | gain_bits
        | MODE_SINGLE
        | rate_bits
        | COMP_QUE_DISABLE
}

/// Serializes a config word as a register write: pointer byte, then the word
/// big-endian.
pub(crate) fn config_payload(word: u16) -> [u8; 3] {
    let mut payload = [Register::Config as u8, 0, 0];
    BigEndian::write_u16(&mut payload[1..], word);
    payload
}

/// Fields of a config word, as decoded from the register value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigFields {
    pub start_single: bool,
    pub mux: u8,
    pub gain_bits: u16,
    pub single_shot: bool,
    pub rate_bits: u16,
    pub comp_que: u8,
}

impl ConfigFields {
    /// Splits a config word into its fields. Gain and rate bits keep their
    /// register position so they compare directly against the profile tables.
    pub fn decode(word: u16) -> Self {
        Self {
            start_single: Config::Os.get(word) != 0,
            mux: Config::Mux.get(word) as u8,
            gain_bits: word & Config::Pga.mask(),
            single_shot: Config::Mode.get(word) != 0,
            rate_bits: word & Config::Dr.mask(),
            comp_que: Config::CompQue.get(word) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{ADS1015_DATA_RATES, ADS1115_DATA_RATES, GAINS};

    #[test]
    fn test_field_masks() {
        assert_eq!(Config::Os.mask(), 0x8000);
        assert_eq!(Config::Mux.mask(), 0x7000);
        assert_eq!(Config::Pga.mask(), 0x0E00);
        assert_eq!(Config::Mode.mask(), 0x0100);
        assert_eq!(Config::Dr.mask(), 0x00E0);
        assert_eq!(Config::CompQue.mask(), 0x0003);
    }

    #[test]
    fn test_config_word_layout() {
        // Channel 0, gain 1, 250 SPS on the ADS1115.
        let word = config_word(4, 0x0200, 0x00A0);
        assert_eq!(word, 0xC3A3);
        assert_eq!(config_payload(word), [0x01, 0xC3, 0xA3]);
    }

    #[test]
    fn test_decode_every_combination() {
        for rates in [ADS1015_DATA_RATES, ADS1115_DATA_RATES] {
            for mux in 0..8u8 {
                for gain in GAINS {
                    for rate in rates {
                        let fields = ConfigFields::decode(config_word(mux, gain.bits, rate.bits));
                        assert_eq!(fields.mux, mux);
                        assert_eq!(fields.gain_bits, gain.bits);
                        assert_eq!(fields.rate_bits, rate.bits);
                        assert!(fields.start_single);
                        assert!(fields.single_shot);
                        assert_eq!(fields.comp_que, 0b11);
                    }
                }
            }
        }
    }
}
