//! Gain and data rate capability tables, and the nearest-fit selection over them.

use core::fmt;

/// Programmable gain amplifier setting.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    TwoThirds,
    One,
    Two,
    Four,
    Eight,
    Sixteen,
}

/// A gain, its config bits and the full-scale voltage it resolves.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GainSetting {
    pub gain: Gain,
    pub bits: u16,
    pub full_scale_mv: u32,
}

/// A data rate in samples per second and its config bits.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataRate {
    pub sps: u32,
    pub bits: u16,
}

const fn gain(gain: Gain, bits: u16, full_scale_mv: u32) -> GainSetting {
    GainSetting {
        gain,
        bits,
        full_scale_mv,
    }
}

const fn rate(sps: u32, bits: u16) -> DataRate {
    DataRate { sps, bits }
}

/// Gain table shared by both variants. Full-scale strictly decreases with gain.
pub const GAINS: &[GainSetting] = &[
    gain(Gain::TwoThirds, 0x0000, 6144),
    gain(Gain::One, 0x0200, 4096),
    gain(Gain::Two, 0x0400, 2048),
    gain(Gain::Four, 0x0600, 1024),
    gain(Gain::Eight, 0x0800, 512),
    gain(Gain::Sixteen, 0x0A00, 256),
];

pub const ADS1015_DATA_RATES: &[DataRate] = &[
    rate(128, 0x0000),
    rate(250, 0x0020),
    rate(490, 0x0040),
    rate(920, 0x0060),
    rate(1600, 0x0080),
    rate(2400, 0x00A0),
    rate(3300, 0x00C0),
];

pub const ADS1115_DATA_RATES: &[DataRate] = &[
    rate(8, 0x0000),
    rate(16, 0x0020),
    rate(32, 0x0040),
    rate(64, 0x0060),
    rate(128, 0x0080),
    rate(250, 0x00A0),
    rate(475, 0x00C0),
    rate(860, 0x00E0),
];

/// Chip variant, selecting the data rate table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Variant {
    /// 12-bit, 128 to 3300 SPS.
    Ads1015,
    /// 16-bit, 8 to 860 SPS.
    Ads1115,
}

impl Variant {
    pub fn data_rates(&self) -> &'static [DataRate] {
        match self {
            Variant::Ads1015 => ADS1015_DATA_RATES,
            Variant::Ads1115 => ADS1115_DATA_RATES,
        }
    }

    pub fn gains(&self) -> &'static [GainSetting] {
        GAINS
    }

    pub fn name(&self) -> &'static str {
        match self {
            Variant::Ads1015 => "ADS1015",
            Variant::Ads1115 => "ADS1115",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Picks the gain with the smallest full-scale that still covers `max_mv`.
///
/// On failure returns the largest full-scale in the table. When two entries
/// are equally close the first one in table order wins.
pub fn best_gain(gains: &[GainSetting], max_mv: f32) -> Result<GainSetting, u32> {
    let mut best: Option<(GainSetting, f32)> = None;
    let mut max = 0;

    for setting in gains {
        max = max.max(setting.full_scale_mv);
        let diff = setting.full_scale_mv as f32 - max_mv;
        if diff >= 0.0 && best.map_or(true, |(_, d)| diff < d) {
            best = Some((*setting, diff));
        }
    }

    best.map(|(setting, _)| setting).ok_or(max)
}

/// Picks the slowest rate that still meets `min_sps`.
///
/// On failure returns the fastest rate in the table.
pub fn best_data_rate(rates: &[DataRate], min_sps: u32) -> Result<DataRate, u32> {
    let mut best: Option<DataRate> = None;
    let mut max = 0;

    for rate in rates {
        max = max.max(rate.sps);
        if rate.sps >= min_sps && best.map_or(true, |b| rate.sps < b.sps) {
            best = Some(*rate);
        }
    }

    best.ok_or(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_scale_strictly_decreasing() {
        for pair in GAINS.windows(2) {
            assert!(pair[0].full_scale_mv > pair[1].full_scale_mv);
        }
    }

    #[test]
    fn test_rates_strictly_increasing() {
        for rates in [ADS1015_DATA_RATES, ADS1115_DATA_RATES] {
            for pair in rates.windows(2) {
                assert!(pair[0].sps < pair[1].sps);
            }
        }
    }

    #[test]
    fn test_best_gain_exact_and_between() {
        assert_eq!(best_gain(GAINS, 4096.0).unwrap().gain, Gain::One);
        assert_eq!(best_gain(GAINS, 3300.0).unwrap().gain, Gain::One);
        assert_eq!(best_gain(GAINS, 4096.5).unwrap().gain, Gain::TwoThirds);
        assert_eq!(best_gain(GAINS, 0.0).unwrap().gain, Gain::Sixteen);
        assert_eq!(best_gain(GAINS, 257.0).unwrap().gain, Gain::Eight);
    }

    #[test]
    fn test_best_gain_sweep() {
        for mv in 0..=6144u32 {
            let setting = best_gain(GAINS, mv as f32).unwrap();
            assert!(setting.full_scale_mv >= mv);
            // No tighter gain would have covered the request.
            assert!(GAINS
                .iter()
                .filter(|g| g.full_scale_mv >= mv)
                .all(|g| g.full_scale_mv >= setting.full_scale_mv));
        }
    }

    #[test]
    fn test_best_gain_out_of_range() {
        assert_eq!(best_gain(GAINS, 6144.1), Err(6144));
        assert_eq!(best_gain(GAINS, 10_000.0), Err(6144));
    }

    #[test]
    fn test_best_data_rate_sweep() {
        for rates in [ADS1015_DATA_RATES, ADS1115_DATA_RATES] {
            let fastest = rates[rates.len() - 1].sps;
            for sps in 0..=fastest {
                let rate = best_data_rate(rates, sps).unwrap();
                assert!(rate.sps >= sps);
                assert!(rates
                    .iter()
                    .filter(|r| r.sps >= sps)
                    .all(|r| r.sps >= rate.sps));
            }
            assert_eq!(best_data_rate(rates, fastest + 1), Err(fastest));
        }
    }

    #[test]
    fn test_best_data_rate_examples() {
        assert_eq!(best_data_rate(ADS1115_DATA_RATES, 200).unwrap().sps, 250);
        assert_eq!(best_data_rate(ADS1115_DATA_RATES, 250).unwrap().sps, 250);
        assert_eq!(best_data_rate(ADS1115_DATA_RATES, 1).unwrap().sps, 8);
        assert_eq!(best_data_rate(ADS1015_DATA_RATES, 1).unwrap().sps, 128);
        assert_eq!(best_data_rate(ADS1015_DATA_RATES, 3301), Err(3300));
        assert_eq!(best_data_rate(ADS1115_DATA_RATES, 861), Err(860));
    }

    #[test]
    fn test_variant_tables() {
        assert_eq!(Variant::Ads1015.data_rates().len(), 7);
        assert_eq!(Variant::Ads1115.data_rates().len(), 8);
        assert_eq!(Variant::Ads1015.gains(), Variant::Ads1115.gains());
        assert_eq!(Variant::Ads1115.name(), "ADS1115");
    }
}
