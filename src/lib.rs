//! # TI ADS1015 / ADS1115 Driver
//!
//! Each pin produced by [`Ads1x15`] carries a prepared single-shot conversion.
//! Reading a pin writes the config word, waits out the conversion and reads
//! back the result, holding the device lock for the whole cycle so pins
//! sharing a chip never interleave.

#![cfg_attr(not(test), no_std)]

use crate::registers::*;
use byteorder::{BigEndian, ByteOrder};
use core::fmt;
use core::result::Result;
use core::time::Duration;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::{delay, i2c};

pub use crate::profile::{
    best_data_rate, best_gain, DataRate, Gain, GainSetting, Variant, ADS1015_DATA_RATES,
    ADS1115_DATA_RATES, GAINS,
};
pub use crate::registers::ConfigFields;

mod profile;
mod registers;

/// Default I2C device address (ADDR tied to GND).
pub const DEFAULT_DEVICE_ADDRESS: u8 = 0x48;

/// Raw code magnitude of a full-scale reading.
const FULL_SCALE_CODE: i32 = 1 << 15;

/// Margin added to the nominal conversion time before reading the result.
const CONVERSION_MARGIN_NS: u32 = 100_000;

/// The four addresses selectable by strapping the ADDR pin.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Address {
    #[default]
    Gnd = 0x48,
    Vdd = 0x49,
    Sda = 0x4A,
    Scl = 0x4B,
}

impl From<Address> for u8 {
    fn from(address: Address) -> u8 {
        address as u8
    }
}

/// Errors that can occur when using the ADS1x15 driver.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<I2cErr> {
    I2c(I2cErr),
    /// Channel outside 0..=3.
    InvalidChannel(u8),
    /// Only 0-1, 0-3, 1-3 and 2-3 can be measured differentially.
    UnsupportedDifferentialPair { a: u8, b: u8 },
    /// The requested voltage exceeds every gain; carries the largest full-scale.
    GainOutOfRange { max_mv: u32 },
    /// The requested frequency exceeds every data rate; carries the fastest rate.
    RateOutOfRange { max_sps: u32 },
}

impl<I2cErr: fmt::Debug> fmt::Display for Error<I2cErr> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C bus error: {:?}", e),
            Error::InvalidChannel(c) => {
                write!(f, "invalid channel {}, must be between 0 and 3", c)
            }
            Error::UnsupportedDifferentialPair { a, b } => write!(
                f,
                "unsupported difference {} - {}, only 0 - 1, 0 - 3, 1 - 3 or 2 - 3 are allowed",
                a, b
            ),
            Error::GainOutOfRange { max_mv } => {
                write!(f, "the maximum voltage which can be read is {}mV", max_mv)
            }
            Error::RateOutOfRange { max_sps } => {
                write!(f, "the maximum frequency which can be read is {}Hz", max_sps)
            }
        }
    }
}

/// A single conversion result.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub raw: i32,
    pub millivolts: f32,
}

impl Reading {
    /// Scales a raw code against the full-scale voltage of the gain it was taken at.
    pub fn from_raw(raw: i32, full_scale_mv: u32) -> Self {
        Self {
            raw,
            millivolts: raw as f32 * full_scale_mv as f32 / FULL_SCALE_CODE as f32,
        }
    }
}

/// A fully resolved single-shot conversion: what to write, how long to wait
/// and how to scale the result.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PreparedQuery {
    payload: [u8; 3],
    gain: GainSetting,
    rate: DataRate,
    wait_ns: u32,
}

impl PreparedQuery {
    /// Resolves a multiplexer selector, voltage range and minimum frequency
    /// against a variant's tables. No bus I/O happens here.
    pub fn new<E>(
        variant: Variant,
        mux: u8,
        max_mv: f32,
        min_sps: u32,
    ) -> Result<Self, Error<E>> {
        let gain = best_gain(variant.gains(), max_mv)
            .map_err(|max_mv| Error::GainOutOfRange { max_mv })?;
        let rate = best_data_rate(variant.data_rates(), min_sps)
            .map_err(|max_sps| Error::RateOutOfRange { max_sps })?;

        let word = config_word(mux, gain.bits, rate.bits);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "{}: mux {=u8}, {} ({=u32}mV), {=u32} SPS, config {=u16:#x}",
            variant,
            mux,
            gain.gain,
            gain.full_scale_mv,
            rate.sps,
            word
        );

        Ok(Self {
            payload: config_payload(word),
            gain,
            rate,
            wait_ns: 1_000_000_000 / rate.sps + CONVERSION_MARGIN_NS,
        })
    }

    /// Config register write: pointer byte followed by the word big-endian.
    pub fn payload(&self) -> &[u8; 3] {
        &self.payload
    }

    pub fn config(&self) -> ConfigFields {
        ConfigFields::decode(BigEndian::read_u16(&self.payload[1..]))
    }

    pub fn gain(&self) -> GainSetting {
        self.gain
    }

    pub fn data_rate(&self) -> DataRate {
        self.rate
    }

    pub fn full_scale_mv(&self) -> u32 {
        self.gain.full_scale_mv
    }

    /// Time to wait between starting the conversion and reading it back.
    pub fn wait(&self) -> Duration {
        Duration::from_nanos(self.wait_ns as u64)
    }
}

/// A pin that can read an electric potential.
#[allow(async_fn_in_trait)]
pub trait AnalogPin {
    type Error;

    /// The readable range as `(min, max)`.
    fn range(&self) -> (Reading, Reading);

    /// Runs a conversion and returns the result.
    async fn read(&self) -> Result<Reading, Self::Error>;
}

struct Bus<I2C, DELAY> {
    i2c: I2C,
    delay: DELAY,
}

/// ADS1x15 async driver.
///
/// `M` selects the lock flavour: `NoopRawMutex` when every pin is read from
/// one executor, `CriticalSectionRawMutex` when pins are shared across cores
/// or interrupt priorities.
pub struct Ads1x15<M, I2C, DELAY>
where
    M: RawMutex,
{
    bus: Mutex<M, Bus<I2C, DELAY>>,
    address: u8,
    variant: Variant,
}

impl<M, I2C, DELAY, I2cErr> Ads1x15<M, I2C, DELAY>
where
    M: RawMutex,
    I2C: i2c::I2c<Error = I2cErr>,
    DELAY: delay::DelayNs,
{
    /// Creates a driver at the default address. Nothing is written to the
    /// device until a pin is read.
    pub fn new(i2c: I2C, delay: DELAY, variant: Variant) -> Self {
        Self::with_address(i2c, delay, variant, DEFAULT_DEVICE_ADDRESS)
    }

    /// Creates a driver at a specific address, either an [`Address`] or a raw 7-bit value.
    pub fn with_address(i2c: I2C, delay: DELAY, variant: Variant, address: impl Into<u8>) -> Self {
        Self {
            bus: Mutex::new(Bus { i2c, delay }),
            address: address.into(),
            variant,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Consumes the driver, returning the I2C bus and delay provider.
    pub fn release(self) -> (I2C, DELAY) {
        let Bus { i2c, delay } = self.bus.into_inner();
        (i2c, delay)
    }

    /// Returns a pin measuring a single channel against GND.
    ///
    /// # Arguments
    /// channel: Input channel, 0 to 3.
    /// max_mv: Largest magnitude that must be readable without clipping.
    /// min_sps: Slowest acceptable sample rate.
    ///
    pub fn pin_for_channel(
        &self,
        channel: u8,
        max_mv: f32,
        min_sps: u32,
    ) -> Result<Ads1x15Pin<'_, M, I2C, DELAY>, Error<I2cErr>> {
        check_channel(channel)?;
        self.pin_for_mux(channel + 0x04, max_mv, min_sps)
    }

    /// Returns a pin measuring `channel_a - channel_b`.
    ///
    /// Only 0 - 1, 0 - 3, 1 - 3 and 2 - 3 are wired in the input multiplexer.
    pub fn pin_for_difference_of_channels(
        &self,
        channel_a: u8,
        channel_b: u8,
        max_mv: f32,
        min_sps: u32,
    ) -> Result<Ads1x15Pin<'_, M, I2C, DELAY>, Error<I2cErr>> {
        check_channel(channel_a)?;
        check_channel(channel_b)?;
        let mux = match (channel_a, channel_b) {
            (0, 1) => 0,
            (0, 3) => 1,
            (1, 3) => 2,
            (2, 3) => 3,
            (a, b) => return Err(Error::UnsupportedDifferentialPair { a, b }),
        };
        self.pin_for_mux(mux, max_mv, min_sps)
    }

    fn pin_for_mux(
        &self,
        mux: u8,
        max_mv: f32,
        min_sps: u32,
    ) -> Result<Ads1x15Pin<'_, M, I2C, DELAY>, Error<I2cErr>> {
        Ok(Ads1x15Pin {
            adc: self,
            query: PreparedQuery::new(self.variant, mux, max_mv, min_sps)?,
        })
    }

    /// Runs one single-shot conversion described by `query`.
    ///
    /// The device lock is held from the config write until the result has
    /// been read, and released on every return path.
    pub async fn execute(&self, query: &PreparedQuery) -> Result<Reading, Error<I2cErr>> {
        let mut buf = [0u8; 2];
        {
            let mut bus = self.bus.lock().await;

            #[cfg(feature = "defmt")]
            defmt::trace!("{}: start conversion {=[u8]:x}", self.variant, &query.payload[..]);

            bus.i2c
                .write(self.address, &query.payload)
                .await
                .map_err(Error::I2c)?;

            bus.delay.delay_ns(query.wait_ns).await;

            bus.i2c
                .write_read(self.address, &[Register::Conversion as u8], &mut buf)
                .await
                .map_err(Error::I2c)?;
        }

        let reading = Reading::from_raw(BigEndian::read_i16(&buf) as i32, query.full_scale_mv());

        #[cfg(feature = "defmt")]
        defmt::trace!("{}: raw {=i32}", self.variant, reading.raw);

        Ok(reading)
    }
}

fn check_channel<E>(channel: u8) -> Result<(), Error<E>> {
    if channel > 3 {
        return Err(Error::InvalidChannel(channel));
    }
    Ok(())
}

/// A channel or channel difference on an [`Ads1x15`], with its conversion
/// settings resolved.
pub struct Ads1x15Pin<'a, M, I2C, DELAY>
where
    M: RawMutex,
{
    adc: &'a Ads1x15<M, I2C, DELAY>,
    query: PreparedQuery,
}

impl<M, I2C, DELAY> Ads1x15Pin<'_, M, I2C, DELAY>
where
    M: RawMutex,
{
    pub fn query(&self) -> &PreparedQuery {
        &self.query
    }
}

impl<M, I2C, DELAY, I2cErr> AnalogPin for Ads1x15Pin<'_, M, I2C, DELAY>
where
    M: RawMutex,
    I2C: i2c::I2c<Error = I2cErr>,
    DELAY: delay::DelayNs,
{
    type Error = Error<I2cErr>;

    fn range(&self) -> (Reading, Reading) {
        let max = Reading {
            raw: FULL_SCALE_CODE,
            millivolts: self.query.full_scale_mv() as f32,
        };
        let min = Reading {
            raw: -max.raw,
            millivolts: -max.millivolts,
        };
        (min, max)
    }

    async fn read(&self) -> Result<Reading, Self::Error> {
        self.adc.execute(&self.query).await
    }
}

impl<M, I2C, DELAY> fmt::Display for Ads1x15Pin<'_, M, I2C, DELAY>
where
    M: RawMutex,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pin", self.adc.variant)
    }
}
