//! Message Decoding Engine
//!
//! Extracts signal values from raw CAN payloads based on the message
//! definitions of a [`Schema`](crate::Schema). Handles bit extraction,
//! endianness, sign extension and physical value conversion.
//!
//! The payload is read once into two 64-bit views, one little-endian and one
//! big-endian, and every signal is extracted from the view matching its byte
//! order. Host byte order plays no role.

use crate::config::{BigEndianSupport, DecoderConfig, SignalOrder};
use crate::signals::database::{ByteOrder, Message, Signal, ValueType};
use crate::types::{DbcError, Result};
use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

/// Maximum payload length of a classic CAN frame
pub const MAX_PAYLOAD_LEN: usize = 8;

/// A decoded signal with its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSignal {
    /// Signal name from the DBC
    pub name: String,
    /// Physical value (`raw * factor + offset`)
    pub value: f64,
    /// Engineering unit (may be empty)
    pub unit: String,
    /// Raw value after sign handling, before scaling. Wide enough for both
    /// signed and unsigned 64-bit fields.
    pub raw_value: i128,
    /// Value description from the signal's `VAL_` table
    pub value_description: Option<String>,
}

/// Little- and big-endian 64-bit views of one payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadViews {
    /// Payload byte 0 is the least significant byte
    little_endian: u64,
    /// Payload byte 0 is the most significant byte
    big_endian: u64,
}

impl PayloadViews {
    /// Build both views. Payloads shorter than 8 bytes are zero-padded at
    /// the end.
    pub fn new(payload: &[u8]) -> Result<Self> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(DbcError::PayloadTooLong(payload.len()));
        }

        let mut bytes = [0u8; MAX_PAYLOAD_LEN];
        bytes[..payload.len()].copy_from_slice(payload);

        Ok(Self {
            little_endian: LittleEndian::read_u64(&bytes),
            big_endian: BigEndian::read_u64(&bytes),
        })
    }
}

/// Message decoder - extracts signals from CAN payloads
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode a payload into one physical value per signal
    ///
    /// # Arguments
    /// * `message` - Message definition from the schema
    /// * `payload` - Raw frame data (at most 8 bytes)
    /// * `config` - Output order and big-endian support
    ///
    /// # Returns
    /// * Values in declaration order, or in start-bit order when
    ///   `SignalOrder::StartBit` is configured
    /// * `PayloadTooLong` / `UnsupportedEndianness` errors; no partial output
    pub fn decode_message(
        message: &Message,
        payload: &[u8],
        config: &DecoderConfig,
    ) -> Result<Vec<f64>> {
        let views = PayloadViews::new(payload)?;
        let signals = Self::ordered_signals(message, config)?;

        log::trace!("Decoding {} signals of message {}", signals.len(), message.name);

        Ok(signals
            .into_iter()
            .map(|signal| Self::decode_signal(signal, &views))
            .collect())
    }

    /// Decode a payload into named signals with units and value descriptions
    pub fn decode_signals(
        message: &Message,
        payload: &[u8],
        config: &DecoderConfig,
    ) -> Result<Vec<DecodedSignal>> {
        let views = PayloadViews::new(payload)?;
        let signals = Self::ordered_signals(message, config)?;

        Ok(signals
            .into_iter()
            .map(|signal| {
                let raw_value = Self::raw_value(signal, &views);
                DecodedSignal {
                    name: signal.name.clone(),
                    value: Self::physical_value(signal, raw_value),
                    unit: signal.unit.clone(),
                    raw_value,
                    value_description: signal.describe(raw_value).map(str::to_string),
                }
            })
            .collect())
    }

    /// Decode a single signal into its physical value
    pub fn decode_signal(signal: &Signal, views: &PayloadViews) -> f64 {
        Self::physical_value(signal, Self::raw_value(signal, views))
    }

    /// Signals in output order, after the big-endian capability check
    fn ordered_signals<'m>(message: &'m Message, config: &DecoderConfig) -> Result<Vec<&'m Signal>> {
        if config.big_endian == BigEndianSupport::Reject {
            if let Some(signal) = message
                .signals
                .iter()
                .find(|s| s.byte_order == ByteOrder::BigEndian)
            {
                return Err(DbcError::UnsupportedEndianness(signal.name.clone()));
            }
        }

        let mut signals: Vec<&Signal> = message.signals.iter().collect();
        if config.signal_order == SignalOrder::StartBit {
            // Stable sort: equal start bits keep declaration order
            signals.sort_by_key(|s| s.start_bit);
        }

        Ok(signals)
    }

    /// Apply factor and offset
    fn physical_value(signal: &Signal, raw_value: i128) -> f64 {
        raw_value as f64 * signal.factor + signal.offset
    }

    /// Extract a signal's bits and apply sign handling
    ///
    /// Lengths above 64 read as 64 bits.
    fn raw_value(signal: &Signal, views: &PayloadViews) -> i128 {
        let length = u32::from(signal.length.min(64));
        let bits = match signal.byte_order {
            ByteOrder::LittleEndian => Self::extract_little_endian(views, signal.start_bit, length),
            ByteOrder::BigEndian => Self::extract_big_endian(views, signal.start_bit, length),
        };

        match signal.value_type {
            // A 1-bit field has no room for a sign bit
            ValueType::Signed if length > 1 => match length {
                8 => i128::from(bits as u8 as i8),
                16 => i128::from(bits as u16 as i16),
                32 => i128::from(bits as u32 as i32),
                64 => i128::from(bits as i64),
                _ => i128::from(Self::sign_extend(bits, length)),
            },
            _ => i128::from(bits),
        }
    }

    /// Extract signal with little-endian (Intel) byte order
    ///
    /// The start bit points to the LSB of the signal; bit `n` of the frame is
    /// bit `n % 8` of byte `n / 8`, which is exactly bit `n` of the
    /// little-endian view.
    fn extract_little_endian(views: &PayloadViews, start_bit: u16, length: u32) -> u64 {
        let start_bit = u32::from(start_bit);
        if start_bit >= 64 {
            return 0;
        }
        (views.little_endian >> start_bit) & Self::mask(length)
    }

    /// Extract signal with big-endian (Motorola) byte order
    ///
    /// The DBC start bit points to the MSB of the signal, numbered with
    /// bit 0 = LSB of byte 0. It is first translated to a position counted
    /// from the MSB of byte 0:
    ///
    /// `norm_start = 8 * (start_bit / 8) + (7 - start_bit % 8)`
    ///
    /// after which the signal is a contiguous run of `length` bits in the
    /// big-endian view. Bits past the end of the view read as zero.
    fn extract_big_endian(views: &PayloadViews, start_bit: u16, length: u32) -> u64 {
        let start_bit = u32::from(start_bit);
        let norm_start = 8 * (start_bit / 8) + (7 - start_bit % 8);
        if norm_start >= 64 {
            return 0;
        }

        let length = length.min(64);
        let end = norm_start + length;
        if end <= 64 {
            (views.big_endian >> (64 - end)) & Self::mask(length)
        } else {
            let available = views.big_endian & (u64::MAX >> norm_start);
            (available << (end - 64)) & Self::mask(length)
        }
    }

    /// Mask of the lowest `length` bits
    fn mask(length: u32) -> u64 {
        if length >= 64 {
            u64::MAX
        } else {
            (1u64 << length) - 1
        }
    }

    /// Sign-extend a value from N bits to 64 bits
    ///
    /// If the value's MSB is 1, fill the upper bits with 1s.
    /// This converts unsigned representation to proper signed value.
    fn sign_extend(value: u64, bit_length: u32) -> i64 {
        if bit_length >= 64 {
            return value as i64;
        }

        let sign_bit = 1u64 << (bit_length - 1);
        if (value & sign_bit) != 0 {
            // Negative value - sign extend
            let mask = !0u64 << bit_length;
            (value | mask) as i64
        } else {
            // Positive value
            (value & Self::mask(bit_length)) as i64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::database::tests::test_signal;

    fn views(data: &[u8]) -> PayloadViews {
        PayloadViews::new(data).unwrap()
    }

    fn big_endian_signal(name: &str, start_bit: u16, length: u16) -> Signal {
        Signal {
            byte_order: ByteOrder::BigEndian,
            ..test_signal(name, start_bit, length)
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_payload_views() {
        let v = views(&[0x01, 0x02]);
        assert_eq!(v.little_endian, 0x0201);
        assert_eq!(v.big_endian, 0x0102_0000_0000_0000);
    }

    #[test]
    fn test_payload_too_long() {
        let result = PayloadViews::new(&[0; 9]);
        assert!(matches!(result, Err(DbcError::PayloadTooLong(9))));
    }

    #[test]
    fn test_extract_little_endian_simple() {
        // Signal: 8 bits starting at bit 0 (byte 0)
        let v = views(&[0xAB, 0xCD, 0xEF, 0x12]);
        assert_eq!(MessageDecoder::extract_little_endian(&v, 0, 8), 0xAB);
    }

    #[test]
    fn test_extract_little_endian_cross_byte() {
        // Signal: 16 bits starting at bit 0 (bytes 0-1)
        let v = views(&[0xAB, 0xCD, 0xEF, 0x12]);
        assert_eq!(MessageDecoder::extract_little_endian(&v, 0, 16), 0xCDAB);
        assert_eq!(MessageDecoder::extract_little_endian(&v, 4, 8), 0xDA);
    }

    #[test]
    fn test_extract_little_endian_out_of_range() {
        let v = views(&[0xFF; 8]);
        assert_eq!(MessageDecoder::extract_little_endian(&v, 64, 8), 0);
        assert_eq!(MessageDecoder::extract_little_endian(&v, 60, 8), 0x0F);
        assert_eq!(MessageDecoder::extract_little_endian(&v, 0, 64), u64::MAX);
    }

    #[test]
    fn test_extract_big_endian_simple() {
        // Signal: 8 bits starting at bit 7 (MSB of byte 0)
        let v = views(&[0xAB, 0xCD, 0xEF, 0x12]);
        assert_eq!(MessageDecoder::extract_big_endian(&v, 7, 8), 0xAB);
        assert_eq!(MessageDecoder::extract_big_endian(&v, 7, 16), 0xABCD);
        assert_eq!(MessageDecoder::extract_big_endian(&v, 15, 8), 0xCD);
    }

    #[test]
    fn test_extract_big_endian_unaligned() {
        // Start bit 3 is bit 3 of byte 0: lower nibble of 0xAB, then 0xC
        let v = views(&[0xAB, 0xCD]);
        assert_eq!(MessageDecoder::extract_big_endian(&v, 3, 8), 0xBC);
    }

    #[test]
    fn test_extract_big_endian_past_end() {
        // MSB at byte 7 bit 0, 4 bits long: 1 bit in range, 3 past the end
        let v = views(&[0, 0, 0, 0, 0, 0, 0, 0x01]);
        assert_eq!(MessageDecoder::extract_big_endian(&v, 56, 4), 0b1000);
        assert_eq!(MessageDecoder::extract_big_endian(&v, 64, 4), 0);
    }

    #[test]
    fn test_sign_extend_positive() {
        // 8-bit value 0x7F (127) should remain positive
        assert_eq!(MessageDecoder::sign_extend(0x7F, 8), 127);
    }

    #[test]
    fn test_sign_extend_negative() {
        // 8-bit value 0xFF (-1 in two's complement) should become -1
        assert_eq!(MessageDecoder::sign_extend(0xFF, 8), -1);
    }

    #[test]
    fn test_sign_extend_negative_10bit() {
        assert_eq!(MessageDecoder::sign_extend(0x383, 10), -125);
        assert_eq!(MessageDecoder::sign_extend(0x200, 10), -512);
        assert_eq!(MessageDecoder::sign_extend(0x1FF, 10), 511);
    }

    #[test]
    fn test_sign_for_every_width() {
        for length in 2..=64u16 {
            let top_bit = 1u64 << (length - 1);
            let data = top_bit.to_le_bytes();
            let v = views(&data);

            let mut signed = test_signal("S", 0, length);
            signed.value_type = ValueType::Signed;
            let unsigned = test_signal("U", 0, length);

            assert!(
                MessageDecoder::decode_signal(&signed, &v) < 0.0,
                "signed {}-bit should be negative",
                length
            );
            assert!(
                MessageDecoder::decode_signal(&unsigned, &v) >= 0.0,
                "unsigned {}-bit should be non-negative",
                length
            );
        }
    }

    #[test]
    fn test_full_width_raw_values_exact() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut unsigned = test_signal("Counter", 0, 64);
        unsigned.value_descriptions = vec![crate::signals::database::ValueDescription {
            value: 1,
            description: "One".to_string(),
        }];
        let mut signed = test_signal("Delta", 0, 64);
        signed.value_type = ValueType::Signed;

        let mut message = Message::new(1, "Wide", 8, None);
        message.signals.push(unsigned);
        message.signals.push(signed);

        let decoded =
            MessageDecoder::decode_signals(&message, &data, &DecoderConfig::default()).unwrap();
        assert_eq!(decoded[0].raw_value, i128::from(u64::MAX));
        assert_eq!(decoded[0].value_description, None);
        assert_eq!(decoded[1].raw_value, -1);

        // 2^53 + 1 is not representable as f64
        let odd = (1u64 << 53) + 1;
        let decoded = MessageDecoder::decode_signals(
            &message,
            &odd.to_le_bytes(),
            &DecoderConfig::default(),
        )
        .unwrap();
        assert_eq!(decoded[0].raw_value, i128::from(odd));
        assert_eq!(decoded[1].raw_value, i128::from(odd));
    }

    #[test]
    fn test_oversized_length_reads_64_bits() {
        let v = views(&[0xFF; 8]);
        assert_eq!(MessageDecoder::extract_big_endian(&v, 7, 200), u64::MAX);
        // MSB in byte 7: 8 bits in range, the rest past the end
        assert_eq!(MessageDecoder::extract_big_endian(&v, 63, 200), u64::MAX << 56);

        let wide = big_endian_signal("Wide", 15, 300);
        assert_eq!(MessageDecoder::decode_signal(&wide, &v), (u64::MAX << 8) as f64);
        let wide = test_signal("WideIntel", 0, 300);
        assert_eq!(MessageDecoder::decode_signal(&wide, &v), u64::MAX as f64);
    }

    #[test]
    fn test_one_bit_signed_is_unsigned() {
        let mut signal = test_signal("Flag", 0, 1);
        signal.value_type = ValueType::Signed;
        assert_eq!(MessageDecoder::decode_signal(&signal, &views(&[0x01])), 1.0);
    }

    #[test]
    fn test_factor_and_offset() {
        let mut signal = test_signal("Temperature", 0, 16);
        signal.factor = 0.01;
        signal.offset = -40.0;
        assert_close(MessageDecoder::decode_signal(&signal, &views(&[0x08, 0x27])), 59.92);
    }

    #[test]
    fn test_decode_order_and_reject_big_endian() {
        let mut message = Message::new(1, "M", 8, None);
        message.signals.push(test_signal("High", 8, 8));
        message.signals.push(test_signal("Low", 0, 8));

        let data = [0x11, 0x22];
        let default_order =
            MessageDecoder::decode_message(&message, &data, &DecoderConfig::default()).unwrap();
        assert_eq!(default_order, vec![34.0, 17.0]);

        let config = DecoderConfig::new().with_signal_order(SignalOrder::StartBit);
        let sorted = MessageDecoder::decode_message(&message, &data, &config).unwrap();
        assert_eq!(sorted, vec![17.0, 34.0]);

        message.signals.push(big_endian_signal("Motorola", 23, 8));
        let config = DecoderConfig::new().with_big_endian_support(BigEndianSupport::Reject);
        let result = MessageDecoder::decode_message(&message, &data, &config);
        assert!(matches!(result, Err(DbcError::UnsupportedEndianness(name)) if name == "Motorola"));
    }

    #[test]
    fn test_decode_signals_with_description() {
        let mut signal = test_signal("Gear", 0, 8);
        signal.unit = "-".to_string();
        signal.value_descriptions = vec![crate::signals::database::ValueDescription {
            value: 3,
            description: "Drive".to_string(),
        }];
        let mut message = Message::new(2, "Transmission", 1, None);
        message.signals.push(signal);

        let decoded =
            MessageDecoder::decode_signals(&message, &[3], &DecoderConfig::default()).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].name, "Gear");
        assert_eq!(decoded[0].value, 3.0);
        assert_eq!(decoded[0].raw_value, 3);
        assert_eq!(decoded[0].unit, "-");
        assert_eq!(decoded[0].value_description.as_deref(), Some("Drive"));
    }
}
