//! Capability trees of the known firmware variants
//!
//! This is where support for other boards should be added

use bytes::{BufMut, Bytes, BytesMut};

mod probe;
pub use probe::{by_kind, DeviceKind};

pub mod shupito0;
pub mod shupito1;
pub mod shupito2;
pub mod shupito23;

/// Well known capability identifiers
pub mod caps {
    use uuid::Uuid;

    /// AVR in-circuit serial programming, also used as plain SPI on the first boards
    pub const AVR_ICSP: Uuid = Uuid::from_u128(0x46dbc865_b4d0_466b_9b70_2f3f5b264e65);
    /// Atmel XMEGA program and debug interface
    pub const PDI: Uuid = Uuid::from_u128(0x71efb903_3030_4fd3_8896_1946aba37efc);
    pub const JTAG: Uuid = Uuid::from_u128(0xee047e35_dec8_48ab_b194_e3762c8f6b66);
    /// TI CC25xx debug interface
    pub const CC25XX: Uuid = Uuid::from_u128(0x76e37480_3f61_4e7a_9b1b_37af6bd418fa);
    pub const SPI: Uuid = Uuid::from_u128(0x633125ab_32e0_49ec_b240_7d845bb70b2d);
    /// UART tunnel
    pub const TUNNEL: Uuid = Uuid::from_u128(0x356e9bf7_8718_4965_94a4_0be370c8797c);
    /// Target voltage measurement
    pub const MEASUREMENT: Uuid = Uuid::from_u128(0x1d4738a0_fc34_4f71_aa73_57881b278cb1);
    pub const MEASUREMENT_AUX: Uuid = Uuid::from_u128(0x0f75b62c_e9ad_4840_ac43_eb28b12cb080);
    /// Firmware information and update
    pub const FW_INFO: Uuid = Uuid::from_u128(0xc49124d9_4629_4aef_ae35_ddc32c21b279);
    pub const BUTTON: Uuid = Uuid::from_u128(0xe5e646a8_beb6_4a68_91f2_f005c72e9e57);
    pub const LED: Uuid = Uuid::from_u128(0x9034d141_c47e_406b_a6fd_3f5887729f8f);
    /// Device renaming
    pub const RENAME: Uuid = Uuid::from_u128(0x64d5bf39_468a_4fbb_80bb_334d8ca3ad81);

    const NAMES: &[(Uuid, &str)] = &[
        (AVR_ICSP, "avr_icsp"),
        (PDI, "pdi"),
        (JTAG, "jtag"),
        (CC25XX, "cc25xx"),
        (SPI, "spi"),
        (TUNNEL, "tunnel"),
        (MEASUREMENT, "measurement"),
        (MEASUREMENT_AUX, "measurement_aux"),
        (FW_INFO, "fw_info"),
        (BUTTON, "button"),
        (LED, "led"),
        (RENAME, "rename"),
    ];

    /// Returns a short name for a well known capability
    pub fn name(id: &Uuid) -> Option<&'static str> {
        NAMES.iter().find(|(known, _)| known == id).map(|&(_, name)| name)
    }
}

/// Flags of the always available auxiliary capabilities
pub const AUX_FLAGS: u8 = 0x03;

/// Version of the payload layouts below
const PAYLOAD_VERSION: u8 = 1;

/// Build metadata embedded in the firmware information capability
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildInfo {
    /// Seconds since the unix epoch
    pub timestamp: u32,
    /// East of UTC
    pub utc_offset_minutes: i16,
    /// Source revision hash
    pub revision: Bytes,
}

/// Configuration of the programming interfaces: clock, minimum and maximum speed divisor
fn programmer_payload(clock_hz: u32) -> Bytes {
    let mut buf = BytesMut::with_capacity(9);
    buf.put_u8(PAYLOAD_VERSION);
    buf.put_u32_le(clock_hz);
    buf.put_u16_le(1);
    buf.put_u16_le(1 << 12);
    buf.freeze()
}

/// A single 32 bit parameter: a clock, a baud rate or a scale
fn u32_payload(value: u32) -> Bytes {
    let mut buf = BytesMut::with_capacity(5);
    buf.put_u8(PAYLOAD_VERSION);
    buf.put_u32_le(value);
    buf.freeze()
}

/// 16.16 fixed point millivolts per measurement unit
const MILLIVOLTS_PER_UNIT: u32 = 0x0002_b401;

fn measurement_payload() -> Bytes {
    u32_payload(MILLIVOLTS_PER_UNIT)
}

fn firmware_info_payload(hw_major: u8, hw_minor: u8, build: &BuildInfo) -> Bytes {
    let mut buf = BytesMut::with_capacity(9 + build.revision.len());
    buf.put_u8(PAYLOAD_VERSION);
    buf.put_u8(hw_major);
    buf.put_u8(hw_minor);
    buf.put_u32_le(build.timestamp);
    buf.put_i16_le(build.utc_offset_minutes);
    buf.extend_from_slice(&build.revision);
    buf.freeze()
}

fn rename_payload(max_name_len: u16) -> Bytes {
    let mut buf = BytesMut::with_capacity(3);
    buf.put_u8(PAYLOAD_VERSION);
    buf.put_u16_le(max_name_len);
    buf.freeze()
}
