//! Resolves a `Descriptor` from a firmware variant name

use super::{shupito0, shupito1, shupito2, shupito23, BuildInfo};
use crate::Descriptor;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(strum::EnumString, strum::Display, strum::EnumIter, strum::EnumVariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum DeviceKind {
    /// Original single interface programmer
    Shupito0,
    /// First xmega board: SPI/PDI, tunnel and measurement.
    ///
    /// Built by the `shupito` firmware tree (`fw_main_xmega`), there is no `shupito1` tree.
    Shupito1,
    /// Adds JTAG, CC25xx and SPI programming plus capability payloads
    Shupito2,
    /// Shupito 2.3 hardware with button, led, rename and firmware information
    Shupito23,
}

/// Builds the descriptor of the given firmware variant
pub fn by_kind(kind: DeviceKind, build: &BuildInfo) -> Descriptor {
    match kind {
        DeviceKind::Shupito0 => shupito0::descriptor(),
        DeviceKind::Shupito1 => shupito1::descriptor(),
        DeviceKind::Shupito2 => shupito2::descriptor(),
        DeviceKind::Shupito23 => shupito23::descriptor(build),
    }
}
