use uuid::Uuid;

use super::caps;
use crate::{Descriptor, Leaf, LeafFormat};

pub const DEVICE_ID: Uuid = Uuid::from_u128(0x68a4e349_b109_41d5_99b0_fda1aeca126f);

pub fn descriptor() -> Descriptor {
    Descriptor::new(
        DEVICE_ID,
        LeafFormat::FlagsPayload,
        Leaf::new(caps::AVR_ICSP, 1, 8),
    )
}
