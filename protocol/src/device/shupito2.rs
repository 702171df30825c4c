use uuid::Uuid;

use super::{caps, measurement_payload, programmer_payload, u32_payload, AUX_FLAGS};
use crate::{Descriptor, Leaf, LeafFormat, Node};

pub const DEVICE_ID: Uuid = Uuid::from_u128(0x093d7f32_cdc6_4928_955d_513d17a85358);

const PROGRAMMER_CLOCK_HZ: u32 = 16_000_000;
const JTAG_CLOCK_HZ: u32 = 32_000_000;
const TUNNEL_BAUD_RATE: u32 = 2_000_000;

pub fn descriptor() -> Descriptor {
    let programmers = vec![
        Leaf::new(caps::AVR_ICSP, 1, 8)
            .with_payload(programmer_payload(PROGRAMMER_CLOCK_HZ))
            .into(),
        Leaf::new(caps::PDI, 1, 8)
            .with_payload(programmer_payload(PROGRAMMER_CLOCK_HZ))
            .into(),
        Leaf::new(caps::JTAG, 1, 4)
            .with_payload(u32_payload(JTAG_CLOCK_HZ))
            .into(),
        Leaf::new(caps::CC25XX, 1, 5)
            .with_payload(programmer_payload(PROGRAMMER_CLOCK_HZ))
            .into(),
        Leaf::new(caps::SPI, 1, 3)
            .with_payload(programmer_payload(PROGRAMMER_CLOCK_HZ))
            .into(),
    ];

    let root = Node::And(vec![
        Node::Or(programmers),
        Leaf::new(caps::TUNNEL, 9, 1)
            .with_flags(AUX_FLAGS)
            .with_payload(u32_payload(TUNNEL_BAUD_RATE))
            .into(),
        Leaf::new(caps::MEASUREMENT, 10, 1)
            .with_payload(measurement_payload())
            .into(),
    ]);

    Descriptor::new(DEVICE_ID, LeafFormat::FlagsPayload, root)
}
