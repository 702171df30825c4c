use uuid::Uuid;

use super::{
    caps, firmware_info_payload, measurement_payload, programmer_payload, rename_payload,
    BuildInfo, AUX_FLAGS,
};
use crate::{Descriptor, Leaf, LeafFormat, Node};

pub const DEVICE_ID: Uuid = Uuid::from_u128(0x093d7f33_cdc6_4928_955d_513d17a85358);

const PROGRAMMER_CLOCK_HZ: u32 = 16_000_000;
const HW_VERSION: (u8, u8) = (2, 3);
const MAX_NAME_LEN: u16 = 30;

pub fn descriptor(build: &BuildInfo) -> Descriptor {
    let root = Node::And(vec![
        Node::Or(vec![
            Leaf::new(caps::AVR_ICSP, 1, 8)
                .with_payload(programmer_payload(PROGRAMMER_CLOCK_HZ))
                .into(),
            Leaf::new(caps::PDI, 1, 8)
                .with_payload(programmer_payload(PROGRAMMER_CLOCK_HZ))
                .into(),
        ]),
        Leaf::new(caps::MEASUREMENT, 10, 1)
            .with_flags(AUX_FLAGS)
            .with_payload(measurement_payload())
            .into(),
        Leaf::new(caps::FW_INFO, 11, 1)
            .with_flags(AUX_FLAGS)
            .with_payload(firmware_info_payload(HW_VERSION.0, HW_VERSION.1, build))
            .into(),
        Leaf::new(caps::BUTTON, 12, 1).with_flags(AUX_FLAGS).into(),
        Leaf::new(caps::LED, 13, 1).with_flags(AUX_FLAGS).into(),
        Leaf::new(caps::RENAME, 14, 1)
            .with_flags(AUX_FLAGS)
            .with_payload(rename_payload(MAX_NAME_LEN))
            .into(),
    ]);

    Descriptor::new(DEVICE_ID, LeafFormat::FlagsPayload, root)
}

#[cfg(test)]
mod test {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn build_info_lands_in_firmware_info() {
        let build = BuildInfo {
            timestamp: 1,
            utc_offset_minutes: 120,
            revision: Bytes::from_static(b"\x12\x34\x56"),
        };
        let descriptor = descriptor(&build);
        let Node::And(children) = &descriptor.root else {
            panic!("root should be an AND group");
        };
        let Node::Leaf(info) = &children[2] else {
            panic!("third child should be the firmware information leaf");
        };
        assert_eq!(info.capability_id, caps::FW_INFO);
        assert_eq!(info.payload[..], [1, 2, 3, 1, 0, 0, 0, 120, 0, 0x12, 0x34, 0x56]);
    }
}
