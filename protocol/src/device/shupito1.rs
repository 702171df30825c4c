use uuid::Uuid;

use super::{caps, AUX_FLAGS};
use crate::{Descriptor, Leaf, LeafFormat, Node};

pub const DEVICE_ID: Uuid = Uuid::from_u128(0x093d7f32_cdc6_4928_955d_513d17a85358);

/// Leaves carry flags but no payload on this board
pub fn descriptor() -> Descriptor {
    let root = Node::And(vec![
        Node::Or(vec![
            Leaf::new(caps::AVR_ICSP, 1, 8).into(),
            Leaf::new(caps::PDI, 1, 8).into(),
        ]),
        Leaf::new(caps::TUNNEL, 9, 1).with_flags(AUX_FLAGS).into(),
        Leaf::new(caps::MEASUREMENT, 10, 1).with_flags(AUX_FLAGS).into(),
        Leaf::new(caps::MEASUREMENT_AUX, 11, 1)
            .with_flags(AUX_FLAGS)
            .into(),
    ]);

    Descriptor::new(DEVICE_ID, LeafFormat::Flags, root)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn layout() {
        let blob = descriptor().to_bytes().unwrap();
        // version + device id + and tag + or tag + 5 leaves of 20 bytes
        assert_eq!(blob.len(), 1 + 16 + 1 + 1 + 5 * 20);
        assert_eq!(blob[..3], [0x01, 0x09, 0x3d]);
        assert_eq!(blob[17], 0x04);
        assert_eq!(blob[18], 0x82);
    }
}
