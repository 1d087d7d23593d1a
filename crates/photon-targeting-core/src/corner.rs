use crate::{Packet, PacketSerde, Pt2};
use serde::{Deserialize, Serialize};

/// Pixel coordinate of one target corner.
///
/// Corner lists are ordered; the order decides the circulation direction the
/// square PnP solver sees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetCorner {
    pub x: f64,
    pub y: f64,
}

impl TargetCorner {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn to_point(self) -> Pt2 {
        Pt2::new(self.x, self.y)
    }
}

impl From<Pt2> for TargetCorner {
    fn from(p: Pt2) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<TargetCorner> for Pt2 {
    fn from(c: TargetCorner) -> Self {
        c.to_point()
    }
}

impl PacketSerde for TargetCorner {
    const TYPE_NAME: &'static str = "TargetCorner";
    const MESSAGE_VERSION: &'static str = "16f6ac0dedc8eaccb951f4895d9e18b6";

    fn pack(&self, packet: &mut Packet) {
        packet.encode_f64(self.x);
        packet.encode_f64(self.y);
    }

    fn unpack(packet: &mut Packet) -> Self {
        let x = packet.decode_f64();
        let y = packet.decode_f64();
        Self { x, y }
    }
}
