//! Big-endian wire codec.
//!
//! A [`Packet`] is an append-only write buffer with an independent read
//! cursor. Reads past the end never fail: the offending read logs one
//! warning, marks the packet exhausted and yields the zero value; every
//! later read yields zero silently. A schema mismatch between producer and
//! consumer therefore shows up as a warning plus zeroed fields instead of a
//! crash.

use crate::{Pose3, Rot3};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use std::mem::size_of;

/// Types with a stable binary layout inside a [`Packet`].
pub trait PacketSerde: Sized {
    /// Stable message identifier.
    const TYPE_NAME: &'static str;
    /// Schema hash; changes whenever the layout changes.
    const MESSAGE_VERSION: &'static str;

    fn pack(&self, packet: &mut Packet);
    fn unpack(packet: &mut Packet) -> Self;

    fn to_bytes(&self) -> Bytes {
        let mut packet = Packet::new();
        self.pack(&mut packet);
        packet.into_bytes()
    }

    fn from_bytes(data: &[u8]) -> Self {
        let mut packet = Packet::from_bytes(data);
        Self::unpack(&mut packet)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Packet {
    buf: BytesMut,
    read_pos: usize,
    exhausted: bool,
}

macro_rules! primitive {
    ($enc:ident, $dec:ident, $ty:ty, $put:ident, $get:ident) => {
        #[inline]
        pub fn $enc(&mut self, value: $ty) {
            self.buf.$put(value);
        }

        pub fn $dec(&mut self) -> $ty {
            self.take(size_of::<$ty>(), stringify!($ty))
                .map(|mut bytes| bytes.$get())
                .unwrap_or_default()
        }
    };
}

impl Packet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Wrap received bytes for decoding.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            buf: BytesMut::from(data),
            ..Self::default()
        }
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Total number of bytes written so far.
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    /// Bytes left in front of the read cursor.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.read_pos)
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Drop all content and reset the read cursor.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.read_pos = 0;
        self.exhausted = false;
    }

    fn take(&mut self, len: usize, what: &'static str) -> Option<&[u8]> {
        if self.exhausted {
            return None;
        }
        if self.remaining() < len {
            log::warn!(
                "packet exhausted: tried to read {what} ({len} bytes) at offset {} of {}; \
                 producer and consumer message versions probably differ",
                self.read_pos,
                self.buf.len()
            );
            self.exhausted = true;
            return None;
        }
        let start = self.read_pos;
        self.read_pos += len;
        Some(&self.buf[start..start + len])
    }

    primitive!(encode_i8, decode_i8, i8, put_i8, get_i8);
    primitive!(encode_u8, decode_u8, u8, put_u8, get_u8);
    primitive!(encode_i16, decode_i16, i16, put_i16, get_i16);
    primitive!(encode_i32, decode_i32, i32, put_i32, get_i32);
    primitive!(encode_i64, decode_i64, i64, put_i64, get_i64);
    primitive!(encode_f32, decode_f32, f32, put_f32, get_f32);
    primitive!(encode_f64, decode_f64, f64, put_f64, get_f64);

    #[inline]
    pub fn encode_bool(&mut self, value: bool) {
        self.encode_u8(u8::from(value));
    }

    pub fn decode_bool(&mut self) -> bool {
        self.decode_u8() != 0
    }

    /// Translation (x, y, z) followed by the quaternion (w, x, y, z).
    pub fn encode_pose(&mut self, pose: &Pose3) {
        let t = &pose.translation.vector;
        self.encode_f64(t.x);
        self.encode_f64(t.y);
        self.encode_f64(t.z);
        let q = pose.rotation.quaternion();
        self.encode_f64(q.w);
        self.encode_f64(q.i);
        self.encode_f64(q.j);
        self.encode_f64(q.k);
    }

    pub fn decode_pose(&mut self) -> Pose3 {
        let x = self.decode_f64();
        let y = self.decode_f64();
        let z = self.decode_f64();
        let w = self.decode_f64();
        let qx = self.decode_f64();
        let qy = self.decode_f64();
        let qz = self.decode_f64();
        Isometry3::from_parts(Translation3::new(x, y, z), normalized_rotation(w, qx, qy, qz))
    }

    pub fn encode<T: PacketSerde>(&mut self, value: &T) {
        value.pack(self);
    }

    pub fn decode<T: PacketSerde>(&mut self) -> T {
        T::unpack(self)
    }

    /// `u8` count followed by the items. Lists longer than 255 are truncated.
    pub fn encode_list<T: PacketSerde>(&mut self, items: &[T]) {
        let len = clamp_list_len(items.len());
        self.encode_u8(len as u8);
        for item in &items[..len] {
            item.pack(self);
        }
    }

    pub fn decode_list<T: PacketSerde>(&mut self) -> Vec<T> {
        let len = self.decode_u8() as usize;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            if self.exhausted {
                break;
            }
            out.push(T::unpack(self));
        }
        out
    }

    pub fn encode_i16_list(&mut self, items: &[i16]) {
        let len = clamp_list_len(items.len());
        self.encode_u8(len as u8);
        for &item in &items[..len] {
            self.encode_i16(item);
        }
    }

    pub fn decode_i16_list(&mut self) -> Vec<i16> {
        let len = self.decode_u8() as usize;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            if self.exhausted {
                break;
            }
            out.push(self.decode_i16());
        }
        out
    }

    /// Presence flag followed by the value.
    pub fn encode_optional<T: PacketSerde>(&mut self, value: Option<&T>) {
        self.encode_bool(value.is_some());
        if let Some(v) = value {
            v.pack(self);
        }
    }

    pub fn decode_optional<T: PacketSerde>(&mut self) -> Option<T> {
        if self.decode_bool() {
            Some(T::unpack(self))
        } else {
            None
        }
    }
}

fn clamp_list_len(len: usize) -> usize {
    if len > u8::MAX as usize {
        log::warn!("list of {len} items truncated to {} on encode", u8::MAX);
        u8::MAX as usize
    } else {
        len
    }
}

fn normalized_rotation(w: f64, x: f64, y: f64, z: f64) -> Rot3 {
    let q = Quaternion::new(w, x, y, z);
    let norm = q.norm();
    if !norm.is_finite() || norm <= f64::EPSILON {
        return UnitQuaternion::identity();
    }
    UnitQuaternion::from_quaternion(q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose_from_xyz_rpy;
    use approx::assert_relative_eq;

    #[test]
    fn primitives_are_big_endian() {
        let mut p = Packet::new();
        p.encode_i16(0x0102);
        p.encode_i32(-2);
        p.encode_bool(true);
        assert_eq!(p.as_bytes(), &[0x01, 0x02, 0xff, 0xff, 0xff, 0xfe, 0x01]);
        assert_eq!(p.decode_i16(), 0x0102);
        assert_eq!(p.decode_i32(), -2);
        assert!(p.decode_bool());
        assert_eq!(p.remaining(), 0);
        assert!(!p.is_exhausted());
    }

    #[test]
    fn empty_buffer_decodes_zero_values() {
        let mut p = Packet::from_bytes(&[]);
        assert_eq!(p.decode_i8(), 0);
        assert!(p.is_exhausted());
        assert_eq!(p.decode_u8(), 0);
        assert_eq!(p.decode_i16(), 0);
        assert_eq!(p.decode_i32(), 0);
        assert_eq!(p.decode_i64(), 0);
        assert!(!p.decode_bool());
        assert_eq!(p.decode_f32(), 0.0);
        assert_eq!(p.decode_f64(), 0.0);
        assert_eq!(p.decode_pose(), Pose3::identity());
        assert!(p.is_exhausted());
    }

    #[test]
    fn partial_read_does_not_consume_tail() {
        let mut p = Packet::from_bytes(&[0x00, 0x07, 0x01]);
        assert_eq!(p.decode_i16(), 7);
        assert_eq!(p.decode_i32(), 0);
        assert!(p.is_exhausted());
        // the cursor did not move past the short field
        assert_eq!(p.remaining(), 1);
        assert_eq!(p.decode_u8(), 0);
    }

    #[test]
    fn pose_round_trips_and_renormalizes() {
        let pose = pose_from_xyz_rpy(1.5, -0.25, 0.75, 0.1, 0.2, -2.4);
        let mut p = Packet::new();
        p.encode_pose(&pose);
        assert_eq!(p.size(), 7 * 8);
        assert_relative_eq!(p.decode_pose(), pose, epsilon = 1e-12);

        let mut raw = Packet::new();
        for v in [0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0] {
            raw.encode_f64(v);
        }
        let decoded = raw.decode_pose();
        assert_relative_eq!(decoded.rotation.quaternion().w, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_quaternion_decodes_to_identity() {
        let mut p = Packet::from_bytes(&[0u8; 56]);
        assert_eq!(p.decode_pose(), Pose3::identity());
        assert!(!p.is_exhausted());
    }

    #[test]
    fn clear_resets_cursor_and_flag() {
        let mut p = Packet::from_bytes(&[1]);
        let _ = p.decode_i64();
        assert!(p.is_exhausted());
        p.clear();
        assert!(!p.is_exhausted());
        assert_eq!(p.size(), 0);
        p.encode_i64(42);
        assert_eq!(p.decode_i64(), 42);
    }
}
