//! Byte-buffer engine
//!
//! The buffer value type plus the codecs behind it:
//!
//! - [`arena`]: shared backing store; views alias it deliberately
//! - [`numeric`]: fixed-width and width-parameterized accessors
//! - [`encoding`]: text encodings, validity, transcoding
//! - [`search`]: linear-time scan primitives
//! - [`iter`]: live index/value/entry cursors
//!
//! A [`ByteBuffer`] is a window (offset + fixed length) into an arena.
//! Slicing shares the arena; writes through any overlapping view are
//! mutually visible. Everything is invocation-scoped: arenas never
//! cross invocations.

pub mod arena;
pub mod encoding;
pub mod iter;
pub mod numeric;
pub mod search;

use std::cmp::Ordering;

use serde_json::json;

use crate::config::limits::MAX_LENGTH;
use crate::config::types::{EngineError, Result};
use self::arena::Arena;
use self::encoding::Encoding;
use self::iter::{Entries, Keys, Values};

/// Fill argument for `allocate` and `fill`: a byte-valued integer, a
/// raw pattern, or text encoded per the fill encoding.
#[derive(Clone, Debug)]
pub enum FillValue {
    Int(f64),
    Bytes(Vec<u8>),
    Text(String),
}

/// Search needle: a byte-valued integer (masked mod 256), a raw byte
/// sequence, or text encoded per the search encoding.
#[derive(Clone, Debug)]
pub enum Needle {
    Byte(f64),
    Bytes(Vec<u8>),
    Text(String),
}

/// Anything readable as "numeric indices + length", for the duck-typed
/// JSON form.
pub trait ByteIndexed {
    fn length(&self) -> usize;
    fn byte_at(&self, index: usize) -> u8;
}

impl ByteIndexed for [u8] {
    fn length(&self) -> usize {
        self.len()
    }
    fn byte_at(&self, index: usize) -> u8 {
        self[index]
    }
}

impl ByteIndexed for Vec<u8> {
    fn length(&self) -> usize {
        self.len()
    }
    fn byte_at(&self, index: usize) -> u8 {
        self[index]
    }
}

/// `{"type":"Buffer","data":[...]}` over any byte-indexed value.
pub fn buffer_to_json<T: ByteIndexed + ?Sized>(value: &T) -> serde_json::Value {
    let data: Vec<serde_json::Value> = (0..value.length())
        .map(|i| json!(value.byte_at(i)))
        .collect();
    json!({ "type": "Buffer", "data": data })
}

/// Fixed-length mutable byte buffer backed by a shared arena.
#[derive(Clone)]
pub struct ByteBuffer {
    arena: Arena,
    offset: usize,
    len: usize,
}

impl ByteBuffer {
    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Allocate a new buffer. Absent fill means zero-fill; an explicit
    /// fill value is applied over the whole length.
    pub fn allocate(
        length: f64,
        fill: Option<&FillValue>,
        fill_encoding: Option<Encoding>,
    ) -> Result<ByteBuffer> {
        let len = checked_length("size", length)?;
        let buf = ByteBuffer::owning(Arena::zeroed(len));
        if let Some(value) = fill {
            buf.fill(value, None, None, fill_encoding)?;
        }
        Ok(buf)
    }

    /// Allocation escape hatch: same length contract, but the content
    /// is unspecified until written. Never auto zero-fills.
    pub fn allocate_fast(length: f64) -> Result<ByteBuffer> {
        let len = checked_length("size", length)?;
        Ok(ByteBuffer::owning(Arena::zeroed(len)))
    }

    /// Independent copy of a byte sequence.
    pub fn from_bytes(source: &[u8]) -> ByteBuffer {
        ByteBuffer::owning(Arena::from_vec(source.to_vec()))
    }

    /// Decode text into a fresh arena.
    pub fn from_text(text: &str, encoding: Encoding) -> ByteBuffer {
        ByteBuffer::owning(Arena::from_vec(encoding::encode(text, encoding)))
    }

    /// Build from a list of guest values: numeric entries are masked to
    /// a byte, everything else becomes 0.
    pub fn from_list(items: &[serde_json::Value]) -> ByteBuffer {
        let bytes: Vec<u8> = items
            .iter()
            .map(|item| item.as_f64().map(mask_byte).unwrap_or(0))
            .collect();
        ByteBuffer::owning(Arena::from_vec(bytes))
    }

    /// Deliberate zero-copy: a view over memory the caller already
    /// owns. The only construction path that does not copy.
    pub fn view_of_arena(arena: &Arena, offset: f64, length: f64) -> Result<ByteBuffer> {
        let offset = checked_length("offset", offset)?;
        let len = checked_length("length", length)?;
        if offset.saturating_add(len) > arena.capacity() {
            return Err(EngineError::out_of_range(format!(
                "The view [{}, {}) is out of range for an arena of {} bytes",
                offset,
                offset + len,
                arena.capacity()
            )));
        }
        Ok(ByteBuffer {
            arena: arena.clone(),
            offset,
            len,
        })
    }

    fn owning(arena: Arena) -> ByteBuffer {
        let len = arena.capacity();
        ByteBuffer {
            arena,
            offset: 0,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The backing arena handle, for deliberate view construction.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Copy the view's bytes out.
    pub fn bytes(&self) -> Vec<u8> {
        self.arena.with(self.offset, self.len, |w| w.to_vec())
    }

    /// Read access to the raw window.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        self.arena.with(self.offset, self.len, f)
    }

    // -----------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------

    /// A view sharing this buffer's arena. Negative indices count from
    /// the end, out-of-range indices clamp, `end <= start` yields an
    /// empty view. Mutation through either side is visible to both.
    pub fn slice(&self, start: Option<f64>, end: Option<f64>) -> ByteBuffer {
        let start = self.clamp_view_index(start, 0);
        let end = self.clamp_view_index(end, self.len);
        let len = end.saturating_sub(start);
        ByteBuffer {
            arena: self.arena.clone(),
            offset: self.offset + start,
            len,
        }
    }

    pub fn subarray(&self, start: Option<f64>, end: Option<f64>) -> ByteBuffer {
        self.slice(start, end)
    }

    fn clamp_view_index(&self, value: Option<f64>, default: usize) -> usize {
        let v = match value {
            None => return default,
            Some(v) if v.is_nan() => return 0,
            Some(v) => v.trunc(),
        };
        if v < 0.0 {
            let from_end = self.len as f64 + v;
            if from_end < 0.0 {
                0
            } else {
                from_end as usize
            }
        } else if v > self.len as f64 {
            self.len
        } else {
            v as usize
        }
    }

    // -----------------------------------------------------------------
    // Bulk operations
    // -----------------------------------------------------------------

    /// Copy a source range into `target`, returning the number of
    /// bytes copied. Overlapping ranges within one arena copy as if
    /// through an intermediate buffer.
    pub fn copy_to(
        &self,
        target: &ByteBuffer,
        target_start: Option<f64>,
        source_start: Option<f64>,
        source_end: Option<f64>,
    ) -> Result<usize> {
        let target_start = checked_position("targetStart", target_start, 0, target.len)?;
        let source_start = checked_position("sourceStart", source_start, 0, self.len)?;
        let source_end = match source_end {
            None => self.len,
            // The end bound clamps instead of erroring.
            Some(v) => checked_position("sourceEnd", Some(v), self.len, usize::MAX)?.min(self.len),
        };

        let available = source_end.saturating_sub(source_start);
        let room = target.len - target_start;
        let count = available.min(room);
        if count == 0 {
            return Ok(0);
        }

        let src_abs = self.offset + source_start;
        let dst_abs = target.offset + target_start;
        if Arena::same_region(&self.arena, &target.arena) {
            let span = src_abs.max(dst_abs) + count;
            self.arena.with_mut(0, span, |w| {
                w.copy_within(src_abs..src_abs + count, dst_abs);
            });
        } else {
            Arena::with_pair(
                &target.arena,
                dst_abs,
                count,
                &self.arena,
                src_abs,
                count,
                |dst, src| dst.copy_from_slice(src),
            );
        }
        Ok(count)
    }

    /// Lexicographic unsigned-byte comparison of two whole buffers.
    pub fn compare(a: &ByteBuffer, b: &ByteBuffer) -> Ordering {
        a.with_bytes(|x| b.with_bytes(|y| x.cmp(y)))
    }

    /// Range form: compares `self[source_start..source_end]` against
    /// `target[target_start..target_end]`. Agrees with the static form
    /// when every bound is absent.
    pub fn compare_with(
        &self,
        target: &ByteBuffer,
        target_start: Option<f64>,
        target_end: Option<f64>,
        source_start: Option<f64>,
        source_end: Option<f64>,
    ) -> Result<Ordering> {
        let ts = checked_position("targetStart", target_start, 0, target.len)?;
        let te = checked_position("targetEnd", target_end, target.len, target.len)?;
        let ss = checked_position("sourceStart", source_start, 0, self.len)?;
        let se = checked_position("sourceEnd", source_end, self.len, self.len)?;
        let target_range = target.slice(Some(ts as f64), Some(te as f64));
        let source_range = self.slice(Some(ss as f64), Some(se as f64));
        Ok(ByteBuffer::compare(&source_range, &target_range))
    }

    pub fn equals(&self, other: &ByteBuffer) -> bool {
        ByteBuffer::compare(self, other) == Ordering::Equal
    }

    /// Concatenate into a fresh, independent arena. Mutating an input
    /// afterwards never changes the result. `total_length` truncates or
    /// zero-pads.
    pub fn concat(items: &[ByteBuffer], total_length: Option<f64>) -> Result<ByteBuffer> {
        let total = match total_length {
            Some(v) => checked_length("totalLength", v)?,
            None => {
                let sum: usize = items.iter().map(|b| b.len).sum();
                if sum > MAX_LENGTH {
                    return Err(EngineError::out_of_range(format!(
                        "Combined length {} exceeds maximum {}",
                        sum, MAX_LENGTH
                    )));
                }
                sum
            }
        };
        let mut out = vec![0u8; total];
        let mut pos = 0;
        for item in items {
            if pos >= total {
                break;
            }
            let count = item.len.min(total - pos);
            item.arena.with(item.offset, count, |src| {
                out[pos..pos + count].copy_from_slice(src);
            });
            pos += count;
        }
        Ok(ByteBuffer::owning(Arena::from_vec(out)))
    }

    /// Fill a range with a repeated value or pattern. An empty pattern
    /// value is a TypeError.
    pub fn fill(
        &self,
        value: &FillValue,
        start: Option<f64>,
        end: Option<f64>,
        fill_encoding: Option<Encoding>,
    ) -> Result<()> {
        let pattern = resolve_fill(value, fill_encoding)?;
        let start = checked_position("start", start, 0, self.len)?;
        let end = checked_position("end", end, self.len, self.len)?;
        if end <= start {
            return Ok(());
        }
        self.arena
            .with_mut(self.offset + start, end - start, |window| {
                for (i, slot) in window.iter_mut().enumerate() {
                    *slot = pattern[i % pattern.len()];
                }
            });
        Ok(())
    }

    // -----------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------

    /// First match of `needle` at or after `byte_offset`.
    ///
    /// Negative offsets count from the end; a NaN or non-integer
    /// offset scans the whole buffer instead of erroring; an empty
    /// needle matches at the clamped offset.
    pub fn index_of(
        &self,
        needle: &Needle,
        byte_offset: Option<f64>,
        needle_encoding: Option<Encoding>,
    ) -> Result<Option<usize>> {
        let needle = resolve_needle(needle, needle_encoding)?;
        let from = self.coerce_search_offset(byte_offset, 0);
        Ok(self.with_bytes(|hay| search::index_of(hay, &needle, from)))
    }

    /// Last match of `needle` starting at or before `byte_offset`.
    pub fn last_index_of(
        &self,
        needle: &Needle,
        byte_offset: Option<f64>,
        needle_encoding: Option<Encoding>,
    ) -> Result<Option<usize>> {
        let needle = resolve_needle(needle, needle_encoding)?;
        let from = self.coerce_search_offset(byte_offset, self.len);
        Ok(self.with_bytes(|hay| search::last_index_of(hay, &needle, from)))
    }

    pub fn includes(
        &self,
        needle: &Needle,
        byte_offset: Option<f64>,
        needle_encoding: Option<Encoding>,
    ) -> Result<bool> {
        Ok(self.index_of(needle, byte_offset, needle_encoding)?.is_some())
    }

    fn coerce_search_offset(&self, byte_offset: Option<f64>, default: usize) -> usize {
        let v = match byte_offset {
            None => return default,
            Some(v) => v,
        };
        // NaN and fractional offsets scan the whole buffer.
        if !v.is_finite() || v.fract() != 0.0 {
            return default;
        }
        if v < 0.0 {
            let from_end = self.len as f64 + v;
            if from_end < 0.0 {
                0
            } else {
                from_end as usize
            }
        } else if v >= self.len as f64 {
            self.len
        } else {
            v as usize
        }
    }

    // -----------------------------------------------------------------
    // In-place transforms
    // -----------------------------------------------------------------

    /// Reverse the view's own window in place.
    pub fn reverse(&self) {
        self.arena.with_mut(self.offset, self.len, |w| w.reverse());
    }

    pub fn swap16(&self) -> Result<()> {
        self.swap_groups(2)
    }

    pub fn swap32(&self) -> Result<()> {
        self.swap_groups(4)
    }

    pub fn swap64(&self) -> Result<()> {
        self.swap_groups(8)
    }

    fn swap_groups(&self, group: usize) -> Result<()> {
        if self.len % group != 0 {
            return Err(EngineError::out_of_range(format!(
                "Buffer size must be a multiple of {}-bits",
                group * 8
            )));
        }
        self.arena.with_mut(self.offset, self.len, |w| {
            for chunk in w.chunks_exact_mut(group) {
                chunk.reverse();
            }
        });
        Ok(())
    }

    // -----------------------------------------------------------------
    // Element access and cursors
    // -----------------------------------------------------------------

    /// Byte at `index`, or None outside the view.
    pub fn get(&self, index: usize) -> Option<u8> {
        if index < self.len {
            Some(self.arena.with(self.offset + index, 1, |w| w[0]))
        } else {
            None
        }
    }

    /// Write a byte at `index`, coercing the value mod 256 and
    /// truncating non-integer numerics. Out-of-range indices are
    /// ignored and never touch buffer bytes or length.
    pub fn set(&self, index: usize, value: f64) -> bool {
        if index >= self.len {
            return false;
        }
        let byte = mask_byte(value);
        self.arena.with_mut(self.offset + index, 1, |w| w[0] = byte);
        true
    }

    pub fn keys(&self) -> Keys {
        Keys::new(self)
    }

    pub fn values(&self) -> Values {
        Values::new(self)
    }

    pub fn entries(&self) -> Entries {
        Entries::new(self)
    }

    /// `{"type":"Buffer","data":[...]}`
    pub fn to_json(&self) -> serde_json::Value {
        buffer_to_json(self)
    }

    /// Text form of the view under `encoding`.
    pub fn to_text(&self, encoding: Encoding) -> String {
        self.with_bytes(|bytes| encoding::decode(bytes, encoding))
    }

    // -----------------------------------------------------------------
    // Numeric accessors: fixed-width family (strict)
    // -----------------------------------------------------------------

    fn window<R>(&self, offset: f64, width: usize, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let off = numeric::checked_offset(offset, width, self.len)?;
        Ok(self.arena.with(self.offset + off, width, f))
    }

    fn write_window(&self, offset: f64, width: usize, f: impl FnOnce(&mut [u8])) -> Result<usize> {
        let off = numeric::checked_offset(offset, width, self.len)?;
        self.arena.with_mut(self.offset + off, width, f);
        Ok(off + width)
    }

    pub fn read_u8(&self, offset: f64) -> Result<u8> {
        self.window(offset, 1, |w| w[0])
    }

    pub fn read_u16_be(&self, offset: f64) -> Result<u16> {
        self.window(offset, 2, |w| numeric::read_uint_be(w) as u16)
    }

    pub fn read_u16_le(&self, offset: f64) -> Result<u16> {
        self.window(offset, 2, |w| numeric::read_uint_le(w) as u16)
    }

    pub fn read_u24_be(&self, offset: f64) -> Result<u32> {
        self.window(offset, 3, |w| numeric::read_uint_be(w) as u32)
    }

    pub fn read_u24_le(&self, offset: f64) -> Result<u32> {
        self.window(offset, 3, |w| numeric::read_uint_le(w) as u32)
    }

    pub fn read_u32_be(&self, offset: f64) -> Result<u32> {
        self.window(offset, 4, |w| numeric::read_uint_be(w) as u32)
    }

    pub fn read_u32_le(&self, offset: f64) -> Result<u32> {
        self.window(offset, 4, |w| numeric::read_uint_le(w) as u32)
    }

    pub fn read_u40_be(&self, offset: f64) -> Result<u64> {
        self.window(offset, 5, |w| numeric::read_uint_be(w))
    }

    pub fn read_u40_le(&self, offset: f64) -> Result<u64> {
        self.window(offset, 5, |w| numeric::read_uint_le(w))
    }

    pub fn read_u48_be(&self, offset: f64) -> Result<u64> {
        self.window(offset, 6, |w| numeric::read_uint_be(w))
    }

    pub fn read_u48_le(&self, offset: f64) -> Result<u64> {
        self.window(offset, 6, |w| numeric::read_uint_le(w))
    }

    pub fn read_i8(&self, offset: f64) -> Result<i8> {
        self.window(offset, 1, |w| w[0] as i8)
    }

    pub fn read_i16_be(&self, offset: f64) -> Result<i16> {
        self.window(offset, 2, |w| numeric::read_int_be(w) as i16)
    }

    pub fn read_i16_le(&self, offset: f64) -> Result<i16> {
        self.window(offset, 2, |w| numeric::read_int_le(w) as i16)
    }

    pub fn read_i24_be(&self, offset: f64) -> Result<i32> {
        self.window(offset, 3, |w| numeric::read_int_be(w) as i32)
    }

    pub fn read_i24_le(&self, offset: f64) -> Result<i32> {
        self.window(offset, 3, |w| numeric::read_int_le(w) as i32)
    }

    pub fn read_i32_be(&self, offset: f64) -> Result<i32> {
        self.window(offset, 4, |w| numeric::read_int_be(w) as i32)
    }

    pub fn read_i32_le(&self, offset: f64) -> Result<i32> {
        self.window(offset, 4, |w| numeric::read_int_le(w) as i32)
    }

    pub fn read_i40_be(&self, offset: f64) -> Result<i64> {
        self.window(offset, 5, |w| numeric::read_int_be(w))
    }

    pub fn read_i40_le(&self, offset: f64) -> Result<i64> {
        self.window(offset, 5, |w| numeric::read_int_le(w))
    }

    pub fn read_i48_be(&self, offset: f64) -> Result<i64> {
        self.window(offset, 6, |w| numeric::read_int_be(w))
    }

    pub fn read_i48_le(&self, offset: f64) -> Result<i64> {
        self.window(offset, 6, |w| numeric::read_int_le(w))
    }

    pub fn write_u8(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_uint_value(value, 1)?;
        self.write_window(offset, 1, |w| w[0] = v as u8)
    }

    pub fn write_u16_be(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_uint_value(value, 2)?;
        self.write_window(offset, 2, |w| numeric::write_uint_be(w, v))
    }

    pub fn write_u16_le(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_uint_value(value, 2)?;
        self.write_window(offset, 2, |w| numeric::write_uint_le(w, v))
    }

    pub fn write_u24_be(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_uint_value(value, 3)?;
        self.write_window(offset, 3, |w| numeric::write_uint_be(w, v))
    }

    pub fn write_u24_le(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_uint_value(value, 3)?;
        self.write_window(offset, 3, |w| numeric::write_uint_le(w, v))
    }

    pub fn write_u32_be(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_uint_value(value, 4)?;
        self.write_window(offset, 4, |w| numeric::write_uint_be(w, v))
    }

    pub fn write_u32_le(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_uint_value(value, 4)?;
        self.write_window(offset, 4, |w| numeric::write_uint_le(w, v))
    }

    pub fn write_u40_be(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_uint_value(value, 5)?;
        self.write_window(offset, 5, |w| numeric::write_uint_be(w, v))
    }

    pub fn write_u40_le(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_uint_value(value, 5)?;
        self.write_window(offset, 5, |w| numeric::write_uint_le(w, v))
    }

    pub fn write_u48_be(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_uint_value(value, 6)?;
        self.write_window(offset, 6, |w| numeric::write_uint_be(w, v))
    }

    pub fn write_u48_le(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_uint_value(value, 6)?;
        self.write_window(offset, 6, |w| numeric::write_uint_le(w, v))
    }

    pub fn write_i8(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_int_value(value, 1)?;
        self.write_window(offset, 1, |w| w[0] = v as u8)
    }

    pub fn write_i16_be(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_int_value(value, 2)?;
        self.write_window(offset, 2, |w| numeric::write_uint_be(w, v as u64))
    }

    pub fn write_i16_le(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_int_value(value, 2)?;
        self.write_window(offset, 2, |w| numeric::write_uint_le(w, v as u64))
    }

    pub fn write_i24_be(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_int_value(value, 3)?;
        self.write_window(offset, 3, |w| numeric::write_uint_be(w, v as u64))
    }

    pub fn write_i24_le(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_int_value(value, 3)?;
        self.write_window(offset, 3, |w| numeric::write_uint_le(w, v as u64))
    }

    pub fn write_i32_be(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_int_value(value, 4)?;
        self.write_window(offset, 4, |w| numeric::write_uint_be(w, v as u64))
    }

    pub fn write_i32_le(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_int_value(value, 4)?;
        self.write_window(offset, 4, |w| numeric::write_uint_le(w, v as u64))
    }

    pub fn write_i40_be(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_int_value(value, 5)?;
        self.write_window(offset, 5, |w| numeric::write_uint_be(w, v as u64))
    }

    pub fn write_i40_le(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_int_value(value, 5)?;
        self.write_window(offset, 5, |w| numeric::write_uint_le(w, v as u64))
    }

    pub fn write_i48_be(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_int_value(value, 6)?;
        self.write_window(offset, 6, |w| numeric::write_uint_be(w, v as u64))
    }

    pub fn write_i48_le(&self, value: f64, offset: f64) -> Result<usize> {
        let v = numeric::checked_int_value(value, 6)?;
        self.write_window(offset, 6, |w| numeric::write_uint_le(w, v as u64))
    }

    // -----------------------------------------------------------------
    // Numeric accessors: floats
    // -----------------------------------------------------------------

    pub fn read_f32_be(&self, offset: f64) -> Result<f32> {
        self.window(offset, 4, numeric::read_f32_be)
    }

    pub fn read_f32_le(&self, offset: f64) -> Result<f32> {
        self.window(offset, 4, numeric::read_f32_le)
    }

    pub fn read_f64_be(&self, offset: f64) -> Result<f64> {
        self.window(offset, 8, numeric::read_f64_be)
    }

    pub fn read_f64_le(&self, offset: f64) -> Result<f64> {
        self.window(offset, 8, numeric::read_f64_le)
    }

    pub fn write_f32_be(&self, value: f64, offset: f64) -> Result<usize> {
        self.write_window(offset, 4, |w| numeric::write_f32_be(w, value as f32))
    }

    pub fn write_f32_le(&self, value: f64, offset: f64) -> Result<usize> {
        self.write_window(offset, 4, |w| numeric::write_f32_le(w, value as f32))
    }

    pub fn write_f64_be(&self, value: f64, offset: f64) -> Result<usize> {
        self.write_window(offset, 8, |w| numeric::write_f64_be(w, value))
    }

    pub fn write_f64_le(&self, value: f64, offset: f64) -> Result<usize> {
        self.write_window(offset, 8, |w| numeric::write_f64_le(w, value))
    }

    // -----------------------------------------------------------------
    // Numeric accessors: 64-bit family, arbitrary precision at the
    // call boundary
    // -----------------------------------------------------------------

    pub fn read_u64_be(&self, offset: f64) -> Result<u128> {
        self.window(offset, 8, |w| u128::from(numeric::read_uint_be(w)))
    }

    pub fn read_u64_le(&self, offset: f64) -> Result<u128> {
        self.window(offset, 8, |w| u128::from(numeric::read_uint_le(w)))
    }

    pub fn read_i64_be(&self, offset: f64) -> Result<i128> {
        self.window(offset, 8, |w| i128::from(numeric::read_uint_be(w) as i64))
    }

    pub fn read_i64_le(&self, offset: f64) -> Result<i128> {
        self.window(offset, 8, |w| i128::from(numeric::read_uint_le(w) as i64))
    }

    pub fn write_u64_be(&self, value: u128, offset: f64) -> Result<usize> {
        let v = numeric::checked_u64_value(value)?;
        self.write_window(offset, 8, |w| numeric::write_uint_be(w, v))
    }

    pub fn write_u64_le(&self, value: u128, offset: f64) -> Result<usize> {
        let v = numeric::checked_u64_value(value)?;
        self.write_window(offset, 8, |w| numeric::write_uint_le(w, v))
    }

    pub fn write_i64_be(&self, value: i128, offset: f64) -> Result<usize> {
        let v = numeric::checked_i64_value(value)?;
        self.write_window(offset, 8, |w| numeric::write_uint_be(w, v as u64))
    }

    pub fn write_i64_le(&self, value: i128, offset: f64) -> Result<usize> {
        let v = numeric::checked_i64_value(value)?;
        self.write_window(offset, 8, |w| numeric::write_uint_le(w, v as u64))
    }

    // -----------------------------------------------------------------
    // Numeric accessors: width-parameterized family (wrapping)
    // -----------------------------------------------------------------

    pub fn read_uint_be(&self, offset: f64, byte_length: f64) -> Result<u64> {
        let width = numeric::checked_width(byte_length)?;
        self.window(offset, width, numeric::read_uint_be)
    }

    pub fn read_uint_le(&self, offset: f64, byte_length: f64) -> Result<u64> {
        let width = numeric::checked_width(byte_length)?;
        self.window(offset, width, numeric::read_uint_le)
    }

    pub fn read_int_be(&self, offset: f64, byte_length: f64) -> Result<i64> {
        let width = numeric::checked_width(byte_length)?;
        self.window(offset, width, numeric::read_int_be)
    }

    pub fn read_int_le(&self, offset: f64, byte_length: f64) -> Result<i64> {
        let width = numeric::checked_width(byte_length)?;
        self.window(offset, width, numeric::read_int_le)
    }

    /// Width-parameterized write: the value wraps modulo `2^(8w)`
    /// instead of raising. The offset is still bounds-checked.
    pub fn write_uint_be(&self, value: f64, offset: f64, byte_length: f64) -> Result<usize> {
        let width = numeric::checked_width(byte_length)?;
        let v = numeric::wrap_uint(value, width);
        self.write_window(offset, width, |w| numeric::write_uint_be(w, v))
    }

    pub fn write_uint_le(&self, value: f64, offset: f64, byte_length: f64) -> Result<usize> {
        let width = numeric::checked_width(byte_length)?;
        let v = numeric::wrap_uint(value, width);
        self.write_window(offset, width, |w| numeric::write_uint_le(w, v))
    }

    /// Signed form: two's-complement wrap shares the unsigned bit
    /// pattern, so the coercion is identical.
    pub fn write_int_be(&self, value: f64, offset: f64, byte_length: f64) -> Result<usize> {
        self.write_uint_be(value, offset, byte_length)
    }

    pub fn write_int_le(&self, value: f64, offset: f64, byte_length: f64) -> Result<usize> {
        self.write_uint_le(value, offset, byte_length)
    }
}

impl ByteIndexed for ByteBuffer {
    fn length(&self) -> usize {
        self.len()
    }
    fn byte_at(&self, index: usize) -> u8 {
        self.get(index).unwrap_or(0)
    }
}

impl std::fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with_bytes(|bytes| {
            write!(f, "<ByteBuffer")?;
            for b in bytes.iter().take(50) {
                write!(f, " {:02x}", b)?;
            }
            if bytes.len() > 50 {
                write!(f, " ... {} more", bytes.len() - 50)?;
            }
            write!(f, ">")
        })
    }
}

// ---------------------------------------------------------------------
// Argument coercion shared by allocate/fill/search
// ---------------------------------------------------------------------

fn mask_byte(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.trunc().rem_euclid(256.0) as u8
}

fn checked_length(name: &str, value: f64) -> Result<usize> {
    let whole = numeric::require_whole(name, value)?;
    if whole < 0 || whole as usize > MAX_LENGTH {
        return Err(EngineError::out_of_range(format!(
            "The value of \"{}\" is out of range. It must be >= 0 and <= {}. Received {}",
            name, MAX_LENGTH, value
        )));
    }
    Ok(whole as usize)
}

fn checked_position(name: &str, value: Option<f64>, default: usize, max: usize) -> Result<usize> {
    let v = match value {
        None => return Ok(default),
        Some(v) => v,
    };
    let whole = numeric::require_whole(name, v)?;
    if whole < 0 || (max != usize::MAX && whole as usize > max) {
        return Err(EngineError::out_of_range(format!(
            "The value of \"{}\" is out of range. Received {}",
            name, v
        )));
    }
    Ok(whole as usize)
}

fn resolve_fill(value: &FillValue, fill_encoding: Option<Encoding>) -> Result<Vec<u8>> {
    let pattern = match value {
        FillValue::Int(v) => vec![mask_byte(*v)],
        FillValue::Bytes(bytes) => bytes.clone(),
        FillValue::Text(text) => {
            let enc = fill_encoding.unwrap_or(Encoding::Utf8);
            encoding::encode(text, enc)
        }
    };
    if pattern.is_empty() {
        return Err(EngineError::type_error(
            "The argument 'value' is invalid: empty fill pattern",
        ));
    }
    Ok(pattern)
}

fn resolve_needle(needle: &Needle, needle_encoding: Option<Encoding>) -> Result<Vec<u8>> {
    Ok(match needle {
        Needle::Byte(v) => vec![mask_byte(*v)],
        Needle::Bytes(bytes) => bytes.clone(),
        Needle::Text(text) => {
            let enc = needle_encoding.unwrap_or(Encoding::Utf8);
            encoding::encode(text, enc)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_defaults_to_zero_fill() {
        let buf = ByteBuffer::allocate(4.0, None, None).unwrap();
        assert_eq!(buf.bytes(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn allocate_with_integer_fill_masks_mod_256() {
        let buf = ByteBuffer::allocate(3.0, Some(&FillValue::Int(257.0)), None).unwrap();
        assert_eq!(buf.bytes(), vec![1, 1, 1]);
    }

    #[test]
    fn allocate_with_pattern_repeats_to_length() {
        let buf = ByteBuffer::allocate(5.0, Some(&FillValue::Text("ab".into())), None).unwrap();
        assert_eq!(buf.bytes(), b"ababa");
    }

    #[test]
    fn empty_fill_pattern_is_type_error() {
        let err = ByteBuffer::allocate(4.0, Some(&FillValue::Text(String::new())), None)
            .unwrap_err();
        assert_eq!(err.kind(), "TypeError");

        let buf = ByteBuffer::allocate(4.0, None, None).unwrap();
        let err = buf
            .fill(&FillValue::Bytes(Vec::new()), None, None, None)
            .unwrap_err();
        assert_eq!(err.kind(), "TypeError");
    }

    #[test]
    fn allocate_rejects_bad_lengths() {
        assert!(ByteBuffer::allocate(-1.0, None, None).is_err());
        assert!(ByteBuffer::allocate(1.5, None, None).is_err());
        assert!(ByteBuffer::allocate((MAX_LENGTH as f64) + 1.0, None, None).is_err());
        assert!(ByteBuffer::allocate_fast(f64::NAN).is_err());
    }

    #[test]
    fn from_list_masks_and_zeroes() {
        let items = vec![
            serde_json::json!(1),
            serde_json::json!(257),
            serde_json::json!(-1),
            serde_json::json!("nope"),
            serde_json::Value::Null,
        ];
        let buf = ByteBuffer::from_list(&items);
        assert_eq!(buf.bytes(), vec![1, 1, 255, 0, 0]);
    }

    #[test]
    fn slice_shares_arena_with_parent() {
        let parent = ByteBuffer::from_bytes(&[0, 1, 2, 3, 4, 5]);
        let view = parent.slice(Some(2.0), Some(5.0));
        assert_eq!(view.bytes(), vec![2, 3, 4]);

        view.set(0, 99.0);
        assert_eq!(parent.get(2), Some(99));
        parent.set(4, 7.0);
        assert_eq!(view.get(2), Some(7));
    }

    #[test]
    fn overlapping_views_alias_for_any_pair() {
        let parent = ByteBuffer::from_bytes(&[0; 8]);
        let a = parent.slice(Some(1.0), Some(6.0));
        let b = parent.slice(Some(3.0), Some(8.0));
        a.set(3, 42.0); // parent index 4 == b index 1
        assert_eq!(b.get(1), Some(42));
    }

    #[test]
    fn slice_clamps_and_supports_negative_indices() {
        let buf = ByteBuffer::from_bytes(b"banana");
        assert_eq!(buf.slice(Some(-3.0), None).bytes(), b"ana");
        assert_eq!(buf.slice(Some(0.0), Some(100.0)).len(), 6);
        assert_eq!(buf.slice(Some(4.0), Some(2.0)).len(), 0);
        assert_eq!(buf.subarray(Some(-100.0), Some(2.0)).bytes(), b"ba");
    }

    #[test]
    fn copy_handles_overlap_as_if_intermediate() {
        let buf = ByteBuffer::from_bytes(&[1, 2, 3, 4, 5]);
        // Shift right by two within the same arena.
        let copied = buf
            .copy_to(&buf, Some(2.0), Some(0.0), Some(3.0))
            .unwrap();
        assert_eq!(copied, 3);
        assert_eq!(buf.bytes(), vec![1, 2, 1, 2, 3]);
    }

    #[test]
    fn copy_between_arenas_and_zero_length() {
        let src = ByteBuffer::from_bytes(b"hello");
        let dst = ByteBuffer::allocate(5.0, None, None).unwrap();
        assert_eq!(src.copy_to(&dst, None, None, None).unwrap(), 5);
        assert_eq!(dst.bytes(), b"hello");

        let empty = ByteBuffer::from_bytes(b"");
        assert_eq!(empty.copy_to(&dst, None, None, None).unwrap(), 0);
    }

    #[test]
    fn copy_rejects_out_of_range_offsets() {
        let src = ByteBuffer::from_bytes(b"abc");
        let dst = ByteBuffer::allocate(3.0, None, None).unwrap();
        let err = src
            .copy_to(&dst, Some(4.0), None, None)
            .unwrap_err();
        assert_eq!(err.code(), Some("ERR_OUT_OF_RANGE"));
        assert!(src.copy_to(&dst, Some(-1.0), None, None).is_err());
    }

    #[test]
    fn compare_is_lexicographic_unsigned() {
        let a = ByteBuffer::from_bytes(&[1, 2, 3]);
        let b = ByteBuffer::from_bytes(&[1, 2, 4]);
        assert_eq!(ByteBuffer::compare(&a, &b), Ordering::Less);
        assert_eq!(ByteBuffer::compare(&b, &a), Ordering::Greater);
        assert!(a.equals(&a.clone()));
        // High bytes compare unsigned.
        let hi = ByteBuffer::from_bytes(&[0x80]);
        let lo = ByteBuffer::from_bytes(&[0x7F]);
        assert_eq!(ByteBuffer::compare(&hi, &lo), Ordering::Greater);
    }

    #[test]
    fn instance_compare_agrees_with_static_form() {
        let a = ByteBuffer::from_bytes(b"abcdef");
        let b = ByteBuffer::from_bytes(b"cdef");
        let range = a
            .compare_with(&b, Some(0.0), Some(4.0), Some(2.0), Some(6.0))
            .unwrap();
        assert_eq!(range, Ordering::Equal);
        assert_eq!(
            a.compare_with(&b, None, None, None, None).unwrap(),
            ByteBuffer::compare(&a, &b)
        );
    }

    #[test]
    fn concat_result_is_independent_of_inputs() {
        let a = ByteBuffer::from_bytes(&[1, 2]);
        let b = ByteBuffer::from_bytes(&[3, 4]);
        let joined = ByteBuffer::concat(&[a.clone(), b.clone()], None).unwrap();
        assert_eq!(joined.bytes(), vec![1, 2, 3, 4]);

        a.set(0, 99.0);
        b.set(1, 99.0);
        assert_eq!(joined.bytes(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn concat_total_length_truncates_or_pads() {
        let a = ByteBuffer::from_bytes(&[1, 2, 3]);
        let truncated = ByteBuffer::concat(&[a.clone()], Some(2.0)).unwrap();
        assert_eq!(truncated.bytes(), vec![1, 2]);
        let padded = ByteBuffer::concat(&[a], Some(5.0)).unwrap();
        assert_eq!(padded.bytes(), vec![1, 2, 3, 0, 0]);
    }

    #[test]
    fn index_of_contract() {
        let buf = ByteBuffer::from_text("banana", Encoding::Utf8);
        let ana = Needle::Text("ana".into());
        assert_eq!(buf.index_of(&ana, Some(1.0), None).unwrap(), Some(1));
        assert_eq!(buf.last_index_of(&ana, None, None).unwrap(), Some(3));
        // Empty needle at a clamped offset.
        let empty = Needle::Text(String::new());
        assert_eq!(buf.index_of(&empty, Some(0.0), None).unwrap(), Some(0));
        assert_eq!(buf.index_of(&empty, Some(100.0), None).unwrap(), Some(6));
        // Huge offset with a real needle misses.
        assert_eq!(buf.index_of(&ana, Some(100.0), None).unwrap(), None);
    }

    #[test]
    fn index_of_nan_offset_scans_whole_buffer() {
        let buf = ByteBuffer::from_text("banana", Encoding::Utf8);
        let ana = Needle::Text("ana".into());
        assert_eq!(buf.index_of(&ana, Some(f64::NAN), None).unwrap(), Some(1));
        assert_eq!(buf.index_of(&ana, Some(2.5), None).unwrap(), Some(1));
        assert_eq!(
            buf.last_index_of(&ana, Some(f64::NAN), None).unwrap(),
            Some(3)
        );
    }

    #[test]
    fn index_of_single_byte_masks_mod_256() {
        let buf = ByteBuffer::from_bytes(&[5, 1, 5]);
        assert_eq!(
            buf.index_of(&Needle::Byte(257.0), None, None).unwrap(),
            Some(1)
        );
        assert!(buf.includes(&Needle::Byte(5.0), Some(1.0), None).unwrap());
    }

    #[test]
    fn reverse_and_swaps_stay_inside_view() {
        let parent = ByteBuffer::from_bytes(&[0, 1, 2, 3, 4, 5]);
        let view = parent.slice(Some(2.0), Some(6.0));
        view.reverse();
        assert_eq!(parent.bytes(), vec![0, 1, 5, 4, 3, 2]);

        view.swap16().unwrap();
        assert_eq!(parent.bytes(), vec![0, 1, 4, 5, 2, 3]);
    }

    #[test]
    fn swap_requires_even_grouping() {
        let buf = ByteBuffer::from_bytes(&[1, 2, 3]);
        let err = buf.swap16().unwrap_err();
        assert_eq!(err.kind(), "RangeError");
        assert!(buf.swap64().is_err());
        let ok = ByteBuffer::from_bytes(&[1, 2, 3, 4, 5, 6, 7, 8]);
        ok.swap64().unwrap();
        assert_eq!(ok.bytes(), vec![8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn set_coerces_and_ignores_out_of_range() {
        let buf = ByteBuffer::from_bytes(&[0, 0]);
        assert!(buf.set(0, 257.9));
        assert_eq!(buf.get(0), Some(1));
        assert!(buf.set(1, -1.0));
        assert_eq!(buf.get(1), Some(255));
        assert!(!buf.set(5, 1.0));
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn to_json_shape_and_duck_typing() {
        let buf = ByteBuffer::from_bytes(&[1, 2]);
        let expected = serde_json::json!({"type": "Buffer", "data": [1, 2]});
        assert_eq!(buf.to_json(), expected);
        // Any byte-indexed value serializes the same way.
        assert_eq!(buffer_to_json(&vec![1u8, 2u8]), expected);
        assert_eq!(buffer_to_json(&[1u8, 2u8][..]), expected);
    }

    #[test]
    fn view_of_arena_is_zero_copy() {
        let owner = ByteBuffer::from_bytes(&[9, 8, 7, 6]);
        let view = ByteBuffer::view_of_arena(owner.arena(), 1.0, 2.0).unwrap();
        assert_eq!(view.bytes(), vec![8, 7]);
        view.set(0, 1.0);
        assert_eq!(owner.get(1), Some(1));
        assert!(ByteBuffer::view_of_arena(owner.arena(), 3.0, 2.0).is_err());
    }

    #[test]
    fn fixed_width_round_trip_scenario() {
        let buf = ByteBuffer::allocate(5.0, Some(&FillValue::Int(0.0)), None).unwrap();
        buf.write_u32_be(0x1234_5678 as f64, 0.0).unwrap();
        assert_eq!(buf.read_u32_be(0.0).unwrap(), 0x1234_5678);
        assert_eq!(buf.read_u8(4.0).unwrap(), 0);
    }

    #[test]
    fn wrap_vs_throw_asymmetry_is_load_bearing() {
        let buf = ByteBuffer::allocate(8.0, None, None).unwrap();
        // Fixed-width: strict.
        assert!(buf.write_u8(256.0, 0.0).is_err());
        assert!(buf.write_u16_le(65536.0, 0.0).is_err());
        // Width-parameterized: wraps, never throws.
        buf.write_uint_le(257.0, 0.0, 1.0).unwrap();
        assert_eq!(buf.read_u8(0.0).unwrap(), 1);
        buf.write_int_le(-1.0, 0.0, 3.0).unwrap();
        assert_eq!(buf.read_int_le(0.0, 3.0).unwrap(), -1);
        assert_eq!(buf.read_uint_le(0.0, 3.0).unwrap(), 0xFF_FFFF);
    }

    #[test]
    fn parameterized_wrap_round_trip_all_widths() {
        let buf = ByteBuffer::allocate(8.0, None, None).unwrap();
        for w in 1..=6u32 {
            let modulus = 1i64 << (8 * w);
            for v in [-1.0f64, 0.0, 123456789.0, -987654321.0] {
                buf.write_int_le(v, 0.0, w as f64).unwrap();
                let expect = (v as i64).rem_euclid(modulus);
                let signed = if expect >= modulus / 2 {
                    expect - modulus
                } else {
                    expect
                };
                assert_eq!(buf.read_int_le(0.0, w as f64).unwrap(), signed);
            }
        }
    }

    #[test]
    fn big_family_boundary_is_arbitrary_precision() {
        let buf = ByteBuffer::allocate(8.0, None, None).unwrap();
        buf.write_u64_le(u64::MAX as u128, 0.0).unwrap();
        assert_eq!(buf.read_u64_le(0.0).unwrap(), u64::MAX as u128);
        assert!(buf.write_u64_le(u64::MAX as u128 + 1, 0.0).is_err());

        buf.write_i64_be(-2_i128, 0.0).unwrap();
        assert_eq!(buf.read_i64_be(0.0).unwrap(), -2);
        assert_eq!(buf.read_u64_be(0.0).unwrap(), u64::MAX as u128 - 1);
    }

    #[test]
    fn float_accessors_round_trip() {
        let buf = ByteBuffer::allocate(8.0, None, None).unwrap();
        buf.write_f64_le(-0.0, 0.0).unwrap();
        assert_eq!(buf.read_f64_le(0.0).unwrap().to_bits(), (-0.0f64).to_bits());
        buf.write_f32_be(f64::INFINITY, 0.0).unwrap();
        assert_eq!(buf.read_f32_be(0.0).unwrap(), f32::INFINITY);
        buf.write_f64_be(f64::NAN, 0.0).unwrap();
        assert!(buf.read_f64_be(0.0).unwrap().is_nan());
    }

    #[test]
    fn accessor_offsets_accept_whole_floats_only() {
        let buf = ByteBuffer::allocate(4.0, None, None).unwrap();
        buf.write_u8(7.0, 2.0).unwrap();
        assert_eq!(buf.read_u8(2.0).unwrap(), 7);
        let err = buf.read_u8(1.5).unwrap_err();
        assert!(err.guest_message().contains("offset"));
        let err = buf.read_u16_be(3.0).unwrap_err();
        assert_eq!(err.code(), Some("ERR_OUT_OF_RANGE"));
        assert!(err.guest_message().contains("offset"));
    }

    #[test]
    fn fill_range_and_encoding() {
        let buf = ByteBuffer::allocate(6.0, None, None).unwrap();
        buf.fill(&FillValue::Int(7.0), Some(2.0), Some(4.0), None)
            .unwrap();
        assert_eq!(buf.bytes(), vec![0, 0, 7, 7, 0, 0]);
        buf.fill(
            &FillValue::Text("6869".into()),
            None,
            None,
            Some(Encoding::Hex),
        )
        .unwrap();
        assert_eq!(buf.bytes(), b"hihihi");
    }
}
