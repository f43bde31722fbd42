//! Morton encoding (Z-order curve) for octree node and leaf addressing
//!
//! Codes are 64-bit with up to 21 bits per axis. The parent of a cell is
//! `code >> 3` and its children are `(code << 3) | octant`.

/// Largest coordinate value representable on one axis
pub const MAX_COORD: u32 = 0x1f_ffff;

/// Spread bits of a 21-bit integer into every third bit of a 64-bit integer
fn spread_bits(x: u32) -> u64 {
    let mut x = x as u64 & 0x1fffff;
    x = (x | (x << 32)) & 0x1f00000000ffff;
    x = (x | (x << 16)) & 0x1f0000ff0000ff;
    x = (x | (x << 8)) & 0x100f00f00f00f00f;
    x = (x | (x << 4)) & 0x10c30c30c30c30c3;
    x = (x | (x << 2)) & 0x1249249249249249;
    x
}

/// Compact every third bit of a 64-bit integer into a 21-bit integer
fn compact_bits(x: u64) -> u32 {
    let mut x = x & 0x1249249249249249;
    x = (x | (x >> 2)) & 0x10c30c30c30c30c3;
    x = (x | (x >> 4)) & 0x100f00f00f00f00f;
    x = (x | (x >> 8)) & 0x1f0000ff0000ff;
    x = (x | (x >> 16)) & 0x1f00000000ffff;
    x = (x | (x >> 32)) & 0x1fffff;
    x as u32
}

/// Encode 3D coordinates into Morton code (Z-order curve)
/// Each coordinate can be up to 21 bits (0..=MAX_COORD)
pub fn encode_morton_3d(x: u32, y: u32, z: u32) -> u64 {
    spread_bits(x) | (spread_bits(y) << 1) | (spread_bits(z) << 2)
}

/// Decode Morton code back to 3D coordinates
pub fn decode_morton_3d(code: u64) -> (u32, u32, u32) {
    (
        compact_bits(code),
        compact_bits(code >> 1),
        compact_bits(code >> 2),
    )
}

/// Code of the cell one layer coarser that contains `code`
#[inline]
pub fn parent_code(code: u64) -> u64 {
    code >> 3
}

/// Code of the first of the 8 children of `code` one layer finer
#[inline]
pub fn first_child_code(code: u64) -> u64 {
    code << 3
}

/// Octant (0..8) of a code within its parent, bit 0=x, bit 1=y, bit 2=z
#[inline]
pub fn octant(code: u64) -> u8 {
    (code & 0b111) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        for x in [0, 1, 3, 100, 1023, 65_535, MAX_COORD] {
            for y in [0, 2, 7, 500, 4096, MAX_COORD] {
                for z in [0, 1, 10, 1000, 131_071, MAX_COORD] {
                    let code = encode_morton_3d(x, y, z);
                    assert_eq!(decode_morton_3d(code), (x, y, z), "Failed for ({}, {}, {})", x, y, z);
                }
            }
        }
    }

    #[test]
    fn test_ordering() {
        assert_eq!(encode_morton_3d(0, 0, 0), 0);
        assert_eq!(encode_morton_3d(1, 0, 0), 1);
        assert_eq!(encode_morton_3d(0, 1, 0), 2);
        assert_eq!(encode_morton_3d(0, 0, 1), 4);
        assert_eq!(encode_morton_3d(1, 1, 1), 7);
        assert_eq!(encode_morton_3d(3, 3, 3), 63);
    }

    #[test]
    fn test_parent_relationship() {
        for x in [0u32, 1, 5, 8, 13, 100, 2047] {
            for y in [0u32, 2, 9, 31, 640] {
                for z in [0u32, 3, 4, 77, 1999] {
                    let code = encode_morton_3d(x, y, z);
                    assert_eq!(parent_code(code), encode_morton_3d(x / 2, y / 2, z / 2));
                }
            }
        }
    }

    #[test]
    fn test_children_share_parent() {
        let parent = encode_morton_3d(5, 2, 7);
        for i in 0..8u64 {
            let child = first_child_code(parent) | i;
            assert_eq!(parent_code(child), parent);
            assert_eq!(octant(child), i as u8);
        }
    }
}
