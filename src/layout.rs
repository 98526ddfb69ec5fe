//! Page-aligned section offsets derived from a decoded header.

use crate::Header;

/// Absolute byte offsets of each section inside the image.
///
/// Derived from a [`Header`], never stored in the file. The header itself
/// occupies the first page; each section starts at the page-aligned end of
/// the previous one, in the fixed order kernel, ramdisk, second stage,
/// device tree. Whether the optional sections are actually present is
/// signalled by their size in the header, not by these offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    /// Kernel offset, always one page in
    pub kernel_offset: u64,
    /// Ramdisk offset
    pub ramdisk_offset: u64,
    /// Second stage bootloader offset
    pub second_offset: u64,
    /// Device tree blob offset
    pub device_tree_offset: u64,
}

/// Number of pages a section of `size` bytes occupies, rounded up.
fn pages(size: u32, page_size: u32) -> u64 {
    (u64::from(size) + u64::from(page_size) - 1) / u64::from(page_size)
}

impl Layout {
    /// Computes the section offsets for `header`.
    ///
    /// `header.page_size` is nonzero for any header that passed decoding.
    pub fn compute(header: &Header) -> Self {
        let page = u64::from(header.page_size);
        let kernel_offset = page;
        let ramdisk_offset = kernel_offset + pages(header.kernel_size, header.page_size) * page;
        let second_offset = ramdisk_offset + pages(header.ramdisk_size, header.page_size) * page;
        let device_tree_offset =
            second_offset + pages(header.second_size, header.page_size) * page;
        Self {
            kernel_offset,
            ramdisk_offset,
            second_offset,
            device_tree_offset,
        }
    }
}
