use std::{
    fmt,
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};

use binrw::{binread, BinRead};

pub mod err;
pub mod extract;
pub mod layout;

pub use err::{Error, Result};
pub use extract::split;
pub use layout::Layout;

/// Boot magic at the start of every image.
pub const BOOT_MAGIC: [u8; 8] = *b"ANDROID!";

/// Encoded size of the header in bytes.
///
/// Identical in both format variants: 8 (magic) + 8*4 + 2*4 + 16 + 512 + 32.
pub const HEADER_SIZE: usize = 608;

/// Legacy boot image header layouts in circulation.
///
/// The device-tree variant repurposes the first reserved word after
/// `page_size` as the device-tree blob size. The two layouts are
/// byte-identical otherwise, so the caller has to know which one it is
/// dealing with; nothing in the bytes tells them apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FormatVariant {
    /// Stock header, both reserved words unused.
    #[default]
    Plain,
    /// Header with a device-tree size in place of the first reserved word.
    DeviceTree,
}

/// Legacy Android boot image header (pre-versioned format)
#[binread]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[br(little, magic = b"ANDROID!", import(variant: FormatVariant))]
pub struct Header {
    /// Kernel size in bytes
    pub kernel_size: u32,
    /// Kernel physical load addr
    pub kernel_addr: u32,
    /// Ramdisk size in bytes
    pub ramdisk_size: u32,
    /// Ramdisk physical load addr
    pub ramdisk_addr: u32,
    /// Second bootloader size in bytes
    pub second_size: u32,
    /// Second bootloader physical load addr
    pub second_addr: u32,
    /// Physical addr for the kernel tags
    pub tags_addr: u32,
    /// Flash page size the image was built for; every section boundary is
    /// a multiple of it
    pub page_size: u32,
    // The first reserved word doubles as the device-tree size slot; the
    // second is skipped either way so the name/cmdline/id offsets stay put.
    #[br(temp)]
    reserved0: u32,
    /// Device tree blob size in bytes, carried by the first reserved word
    /// in the device-tree variant
    #[br(calc = match variant {
        FormatVariant::DeviceTree => reserved0,
        FormatVariant::Plain => 0,
    })]
    pub device_tree_size: u32,
    /// Product or board name, NUL-padded ASCII
    #[br(pad_before = 4)]
    pub board_name: [u8; 16],
    /// Kernel command line, NUL-padded ASCII
    pub cmdline: Box<[u8; 512]>,
    /// Timestamp / checksum / sha1, not interpreted
    pub id: [u8; 32],
}

impl Header {
    /// Decodes a boot image header from the start of `reader`.
    ///
    /// The magic signature is checked before any size field is read, and
    /// `page_size` must be large enough to hold the header itself, which
    /// also rules out a zero page size before any layout arithmetic.
    pub fn parse<R: Read + Seek>(reader: &mut R, variant: FormatVariant) -> Result<Self> {
        let header = Self::read_args(reader, (variant,)).map_err(Error::from_decode)?;
        if (header.page_size as usize) < HEADER_SIZE {
            return Err(Error::InvalidPageSize(header.page_size));
        }
        Ok(header)
    }

    /// Opens `path` and decodes the header at its start.
    ///
    /// The file handle lives only for the duration of the call; decode
    /// failures carry the path for diagnostics.
    pub fn parse_file(path: impl AsRef<Path>, variant: FormatVariant) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&mut BufReader::new(file), variant).map_err(|e| e.locate(path))
    }

    /// Computes the section offsets declared by this header.
    pub fn layout(&self) -> Layout {
        Layout::compute(self)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Page size: {0} (0x{0:08x})", self.page_size)?;
        writeln!(f, "Kernel size: {0} (0x{0:08x})", self.kernel_size)?;
        writeln!(f, "Kernel address: {0} (0x{0:08x})", self.kernel_addr)?;
        writeln!(f, "Ramdisk size: {0} (0x{0:08x})", self.ramdisk_size)?;
        writeln!(f, "Ramdisk address: {0} (0x{0:08x})", self.ramdisk_addr)?;
        writeln!(f, "Second size: {0} (0x{0:08x})", self.second_size)?;
        writeln!(f, "Second address: {0} (0x{0:08x})", self.second_addr)?;
        writeln!(f, "Tags address: {0} (0x{0:08x})", self.tags_addr)?;
        if self.device_tree_size != 0 {
            writeln!(f, "Device tree size: {0} (0x{0:08x})", self.device_tree_size)?;
        }
        writeln!(
            f,
            "Board name: {}",
            String::from_utf8_lossy(take_until_null(&self.board_name))
        )?;
        write!(
            f,
            "Command line: {}",
            String::from_utf8_lossy(take_until_null(&*self.cmdline))
        )
    }
}

fn take_until_null(input: &[u8]) -> &[u8] {
    match input.iter().position(|x| *x == 0) {
        Some(null_idx) => &input[..null_idx],
        None => input,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn push_u32(buf: &mut Vec<u8>, value: u32) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Builds the 608 header bytes of an image with the given sizes.
    fn header_bytes(
        page_size: u32,
        kernel: u32,
        ramdisk: u32,
        second: u32,
        reserved0: u32,
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&BOOT_MAGIC);
        push_u32(&mut buf, kernel);
        push_u32(&mut buf, 0x8000_8000);
        push_u32(&mut buf, ramdisk);
        push_u32(&mut buf, 0x8100_0000);
        push_u32(&mut buf, second);
        push_u32(&mut buf, 0x8110_0000);
        push_u32(&mut buf, 0x8000_0100);
        push_u32(&mut buf, page_size);
        push_u32(&mut buf, reserved0);
        push_u32(&mut buf, 0);
        let mut board = [0u8; 16];
        board[..9].copy_from_slice(b"testboard");
        buf.extend_from_slice(&board);
        let mut cmdline = [0u8; 512];
        cmdline[..22].copy_from_slice(b"console=ttyMSM0,115200");
        buf.extend_from_slice(&cmdline);
        buf.extend_from_slice(&[0u8; 32]);
        assert_eq!(buf.len(), HEADER_SIZE);
        buf
    }

    #[test]
    fn decodes_every_field() {
        let buf = header_bytes(2048, 5000, 3000, 64, 0);
        let hdr = Header::parse(&mut Cursor::new(buf), FormatVariant::Plain).unwrap();
        assert_eq!(hdr.kernel_size, 5000);
        assert_eq!(hdr.kernel_addr, 0x8000_8000);
        assert_eq!(hdr.ramdisk_size, 3000);
        assert_eq!(hdr.ramdisk_addr, 0x8100_0000);
        assert_eq!(hdr.second_size, 64);
        assert_eq!(hdr.second_addr, 0x8110_0000);
        assert_eq!(hdr.tags_addr, 0x8000_0100);
        assert_eq!(hdr.page_size, 2048);
        assert_eq!(hdr.device_tree_size, 0);
        assert_eq!(&hdr.board_name[..9], b"testboard");
        assert_eq!(&hdr.cmdline[..22], b"console=ttyMSM0,115200");
        assert_eq!(hdr.id, [0u8; 32]);
    }

    #[test]
    fn reserved_word_is_discarded_in_plain_mode() {
        let buf = header_bytes(2048, 1, 1, 0, 1234);
        let hdr = Header::parse(&mut Cursor::new(buf), FormatVariant::Plain).unwrap();
        assert_eq!(hdr.device_tree_size, 0);
    }

    #[test]
    fn reserved_word_is_the_dt_size_in_dt_mode() {
        let buf = header_bytes(2048, 1, 1, 0, 1234);
        let hdr = Header::parse(&mut Cursor::new(buf), FormatVariant::DeviceTree).unwrap();
        assert_eq!(hdr.device_tree_size, 1234);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = header_bytes(2048, 1, 1, 0, 0);
        buf[..8].copy_from_slice(b"VNDRBOOT");
        let err = Header::parse(&mut Cursor::new(buf), FormatVariant::Plain).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic(_)));
    }

    #[test]
    fn bad_magic_wins_over_a_missing_body() {
        // Nothing follows the 8 magic bytes; the signature check must
        // still come first.
        let err = Header::parse(&mut Cursor::new(b"NOTABOOT".to_vec()), FormatVariant::Plain)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMagic(_)));
    }

    #[test]
    fn rejects_truncated_header() {
        let buf = header_bytes(2048, 1, 1, 0, 0);
        let err = Header::parse(&mut Cursor::new(buf[..100].to_vec()), FormatVariant::Plain)
            .unwrap_err();
        assert!(matches!(err, Error::TruncatedInput));
    }

    #[test]
    fn rejects_zero_page_size() {
        let buf = header_bytes(0, 1, 1, 0, 0);
        let err = Header::parse(&mut Cursor::new(buf), FormatVariant::Plain).unwrap_err();
        assert!(matches!(err, Error::InvalidPageSize(0)));
    }

    #[test]
    fn rejects_page_size_smaller_than_the_header() {
        let buf = header_bytes(512, 1, 1, 0, 0);
        let err = Header::parse(&mut Cursor::new(buf), FormatVariant::Plain).unwrap_err();
        assert!(matches!(err, Error::InvalidPageSize(512)));
    }

    #[test]
    fn summary_lists_the_decoded_fields() {
        let buf = header_bytes(2048, 5000, 3000, 0, 0);
        let hdr = Header::parse(&mut Cursor::new(buf), FormatVariant::Plain).unwrap();
        let summary = hdr.to_string();
        assert!(summary.contains("Page size: 2048 (0x00000800)"));
        assert!(summary.contains("Kernel size: 5000"));
        assert!(summary.contains("Board name: testboard"));
        assert!(summary.contains("Command line: console=ttyMSM0,115200"));
    }
}
